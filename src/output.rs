//! CLI output formatting for `check` and `build`.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every post leads with
//! its position in the home listing and its title; the source file, date and
//! output path follow as indented context lines. The output reads as a
//! content inventory while still letting users trace each page back to the
//! file it came from.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Posts
//! 001 Welcome (pinned)
//!     Source: posts/welcome.md
//!     Date: 2024-11-01
//! 002 Hello, World
//!     Source: posts/2024-12-05-hello.md
//!     Date: 2024-12-05
//!     Category: Engineering
//!     Tags: rust, web
//!
//! Categories
//!     Engineering (1 post)
//!
//! Tags
//!     rust (1 post)
//!     web (1 post)
//!
//! Skipped 1 draft
//! ```
//!
//! ## Build
//!
//! ```text
//! Home → index.html
//! 001 Welcome → 2024/11/01/welcome/index.html
//! 002 Hello, World → 2024/12/05/hello/index.html
//!
//! Categories
//!     Engineering → categories/engineering/index.html
//!
//! Tags
//!     rust → tags/rust/index.html
//!
//! Generated 2 posts, 1 category, 1 tag (5 pages)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::site::{BuildReport, Inventory, LabelSummary};

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 post`, `3 tags`.
fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// Format an entity header: positional index + title, with an optional
/// marker.
///
/// ```text
/// 001 Welcome (pinned)
/// 002 Hello, World
/// ```
fn entity_header(index: usize, title: &str, marker: Option<&str>) -> String {
    match marker {
        Some(m) => format!("{} {} ({})", format_index(index), title, m),
        None => format!("{} {}", format_index(index), title),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

fn post_marker(pinned: bool, draft: bool) -> Option<&'static str> {
    match (pinned, draft) {
        (true, true) => Some("pinned, draft"),
        (true, false) => Some("pinned"),
        (false, true) => Some("draft"),
        (false, false) => None,
    }
}

/// Label lines of a section, e.g. `    rust (2 posts)`.
fn label_section(lines: &mut Vec<String>, heading: &str, labels: &[LabelSummary]) {
    if labels.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(heading.to_string());
    for entry in labels {
        lines.push(format!(
            "{}{} ({})",
            indent(1),
            entry.label,
            plural(entry.posts, "post")
        ));
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the content inventory found by `check`.
pub fn format_check_output(inventory: &Inventory) -> Vec<String> {
    let mut lines = vec!["Posts".to_string()];
    if inventory.posts.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, post) in inventory.posts.iter().enumerate() {
        let ctx = indent(1);
        lines.push(entity_header(i + 1, &post.title, post_marker(post.pinned, post.draft)));
        lines.push(format!("{ctx}Source: {}", post.source_path.display()));
        lines.push(format!("{ctx}Date: {}", post.publish_date.format("%Y-%m-%d")));
        if !post.category.is_empty() {
            lines.push(format!("{ctx}Category: {}", post.category));
        }
        if !post.tags.is_empty() {
            lines.push(format!("{ctx}Tags: {}", post.tags.join(", ")));
        }
        let description = truncate_desc(post.description.trim(), 60);
        if !description.is_empty() {
            lines.push(format!("{ctx}{description}"));
        }
    }

    label_section(&mut lines, "Categories", &inventory.categories);
    label_section(&mut lines, "Tags", &inventory.tags);

    if inventory.drafts_skipped > 0 {
        lines.push(String::new());
        lines.push(format!("Skipped {}", plural(inventory.drafts_skipped, "draft")));
    }
    lines
}

/// Print check output to stdout.
pub fn print_check_output(inventory: &Inventory) {
    for line in format_check_output(inventory) {
        println!("{}", line);
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format the pages written by `build`.
pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let inventory = &report.inventory;
    let mut lines = vec!["Home \u{2192} index.html".to_string()];

    for (i, post) in inventory.posts.iter().enumerate() {
        lines.push(format!(
            "{} \u{2192} {}",
            entity_header(i + 1, &post.title, post_marker(post.pinned, post.draft)),
            post.output_path().display()
        ));
    }

    for (heading, labels) in [("Categories", &inventory.categories), ("Tags", &inventory.tags)] {
        if labels.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(heading.to_string());
        for entry in labels {
            lines.push(format!(
                "{}{} \u{2192} {}index.html",
                indent(1),
                entry.label,
                entry.dir
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}, {} ({})",
        plural(inventory.posts.len(), "post"),
        plural_category(inventory.categories.len()),
        plural(inventory.tags.len(), "tag"),
        plural(report.pages.len(), "page"),
    ));
    if inventory.drafts_skipped > 0 {
        lines.push(format!("Skipped {}", plural(inventory.drafts_skipped, "draft")));
    }
    lines
}

fn plural_category(n: usize) -> String {
    if n == 1 {
        "1 category".to_string()
    } else {
        format!("{n} categories")
    }
}

/// Print build output to stdout.
pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
