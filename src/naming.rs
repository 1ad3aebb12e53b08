//! Filename parsing and slug derivation.
//!
//! Post sources follow the `YYYY-MM-DD-name.md` convention, though the date
//! prefix is optional. The slug is the name part, normalized to a URL-safe
//! form:
//!
//! - `2024-12-05-Hello-World.md` → `hello-world`
//! - `rust_in_2025.markdown` → `rust-in-2025`
//! - `2024-12-05-C++ Tips.md` → `c-tips`
//!
//! The filename date is only used to derive the slug. The publish date always
//! comes from frontmatter.

use chrono::NaiveDate;
use std::path::Path;

/// Result of parsing a post filename stem like `2024-12-05-hello-world`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Date prefix if present and a valid calendar date.
    pub date: Option<NaiveDate>,
    /// Raw name after the date prefix. For undated stems, the full input.
    pub name: String,
}

/// Split a filename stem into an optional `YYYY-MM-DD-` prefix and the rest.
///
/// - `"2024-12-05-hello"` → date=Some(2024-12-05), name="hello"
/// - `"2024-12-05"` → date=Some(2024-12-05), name=""
/// - `"2024-13-05-hello"` → date=None, name="2024-13-05-hello" (not a date)
/// - `"hello"` → date=None, name="hello"
pub fn parse_post_name(stem: &str) -> ParsedName {
    if let Some(prefix) = stem.get(..10)
        && is_date_shaped(prefix)
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
    {
        let rest = &stem[10..];
        if rest.is_empty() || rest.starts_with('-') {
            return ParsedName {
                date: Some(date),
                name: rest.trim_start_matches('-').to_string(),
            };
        }
    }
    ParsedName {
        date: None,
        name: stem.to_string(),
    }
}

/// `NNNN-NN-NN`, checked before handing off to chrono so that stems like
/// `2024-1-5-x` are not read as dates.
fn is_date_shaped(s: &str) -> bool {
    s.bytes().enumerate().all(|(i, b)| match i {
        4 | 7 => b == b'-',
        _ => b.is_ascii_digit(),
    })
}

/// Normalize arbitrary text into a URL-safe slug.
///
/// Lowercases, keeps ASCII alphanumerics and non-ASCII letters/digits, and
/// collapses every other run of characters into a single `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Derive a post slug from its source path. Returns an empty string when the
/// filename has nothing left after the date prefix.
pub fn slug_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    slugify(&parse_post_name(&stem).name)
}
