//! Shared test utilities for the simple-folio test suite.
//!
//! Provides record and source builders plus lookup helpers that work with
//! the content model (`PostRecord`, `Inventory`).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = memory_source(&[
//!     ("posts/hello.md", md("Hello", "2024-12-05", "tags: [rust]\n", "Body")),
//! ]);
//! let inventory = SiteBuilder::new(&config).check(&source).unwrap();
//! assert_eq!(slugs(&inventory.posts), vec!["hello"]);
//! ```

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::model::PostRecord;
use crate::source::{MemorySource, SourceFile};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Builders
// =========================================================================

/// A published post with the given slug and `YYYY-MM-DD` date; every other
/// field takes its default.
pub fn post(slug: &str, date: &str) -> PostRecord {
    PostRecord {
        slug: slug.to_string(),
        title: slug.to_string(),
        publish_date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap_or_else(|e| panic!("bad test date {date:?}: {e}")),
        category: String::new(),
        tags: Vec::new(),
        description: String::new(),
        author: String::new(),
        pinned: false,
        draft: false,
        body_html: String::new(),
        reading_minutes: 1,
        source_path: PathBuf::from(format!("posts/{slug}.md")),
    }
}

/// A markdown document with `title` and `date` plus any extra frontmatter
/// lines (each ending in `\n`).
pub fn md(title: &str, date: &str, extra: &str, body: &str) -> String {
    format!("---\ntitle: {title}\ndate: {date}\n{extra}---\n{body}\n")
}

/// In-memory content source from `(path, content)` pairs.
pub fn memory_source(files: &[(&str, String)]) -> MemorySource {
    MemorySource::new(
        files
            .iter()
            .map(|(path, content)| SourceFile::new(*path, content.clone()))
            .collect(),
    )
}

// =========================================================================
// Lookups
// =========================================================================

/// Find a post by slug. Panics if not found.
pub fn find_post<'a>(posts: &'a [PostRecord], slug: &str) -> &'a PostRecord {
    posts.iter().find(|p| p.slug == slug).unwrap_or_else(|| {
        let available = slugs(posts);
        panic!("post '{slug}' not found. Available: {available:?}")
    })
}

/// All slugs in the given order.
pub fn slugs(posts: &[PostRecord]) -> Vec<&str> {
    posts.iter().map(|p| p.slug.as_str()).collect()
}
