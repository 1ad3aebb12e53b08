//! Document loading: split each source into frontmatter and body.
//!
//! A source must open with a `---` line and close its frontmatter with another
//! `---` line:
//!
//! ```text
//! ---
//! title: Hello
//! date: 2024-12-05
//! ---
//! Body markdown starts here.
//! ```
//!
//! Loading is fail-fast: the first malformed source aborts the whole load,
//! because a site missing a post is a wrong site.

use crate::source::SourceFile;
use rayon::prelude::*;
use std::path::PathBuf;
use thiserror::Error;

const DELIMITER: &str = "---";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Malformed document {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },
}

/// A source split into its unparsed parts. Lives only until modeling.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub raw_frontmatter: String,
    pub raw_body: String,
}

/// Split one source at its frontmatter delimiters.
pub fn load_document(source: &SourceFile) -> Result<SourceDocument, LoadError> {
    let malformed = |reason: &str| LoadError::MalformedDocument {
        path: source.path.clone(),
        reason: reason.to_string(),
    };

    let text = source.content.strip_prefix('\u{feff}').unwrap_or(&source.content);
    let mut lines = text.split_inclusive('\n');

    let frontmatter_start = match lines.next() {
        Some(first) if is_delimiter(first) => first.len(),
        _ => return Err(malformed("missing opening frontmatter delimiter `---`")),
    };

    let mut consumed = frontmatter_start;
    for line in lines {
        if is_delimiter(line) {
            let raw_frontmatter = text[frontmatter_start..consumed].to_string();
            let raw_body = text[consumed + line.len()..].to_string();
            return Ok(SourceDocument {
                path: source.path.clone(),
                raw_frontmatter,
                raw_body,
            });
        }
        consumed += line.len();
    }

    Err(malformed("missing closing frontmatter delimiter `---`"))
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// Load every source, preserving input order.
///
/// Sources are split in parallel; when several are malformed the error for
/// the earliest one in input order is returned.
pub fn load_all(sources: &[SourceFile]) -> Result<Vec<SourceDocument>, LoadError> {
    let results: Vec<_> = sources.par_iter().map(load_document).collect();
    results.into_iter().collect()
}
