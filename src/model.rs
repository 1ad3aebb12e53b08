//! Content model: typed post records built from loaded documents.
//!
//! Frontmatter is parsed as YAML and then checked against a fixed schema.
//! There is no coercion: a quoted `"true"` is not a boolean, a bare word is
//! not a tag list. The only defaults are the documented ones for optional
//! keys.
//!
//! | Key | Required | Type | Default |
//! |-----|----------|------|---------|
//! | `title` | yes | non-empty string | |
//! | `date` | yes | `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS[ ±HHMM]` or RFC 3339 | |
//! | `category` | no | string | `""` |
//! | `tags` | no | list of non-empty strings | `[]` |
//! | `description` | no | string | `""` |
//! | `author` | no | string | `""` |
//! | `pinned` | no | bool | `false` |
//! | `draft` | no | bool | `false` |
//!
//! A key set to null (`category:` with nothing after it) counts as absent.
//! Unknown keys are logged and ignored.

use crate::load::SourceDocument;
use crate::{markdown, naming};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const KNOWN_KEYS: &[&str] = &[
    "title",
    "date",
    "category",
    "tags",
    "description",
    "author",
    "pinned",
    "draft",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Malformed document {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },
    #[error("Missing required field `{field}` in {}", path.display())]
    MissingRequiredField { field: &'static str, path: PathBuf },
    #[error(
        "Invalid date {value:?} in {} (expected YYYY-MM-DD, YYYY-MM-DD HH:MM:SS with optional +HHMM offset, or RFC 3339)",
        path.display()
    )]
    InvalidDateFormat { path: PathBuf, value: String },
    #[error("Field `{field}` in {} must be {expected}", path.display())]
    InvalidFieldType {
        path: PathBuf,
        field: &'static str,
        expected: &'static str,
    },
    #[error("Duplicate slug `{slug}`: {} and {}", first.display(), second.display())]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// A fully validated post. Built once per build and never modified after.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub slug: String,
    pub title: String,
    pub publish_date: NaiveDate,
    pub category: String,
    /// Distinct tags in authored order.
    pub tags: Vec<String>,
    pub description: String,
    pub author: String,
    pub pinned: bool,
    pub draft: bool,
    #[serde(skip)]
    pub body_html: String,
    pub reading_minutes: u32,
    pub source_path: PathBuf,
}

impl PostRecord {
    /// Output directory relative to the site root: `YYYY/MM/DD/slug/`.
    pub fn url_path(&self) -> String {
        format!("{}/{}/", self.publish_date.format("%Y/%m/%d"), self.slug)
    }

    /// Output file relative to the site root: `YYYY/MM/DD/slug/index.html`.
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(self.url_path()).join("index.html")
    }
}

/// Parse a frontmatter date, keeping only the calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z")
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Typed view over a frontmatter mapping, bound to its source path for errors.
struct Frontmatter<'a> {
    path: &'a Path,
    map: Mapping,
}

impl<'a> Frontmatter<'a> {
    fn parse(path: &'a Path, raw: &str) -> Result<Self, ModelError> {
        let malformed = |reason: String| ModelError::MalformedDocument {
            path: path.to_path_buf(),
            reason,
        };
        let value: Value = serde_yaml::from_str(raw)
            .map_err(|e| malformed(format!("invalid frontmatter YAML: {e}")))?;
        let map = match value {
            Value::Null => Mapping::new(),
            Value::Mapping(map) => map,
            _ => return Err(malformed("frontmatter must be a key/value mapping".into())),
        };
        for key in map.keys() {
            match key.as_str() {
                Some(k) if KNOWN_KEYS.contains(&k) => {}
                Some(k) => tracing::warn!(path = %path.display(), key = k, "ignoring unknown frontmatter key"),
                None => return Err(malformed("frontmatter keys must be strings".into())),
            }
        }
        Ok(Self { path, map })
    }

    fn invalid(&self, field: &'static str, expected: &'static str) -> ModelError {
        ModelError::InvalidFieldType {
            path: self.path.to_path_buf(),
            field,
            expected,
        }
    }

    fn get(&self, field: &str) -> Option<&Value> {
        self.map.get(field).filter(|v| !v.is_null())
    }

    fn string(&self, field: &'static str) -> Result<Option<String>, ModelError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(_) => Err(self.invalid(field, "a string")),
        }
    }

    fn required_string(&self, field: &'static str) -> Result<String, ModelError> {
        match self.string(field)? {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(ModelError::MissingRequiredField {
                field,
                path: self.path.to_path_buf(),
            }),
        }
    }

    fn bool(&self, field: &'static str) -> Result<bool, ModelError> {
        match self.get(field) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(self.invalid(field, "true or false")),
        }
    }

    /// A date that is present but not a string (`date: 20241205`) is a bad
    /// date, not a type error.
    fn date(&self) -> Result<NaiveDate, ModelError> {
        let invalid = |value: String| ModelError::InvalidDateFormat {
            path: self.path.to_path_buf(),
            value,
        };
        match self.get("date") {
            Some(Value::String(_)) | None => {}
            Some(other) => {
                let shown = serde_yaml::to_string(other)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default();
                return Err(invalid(shown));
            }
        }
        let raw = self.required_string("date")?;
        parse_date(&raw).ok_or_else(|| invalid(raw))
    }

    fn tags(&self) -> Result<Vec<String>, ModelError> {
        let items = match self.get("tags") {
            None => return Ok(Vec::new()),
            Some(Value::Sequence(items)) => items,
            Some(_) => return Err(self.invalid("tags", "a list of strings")),
        };
        let mut tags: Vec<String> = Vec::with_capacity(items.len());
        for item in items {
            let tag = match item {
                Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                _ => return Err(self.invalid("tags", "a list of non-empty strings")),
            };
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Ok(tags)
    }
}

/// Build one post record from a loaded document.
pub fn build_post(doc: &SourceDocument) -> Result<PostRecord, ModelError> {
    let fm = Frontmatter::parse(&doc.path, &doc.raw_frontmatter)?;

    let title = fm.required_string("title")?;
    let publish_date = fm.date()?;

    let slug = naming::slug_from_path(&doc.path);
    if slug.is_empty() {
        return Err(ModelError::MalformedDocument {
            path: doc.path.clone(),
            reason: "filename does not yield a slug".into(),
        });
    }

    Ok(PostRecord {
        slug,
        title,
        publish_date,
        category: fm.string("category")?.unwrap_or_default(),
        tags: fm.tags()?,
        description: fm.string("description")?.unwrap_or_default(),
        author: fm.string("author")?.unwrap_or_default(),
        pinned: fm.bool("pinned")?,
        draft: fm.bool("draft")?,
        body_html: markdown::to_html(&doc.raw_body),
        reading_minutes: markdown::reading_minutes(&doc.raw_body),
        source_path: doc.path.clone(),
    })
}

/// Build every post, then check slug uniqueness.
///
/// Documents are modeled in parallel. Errors are reported for the earliest
/// failing document in input order, and the returned records keep input order.
pub fn build_posts(docs: &[SourceDocument]) -> Result<Vec<PostRecord>, ModelError> {
    let results: Vec<_> = docs.par_iter().map(build_post).collect();
    let posts: Vec<PostRecord> = results.into_iter().collect::<Result<_, _>>()?;

    let mut seen: HashMap<&str, &Path> = HashMap::with_capacity(posts.len());
    for post in &posts {
        if let Some(first) = seen.insert(&post.slug, &post.source_path) {
            return Err(ModelError::DuplicateSlug {
                slug: post.slug.clone(),
                first: first.to_path_buf(),
                second: post.source_path.clone(),
            });
        }
    }
    Ok(posts)
}
