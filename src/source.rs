//! Content source boundary.
//!
//! The build never touches the filesystem directly to find posts; it asks a
//! [`ContentSource`] for `(path, content)` pairs. [`DirectorySource`] walks a
//! posts directory on disk, [`MemorySource`] serves fixed sources for tests
//! and embedding.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const POST_EXTENSIONS: &[&str] = &["md", "markdown"];

/// One raw content source: an identifier and its full text.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Path relative to the content root, e.g. `posts/2024-12-05-hello.md`.
    pub path: PathBuf,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Enumerates the content sources of one build.
pub trait ContentSource {
    fn list_sources(&self) -> io::Result<Vec<SourceFile>>;
}

/// Reads every markdown file under `<root>/<dir>`, recursively.
///
/// Hidden files and directories are skipped. Results are sorted by path so
/// enumeration order never depends on the filesystem.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>, dir: impl AsRef<Path>) -> Self {
        Self {
            root: root.into(),
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl ContentSource for DirectorySource {
    fn list_sources(&self) -> io::Result<Vec<SourceFile>> {
        let posts_dir = self.root.join(&self.dir);
        if !posts_dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("posts directory not found: {}", posts_dir.display()),
            ));
        }

        let mut sources = Vec::new();
        let walker = WalkDir::new(&posts_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
        for entry in walker {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() || !is_post_file(entry.path()) {
                continue;
            }
            let content = fs::read_to_string(entry.path()).map_err(|e| {
                io::Error::new(e.kind(), format!("{}: {e}", entry.path().display()))
            })?;
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .to_path_buf();
            sources.push(SourceFile { path: rel, content });
        }
        sources.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(sources)
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_post_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| POST_EXTENSIONS.contains(&ext.as_str()))
}

/// A fixed, in-memory set of sources, returned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sources: Vec<SourceFile>,
}

impl MemorySource {
    pub fn new(sources: Vec<SourceFile>) -> Self {
        Self { sources }
    }
}

impl ContentSource for MemorySource {
    fn list_sources(&self) -> io::Result<Vec<SourceFile>> {
        Ok(self.sources.clone())
    }
}
