//! Output boundary.
//!
//! The assembler hands finished pages to an [`OutputSink`] and calls
//! [`OutputSink::commit`] once every page has been written. Until commit, a
//! sink must not make any output visible.
//!
//! [`DirectorySink`] writes into a hidden staging directory next to the
//! target and swaps it into place on commit, so a build that fails halfway
//! through writing leaves the previous site untouched.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Accepts output files for one build.
pub trait OutputSink {
    /// Write one file at `path`, relative to the output root.
    fn write_output(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Make everything written so far visible as the new site.
    fn commit(&mut self) -> io::Result<()>;
}

/// Output paths must stay inside the output root.
fn check_relative(path: &Path) -> io::Result<()> {
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || path.as_os_str().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("output path must be relative and inside the site: {}", path.display()),
        ));
    }
    Ok(())
}

/// Writes the site to a directory on disk, atomically replacing its contents
/// on commit.
///
/// Nothing touches the disk until the first write.
#[derive(Debug)]
pub struct DirectorySink {
    target: PathBuf,
    staging: PathBuf,
    staging_ready: bool,
    committed: bool,
}

impl DirectorySink {
    pub fn new(target: impl Into<PathBuf>) -> io::Result<Self> {
        let target = target.into();
        let staging = sibling(&target, "staging")?;
        Ok(Self {
            target,
            staging,
            staging_ready: false,
            committed: false,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Start from an empty staging directory, clearing leftovers of an
    /// interrupted earlier build.
    fn ensure_staging(&mut self) -> io::Result<()> {
        if self.staging_ready {
            return Ok(());
        }
        if self.staging.exists() {
            fs::remove_dir_all(&self.staging)?;
        }
        fs::create_dir_all(&self.staging)?;
        self.staging_ready = true;
        Ok(())
    }
}

/// `<parent>/.<name>.<suffix>` for a target `<parent>/<name>`.
fn sibling(target: &Path, suffix: &str) -> io::Result<PathBuf> {
    let name = target.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("output directory must be named: {}", target.display()),
        )
    })?;
    Ok(target.with_file_name(format!(".{}.{suffix}", name.to_string_lossy())))
}

impl OutputSink for DirectorySink {
    fn write_output(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        check_relative(path)?;
        self.ensure_staging()?;
        let dest = self.staging.join(path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, bytes)
    }

    fn commit(&mut self) -> io::Result<()> {
        self.ensure_staging()?;
        let previous = sibling(&self.target, "previous")?;
        if previous.is_dir() {
            fs::remove_dir_all(&previous)?;
        } else if previous.exists() {
            fs::remove_file(&previous)?;
        }
        let had_previous = self.target.exists();
        if had_previous {
            fs::rename(&self.target, &previous)?;
        }
        if let Err(e) = fs::rename(&self.staging, &self.target) {
            if had_previous {
                fs::rename(&previous, &self.target)?;
            }
            return Err(e);
        }
        self.committed = true;
        // The new site is live; a leftover previous copy is only clutter.
        if had_previous && let Err(e) = fs::remove_dir_all(&previous) {
            tracing::warn!(path = %previous.display(), error = %e, "could not remove previous site");
        }
        Ok(())
    }
}

impl Drop for DirectorySink {
    fn drop(&mut self) {
        if self.staging_ready
            && !self.committed
            && let Err(e) = fs::remove_dir_all(&self.staging)
        {
            tracing::warn!(path = %self.staging.display(), error = %e, "could not remove staging directory");
        }
    }
}

/// Collects output in memory. Files become visible in [`MemorySink::files`]
/// only after commit.
#[derive(Debug, Default)]
pub struct MemorySink {
    pending: BTreeMap<PathBuf, Vec<u8>>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed files, keyed by relative path.
    pub fn files(&self) -> &BTreeMap<PathBuf, Vec<u8>> {
        &self.files
    }

    /// Committed file as UTF-8 text.
    pub fn text(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files
            .get(path.as_ref())
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

impl OutputSink for MemorySink {
    fn write_output(&mut self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        check_relative(path)?;
        self.pending.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn commit(&mut self) -> io::Result<()> {
        self.files = std::mem::take(&mut self.pending);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn directory_sink_writes_nothing_before_commit() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("dist");
        let mut sink = DirectorySink::new(&target).unwrap();
        sink.write_output(Path::new("a/b/index.html"), b"hi").unwrap();
        assert!(!target.exists());

        sink.commit().unwrap();
        assert_eq!(fs::read_to_string(target.join("a/b/index.html")).unwrap(), "hi");
        assert!(!tmp.path().join(".dist.staging").exists());
    }

    #[test]
    fn directory_sink_replaces_previous_site() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("dist");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("stale.html"), "old").unwrap();

        let mut sink = DirectorySink::new(&target).unwrap();
        sink.write_output(Path::new("index.html"), b"new").unwrap();
        sink.commit().unwrap();

        assert!(!target.join("stale.html").exists());
        assert_eq!(fs::read_to_string(target.join("index.html")).unwrap(), "new");
        assert!(!tmp.path().join(".dist.previous").exists());
    }

    #[test]
    fn commit_succeeds_when_previous_cannot_be_removed() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("dist");
        // A plain file where the old site was: it is swapped aside fine but
        // `remove_dir_all` refuses it afterwards.
        fs::write(&target, "not a directory").unwrap();

        let mut sink = DirectorySink::new(&target).unwrap();
        sink.write_output(Path::new("index.html"), b"new").unwrap();
        sink.commit().unwrap();

        assert_eq!(fs::read_to_string(target.join("index.html")).unwrap(), "new");
        assert!(tmp.path().join(".dist.previous").is_file());
        assert!(!tmp.path().join(".dist.staging").exists());

        // The leftover does not block the next build.
        let mut sink = DirectorySink::new(&target).unwrap();
        sink.write_output(Path::new("index.html"), b"newer").unwrap();
        sink.commit().unwrap();
        assert_eq!(fs::read_to_string(target.join("index.html")).unwrap(), "newer");
        assert!(!tmp.path().join(".dist.previous").exists());
    }

    #[test]
    fn dropped_sink_leaves_previous_site_and_cleans_staging() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("dist");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("index.html"), "old").unwrap();

        {
            let mut sink = DirectorySink::new(&target).unwrap();
            sink.write_output(Path::new("index.html"), b"new").unwrap();
        }

        assert_eq!(fs::read_to_string(target.join("index.html")).unwrap(), "old");
        assert!(!tmp.path().join(".dist.staging").exists());
    }

    #[test]
    fn directory_sink_untouched_without_writes() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("dist");
        drop(DirectorySink::new(&target).unwrap());
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn directory_sink_clears_stale_staging() {
        let tmp = TempDir::new().unwrap();
        let stale = tmp.path().join(".dist.staging");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("leftover.html"), "x").unwrap();

        let target = tmp.path().join("dist");
        let mut sink = DirectorySink::new(&target).unwrap();
        sink.write_output(Path::new("index.html"), b"new").unwrap();
        sink.commit().unwrap();
        assert!(!target.join("leftover.html").exists());
        assert!(target.join("index.html").exists());
    }

    #[test]
    fn rejects_paths_outside_root() {
        let mut sink = MemorySink::new();
        assert!(sink.write_output(Path::new("../escape.html"), b"x").is_err());
        assert!(sink.write_output(Path::new("/etc/passwd"), b"x").is_err());
        assert!(sink.write_output(Path::new(""), b"x").is_err());
    }

    #[test]
    fn memory_sink_exposes_files_after_commit() {
        let mut sink = MemorySink::new();
        sink.write_output(Path::new("index.html"), b"<p>x</p>").unwrap();
        assert!(sink.files().is_empty());
        sink.commit().unwrap();
        assert_eq!(sink.text("index.html"), Some("<p>x</p>"));
    }
}
