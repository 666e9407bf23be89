//! Graph fixtures on disk.
//!
//! Each crate keeps its serialized graph documents under
//! `tests/fixtures/`. These helpers read them by name and stage copies in
//! temporary directories for tests that drive file-based entry points.

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Directory holding the fixtures of the crate rooted at `manifest_dir`.
///
/// Pass `env!("CARGO_MANIFEST_DIR")`.
#[must_use]
pub fn fixture_dir(manifest_dir: &str) -> Utf8PathBuf {
    Utf8Path::new(manifest_dir).join("tests").join("fixtures")
}

/// Reads the fixture `name` from `dir`.
///
/// # Errors
///
/// Returns an error when the file is missing or not UTF-8.
pub fn read(dir: &Utf8Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    std::fs::read_to_string(&path).with_context(|| format!("read fixture {path}"))
}

/// A temporary directory that owns staged files.
#[derive(Debug)]
pub struct Staged {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Staged {
    /// Creates an empty staging directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or its path is
    /// not UTF-8.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create staging directory")?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| anyhow!("staging path is not UTF-8: {}", path.display()))?;
        Ok(Self { _dir: dir, root })
    }

    /// Root of the staging directory.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.root
    }

    /// Writes `contents` to `name` inside the staging directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn write(&self, name: &str, contents: &str) -> Result<Utf8PathBuf> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        std::fs::write(&path, contents).with_context(|| format!("write {path}"))?;
        Ok(path)
    }

    /// Copies the fixture `name` from `dir` into the staging directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the fixture cannot be read or written.
    pub fn copy_fixture(&self, dir: &Utf8Path, name: &str) -> Result<Utf8PathBuf> {
        self.write(name, &read(dir, name)?)
    }
}

#[cfg(test)]
#[expect(
    clippy::panic_in_result_fn,
    reason = "tests assert directly and propagate setup errors"
)]
mod tests {
    use super::*;

    #[test]
    fn staged_files_are_readable() -> Result<()> {
        let staged = Staged::new()?;
        let path = staged.write("nested/graph.json", r#"{"classes":[]}"#)?;
        assert!(path.starts_with(staged.path()));
        let parent = path.parent().ok_or_else(|| anyhow!("no parent"))?;
        assert_eq!(read(parent, "graph.json")?, r#"{"classes":[]}"#);
        Ok(())
    }
}
