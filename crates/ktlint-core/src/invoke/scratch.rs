//! Scratch copies of the source for in-place formatting
//!
//! Each request gets its own private temp directory holding `<stem>.<ext>`, so the
//! formatter sees the original file name (rule selection depends on the extension)
//! and concurrent requests for same-named files never share a path.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::{fs, task};
use tracing::{debug, warn};

const FALLBACK_STEM: &str = "Input";

/// A source file living in a private temp directory until [`ScratchFile::cleanup`]
#[derive(Debug)]
pub struct ScratchFile {
    dir: TempDir,
    path: PathBuf,
}

impl ScratchFile {
    /// Write `source` to a fresh scratch file named after `hint`
    pub async fn create(
        source: &str,
        hint: Option<&Path>,
        extensions: &[&str],
        default_extension: &str,
    ) -> Result<Self> {
        let dir = task::spawn_blocking(|| {
            tempfile::Builder::new().prefix("ktlint-fmt-").tempdir()
        })
        .await
        .map_err(std::io::Error::other)
        .and_then(|result| result)
        .map_err(|e| Error::io("Failed to create scratch directory", e))?;

        let path = dir
            .path()
            .join(scratch_file_name(hint, extensions, default_extension));
        fs::write(&path, source)
            .await
            .map_err(|e| Error::io(format!("Failed to write {}", path.display()), e))?;

        debug!("Scratch file created at {}", path.display());
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the (possibly rewritten) contents back
    pub async fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::io(format!("Failed to read {}", self.path.display()), e))
    }

    /// Remove the scratch directory; failures are logged, never returned
    pub async fn cleanup(self) {
        let dir_path = self.dir.path().to_path_buf();
        let dir = self.dir;
        let removed = task::spawn_blocking(move || dir.close())
            .await
            .map_err(std::io::Error::other)
            .and_then(|result| result);

        if let Err(e) = removed {
            warn!(
                "Failed to remove scratch directory {}: {}",
                dir_path.display(),
                e
            );
        }
    }
}

/// `<stem>.<ext>` for the hint, falling back to the default extension when the hint's
/// extension is not one the formatter handles
pub fn scratch_file_name(hint: Option<&Path>, extensions: &[&str], default_extension: &str) -> String {
    let stem = hint
        .and_then(|h| h.file_stem())
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_STEM);

    let extension = hint
        .and_then(|h| h.extension())
        .and_then(|e| e.to_str())
        .filter(|e| extensions.iter().any(|known| known.eq_ignore_ascii_case(e)))
        .unwrap_or(default_extension);

    format!("{}.{}", stem, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTS: &[&str] = &["kt", "kts"];

    #[test]
    fn test_name_mirrors_hint() {
        let name = scratch_file_name(Some(Path::new("/src/app/Main.kt")), EXTS, "kt");
        assert_eq!(name, "Main.kt");

        let name = scratch_file_name(Some(Path::new("build.gradle.kts")), EXTS, "kt");
        assert_eq!(name, "build.gradle.kts");
    }

    #[test]
    fn test_name_falls_back_for_missing_or_foreign_hint() {
        assert_eq!(scratch_file_name(None, EXTS, "kt"), "Input.kt");
        assert_eq!(
            scratch_file_name(Some(Path::new("notes.txt")), EXTS, "kt"),
            "notes.kt"
        );
        assert_eq!(scratch_file_name(Some(Path::new("Untitled-1")), EXTS, "kt"), "Untitled-1.kt");
    }

    #[tokio::test]
    async fn test_create_read_and_cleanup() {
        let scratch = ScratchFile::create("val x=1", Some(Path::new("Main.kt")), EXTS, "kt")
            .await
            .unwrap();
        let path = scratch.path().to_path_buf();
        let dir = path.parent().unwrap().to_path_buf();

        assert!(path.ends_with("Main.kt"));
        assert_eq!(scratch.read().await.unwrap(), "val x=1");

        scratch.cleanup().await;
        assert!(!path.exists());
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_same_name_requests_get_distinct_paths() {
        let a = ScratchFile::create("a", Some(Path::new("Main.kt")), EXTS, "kt")
            .await
            .unwrap();
        let b = ScratchFile::create("b", Some(Path::new("Main.kt")), EXTS, "kt")
            .await
            .unwrap();

        assert_ne!(a.path(), b.path());
        assert_eq!(a.read().await.unwrap(), "a");
        assert_eq!(b.read().await.unwrap(), "b");

        a.cleanup().await;
        b.cleanup().await;
    }
}
