//! Platform strategy for storing and launching the formatter executable
//!
//! All OS branching lives here and is resolved once, when a `Provisioner` or
//! `FormatInvoker` is built.
//!
//! - POSIX: the release asset is a self-executing script/jar. It is stored under its
//!   own name, marked `0755`, and launched directly.
//! - Windows: the same asset is stored as `<asset>.jar` and launched through
//!   `java -jar`, since the shebang stub cannot run there.

use std::fmt;
use std::path::Path;
use tokio::process::Command;

/// Supported platform families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformStrategy {
    Posix,
    Windows,
}

impl PlatformStrategy {
    /// Detect the platform this binary was built for
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    /// Local file name the downloaded asset is stored under
    pub fn local_file_name(&self, asset_name: &str) -> String {
        match self {
            Self::Posix => asset_name.to_string(),
            Self::Windows => format!("{}.jar", asset_name),
        }
    }

    /// Whether the stored asset needs the executable bit
    pub fn needs_executable_bit(&self) -> bool {
        matches!(self, Self::Posix)
    }

    /// Build the base command that launches `executable`
    pub fn command(&self, executable: &Path) -> Command {
        match self {
            Self::Posix => Command::new(executable),
            Self::Windows => {
                let mut cmd = Command::new("java");
                cmd.arg("-jar").arg(executable);
                cmd
            }
        }
    }
}

impl fmt::Display for PlatformStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posix => write!(f, "posix"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Set mode `0755` on `path`; a no-op where the bit does not exist
pub(crate) async fn make_executable(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = tokio::fs::metadata(path).await?.permissions();
        permissions.set_mode(0o755);
        tokio::fs::set_permissions(path, permissions).await?;
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_file_names_are_distinct() {
        assert_eq!(PlatformStrategy::Posix.local_file_name("ktlint"), "ktlint");
        assert_eq!(
            PlatformStrategy::Windows.local_file_name("ktlint"),
            "ktlint.jar"
        );
    }

    #[test]
    fn test_only_posix_needs_executable_bit() {
        assert!(PlatformStrategy::Posix.needs_executable_bit());
        assert!(!PlatformStrategy::Windows.needs_executable_bit());
    }

    #[test]
    fn test_windows_launches_through_java() {
        let cmd = PlatformStrategy::Windows.command(Path::new("C:/tools/ktlint.jar"));
        let std_cmd = cmd.as_std();
        assert_eq!(std_cmd.get_program(), "java");
        let args: Vec<_> = std_cmd.get_args().collect();
        assert_eq!(args, ["-jar", "C:/tools/ktlint.jar"]);
    }

    #[test]
    fn test_posix_launches_directly() {
        let cmd = PlatformStrategy::Posix.command(Path::new("/opt/ktlint"));
        assert_eq!(cmd.as_std().get_program(), "/opt/ktlint");
        assert_eq!(cmd.as_std().get_args().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_make_executable_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        make_executable(&path).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
