//! ktlint Core - Shared library for on-demand Kotlin formatting
//!
//! This library makes sure a pinned ktlint executable is present on the machine and
//! runs it against source text, turning its noisy output into a clean result or a
//! typed error. Editor integrations and CLIs sit on top of the two entry points
//! [`ensure_executable`] and [`format`].
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Configuration** - `FormatterProfile` trait, `ReleaseConfig` and `PlatformStrategy`
//! - **Layer 2: Asset Provisioner** - downloads and caches the executable (`provision`)
//! - **Layer 3: Format Invoker** - runs the executable and classifies its output (`invoke`)
//!
//! Diagnostics flow through the [`FormatEvents`] sink; the library never writes to a
//! concrete log destination itself.
//!
//! # Example Usage
//!
//! ```ignore
//! use ktlint_core::{ensure_executable, format, TracingEvents};
//!
//! let ktlint = ensure_executable(&install_dir).await?;
//! let formatted = format("val x=1", &ktlint, Some(Path::new("Main.kt")), &TracingEvents).await?;
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod invoke;
pub mod platform;
pub mod profile;
pub mod provision;

#[cfg(test)]
mod test_support;

use std::path::{Path, PathBuf};

// Re-export main types for convenience
pub use config::ReleaseConfig;
pub use error::{DownloadCause, Error, Result};
pub use events::{FormatEvents, NoopEvents, ProcessStart, TracingEvents};
pub use invoke::{FormatInvoker, ProcessOutput, Strategy, Verdict};
pub use platform::PlatformStrategy;
pub use profile::{FormatterProfile, Ktlint};
pub use provision::{DownloadProgress, Provisioner};

/// Make sure the built-in ktlint release is installed under `install_dir` and return its path.
///
/// Environment overrides (`KTLINT_VERSION`, `KTLINT_BASE_URL`) are honored.
pub async fn ensure_executable(install_dir: &Path) -> Result<PathBuf> {
    let provisioner = Provisioner::from_profile(&Ktlint, install_dir)?;
    provisioner.ensure_executable(|_| {}).await
}

/// Format `source` with the executable at `executable` using the default strategy.
pub async fn format(
    source: &str,
    executable: &Path,
    file_name_hint: Option<&Path>,
    events: &dyn FormatEvents,
) -> Result<String> {
    FormatInvoker::new(&Ktlint)?
        .format(source, executable, file_name_hint, events)
        .await
}
