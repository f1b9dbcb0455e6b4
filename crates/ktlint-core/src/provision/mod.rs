//! Asset Provisioner
//!
//! Guarantees the pinned formatter executable exists under an install directory,
//! downloading it on first use. Existence of the file is the only freshness signal:
//! a cached asset is never re-verified.

pub mod download;

use crate::config::ReleaseConfig;
use crate::error::{Error, Result};
use crate::platform::PlatformStrategy;
use crate::profile::FormatterProfile;
use reqwest::Client;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub use download::DownloadProgress;

/// One download lock per target path, shared by every `Provisioner` in the process
static DOWNLOAD_LOCKS: OnceLock<std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    OnceLock::new();

fn download_lock(target: &Path) -> Arc<Mutex<()>> {
    let mut locks = DOWNLOAD_LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    locks.entry(target.to_path_buf()).or_default().clone()
}

/// Downloads and caches the formatter executable
///
/// Concurrent first-run callers targeting the same path are serialized process-wide,
/// even when each builds its own `Provisioner`, so only one of them downloads.
pub struct Provisioner {
    release: ReleaseConfig,
    platform: PlatformStrategy,
    install_dir: PathBuf,
    client: Client,
}

impl Provisioner {
    /// Create a provisioner for an explicit release, storing the asset in `install_dir`
    pub fn new(release: ReleaseConfig, install_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = download::client_builder(release.user_agent())
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            release,
            platform: PlatformStrategy::detect(),
            install_dir: install_dir.into(),
            client,
        })
    }

    /// Create a provisioner from a profile (environment overrides applied)
    pub fn from_profile<P: FormatterProfile>(profile: &P, install_dir: &Path) -> Result<Self> {
        let release = ReleaseConfig::from_profile(profile)?;
        Self::new(release, install_dir)
    }

    pub fn with_platform(mut self, platform: PlatformStrategy) -> Self {
        self.platform = platform;
        self
    }

    /// Replace the HTTP client; it must not follow redirects on its own
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn release(&self) -> &ReleaseConfig {
        &self.release
    }

    pub fn platform(&self) -> PlatformStrategy {
        self.platform
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Where the executable lives once installed
    pub fn executable_path(&self) -> PathBuf {
        self.install_dir
            .join(self.release.local_file_name(self.platform))
    }

    /// Check if the executable is already cached
    pub async fn is_installed(&self) -> bool {
        fs::try_exists(self.executable_path())
            .await
            .unwrap_or(false)
    }

    /// Return the executable path, downloading the asset first if it is missing
    ///
    /// `progress_cb` only fires when a download actually happens.
    pub async fn ensure_executable<F>(&self, progress_cb: F) -> Result<PathBuf>
    where
        F: Fn(DownloadProgress) + Send + Sync,
    {
        let path = self.executable_path();
        if self.is_installed().await {
            return Ok(path);
        }

        let lock = download_lock(&path);
        let _guard = lock.lock().await;
        if self.is_installed().await {
            debug!("{} was installed by a concurrent caller", path.display());
            return Ok(path);
        }

        fs::create_dir_all(&self.install_dir).await.map_err(|e| {
            Error::io(
                format!("Failed to create directory: {}", self.install_dir.display()),
                e,
            )
        })?;

        let url = self.release.asset_url();
        info!(
            "Downloading {} {} ({}) from {} to {}",
            self.release.asset_name(),
            self.release.version(),
            self.platform,
            url,
            path.display()
        );

        let bytes = download::download_file(
            &self.client,
            url,
            &path,
            self.release.max_redirects(),
            self.platform.needs_executable_bit(),
            &progress_cb,
        )
        .await?;

        info!(
            "Download complete: {} bytes written to {}",
            bytes,
            path.display()
        );

        Ok(path)
    }
}
