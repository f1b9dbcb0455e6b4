//! Release configuration: which version to fetch and from where

use crate::error::{Error, Result};
use crate::platform::PlatformStrategy;
use crate::profile::FormatterProfile;
use semver::Version;
use url::Url;

/// Default cap on chained redirects while downloading
pub const DEFAULT_MAX_REDIRECTS: usize = 20;

/// Pinned release location, injected into the provisioner
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    version: String,
    base_url: Url,
    asset_name: String,
    user_agent: String,
    max_redirects: usize,
}

impl ReleaseConfig {
    /// Create a release config for an explicit version and host
    pub fn new(version: &str, base_url: &str, asset_name: &str) -> Result<Self> {
        let cleaned = version.strip_prefix('v').unwrap_or(version);
        Version::parse(cleaned)
            .map_err(|e| Error::InvalidConfig(format!("invalid version '{}': {}", version, e)))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| Error::InvalidConfig(format!("invalid base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "URL cannot have path segments: {}",
                base_url
            )));
        }

        if asset_name.is_empty() {
            return Err(Error::InvalidConfig("asset name is empty".to_string()));
        }

        Ok(Self {
            version: version.to_string(),
            base_url,
            asset_name: asset_name.to_string(),
            user_agent: asset_name.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        })
    }

    /// Create a release config from a profile, honoring its environment overrides
    pub fn from_profile<P: FormatterProfile>(profile: &P) -> Result<Self> {
        Self::from_profile_with(profile, |key| std::env::var(key).ok())
    }

    /// Like [`ReleaseConfig::from_profile`] with a custom variable lookup
    pub fn from_profile_with<P, F>(profile: &P, lookup: F) -> Result<Self>
    where
        P: FormatterProfile,
        F: Fn(&str) -> Option<String>,
    {
        let version = lookup(profile.version_env())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| profile.default_version().to_string());
        let base_url = lookup(profile.base_url_env())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| profile.default_base_url().to_string());

        Ok(Self::new(version.trim(), base_url.trim(), profile.asset_name())?
            .with_user_agent(profile.user_agent()))
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn asset_name(&self) -> &str {
        &self.asset_name
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    /// Download URL: `<base>/<version>/<asset>`, preserving query parameters
    pub fn asset_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&self.version)
                .push(&self.asset_name);
        }
        url
    }

    /// File name the asset is stored under on `platform`
    pub fn local_file_name(&self, platform: PlatformStrategy) -> String {
        platform.local_file_name(&self.asset_name)
    }
}
