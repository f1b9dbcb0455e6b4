//! Formatter profile trait
//!
//! A profile describes one formatter product: where its releases live, how its
//! executable is invoked, and which output patterns carry meaning. The built-in
//! [`Ktlint`] profile is what the CLI uses.

/// Configuration trait for an external formatter product
///
/// Implementors define:
/// - Product identity (name, display name)
/// - Release location (pinned version, base URL, asset name)
/// - Environment variables that override the release location
/// - Invocation arguments
/// - Output markers used to classify a run
pub trait FormatterProfile: Clone + Send + Sync + 'static {
    /// Internal product name (used for file names, user agent)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Pinned release version
    fn default_version(&self) -> &'static str;

    /// Release host; assets live at `<base>/<version>/<asset>`
    fn default_base_url(&self) -> &'static str;

    /// Environment variable overriding the pinned version
    fn version_env(&self) -> &'static str;

    /// Environment variable overriding the release host
    fn base_url_env(&self) -> &'static str;

    /// Remote asset name, identical on every platform
    fn asset_name(&self) -> &'static str;

    /// Arguments passed on every invocation
    fn format_args(&self) -> &'static [&'static str];

    /// Extra argument that switches the tool to stdin/stdout mode
    fn stdin_arg(&self) -> &'static str;

    /// stderr substrings meaning the input could not be parsed at all
    fn parse_failure_markers(&self) -> &'static [&'static str];

    /// stdout substrings of startup banners that cannot be silenced
    fn banner_markers(&self) -> &'static [&'static str];

    /// File extensions the formatter selects rules for, without the dot
    fn extensions(&self) -> &'static [&'static str];

    /// Extension used when the caller's file name hint is missing or foreign
    fn default_extension(&self) -> &'static str {
        self.extensions().first().copied().unwrap_or("txt")
    }

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }
}

/// Pinterest ktlint
#[derive(Debug, Clone, Copy, Default)]
pub struct Ktlint;

impl FormatterProfile for Ktlint {
    fn name(&self) -> &'static str {
        "ktlint"
    }

    fn display_name(&self) -> &'static str {
        "ktlint"
    }

    fn default_version(&self) -> &'static str {
        "1.8.0"
    }

    fn default_base_url(&self) -> &'static str {
        "https://github.com/pinterest/ktlint/releases/download"
    }

    fn version_env(&self) -> &'static str {
        "KTLINT_VERSION"
    }

    fn base_url_env(&self) -> &'static str {
        "KTLINT_BASE_URL"
    }

    fn asset_name(&self) -> &'static str {
        "ktlint"
    }

    fn format_args(&self) -> &'static [&'static str] {
        &["--format", "--log-level=error"]
    }

    fn stdin_arg(&self) -> &'static str {
        "--stdin"
    }

    fn parse_failure_markers(&self) -> &'static [&'static str] {
        &["Not a valid Kotlin file", "Can not parse input"]
    }

    fn banner_markers(&self) -> &'static [&'static str] {
        &["Enable default patterns"]
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["kt", "kts"]
    }

    fn user_agent(&self) -> &'static str {
        concat!("ktlint-fmt/", env!("CARGO_PKG_VERSION"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ktlint_defaults() {
        assert_eq!(Ktlint.default_version(), "1.8.0");
        assert_eq!(Ktlint.default_extension(), "kt");
        assert!(Ktlint.extensions().contains(&"kts"));
        assert_eq!(Ktlint.format_args(), &["--format", "--log-level=error"]);
    }

    #[test]
    fn test_user_agent_names_the_client() {
        assert!(Ktlint.user_agent().starts_with("ktlint-fmt/"));
    }
}
