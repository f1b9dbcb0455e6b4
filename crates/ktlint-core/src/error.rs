//! Error types for provisioning and formatting

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ktlint-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a download did not produce a file
#[derive(Error, Debug)]
pub enum DownloadCause {
    /// Terminal response was not a 2xx
    #[error("HTTP status {0}")]
    Status(u16),

    /// Connection or body stream failure
    #[error("{0}")]
    Network(#[source] reqwest::Error),

    /// Redirect chain exceeded the configured limit
    #[error("more than {0} redirects")]
    TooManyRedirects(usize),
}

/// Main error type for ktlint-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Procurement failed on the network or HTTP level
    #[error("download from {url} failed: {cause}")]
    DownloadFailed { url: String, cause: DownloadCause },

    /// Local filesystem failure
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The formatter could not parse the input
    #[error("invalid syntax: {0}")]
    InvalidSyntax(String),

    /// The formatter process could not be spawned
    #[error("failed to launch {}: {source}", .program.display())]
    ProcessLaunch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The formatter ran, complained and produced nothing usable
    #[error("formatting failed: {0}")]
    FormattingFailed(String),

    /// Release or profile settings are unusable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn download(url: &url::Url, cause: DownloadCause) -> Self {
        Self::DownloadFailed {
            url: url.to_string(),
            cause,
        }
    }

    /// HTTP status carried by a failed download, if the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::DownloadFailed {
                cause: DownloadCause::Status(code),
                ..
            } => Some(*code),
            _ => None,
        }
    }
}
