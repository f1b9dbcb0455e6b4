//! Streaming downloads with manual redirect handling and progress reporting
//!
//! Redirects are followed by hand (the client is built with automatic redirects
//! disabled) so the chain length is under our control and every hop is logged.
//! The body is streamed into a uniquely named `.<dest>.<random>.part` file next to
//! `dest` and only renamed onto `dest` once complete, so a failed download never leaves
//! a file that looks installed and separate processes never share a part file.

use crate::error::{DownloadCause, Error, Result};
use crate::platform::make_executable;
use futures::StreamExt;
use reqwest::header::LOCATION;
use reqwest::{Client, ClientBuilder, Response};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

/// Redirect statuses that are re-issued against `Location`
const FOLLOWED_REDIRECTS: &[u16] = &[301, 302, 307, 308];

/// Progress information during a download.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    /// Bytes downloaded so far.
    pub bytes_downloaded: u64,
    /// Total bytes expected (if known from Content-Length header).
    pub total_bytes: Option<u64>,
    /// Progress percentage (0.0 to 100.0), or None if total is unknown.
    pub percent: Option<f32>,
}

impl DownloadProgress {
    pub(crate) fn new(bytes_downloaded: u64, total_bytes: Option<u64>) -> Self {
        let percent = total_bytes.map(|total| {
            if total > 0 {
                (bytes_downloaded as f32 / total as f32) * 100.0
            } else {
                0.0
            }
        });

        Self {
            bytes_downloaded,
            total_bytes,
            percent,
        }
    }

    /// Whole percent for display; 0 while the total is unknown
    pub fn display_percent(&self) -> u32 {
        self.percent.map(|p| p.round() as u32).unwrap_or(0)
    }
}

/// Client settings shared by every download: user agent, no automatic redirects
pub(crate) fn client_builder(user_agent: &str) -> ClientBuilder {
    Client::builder()
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::none())
}

/// Download `url` to `dest`, returning the number of bytes written.
///
/// When `executable` is set the file gets mode `0755` before it is moved into place;
/// failing to set the bit is logged and ignored.
pub(crate) async fn download_file(
    client: &Client,
    url: Url,
    dest: &Path,
    max_redirects: usize,
    executable: bool,
    progress_cb: &(dyn Fn(DownloadProgress) + Send + Sync),
) -> Result<u64> {
    let (final_url, response) = fetch_following_redirects(client, url, max_redirects).await?;

    let (file, part) = create_part_file(dest).await?;
    debug!("Streaming into {}", part.display());
    let written = match stream_to_file(response, &final_url, file, progress_cb).await {
        Ok(written) => written,
        Err(e) => {
            remove_partial(&part).await;
            return Err(e);
        }
    };

    if executable {
        if let Err(e) = make_executable(&part).await {
            warn!(
                "Could not set executable permission on {}: {}",
                part.display(),
                e
            );
        }
    }

    if let Err(e) = fs::rename(&part, dest).await {
        remove_partial(&part).await;
        return Err(Error::io(
            format!("Failed to move download into {}", dest.display()),
            e,
        ));
    }

    Ok(written)
}

/// GET `url`, re-issuing the request for every followed redirect, until a
/// non-redirect response arrives. Returns the final URL with its 2xx response.
async fn fetch_following_redirects(
    client: &Client,
    url: Url,
    max_redirects: usize,
) -> Result<(Url, Response)> {
    let mut current = url;
    let mut redirects = 0;

    loop {
        let response = client
            .get(current.clone())
            .send()
            .await
            .map_err(|e| Error::download(&current, DownloadCause::Network(e)))?;
        let status = response.status();

        if FOLLOWED_REDIRECTS.contains(&status.as_u16()) {
            if let Some(next) = redirect_target(&response, &current) {
                redirects += 1;
                if redirects > max_redirects {
                    return Err(Error::download(
                        &current,
                        DownloadCause::TooManyRedirects(max_redirects),
                    ));
                }
                debug!("HTTP {} redirect: {} -> {}", status.as_u16(), current, next);
                current = next;
                continue;
            }
        }

        if !status.is_success() {
            return Err(Error::download(
                &current,
                DownloadCause::Status(status.as_u16()),
            ));
        }

        return Ok((current, response));
    }
}

/// Resolve the `Location` header against the URL that produced it
fn redirect_target(response: &Response, current: &Url) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

async fn stream_to_file(
    response: Response,
    url: &Url,
    mut file: File,
    progress_cb: &(dyn Fn(DownloadProgress) + Send + Sync),
) -> Result<u64> {
    let total_bytes = response.content_length();
    debug!("Content-Length: {:?}", total_bytes);

    let mut stream = response.bytes_stream();
    let mut bytes_downloaded: u64 = 0;

    progress_cb(DownloadProgress::new(0, total_bytes));

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| Error::download(url, DownloadCause::Network(e)))?;

        file.write_all(&chunk)
            .await
            .map_err(|e| Error::io("Failed to write chunk to file", e))?;

        bytes_downloaded += chunk.len() as u64;
        progress_cb(DownloadProgress::new(bytes_downloaded, total_bytes));
    }

    file.flush()
        .await
        .map_err(|e| Error::io("Failed to flush file", e))?;

    Ok(bytes_downloaded)
}

/// Create an empty, uniquely named part file in the directory of `dest`
async fn create_part_file(dest: &Path) -> Result<(File, PathBuf)> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let prefix = format!(
        ".{}.",
        dest.file_name().unwrap_or_default().to_string_lossy()
    );

    let created = tokio::task::spawn_blocking(move || {
        tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".part")
            .tempfile_in(&dir)
    })
    .await
    .map_err(std::io::Error::other)
    .and_then(|result| result)
    .map_err(|e| {
        Error::io(
            format!("Failed to create part file next to {}", dest.display()),
            e,
        )
    })?;

    let (file, temp_path) = created.into_parts();
    let part = temp_path
        .keep()
        .map_err(|e| Error::io("Failed to keep part file", e.error))?;

    Ok((File::from_std(file), part))
}

async fn remove_partial(part: &Path) {
    match fs::remove_file(part).await {
        Ok(()) => debug!("Removed partial download {}", part.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial download {}: {}", part.display(), e),
    }
}
