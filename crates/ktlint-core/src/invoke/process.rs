//! Running the formatter subprocess and capturing its output

use super::classify::ProcessOutput;
use crate::error::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::debug;

/// Spawn `cmd`, optionally feed `input` on stdin, and collect stdout/stderr until exit
///
/// Both streams are drained concurrently with the stdin write so a chatty tool can
/// never block on a full pipe.
pub(crate) async fn run(
    mut cmd: Command,
    program: &Path,
    input: Option<&str>,
) -> Result<ProcessOutput> {
    let stdin_mode = if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    };

    let mut child = cmd
        .stdin(stdin_mode)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| Error::ProcessLaunch {
            program: program.to_path_buf(),
            source,
        })?;

    let stdin = child.stdin.take();
    let stdout = child.stdout.take().ok_or_else(|| not_captured("stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| not_captured("stderr"))?;

    let write_input = async move {
        if let (Some(mut stdin), Some(input)) = (stdin, input) {
            // The tool may exit before consuming everything; its output decides the verdict.
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                debug!("Formatter closed stdin early: {}", e);
            }
        }
    };

    let ((), stdout, stderr) = tokio::join!(write_input, read_all(stdout), read_all(stderr));
    let stdout = stdout.map_err(|e| Error::io("Failed to read formatter stdout", e))?;
    let stderr = stderr.map_err(|e| Error::io("Failed to read formatter stderr", e))?;

    let status = child
        .wait()
        .await
        .map_err(|e| Error::io("Failed to wait for formatter", e))?;

    Ok(ProcessOutput {
        stdout,
        stderr,
        exit_code: status.code(),
    })
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn not_captured(stream: &str) -> Error {
    Error::io(
        format!("Failed to capture formatter {}", stream),
        std::io::Error::other("pipe not available"),
    )
}
