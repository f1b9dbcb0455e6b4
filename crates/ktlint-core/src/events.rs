//! Structured diagnostics emitted while formatting
//!
//! The invoker reports every classification input through a [`FormatEvents`] sink so
//! callers can audit why a run succeeded or failed. All methods have empty default
//! bodies; implement only what you need.

use crate::error::Error;
use crate::invoke::ProcessOutput;
use std::path::Path;
use tracing::{debug, info, warn};

/// A subprocess about to be spawned
#[derive(Debug, Clone, Copy)]
pub struct ProcessStart<'a> {
    pub program: &'a Path,
    pub args: &'a [String],
}

/// Receiver for formatter diagnostics
pub trait FormatEvents: Send + Sync {
    /// Called right before the subprocess is spawned
    fn on_process_start(&self, _start: &ProcessStart<'_>) {}

    /// Called for every stdout line dropped as log noise (ANSI codes stripped)
    fn on_line_filtered(&self, _line: &str) {}

    /// Called once the subprocess exited, with its raw output
    fn on_process_exit(&self, _output: &ProcessOutput) {}

    /// Called with the final result of the request
    fn on_outcome(&self, _outcome: Result<&str, &Error>) {}
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEvents;

impl FormatEvents for NoopEvents {}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEvents;

impl FormatEvents for TracingEvents {
    fn on_process_start(&self, start: &ProcessStart<'_>) {
        debug!(program = %start.program.display(), args = ?start.args, "Running formatter");
    }

    fn on_line_filtered(&self, line: &str) {
        debug!("[Filtered Log] {}", line);
    }

    fn on_process_exit(&self, output: &ProcessOutput) {
        debug!(exit_code = ?output.exit_code, "Formatter finished");
        if !output.stderr.is_empty() {
            debug!("Formatter stderr:\n{}", output.stderr);
        }
        if !output.stdout.is_empty() {
            debug!("Formatter stdout:\n{}", output.stdout);
        }
    }

    fn on_outcome(&self, outcome: Result<&str, &Error>) {
        match outcome {
            Ok(text) => info!("Formatting successful (content length: {})", text.len()),
            Err(e) => warn!("Formatting failed: {}", e),
        }
    }
}
