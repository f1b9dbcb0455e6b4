//! Turning `{stdout, stderr, exit code}` into a verdict
//!
//! The exit code alone is not trustworthy: ktlint exits non-zero after a successful
//! format whenever lint violations remain that it cannot fix on its own.

use super::Strategy;

/// Fallback message when the tool failed without saying why
pub const UNKNOWN_FAILURE: &str = "Unknown formatting error";

/// Raw output of one formatter run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

/// Classification of one run, before it is mapped to the caller's result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Cleaned stdout holds the formatted source
    Formatted(String),
    /// Nothing emitted and exit code 0: the input was already formatted
    Unchanged,
    /// The formatted source must be read back from the scratch file
    ReadBack,
    /// The input could not be parsed; carries the first stderr line
    InvalidSyntax(String),
    /// The tool failed without usable output
    Failed(String),
}

/// Decide the verdict. First match wins:
///
/// 1. parse-failure marker in stderr and empty cleaned stdout: `InvalidSyntax`
/// 2. temp-file strategy: `ReadBack`
/// 3. non-empty cleaned stdout: `Formatted`
/// 4. exit code 0: `Unchanged`
/// 5. otherwise: `Failed`
///
/// A `ReadBack` is settled by [`failed_without_rewrite`] once the scratch file has
/// been read.
pub fn classify(
    output: &ProcessOutput,
    cleaned_stdout: &str,
    parse_failure_markers: &[&str],
    strategy: Strategy,
) -> Verdict {
    let stdout_empty = cleaned_stdout.trim().is_empty();
    let parse_failure = parse_failure_markers
        .iter()
        .any(|marker| output.stderr.contains(marker));

    if parse_failure && stdout_empty {
        let first_line = output.stderr.lines().next().unwrap_or_default().trim_end();
        return Verdict::InvalidSyntax(first_line.to_string());
    }

    if strategy == Strategy::TempFile {
        return Verdict::ReadBack;
    }

    if !stdout_empty {
        Verdict::Formatted(cleaned_stdout.to_string())
    } else if output.exit_code == Some(0) {
        Verdict::Unchanged
    } else if output.stderr.trim().is_empty() {
        Verdict::Failed(UNKNOWN_FAILURE.to_string())
    } else {
        Verdict::Failed(output.stderr.trim().to_string())
    }
}

/// For a temp-file run that left the scratch file identical to the input: the failure
/// message when the tool crashed instead of formatting.
///
/// A non-zero exit alone is tolerated (unfixable violations), but one that also wrote
/// to stderr is a crash. Death by signal always is.
pub fn failed_without_rewrite(output: &ProcessOutput) -> Option<String> {
    let stderr = output.stderr.trim();
    match output.exit_code {
        Some(0) => None,
        Some(_) if stderr.is_empty() => None,
        Some(_) => Some(stderr.to_string()),
        None if stderr.is_empty() => Some(UNKNOWN_FAILURE.to_string()),
        None => Some(stderr.to_string()),
    }
}
