//! Format Invoker
//!
//! Runs the formatter executable once per request and classifies its output:
//!
//! - `noise`: strips log lines interleaved into stdout
//! - `classify`: combines stdout, stderr and exit code into a [`Verdict`]
//! - `scratch`: private temp file for the in-place strategy
//! - `process`: subprocess spawning and output capture

pub mod classify;
pub mod noise;
pub mod process;
pub mod scratch;

use crate::error::{Error, Result};
use crate::events::{FormatEvents, ProcessStart};
use crate::platform::PlatformStrategy;
use crate::profile::FormatterProfile;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use classify::{classify, failed_without_rewrite, ProcessOutput, Verdict, UNKNOWN_FAILURE};
pub use noise::NoiseFilter;
pub use scratch::ScratchFile;

/// How source text reaches the formatter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// Write a scratch `<stem>.<ext>` file, format it in place, read it back
    #[default]
    TempFile,
    /// Pipe the source through stdin and take the result from stdout
    Stdin,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::TempFile => write!(f, "temp-file"),
            Strategy::Stdin => write!(f, "stdin"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "temp-file" | "tempfile" | "file" => Ok(Strategy::TempFile),
            "stdin" | "pipe" => Ok(Strategy::Stdin),
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}

/// Runs a formatter executable against source text
#[derive(Debug, Clone)]
pub struct FormatInvoker {
    platform: PlatformStrategy,
    strategy: Strategy,
    noise: NoiseFilter,
    format_args: &'static [&'static str],
    stdin_arg: &'static str,
    parse_failure_markers: &'static [&'static str],
    extensions: &'static [&'static str],
    default_extension: &'static str,
}

impl FormatInvoker {
    /// Create an invoker for a profile, using the default strategy and detected platform
    pub fn new<P: FormatterProfile>(profile: &P) -> Result<Self> {
        Ok(Self {
            platform: PlatformStrategy::detect(),
            strategy: Strategy::default(),
            noise: NoiseFilter::new(profile.banner_markers())?,
            format_args: profile.format_args(),
            stdin_arg: profile.stdin_arg(),
            parse_failure_markers: profile.parse_failure_markers(),
            extensions: profile.extensions(),
            default_extension: profile.default_extension(),
        })
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_platform(mut self, platform: PlatformStrategy) -> Self {
        self.platform = platform;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Format `source` with the executable at `executable`
    ///
    /// `file_name_hint` is the original file's name; the temp-file strategy mirrors it
    /// so extension-specific rules apply.
    pub async fn format(
        &self,
        source: &str,
        executable: &Path,
        file_name_hint: Option<&Path>,
        events: &dyn FormatEvents,
    ) -> Result<String> {
        let result = match self.strategy {
            Strategy::Stdin => self.format_via_stdin(source, executable, events).await,
            Strategy::TempFile => {
                self.format_in_place(source, executable, file_name_hint, events)
                    .await
            }
        };

        events.on_outcome(result.as_deref());
        result
    }

    async fn format_via_stdin(
        &self,
        source: &str,
        executable: &Path,
        events: &dyn FormatEvents,
    ) -> Result<String> {
        let args = self.args_with(self.stdin_arg);
        let output = self.execute(executable, &args, Some(source), events).await?;
        self.resolve(&output, source, None, events).await
    }

    async fn format_in_place(
        &self,
        source: &str,
        executable: &Path,
        file_name_hint: Option<&Path>,
        events: &dyn FormatEvents,
    ) -> Result<String> {
        let scratch = ScratchFile::create(
            source,
            file_name_hint,
            self.extensions,
            self.default_extension,
        )
        .await?;

        let args = self.args_with(&scratch.path().to_string_lossy());
        let result = match self.execute(executable, &args, None, events).await {
            Ok(output) => self.resolve(&output, source, Some(&scratch), events).await,
            Err(e) => Err(e),
        };

        scratch.cleanup().await;
        result
    }

    async fn execute(
        &self,
        executable: &Path,
        args: &[String],
        input: Option<&str>,
        events: &dyn FormatEvents,
    ) -> Result<ProcessOutput> {
        events.on_process_start(&ProcessStart {
            program: executable,
            args,
        });

        let mut cmd = self.platform.command(executable);
        cmd.args(args);

        let output = process::run(cmd, executable, input).await?;
        events.on_process_exit(&output);
        Ok(output)
    }

    async fn resolve(
        &self,
        output: &ProcessOutput,
        source: &str,
        scratch: Option<&ScratchFile>,
        events: &dyn FormatEvents,
    ) -> Result<String> {
        let cleaned = self.noise.clean(&output.stdout, events);

        match classify(output, &cleaned, self.parse_failure_markers, self.strategy) {
            Verdict::Formatted(text) => Ok(text),
            Verdict::Unchanged => Ok(source.to_string()),
            Verdict::ReadBack => {
                let file = scratch
                    .ok_or_else(|| Error::FormattingFailed(UNKNOWN_FAILURE.to_string()))?;
                let text = file.read().await?;
                if text == source {
                    if let Some(message) = failed_without_rewrite(output) {
                        return Err(Error::FormattingFailed(message));
                    }
                }
                Ok(text)
            }
            Verdict::InvalidSyntax(line) => Err(Error::InvalidSyntax(line)),
            Verdict::Failed(message) => Err(Error::FormattingFailed(message)),
        }
    }

    fn args_with(&self, last: &str) -> Vec<String> {
        self.format_args
            .iter()
            .map(|arg| arg.to_string())
            .chain(std::iter::once(last.to_string()))
            .collect()
    }
}
