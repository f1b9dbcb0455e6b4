//! ktlint-fmt CLI - Kotlin formatting with an automatically provisioned ktlint

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ktlint_core::{FormatInvoker, FormatterProfile, Ktlint, Provisioner, Strategy, TracingEvents};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use std::path::{Path, PathBuf};

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory name under the platform data dir holding the cached executable
const INSTALL_DIR_NAME: &str = "ktlint-fmt";

#[derive(Parser, Debug)]
#[command(name = "ktlint-fmt")]
#[command(about = "Format Kotlin sources with an automatically downloaded ktlint")]
#[command(version)]
pub struct Args {
    /// Directory holding the cached ktlint executable
    #[arg(long = "install-dir", global = true)]
    pub install_dir: Option<PathBuf>,

    /// Log classification details (equivalent to RUST_LOG=ktlint_core=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download ktlint if it is not cached yet and print its path
    Install,
    /// Print where ktlint is cached and whether it is present (no network)
    Path,
    /// Format Kotlin files in place (or stdin to stdout)
    Format(FormatArgs),
}

#[derive(Parser, Debug)]
pub struct FormatArgs {
    /// Files to format; `-` or no file reads stdin and writes stdout
    pub files: Vec<PathBuf>,

    /// Print formatted output instead of rewriting files
    #[arg(long)]
    pub stdout: bool,

    /// How source reaches ktlint (temp-file or stdin)
    #[arg(long, default_value_t = Strategy::TempFile)]
    pub strategy: Strategy,

    /// File name used to pick rules when reading stdin
    #[arg(long = "stdin-filename")]
    pub stdin_filename: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    init_tracing(args.verbose);
    tracing::debug!("ktlint-fmt v{}", CLI_VERSION);

    let install_dir = match args.install_dir {
        Some(dir) => dir,
        None => default_install_dir()?,
    };
    let provisioner = Provisioner::from_profile(&Ktlint, &install_dir)
        .context("Invalid ktlint release configuration")?;

    match args.command {
        Command::Install => {
            let path = ensure_installed(&provisioner).await?;
            println!("{} {}", "ktlint ready:".green().bold(), path.display());
            Ok(())
        }
        Command::Path => {
            let path = provisioner.executable_path();
            let state = if provisioner.is_installed().await {
                "installed".green()
            } else {
                "not installed".yellow()
            };
            println!("{} ({})", path.display(), state);
            Ok(())
        }
        Command::Format(format_args) => {
            let path = ensure_installed(&provisioner).await?;
            run_format(&path, format_args).await
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "ktlint_core=debug"
    } else {
        "ktlint_core=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                default
                    .parse()
                    .unwrap_or_else(|_| tracing::Level::INFO.into()),
            ),
        )
        .init();
}

fn default_install_dir() -> Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(dirs::cache_dir)
        .context("Could not determine a data directory; pass --install-dir")?;
    Ok(base.join(INSTALL_DIR_NAME))
}

/// Ensure ktlint is present, drawing download progress on stderr
async fn ensure_installed(provisioner: &Provisioner) -> Result<PathBuf> {
    if provisioner.is_installed().await {
        return Ok(provisioner.executable_path());
    }

    let release = provisioner.release();
    let label = format!(
        "Downloading {} {}",
        Ktlint.display_name(),
        release.version()
    );
    let progress = output::ProgressLine::new(label);
    let result = provisioner
        .ensure_executable(|p| progress.update(p.display_percent()))
        .await;
    progress.finish(result.is_ok());

    result.with_context(|| {
        format!(
            "Failed to initialize {} from {}",
            Ktlint.display_name(),
            release.asset_url()
        )
    })
}

async fn run_format(executable: &Path, args: FormatArgs) -> Result<()> {
    let invoker = FormatInvoker::new(&Ktlint)?.with_strategy(args.strategy);

    let reads_stdin = args.files.is_empty() || args.files.iter().any(|f| f == Path::new("-"));
    if reads_stdin {
        if args.files.len() > 1 {
            anyhow::bail!("`-` cannot be combined with other files");
        }
        return format_stdin(&invoker, executable, args.stdin_filename.as_deref()).await;
    }

    let mut failed = 0;
    for file in &args.files {
        match format_file(&invoker, executable, file, args.stdout).await {
            Ok(changed) => output::status_ok(file, changed),
            Err(e) => {
                output::status_failed(file, &e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) failed to format", failed, args.files.len());
    }
    Ok(())
}

async fn format_stdin(
    invoker: &FormatInvoker,
    executable: &Path,
    file_name: Option<&Path>,
) -> Result<()> {
    let mut source = String::new();
    tokio::io::stdin()
        .read_to_string(&mut source)
        .await
        .context("Failed to read stdin")?;

    let formatted = invoker
        .format(&source, executable, file_name, &TracingEvents)
        .await?;

    write_stdout(&formatted).await
}

async fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(text.as_bytes())
        .await
        .context("Failed to write stdout")?;
    stdout.flush().await.context("Failed to flush stdout")?;
    Ok(())
}

/// Format one file; returns whether its content changed
async fn format_file(
    invoker: &FormatInvoker,
    executable: &Path,
    file: &Path,
    to_stdout: bool,
) -> Result<bool> {
    let source = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let formatted = invoker
        .format(&source, executable, Some(file), &TracingEvents)
        .await?;

    if to_stdout {
        write_stdout(&formatted).await?;
        return Ok(formatted != source);
    }

    if formatted == source {
        return Ok(false);
    }

    tokio::fs::write(file, &formatted)
        .await
        .with_context(|| format!("Failed to write {}", file.display()))?;
    Ok(true)
}
