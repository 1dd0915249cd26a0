use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use gitter::config::{Overrides, Settings, MAX_WIDTH, MIN_WIDTH};

#[derive(Parser)]
#[command(
    name = "gitter",
    about = "Monitor git server stability by cloning a repository on a fixed cadence",
    version,
    long_about = None
)]
struct Cli {
    /// TOML settings file supplying defaults for the flags below
    #[arg(long, global = true, env = "GITTER_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write diagnostic traces to this file (filtered by RUST_LOG)
    #[arg(long, global = true, value_name = "PATH")]
    trace_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone a repository repeatedly and show live results
    Clone {
        /// Repository URL (required unless --demo)
        url: Option<String>,

        /// Simulate clones instead of running git
        #[arg(short, long)]
        demo: bool,

        /// File receiving one line per failure [default: gitter.log]
        #[arg(long, value_name = "PATH")]
        log_file: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Show the dashboard with simulated clones
    Demo {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Print version information
    Version,
}

#[derive(Args)]
struct RunArgs {
    /// Time between clone attempts [default: 2s]
    #[arg(short, long, value_parser = humantime::parse_duration)]
    interval: Option<Duration>,

    /// Deadline for each clone attempt [default: 10s]
    #[arg(short, long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    #[arg(
        short,
        long,
        help = format!("Dashboard width in columns, {MIN_WIDTH}-{MAX_WIDTH} [default: 100]")
    )]
    width: Option<u16>,

    /// Number of recent errors to display [default: 5]
    #[arg(short, long)]
    error_history: Option<usize>,
}

impl RunArgs {
    fn into_overrides(
        self,
        target: Option<String>,
        demo: bool,
        log_file: Option<PathBuf>,
    ) -> Overrides {
        Overrides {
            target,
            demo,
            interval: self.interval,
            timeout: self.timeout,
            width: self.width,
            error_history: self.error_history,
            log_file,
        }
    }
}

/// Route traces to `trace_file`, or drop them; the dashboard owns the terminal.
fn init_tracing(trace_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match trace_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create trace file: {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .init();
            Ok(None)
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let overrides = match cli.command {
        Commands::Version => {
            println!("gitter {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::Clone {
            url,
            demo,
            log_file,
            run,
        } => run.into_overrides(url, demo, log_file),
        Commands::Demo { run } => run.into_overrides(None, true, None),
    };

    let settings = Settings::load_or_default(cli.config.as_deref())?;
    let config = settings.resolve(overrides)?;

    tracing::info!(mode = %config.mode, target = %config.target, "Starting gitter");
    let summary = gitter::run(config).await?;
    println!("{}", summary);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _trace_guard = match init_tracing(cli.trace_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
