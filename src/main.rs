use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use localpm::cli::{self, Commands};

const LOG_FILE: &str = "localpm.log";

#[derive(Parser)]
#[command(name = "localpm")]
#[command(about = "A local package manager for native libraries", long_about = None)]
struct Cli {
    /// Store root (defaults to ~/.local/localpm)
    #[arg(long, global = true, env = "LOCALPM_ROOT")]
    root: Option<PathBuf>,

    /// Log debug output
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn init_logging(root: &Path, verbose: bool) -> anyhow::Result<()> {
    let directive = if verbose { "localpm=debug" } else { "localpm=info" };
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    // only once `init` has created the logs directory
    let logs = root.join("logs");
    let file = if logs.is_dir() {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(logs.join(LOG_FILE))
            .ok()
    } else {
        None
    };
    let file_layer = file.map(|f| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(f))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file_layer)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let root = args.root.unwrap_or_else(cli::default_root);

    init_logging(&root, args.verbose)?;

    cli::run(&root, args.command)
}
