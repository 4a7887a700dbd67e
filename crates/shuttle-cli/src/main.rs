//! ollama-shuttle - copy, move and delete models between local Ollama registries.
//!
//! Blobs shared with models that stay behind are never deleted.

mod commands;
mod progress;
mod prompt;

use clap::Parser;
use shuttle_core::config::ManagedInstallConfig;
use shuttle_core::{Action, ShuttleError};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ollama-shuttle", version)]
#[command(about = "Copy, move and delete models between local Ollama registries")]
struct Args {
    /// Source registry (the directory holding blobs/ and manifests/)
    #[arg(long = "from", default_value = ManagedInstallConfig::MODELS_DIR)]
    from: PathBuf,

    /// Destination registry
    #[arg(long, default_value = ManagedInstallConfig::MODELS_DIR)]
    to: PathBuf,

    /// Action to perform: copy, delete or move
    #[arg(long, default_value = "copy")]
    action: Action,

    /// Process every model in the source registry
    #[arg(long)]
    all: bool,

    /// Models to process; names without a tag get ":latest"
    #[arg(long, num_args = 1..)]
    models: Vec<String>,

    /// Replace destination files even when their size already matches
    #[arg(long)]
    always_replace: bool,

    /// List the models in the source registry and exit
    #[arg(long)]
    show: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn into_options(self) -> commands::Options {
        commands::Options {
            from: self.from,
            to: self.to,
            action: self.action,
            all: self.all,
            models: self.models,
            always_replace: self.always_replace,
            show: self.show,
        }
    }
}

fn init_logging(debug: bool) {
    // RUST_LOG wins over --debug.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    let options = args.into_options();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout().lock();

    match commands::run(&options, &mut input, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            let code = e
                .downcast_ref::<ShuttleError>()
                .map(ShuttleError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
