//! Packsmith command line entry point

use clap::Parser;
use tracing_subscriber::EnvFilter;

use packsmith::cli::{Cli, Commands};
use packsmith::commands::{self, Status};
use packsmith::error::Result;

/// Log filter variable; falls back to `warn`, or `debug` with `--verbose`
const LOG_ENV: &str = "PACKSMITH_LOG";

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn dispatch(cli: Cli) -> Result<Status> {
    match cli.command {
        Commands::ZipPacks(args) => commands::zip_packs::run(cli.content_root, args),
        Commands::Prepare(args) => commands::prepare::run(cli.content_root, args),
        Commands::Classify(args) => commands::classify::run(cli.content_root, &args),
        Commands::PreserveFields(args) => commands::preserve_fields::run(&args),
        Commands::Version => commands::version::run().map(|()| Status::Success),
        Commands::Completions(args) => commands::completions::run(&args).map(|()| Status::Success),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match dispatch(cli) {
        Ok(status) => std::process::exit(status.code()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(commands::error_code(&e));
        }
    }
}
