use clap::Parser;
use retrosort::cli::{Args, run_cli};
use retrosort::output::OutputFormatter;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "retrosort=debug"
    } else {
        "retrosort=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    println!("Welcome to retrosort - retro game archives, sorted by genre!");

    // Per-archive errors are already in the report; only pre-flight failures are fatal
    if let Err(e) = run_cli(&args) {
        OutputFormatter::error(&format!("Error: {}", e));
        std::process::exit(1);
    }
}
