//! CLI entry point for the reader.

use rama_reader::cli;
use tracing_subscriber::EnvFilter;

fn main() {
    // Log to stderr at WARN unless RUST_LOG says otherwise; stdout carries the outline
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
