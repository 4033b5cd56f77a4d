//! BonkBuddy command line.
//!
//! Detects builds from screenshots and turns them into shareable tokens.

use clap::Parser;

mod app;
mod cli;
mod config;
mod layout;
mod util;

fn main() -> anyhow::Result<()> {
    // Structured logging. Use `RUST_LOG=info` etc.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    app::run(cli::Cli::parse())
}
