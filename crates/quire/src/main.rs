//! Quire CLI binary.

use anyhow::Result;
use quire::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the quire CLI.
///
/// Uses tokio's current_thread runtime: the process stays single-threaded
/// and every file operation is awaited in turn.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // RUST_LOG wins when set, e.g. RUST_LOG=quire_record=trace
    let default_filter = if cli.verbose {
        "quire=debug,quire_record=debug"
    } else {
        "quire=info,quire_record=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting quire CLI");

    cli.execute().await?;

    tracing::debug!("Quire CLI completed successfully");
    Ok(())
}
