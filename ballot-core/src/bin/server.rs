//! Ballot engine server binary

use anyhow::Result;
use ballot_core::{Config, Engine};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting BallotCore server");

    // Load configuration: file path as the first argument, otherwise
    // environment overrides on the defaults.
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    let engine = Engine::open(config).await?;

    let stats = engine.stats()?;
    tracing::info!(
        voters = stats.voters,
        elections = stats.elections,
        votes_cast = stats.votes_cast,
        "Engine opened"
    );

    // Transports mount on the engine in-process; the binary holds the
    // store open until interrupted.
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down ballot server");
    engine.shutdown().await;

    Ok(())
}
