//! Runs a Mafia game server.
//!
//! ```text
//! mafia-server --bind 0.0.0.0 --port 8080 --config game.json
//! ```
//!
//! Log verbosity follows `RUST_LOG` and defaults to `info`.

use std::path::PathBuf;

use clap::Parser;
use mafia::prelude::*;
use tracing_subscriber::EnvFilter;

/// Multiplayer Mafia game server over WebSockets
#[derive(Parser, Debug)]
#[command(name = "mafia-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// JSON file with game settings; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let game_config = match &cli.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => GameConfig::default(),
    };
    tracing::info!(?game_config, "loaded game settings");

    let server = MafiaServer::builder()
        .bind(&format!("{}:{}", cli.bind, cli.port))
        .game_config(game_config)
        .build()
        .await?;
    server.run().await?;
    Ok(())
}
