//! vowarc-server: JSON endpoints for the VowArc app.
//!
//! Loads `config.toml`, opens the SQLite database, and serves the analysis
//! and phase-transition endpoints over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use vowarc_core::{Config, Database, OpenAiClient, VowArc};
use vowarc_server::create_router;

#[derive(Parser)]
#[command(name = "vowarc-server")]
#[command(about = "HTTP endpoints for the VowArc commitment coach")]
struct Cli {
    /// Path to configuration file (defaults to ~/.config/vowarc/config.toml)
    #[arg(short, long, env = "VOWARC_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config file)
    #[arg(short, long, env = "VOWARC_BIND")]
    bind: Option<String>,

    /// SQLite database path (overrides config file)
    #[arg(short, long, env = "VOWARC_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vowarc=info".parse()?)
                .add_directive("vowarc_core=info".parse()?)
                .add_directive("vowarc_server=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            info!("Config file: {}", path.display());
            Config::load_from(path)?
        }
        None => Config::load()?,
    };

    // Apply CLI overrides
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    let db_path = match cli.database {
        Some(path) => path,
        None => config.database_path()?,
    };

    info!("Database: {}", db_path.display());
    let database = Database::open_at(&db_path)?;

    let ai = OpenAiClient::new(config.ai.clone())?;
    if !ai.has_credentials() {
        tracing::warn!(
            env_var = %config.ai.api_key_env,
            "AI API key not set; analysis endpoints will fail"
        );
    }

    let bind_address = config.server.bind_address.clone();
    let state = VowArc::new(Arc::new(database), Arc::new(ai), config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on http://{}", bind_address);
    axum::serve(listener, app).await?;

    Ok(())
}
