//! Chess Coach Server
//!
//! Serves engine analysis and move commentary over HTTP.

use anyhow::Context;
use clap::Parser;
use coach_server::commentary::{CommentaryGenerator, DisabledGenerator, OpenAiClient, TextGenerator};
use coach_server::config::ServerConfig;
use coach_server::{router, AppState};
use engine_session::Analyzer;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "coach-server", about = "Chess position analysis and commentary over HTTP")]
struct Args {
    /// Configuration file (defaults to ./coach.toml when present).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Port to listen on, overriding config and environment.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }

    let engine_config = config.engine_config()?;
    tracing::info!(
        engine = %engine_config.path.display(),
        depth = engine_config.depth,
        handshake = engine_config.handshake.as_str(),
        timeout_secs = config.engine.timeout_secs,
        max_concurrent = config.engine.max_concurrent.map(|n| n as u64),
        "Engine configured"
    );

    let client: Arc<dyn TextGenerator> = match &config.commentary.api_key {
        Some(key) => Arc::new(
            OpenAiClient::new(
                key.clone(),
                &config.commentary.base_url,
                config.commentary.model.clone(),
                Duration::from_secs(config.commentary.timeout_secs),
            )
            .context("Failed to build text-generation client")?,
        ),
        None => {
            tracing::warn!("OPENAI_API_KEY not set, explanations will use the fallback text");
            Arc::new(DisabledGenerator)
        }
    };

    let state = AppState {
        analyzer: Arc::new(Analyzer::new(engine_config)),
        commentary: Arc::new(CommentaryGenerator::new(client)),
    };
    let app = router(state);

    let addr = SocketAddr::new(config.bind, config.port);
    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
