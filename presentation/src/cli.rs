use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use application::rag_service::{RagService, RagSettings};
use clap::Parser;
use infrastructure::config::Config;
use infrastructure::embedder::OllamaEmbedder;
use infrastructure::ollama_client::OllamaClient;
use infrastructure::open_vector_index;
use shared::telemetry::init_tracing;
use shared::types::Result;
use tracing::{info, warn};

use crate::routes;
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "rag_relay")]
#[command(about = "Retrieval-augmented chat relay in front of a local Ollama model")]
pub struct Cli {
    /// Address to listen on (overrides RAG_BIND)
    #[arg(long)]
    pub bind: Option<String>,

    /// Tracing filter, e.g. "info" or "debug,hyper=warn" (overrides RAG_LOG)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Read settings from this env file instead of ./.env
    #[arg(long)]
    pub env_file: Option<PathBuf>,
}

pub struct CliApp;

impl CliApp {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&mut self, cli: Cli) -> Result<()> {
        let mut config = match &cli.env_file {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(bind) = cli.bind {
            config.bind_address = bind;
        }
        if let Some(level) = cli.log_level {
            config.log_level = level;
        }
        config.log_json |= cli.log_json;

        init_tracing(&config.log_level, config.log_json);
        for warning in &config.warnings {
            warn!("{warning}");
        }
        info!(version = env!("CARGO_PKG_VERSION"), "rag_relay starting");

        let state = build_state(&config)?;
        serve(state, &config.bind_address).await
    }
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates the long-lived service handles shared by all requests.
pub fn build_state(config: &Config) -> Result<AppState> {
    let system_prompt = config.system_prompt()?;
    let client = OllamaClient::from_config(config);
    let embedder = Arc::new(OllamaEmbedder::new(client.clone()));
    let index = open_vector_index(config)?;

    info!(
        ollama = %config.ollama_base_url,
        model = %client.model(),
        embedding_model = %config.embedding_model,
        backend = %config.vector_backend,
        collection = %config.collection_name,
        top_k = config.top_k,
        "services configured"
    );
    if !config.documents_dir.is_dir() {
        warn!(
            path = %config.documents_dir.display(),
            "source document directory not found; the index is populated elsewhere"
        );
    }

    let settings = RagSettings {
        collection: config.collection_name.clone(),
        top_k: config.top_k,
        system_prompt,
    };
    Ok(AppState::new(RagService::new(
        embedder,
        index,
        Arc::new(client),
        settings,
    )))
}

async fn serve(state: AppState, bind_address: &str) -> Result<()> {
    let app = routes::build(state);
    let addr: SocketAddr = bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("rag_relay stopped");
    Ok(())
}

/// Resolves on SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
