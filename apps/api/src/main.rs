mod analysis;
mod config;
mod credentials;
mod errors;
mod llm_client;
mod pipeline;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::pipelines::AnalysisPipelines;
use crate::analysis::service::{AnalysisService, RunDefaults};
use crate::config::Config;
use crate::credentials::EnvCredentialProvider;
use crate::llm_client::LlmClient;
use crate::pipeline::Orchestrator;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on unparseable env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Analyzer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client. The API key is resolved per run, not here.
    let llm = Arc::new(LlmClient::new(&config.llm_api_url)?);
    info!("LLM client initialized (model: {})", config.llm_model);

    // Pipelines are wired once; a wiring mistake stops startup.
    let pipelines = Arc::new(AnalysisPipelines::build()?);
    info!("Analysis pipelines validated");

    let orchestrator = Orchestrator::new(llm, Arc::new(EnvCredentialProvider));
    let analysis = AnalysisService::new(
        orchestrator,
        pipelines,
        RunDefaults {
            mode: config.default_run_mode,
            timeout: config.stage_timeout,
            generation: config.generation_options(),
        },
    );
    info!(
        "Default run mode: {:?}, stage timeout: {:?}",
        config.default_run_mode, config.stage_timeout
    );

    // Build app state
    let state = AppState {
        analysis,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
