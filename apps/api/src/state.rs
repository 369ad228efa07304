use crate::analysis::service::AnalysisService;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pipelines, orchestrator and run defaults. Cheap to clone (Arc-backed).
    pub analysis: AnalysisService,
    pub config: Config,
}
