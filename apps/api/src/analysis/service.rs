//! Analysis service — the invocation surface over the pipelines.
//!
//! Flow: validate request → seed context → pick failure policy → orchestrator.run →
//!       collapse outcome → typed artifacts + warnings.
//!
//! Independent pipelines (full analysis, industry optimization) share no context
//! and run concurrently for the combined report.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::analysis::artifacts::{from_validated, ResumeAnalysis, ResumeContent};
use crate::analysis::pipelines::{
    default_fallbacks, AnalysisPipelines, ATS_ANALYSIS, CONTENT_ANALYSIS, IMPROVEMENTS, INDUSTRY,
    INDUSTRY_OPTIMIZATION, JOB_DESCRIPTION, NO_JOB_DESCRIPTION, RESUME_CONTENT, RESUME_TEXT,
    TARGET_ROLE,
};
use crate::errors::AppError;
use crate::llm_client::GenerationOptions;
use crate::pipeline::cancel::{cancel_pair, CancelSignal};
use crate::pipeline::orchestrator::{StageRecord, StageWarning};
use crate::pipeline::{Orchestrator, Pipeline, PipelineContext, RunOptions, RunReport};

// ────────────────────────────────────────────────────────────────────────────
// Request / response models
// ────────────────────────────────────────────────────────────────────────────

/// Caller-chosen failure policy for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    Strict,
    BestEffort,
}

#[derive(Debug, Error)]
#[error("unknown run mode '{0}' (expected 'strict' or 'best_effort')")]
pub struct ParseRunModeError(String);

impl FromStr for RunMode {
    type Err = ParseRunModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "strict" => Ok(RunMode::Strict),
            "best_effort" => Ok(RunMode::BestEffort),
            _ => Err(ParseRunModeError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub resume_text: String,
    pub target_role: String,
    pub industry: String,
    pub job_description: Option<String>,
    pub mode: Option<RunMode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndustryRequest {
    pub resume_text: String,
    pub industry: String,
    pub mode: Option<RunMode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentRequest {
    pub resume_text: String,
    pub target_role: String,
    pub mode: Option<RunMode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub run_id: Uuid,
    pub content_analysis: Value,
    pub improvements: Value,
    pub ats_optimization: ResumeAnalysis,
    pub warnings: Vec<StageWarning>,
    pub stages: Vec<StageRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndustryResponse {
    pub run_id: Uuid,
    pub industry_optimization: Value,
    pub warnings: Vec<StageWarning>,
    pub stages: Vec<StageRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentResponse {
    pub run_id: Uuid,
    pub content: ResumeContent,
    pub warnings: Vec<StageWarning>,
    pub stages: Vec<StageRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub analysis: AnalysisResponse,
    pub industry: IndustryResponse,
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

/// Run-level defaults applied to every request.
#[derive(Debug, Clone)]
pub struct RunDefaults {
    pub mode: RunMode,
    pub timeout: Duration,
    pub generation: GenerationOptions,
}

#[derive(Clone)]
pub struct AnalysisService {
    orchestrator: Orchestrator,
    pipelines: Arc<AnalysisPipelines>,
    defaults: RunDefaults,
}

impl AnalysisService {
    pub fn new(orchestrator: Orchestrator, pipelines: Arc<AnalysisPipelines>, defaults: RunDefaults) -> Self {
        Self {
            orchestrator,
            pipelines,
            defaults,
        }
    }

    fn run_options(&self, mode: Option<RunMode>, cancel: Option<CancelSignal>) -> RunOptions {
        let options = match mode.unwrap_or(self.defaults.mode) {
            RunMode::Strict => RunOptions::strict(),
            RunMode::BestEffort => RunOptions::best_effort(default_fallbacks()),
        };
        let options = options
            .with_timeout(self.defaults.timeout)
            .with_generation(self.defaults.generation.clone());
        match cancel {
            Some(signal) => options.with_cancel(signal),
            None => options,
        }
    }

    async fn run(
        &self,
        pipeline: &Pipeline,
        seeds: PipelineContext,
        mode: Option<RunMode>,
        cancel: Option<CancelSignal>,
    ) -> Result<RunReport, AppError> {
        let report = self
            .orchestrator
            .run(pipeline, seeds, &self.run_options(mode, cancel))
            .await?
            .into_result()?;
        if !report.warnings.is_empty() {
            info!(
                "Run {} of '{}' degraded in {} stage(s)",
                report.run_id,
                report.pipeline,
                report.warnings.len()
            );
        }
        Ok(report)
    }

    /// Content analysis → improvement recommendations → ATS optimization.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse, AppError> {
        self.analyze_with(request, None).await
    }

    async fn analyze_with(
        &self,
        request: AnalysisRequest,
        cancel: Option<CancelSignal>,
    ) -> Result<AnalysisResponse, AppError> {
        require_text("resume_text", &request.resume_text)?;
        require_text("target_role", &request.target_role)?;
        require_text("industry", &request.industry)?;

        let job_description = request
            .job_description
            .filter(|jd| !jd.trim().is_empty())
            .unwrap_or_else(|| NO_JOB_DESCRIPTION.to_string());

        let seeds = PipelineContext::new()
            .with(RESUME_TEXT, request.resume_text)
            .and_then(|c| c.with(TARGET_ROLE, request.target_role))
            .and_then(|c| c.with(INDUSTRY, request.industry))
            .and_then(|c| c.with(JOB_DESCRIPTION, job_description))
            .map_err(|e| AppError::Internal(e.into()))?;

        let report = self
            .run(&self.pipelines.full_analysis, seeds, request.mode, cancel)
            .await?;

        let content_analysis = output(&report, CONTENT_ANALYSIS)?;
        let improvements = output(&report, IMPROVEMENTS)?;
        let ats_optimization = from_validated(ATS_ANALYSIS, output(&report, ATS_ANALYSIS)?)?;

        Ok(AnalysisResponse {
            run_id: report.run_id,
            content_analysis,
            improvements,
            ats_optimization,
            warnings: report.warnings,
            stages: report.stages,
        })
    }

    pub async fn optimize_for_industry(
        &self,
        request: IndustryRequest,
    ) -> Result<IndustryResponse, AppError> {
        self.optimize_for_industry_with(request, None).await
    }

    async fn optimize_for_industry_with(
        &self,
        request: IndustryRequest,
        cancel: Option<CancelSignal>,
    ) -> Result<IndustryResponse, AppError> {
        require_text("resume_text", &request.resume_text)?;
        require_text("industry", &request.industry)?;

        let seeds = PipelineContext::new()
            .with(RESUME_TEXT, request.resume_text)
            .and_then(|c| c.with(INDUSTRY, request.industry))
            .map_err(|e| AppError::Internal(e.into()))?;

        let report = self
            .run(&self.pipelines.industry_optimization, seeds, request.mode, cancel)
            .await?;

        let industry_optimization = output(&report, INDUSTRY_OPTIMIZATION)?;

        Ok(IndustryResponse {
            run_id: report.run_id,
            industry_optimization,
            warnings: report.warnings,
            stages: report.stages,
        })
    }

    pub async fn generate_content(&self, request: ContentRequest) -> Result<ContentResponse, AppError> {
        require_text("resume_text", &request.resume_text)?;
        require_text("target_role", &request.target_role)?;

        let seeds = PipelineContext::new()
            .with(RESUME_TEXT, request.resume_text)
            .and_then(|c| c.with(TARGET_ROLE, request.target_role))
            .map_err(|e| AppError::Internal(e.into()))?;

        let report = self
            .run(&self.pipelines.content_generation, seeds, request.mode, None)
            .await?;

        let value = output(&report, RESUME_CONTENT)?;

        Ok(ContentResponse {
            run_id: report.run_id,
            content: from_validated(RESUME_CONTENT, value)?,
            warnings: report.warnings,
            stages: report.stages,
        })
    }

    /// Full analysis and industry optimization, run concurrently.
    ///
    /// The first pipeline to fail cancels the other at its next stage boundary;
    /// the response reports the failure, not the cancellation it caused.
    pub async fn report(&self, request: AnalysisRequest) -> Result<ReportResponse, AppError> {
        let industry_request = IndustryRequest {
            resume_text: request.resume_text.clone(),
            industry: request.industry.clone(),
            mode: request.mode,
        };

        let (handle, signal) = cancel_pair();

        let (analysis, industry) = tokio::join!(
            async {
                let result = self.analyze_with(request, Some(signal.clone())).await;
                if result.is_err() {
                    handle.cancel();
                }
                result
            },
            async {
                let result = self
                    .optimize_for_industry_with(industry_request, Some(signal.clone()))
                    .await;
                if result.is_err() {
                    handle.cancel();
                }
                result
            }
        );

        match (analysis, industry) {
            (Ok(analysis), Ok(industry)) => Ok(ReportResponse { analysis, industry }),
            (Err(AppError::Cancelled(_)), Err(err)) | (Err(err), _) | (_, Err(err)) => Err(err),
        }
    }
}

fn output(report: &RunReport, key: &str) -> Result<Value, AppError> {
    report
        .context
        .require(key)
        .cloned()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("completed run is missing output: {e}")))
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}
