//! Pipeline Orchestrator — runs a pipeline's stages strictly in order.
//!
//! Flow per run: fetch credential (fail fast) → check seeds → for each stage:
//! cancellation checkpoint → execute → merge output (or apply failure policy).
//!
//! Each run owns its context. `Pipeline`, `Stage` and the injected capabilities are
//! shared read-only, so independent runs may execute concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::credentials::{CredentialProvider, LLM_API_KEY, LLM_SERVICE};
use crate::llm_client::{GenerationOptions, TextGenerator};
use crate::pipeline::builder::Pipeline;
use crate::pipeline::cancel::CancelSignal;
use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::{FailureKind, PipelineError, StageFailure};
use crate::pipeline::extract::ExtractionTier;
use crate::pipeline::stage::StageEnv;

pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(90);

// ────────────────────────────────────────────────────────────────────────────
// Run configuration
// ────────────────────────────────────────────────────────────────────────────

/// What to do when a stage fails. Chosen per run, not per stage.
#[derive(Debug, Clone, Default)]
pub enum FailurePolicy {
    /// Abort on the first failure.
    #[default]
    Strict,
    /// Substitute the fallback for the stage's output key, warn, continue.
    /// A failing stage with no fallback entry aborts as in strict mode.
    BestEffort { fallbacks: HashMap<String, Value> },
}

impl FailurePolicy {
    pub fn label(&self) -> &'static str {
        match self {
            FailurePolicy::Strict => "strict",
            FailurePolicy::BestEffort { .. } => "best_effort",
        }
    }

    fn fallback_for(&self, output_key: &str) -> Option<&Value> {
        match self {
            FailurePolicy::Strict => None,
            FailurePolicy::BestEffort { fallbacks } => fallbacks.get(output_key),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub policy: FailurePolicy,
    /// Upper bound for each generation call.
    pub timeout: Duration,
    pub generation: GenerationOptions,
    pub cancel: Option<CancelSignal>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::Strict,
            timeout: DEFAULT_STAGE_TIMEOUT,
            generation: GenerationOptions::default(),
            cancel: None,
        }
    }
}

impl RunOptions {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn best_effort(fallbacks: HashMap<String, Value>) -> Self {
        Self {
            policy: FailurePolicy::BestEffort { fallbacks },
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_generation(mut self, generation: GenerationOptions) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Run results
// ────────────────────────────────────────────────────────────────────────────

/// Non-fatal notice that a stage degraded to its fallback value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageWarning {
    pub stage: String,
    pub output_key: String,
    pub kind: FailureKind,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded { tier: ExtractionTier },
    Degraded { kind: FailureKind },
}

#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: String,
    #[serde(flatten)]
    pub status: StageStatus,
    pub elapsed_ms: u64,
}

/// Everything a run produced, whatever its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub pipeline: String,
    pub context: PipelineContext,
    pub warnings: Vec<StageWarning>,
    pub stages: Vec<StageRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunReport),
    /// First strict-mode failure. The report holds the partial context.
    Failed { failure: StageFailure, report: RunReport },
    /// Stopped at a stage boundary.
    Cancelled { next_stage: String, report: RunReport },
}

impl RunOutcome {
    /// Collapses to a single summarizing error for callers that only need one.
    pub fn into_result(self) -> Result<RunReport, PipelineError> {
        match self {
            RunOutcome::Completed(report) => Ok(report),
            RunOutcome::Failed { failure, report } => Err(PipelineError::StageFailed {
                failure,
                report: Box::new(report),
            }),
            RunOutcome::Cancelled { next_stage, report } => Err(PipelineError::Cancelled {
                next_stage,
                report: Box::new(report),
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

/// Runs pipelines against injected generation and credential capabilities.
#[derive(Clone)]
pub struct Orchestrator {
    generator: Arc<dyn TextGenerator>,
    credentials: Arc<dyn CredentialProvider>,
}

impl Orchestrator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            generator,
            credentials,
        }
    }

    /// Runs `pipeline` with `seeds`.
    ///
    /// `Err` is reserved for problems that stop the run before any stage executes
    /// (missing credential, missing or undeclared seed). Stage failures and cancellation come
    /// back as `RunOutcome` variants carrying the partial report.
    pub async fn run(
        &self,
        pipeline: &Pipeline,
        seeds: PipelineContext,
        options: &RunOptions,
    ) -> Result<RunOutcome, PipelineError> {
        let credential = self
            .credentials
            .get_credential(LLM_SERVICE, LLM_API_KEY)
            .ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "no credential configured for {LLM_SERVICE}/{LLM_API_KEY}"
                ))
            })?;

        if let Some(key) = pipeline.seed_keys().iter().find(|k| !seeds.contains(k)) {
            return Err(PipelineError::MissingSeed {
                pipeline: pipeline.name().to_string(),
                key: key.clone(),
            });
        }

        // Stage outputs may never overwrite caller input.
        if let Some(key) = seeds.keys().find(|k| !pipeline.seed_keys().contains(*k)) {
            return Err(PipelineError::UndeclaredSeed {
                pipeline: pipeline.name().to_string(),
                key: key.to_string(),
            });
        }

        let run_id = Uuid::new_v4();
        let span = info_span!(
            "pipeline_run",
            pipeline = %pipeline.name(),
            run_id = %run_id,
            mode = options.policy.label()
        );

        let env = StageEnv {
            generator: self.generator.as_ref(),
            credential: &credential,
            options: &options.generation,
            timeout: options.timeout,
        };

        run_stages(pipeline, seeds, options, &env, run_id)
            .instrument(span)
            .await
    }
}

async fn run_stages(
    pipeline: &Pipeline,
    mut context: PipelineContext,
    options: &RunOptions,
    env: &StageEnv<'_>,
    run_id: Uuid,
) -> Result<RunOutcome, PipelineError> {
    let started_at = Utc::now();
    let mut warnings = Vec::new();
    let mut records = Vec::with_capacity(pipeline.stages().len());

    info!(
        outputs = ?pipeline.output_keys().collect::<Vec<_>>(),
        "Starting pipeline with {} stages and {} seed(s)",
        pipeline.stages().len(),
        context.len()
    );

    let report = |context: PipelineContext,
                  warnings: Vec<StageWarning>,
                  stages: Vec<StageRecord>| RunReport {
        run_id,
        pipeline: pipeline.name().to_string(),
        context,
        warnings,
        stages,
        started_at,
        finished_at: Utc::now(),
    };

    for stage in pipeline.stages() {
        if options.cancel.as_ref().is_some_and(CancelSignal::is_cancelled) {
            warn!("Run cancelled before stage '{}'", stage.name());
            return Ok(RunOutcome::Cancelled {
                next_stage: stage.name().to_string(),
                report: report(context, warnings, records),
            });
        }

        let started = Instant::now();
        let result = stage
            .execute(&context, env)
            .instrument(info_span!("stage", stage = %stage.name()))
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(success) => {
                info!(
                    "Stage '{}' succeeded in {}ms via {:?}",
                    stage.name(),
                    elapsed_ms,
                    success.tier
                );
                context.insert(stage.output_key(), success.value)?;
                records.push(StageRecord {
                    stage: stage.name().to_string(),
                    status: StageStatus::Succeeded { tier: success.tier },
                    elapsed_ms,
                });
            }
            Err(failure) => {
                let fallback = failure
                    .kind
                    .is_recoverable()
                    .then(|| options.policy.fallback_for(stage.output_key()))
                    .flatten();

                let Some(fallback) = fallback else {
                    error!("Pipeline aborted: {failure}");
                    return Ok(RunOutcome::Failed {
                        failure,
                        report: report(context, warnings, records),
                    });
                };

                warn!("Stage degraded to fallback: {failure}");
                context.insert(stage.output_key(), fallback.clone())?;
                warnings.push(StageWarning {
                    stage: failure.stage,
                    output_key: stage.output_key().to_string(),
                    kind: failure.kind,
                    reason: failure.reason,
                });
                records.push(StageRecord {
                    stage: stage.name().to_string(),
                    status: StageStatus::Degraded { kind: failure.kind },
                    elapsed_ms,
                });
            }
        }
    }

    info!("Pipeline completed with {} warning(s)", warnings.len());
    Ok(RunOutcome::Completed(report(context, warnings, records)))
}
