use serde::Serialize;
use thiserror::Error;

use crate::pipeline::orchestrator::RunReport;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    #[error("Context key '{0}' was already written in this run")]
    DuplicateKey(String),

    #[error("Context key '{0}' was never declared")]
    UndeclaredKey(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("Template placeholder '{{{0}}}' has no value in the context")]
    MissingVariable(String),
}

/// Static wiring problems, detected while a pipeline is assembled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WiringError {
    #[error("Pipeline '{pipeline}' has no stages")]
    Empty { pipeline: String },

    #[error("Stage '{stage}' needs '{key}', which is neither a seed nor produced by an earlier stage")]
    UnsatisfiedInput { stage: String, key: String },

    #[error("Stage '{stage}' writes '{key}', which is already a seed or an earlier stage's output")]
    DuplicateOutput { stage: String, key: String },

    #[error("Stage name '{0}' is used more than once")]
    DuplicateStageName(String),
}

/// Which step of a stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Unresolved placeholder. Always fatal.
    Template,
    /// Adapter failure, including timeouts.
    Provider,
    /// The generator rejected the credential. Always fatal.
    Configuration,
    /// No parseable JSON in the generator output.
    Extraction,
    /// Parsed JSON does not satisfy the stage's contract.
    Validation,
}

impl FailureKind {
    /// Whether best-effort mode may substitute a fallback for this failure.
    pub fn is_recoverable(self) -> bool {
        !matches!(self, FailureKind::Template | FailureKind::Configuration)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::Template => "template error",
            FailureKind::Provider => "provider error",
            FailureKind::Configuration => "configuration error",
            FailureKind::Extraction => "extraction error",
            FailureKind::Validation => "validation error",
        };
        f.write_str(name)
    }
}

/// Full diagnostic for a failed stage. `raw_output` is never truncated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFailure {
    pub stage: String,
    pub kind: FailureKind,
    pub reason: String,
    pub raw_output: Option<String>,
}

impl StageFailure {
    pub fn new(stage: &str, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            stage: stage.to_string(),
            kind,
            reason: reason.into(),
            raw_output: None,
        }
    }

    pub fn with_raw(mut self, raw: String) -> Self {
        self.raw_output = Some(raw);
        self
    }
}

impl std::fmt::Display for StageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stage '{}' failed ({}): {}", self.stage, self.kind, self.reason)
    }
}

/// Fatal run errors.
///
/// `Configuration`, `MissingSeed`, `UndeclaredSeed` and `Context` happen before or outside stage
/// execution. `StageFailed` and `Cancelled` only come from
/// `RunOutcome::into_result`, and keep the partial report for diagnostics.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Pipeline '{pipeline}' requires seed input '{key}'")]
    MissingSeed { pipeline: String, key: String },

    #[error("Pipeline '{pipeline}' does not declare seed input '{key}'")]
    UndeclaredSeed { pipeline: String, key: String },

    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error("Pipeline failed: {failure}")]
    StageFailed {
        failure: StageFailure,
        report: Box<RunReport>,
    },

    #[error("Pipeline cancelled before stage '{next_stage}'")]
    Cancelled {
        next_stage: String,
        report: Box<RunReport>,
    },
}
