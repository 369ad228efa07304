use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::pipeline::{FailureKind, PipelineError, RunReport, StageFailure};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid credential / pipeline wiring. Retrying will not help.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A stage failure that aborted the run. Carries the full diagnostic and the
    /// partial run report.
    #[error("Pipeline stage failed: {failure}")]
    StageFailed {
        failure: StageFailure,
        report: Box<RunReport>,
    },

    #[error("Run cancelled before stage '{0}'")]
    Cancelled(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Configuration(msg) => AppError::Configuration(msg),
            PipelineError::MissingSeed { pipeline, key } => AppError::Configuration(format!(
                "pipeline '{pipeline}' requires seed input '{key}'"
            )),
            PipelineError::UndeclaredSeed { pipeline, key } => AppError::Configuration(format!(
                "pipeline '{pipeline}' does not accept seed input '{key}'"
            )),
            PipelineError::StageFailed { failure, .. } if failure.kind == FailureKind::Configuration => {
                AppError::Configuration(failure.to_string())
            }
            PipelineError::StageFailed { failure, report } => {
                AppError::StageFailed { failure, report }
            }
            PipelineError::Cancelled { next_stage, .. } => AppError::Cancelled(next_stage),
            PipelineError::Context(e) => AppError::Internal(anyhow::anyhow!(e)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details): (StatusCode, &str, String, Option<Value>) =
            match &self {
                AppError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
                }
                AppError::Configuration(msg) => {
                    tracing::error!("Configuration error: {msg}");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "CONFIGURATION_ERROR",
                        "The analysis service is not configured correctly".to_string(),
                        None,
                    )
                }
                AppError::StageFailed { failure, report } => {
                    tracing::error!("Pipeline failure in run {}: {failure}", report.run_id);
                    (
                        StatusCode::BAD_GATEWAY,
                        "PIPELINE_STAGE_FAILED",
                        failure.to_string(),
                        Some(json!({
                            "stage": failure.stage,
                            "kind": failure.kind,
                            "reason": failure.reason,
                            "raw_output": failure.raw_output,
                            "run_id": report.run_id,
                            "pipeline": report.pipeline,
                            "stages": report.stages,
                            "warnings": report.warnings,
                        })),
                    )
                }
                AppError::Cancelled(stage) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "RUN_CANCELLED",
                    format!("Analysis was cancelled before stage '{stage}'"),
                    None,
                ),
                AppError::Internal(e) => {
                    tracing::error!("Internal error: {e:?}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal server error occurred".to_string(),
                        None,
                    )
                }
            };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::orchestrator::{StageRecord, StageStatus};
    use crate::pipeline::extract::ExtractionTier;
    use crate::pipeline::PipelineContext;
    use axum::body::to_bytes;
    use chrono::Utc;
    use uuid::Uuid;

    fn partial_report() -> RunReport {
        RunReport {
            run_id: Uuid::new_v4(),
            pipeline: "full_analysis".to_string(),
            context: PipelineContext::new(),
            warnings: vec![],
            stages: vec![StageRecord {
                stage: "content_analysis".to_string(),
                status: StageStatus::Succeeded {
                    tier: ExtractionTier::WholeText,
                },
                elapsed_ms: 12,
            }],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_response() {
        let response = AppError::Validation("resume_text cannot be empty".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "resume_text cannot be empty");
    }

    #[tokio::test]
    async fn test_stage_failure_response_carries_full_diagnostic() {
        let raw = "not json at all ".repeat(100);
        let failure = StageFailure::new("improvement_recommendations", FailureKind::Extraction, "no parseable JSON found")
            .with_raw(raw.clone());
        let report = partial_report();
        let run_id = report.run_id.to_string();
        let response = AppError::StageFailed {
            failure,
            report: Box::new(report),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        let details = &body["error"]["details"];
        assert_eq!(body["error"]["code"], "PIPELINE_STAGE_FAILED");
        assert_eq!(details["stage"], "improvement_recommendations");
        assert_eq!(details["kind"], "extraction");
        assert_eq!(details["raw_output"], raw.as_str());
        assert_eq!(details["run_id"], run_id.as_str());
        assert_eq!(details["stages"][0]["stage"], "content_analysis");
        assert_eq!(details["stages"][0]["status"], "succeeded");
        assert_eq!(details["warnings"], json!([]));
    }

    #[test]
    fn test_pipeline_configuration_maps_to_configuration() {
        let err: AppError = PipelineError::Configuration("no credential".to_string()).into();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_missing_seed_maps_to_configuration() {
        let err: AppError = PipelineError::MissingSeed {
            pipeline: "p".to_string(),
            key: "industry".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Configuration(ref m) if m.contains("industry")));
    }

    #[test]
    fn test_undeclared_seed_maps_to_configuration() {
        let err: AppError = PipelineError::UndeclaredSeed {
            pipeline: "p".to_string(),
            key: "advice".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Configuration(ref m) if m.contains("advice")));
    }

    #[tokio::test]
    async fn test_rejected_credential_is_service_unavailable() {
        let failure = StageFailure::new(
            "content_analysis",
            FailureKind::Configuration,
            "unauthorized: the API credential was rejected (invalid x-api-key)",
        );
        let err: AppError = PipelineError::StageFailed {
            failure,
            report: Box::new(partial_report()),
        }
        .into();
        assert!(matches!(err, AppError::Configuration(_)));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["error"]["code"], "CONFIGURATION_ERROR");
    }
}
