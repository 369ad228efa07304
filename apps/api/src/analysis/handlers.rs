//! Axum route handlers for the Analysis API.

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::analysis::service::{
    AnalysisRequest, AnalysisResponse, ContentRequest, ContentResponse, IndustryRequest,
    IndustryResponse, ReportResponse, RunMode,
};
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/analysis
///
/// Content analysis → improvement recommendations → ATS optimization.
/// Best-effort runs return the artifacts plus the list of degraded stages.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    Ok(Json(state.analysis.analyze(request).await?))
}

/// POST /api/v1/analysis/report
///
/// Full analysis and industry optimization, executed concurrently.
pub async fn handle_report(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<ReportResponse>, AppError> {
    Ok(Json(state.analysis.report(request).await?))
}

/// POST /api/v1/analysis/industry
pub async fn handle_industry(
    State(state): State<AppState>,
    Json(request): Json<IndustryRequest>,
) -> Result<Json<IndustryResponse>, AppError> {
    Ok(Json(state.analysis.optimize_for_industry(request).await?))
}

/// POST /api/v1/content
///
/// Generates a validated summary + skills list from the supplied resume text.
pub async fn handle_generate_content(
    State(state): State<AppState>,
    Json(request): Json<ContentRequest>,
) -> Result<Json<ContentResponse>, AppError> {
    Ok(Json(state.analysis.generate_content(request).await?))
}

/// POST /api/v1/analysis/upload
///
/// Multipart form: `resume` (PDF or plain text file), `target_role`, `industry`,
/// optional `job_description` and `mode`. PDF text extraction runs on the
/// blocking pool.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let mut resume: Option<(Option<String>, Vec<u8>)> = None;
    let mut target_role = String::new();
    let mut industry = String::new();
    let mut job_description = None;
    let mut mode = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let invalid = |e: axum::extract::multipart::MultipartError| {
            AppError::Validation(format!("Could not read field '{name}': {e}"))
        };
        match name.as_str() {
            "resume" => resume = Some((content_type, field.bytes().await.map_err(invalid)?.to_vec())),
            "target_role" => target_role = field.text().await.map_err(invalid)?,
            "industry" => industry = field.text().await.map_err(invalid)?,
            "job_description" => job_description = Some(field.text().await.map_err(invalid)?),
            "mode" => {
                let raw = field.text().await.map_err(invalid)?;
                mode = Some(
                    raw.parse::<RunMode>()
                        .map_err(|e| AppError::Validation(e.to_string()))?,
                );
            }
            other => tracing::debug!("Ignoring unknown multipart field '{other}'"),
        }
    }

    let (content_type, bytes) =
        resume.ok_or_else(|| AppError::Validation("missing 'resume' file field".to_string()))?;
    let resume_text = resume_text_from_upload(content_type.as_deref(), bytes).await?;

    let request = AnalysisRequest {
        resume_text,
        target_role,
        industry,
        job_description,
        mode,
    };
    Ok(Json(state.analysis.analyze(request).await?))
}

fn is_pdf(content_type: Option<&str>, bytes: &[u8]) -> bool {
    content_type == Some("application/pdf") || bytes.starts_with(b"%PDF")
}

async fn resume_text_from_upload(
    content_type: Option<&str>,
    bytes: Vec<u8>,
) -> Result<String, AppError> {
    if !is_pdf(content_type, &bytes) {
        return String::from_utf8(bytes)
            .map_err(|_| AppError::Validation("resume file is neither PDF nor UTF-8 text".to_string()));
    }

    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))?
        .map_err(|e| AppError::Validation(format!("Could not extract text from PDF: {e}")))
}
