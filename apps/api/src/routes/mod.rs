pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route("/api/v1/analysis", post(handlers::handle_analyze))
        .route("/api/v1/analysis/report", post(handlers::handle_report))
        .route("/api/v1/analysis/industry", post(handlers::handle_industry))
        .route("/api/v1/analysis/upload", post(handlers::handle_upload))
        // Content API
        .route("/api/v1/content", post(handlers::handle_generate_content))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::analysis::service::tests::{
        happy_generator, service_with, CONTENT_ANALYSIS_REPLY, IMPROVEMENTS_REPLY,
    };
    use crate::analysis::service::RunMode;
    use crate::config::Config;
    use crate::llm_client::stub::{StubGenerator, StubReply};

    fn test_config() -> Config {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            llm_api_url: "http://localhost:0".to_string(),
            llm_model: "test-model".to_string(),
            llm_temperature: 0.0,
            llm_max_output_tokens: 512,
            stage_timeout: Duration::from_secs(5),
            default_run_mode: RunMode::Strict,
        }
    }

    fn router_with(generator: StubGenerator) -> Router {
        build_router(AppState {
            analysis: service_with(Arc::new(generator), RunMode::Strict),
            config: test_config(),
        })
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn analysis_body() -> Value {
        json!({
            "resume_text": "Jane Doe. Rust engineer, 5 years building payment systems.",
            "target_role": "Senior Backend Engineer",
            "industry": "fintech"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = router_with(happy_generator())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "test-model");
    }

    #[tokio::test]
    async fn test_analysis_route_returns_artifacts() {
        let response = router_with(happy_generator())
            .oneshot(post_json("/api/v1/analysis", analysis_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["ats_optimization"]["score"], 78.0);
        assert_eq!(body["content_analysis"]["strengths"], json!(["Rust"]));
        assert_eq!(body["stages"].as_array().unwrap().len(), 3);
        assert!(body["warnings"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_resume_is_bad_request() {
        let mut request = analysis_body();
        request["resume_text"] = json!("   ");
        let response = router_with(happy_generator())
            .oneshot(post_json("/api/v1/analysis", request))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_strict_stage_failure_is_bad_gateway() {
        let generator = StubGenerator::routed(vec![
            ("Analyze the resume below", StubReply::text(CONTENT_ANALYSIS_REPLY)),
            ("prioritized improvement", StubReply::text(IMPROVEMENTS_REPLY)),
            ("Applicant Tracking System", StubReply::text("I cannot help with that.")),
        ]);
        let response = router_with(generator)
            .oneshot(post_json("/api/v1/analysis", analysis_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        let details = &body["error"]["details"];
        assert_eq!(body["error"]["code"], "PIPELINE_STAGE_FAILED");
        assert_eq!(details["stage"], "ats_optimization");
        assert_eq!(details["kind"], "extraction");
        assert_eq!(details["raw_output"], "I cannot help with that.");
        assert!(details["run_id"].is_string());
        assert_eq!(details["pipeline"], "full_analysis");
        let stages: Vec<&str> = details["stages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|record| record["stage"].as_str().unwrap())
            .collect();
        assert_eq!(stages, vec!["content_analysis", "improvement_recommendations"]);
        assert_eq!(details["warnings"], json!([]));
    }

    #[tokio::test]
    async fn test_rejected_credential_is_service_unavailable_in_best_effort() {
        let mut request = analysis_body();
        request["mode"] = json!("best_effort");
        let response = router_with(StubGenerator::always(StubReply::Unauthorized))
            .oneshot(post_json("/api/v1/analysis", request))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
    }

    #[tokio::test]
    async fn test_content_route() {
        let response = router_with(happy_generator())
            .oneshot(post_json(
                "/api/v1/content",
                json!({
                    "resume_text": "Jane Doe. Rust engineer.",
                    "target_role": "Backend Engineer"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["content"]["skills"], json!(["Rust", "SQL", "AWS"]));
    }

    #[tokio::test]
    async fn test_report_route_runs_both_pipelines() {
        let response = router_with(happy_generator())
            .oneshot(post_json("/api/v1/analysis/report", analysis_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["analysis"]["ats_optimization"]["score"], 78.0);
        assert_eq!(
            body["industry"]["industry_optimization"]["industryKeywords"],
            json!(["payments"])
        );
    }

    #[tokio::test]
    async fn test_plain_text_upload() {
        let boundary = "resume-boundary";
        let form = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"cv.txt\"\r\nContent-Type: text/plain\r\n\r\nJane Doe. Rust engineer.\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"target_role\"\r\n\r\nBackend Engineer\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"industry\"\r\n\r\nfintech\r\n\
             --{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/analysis/upload")
            .header("content-type", format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(form))
            .unwrap();

        let response = router_with(happy_generator()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["ats_optimization"]["matchedKeywords"], json!(["Rust"]));
    }
}
