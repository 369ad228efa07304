//! The resume analysis pipelines, assembled (and wiring-checked) once at startup.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::analysis::prompts::{
    ATS_OPTIMIZATION_TEMPLATE, CONTENT_ANALYSIS_TEMPLATE, IMPROVEMENTS_TEMPLATE,
    INDUSTRY_OPTIMIZATION_TEMPLATE, RESUME_CONTENT_TEMPLATE,
};
use crate::llm_client::prompts::RESUME_WRITER_SYSTEM;
use crate::pipeline::{Pipeline, SchemaContract, Stage, WiringError};

// Seed keys
pub const RESUME_TEXT: &str = "resume_text";
pub const TARGET_ROLE: &str = "target_role";
pub const INDUSTRY: &str = "industry";
pub const JOB_DESCRIPTION: &str = "job_description";

// Output keys
pub const CONTENT_ANALYSIS: &str = "content_analysis";
pub const IMPROVEMENTS: &str = "improvements";
pub const ATS_ANALYSIS: &str = "ats_analysis";
pub const INDUSTRY_OPTIMIZATION: &str = "industry_optimization";
pub const RESUME_CONTENT: &str = "resume_content";

/// Seed value when the caller supplies no job description.
pub const NO_JOB_DESCRIPTION: &str = "No job description provided.";

/// All pipelines the service exposes. Read-only after construction.
#[derive(Debug, Clone)]
pub struct AnalysisPipelines {
    /// content analysis → improvement recommendations → ATS optimization
    pub full_analysis: Pipeline,
    pub industry_optimization: Pipeline,
    pub content_generation: Pipeline,
}

impl AnalysisPipelines {
    pub fn build() -> Result<Self, WiringError> {
        Ok(Self {
            full_analysis: full_analysis()?,
            industry_optimization: industry_optimization()?,
            content_generation: content_generation()?,
        })
    }
}

fn full_analysis() -> Result<Pipeline, WiringError> {
    Pipeline::builder("full_analysis")
        .seeds([RESUME_TEXT, TARGET_ROLE, INDUSTRY, JOB_DESCRIPTION])
        .stage(
            Stage::new("content_analysis", CONTENT_ANALYSIS_TEMPLATE, CONTENT_ANALYSIS).with_schema(
                SchemaContract::required_paths([
                    "strengths",
                    "weaknesses",
                    "contentSuggestions.summary",
                    "contentSuggestions.skills",
                ]),
            ),
        )
        .stage(
            Stage::new("improvement_recommendations", IMPROVEMENTS_TEMPLATE, IMPROVEMENTS)
                .with_schema(SchemaContract::required_paths([
                    "prioritizedActions",
                    "rewrittenSummary",
                ])),
        )
        .stage(
            Stage::new("ats_optimization", ATS_OPTIMIZATION_TEMPLATE, ATS_ANALYSIS)
                .with_schema(SchemaContract::resume_analysis()),
        )
        .build()
}

fn industry_optimization() -> Result<Pipeline, WiringError> {
    Pipeline::builder("industry_optimization")
        .seeds([RESUME_TEXT, INDUSTRY])
        .stage(
            Stage::new(
                "industry_optimization",
                INDUSTRY_OPTIMIZATION_TEMPLATE,
                INDUSTRY_OPTIMIZATION,
            )
            .with_schema(SchemaContract::required_paths([
                "industryKeywords",
                "recommendations",
            ])),
        )
        .build()
}

fn content_generation() -> Result<Pipeline, WiringError> {
    Pipeline::builder("content_generation")
        .seeds([RESUME_TEXT, TARGET_ROLE])
        .stage(
            Stage::new("resume_content", RESUME_CONTENT_TEMPLATE, RESUME_CONTENT)
                .with_schema(SchemaContract::resume_content())
                .with_system(RESUME_WRITER_SYSTEM)
                .with_temperature(0.7),
        )
        .build()
}

/// Best-effort fallback values, keyed by output key.
///
/// `resume_content` has none: generated copy is the whole point of that pipeline,
/// so it aborts even in best-effort mode.
pub fn default_fallbacks() -> HashMap<String, Value> {
    HashMap::from([
        (
            CONTENT_ANALYSIS.to_string(),
            json!({
                "strengths": [],
                "weaknesses": [],
                "contentSuggestions": {"summary": "", "skills": []}
            }),
        ),
        (
            IMPROVEMENTS.to_string(),
            json!({"prioritizedActions": [], "rewrittenSummary": ""}),
        ),
        (
            ATS_ANALYSIS.to_string(),
            json!({
                "score": 0,
                "matchedKeywords": [],
                "missedKeywords": [],
                "suggestions": ["ATS analysis was unavailable for this run. Try again later."]
            }),
        ),
        (
            INDUSTRY_OPTIMIZATION.to_string(),
            json!({"industryKeywords": [], "recommendations": []}),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::schema::validate;

    #[test]
    fn test_all_pipelines_pass_wiring() {
        let pipelines = AnalysisPipelines::build().unwrap();
        assert_eq!(
            pipelines.full_analysis.output_keys().collect::<Vec<_>>(),
            vec![CONTENT_ANALYSIS, IMPROVEMENTS, ATS_ANALYSIS]
        );
        assert_eq!(pipelines.industry_optimization.stages().len(), 1);
        assert_eq!(pipelines.content_generation.stages().len(), 1);
    }

    #[test]
    fn test_full_analysis_without_content_stage_fails_wiring() {
        let err = Pipeline::builder("broken")
            .seeds([RESUME_TEXT, TARGET_ROLE, INDUSTRY, JOB_DESCRIPTION])
            .stage(Stage::new("improvement_recommendations", IMPROVEMENTS_TEMPLATE, IMPROVEMENTS))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            WiringError::UnsatisfiedInput {
                stage: "improvement_recommendations".to_string(),
                key: CONTENT_ANALYSIS.to_string()
            }
        );
    }

    #[test]
    fn test_fallbacks_satisfy_their_stage_contracts() {
        let pipelines = AnalysisPipelines::build().unwrap();
        let fallbacks = default_fallbacks();
        let stages = pipelines
            .full_analysis
            .stages()
            .iter()
            .chain(pipelines.industry_optimization.stages());
        for stage in stages {
            let fallback = &fallbacks[stage.output_key()];
            let schema = stage.schema().unwrap();
            assert!(validate(fallback, schema), "fallback for {} is invalid", stage.name());
        }
    }

    #[test]
    fn test_content_generation_has_no_fallback() {
        assert!(!default_fallbacks().contains_key(RESUME_CONTENT));
    }
}
