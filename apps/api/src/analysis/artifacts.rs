//! Typed views of the validated stage outputs that have a strict shape.
//!
//! Only deserialized after the schema validator has accepted the value, so the
//! conversion cannot disagree with the contract. Unknown fields are dropped.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

/// Output of the ATS optimization stage (resume-analysis contract).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysis {
    /// 0 – 100
    pub score: f64,
    pub matched_keywords: Vec<String>,
    pub missed_keywords: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Output of the content generation stage (resume-content contract).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeContent {
    pub summary: String,
    pub skills: Vec<String>,
}

/// Converts a validated context value into its typed artifact.
pub fn from_validated<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| {
        AppError::Internal(anyhow::anyhow!(
            "validated output '{key}' does not match its typed artifact: {e}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resume_analysis_from_camel_case() {
        let value = json!({
            "score": 72,
            "matchedKeywords": ["rust"],
            "missedKeywords": ["kubernetes"],
            "suggestions": ["Mention Kubernetes work"],
            "extra": true
        });
        let analysis: ResumeAnalysis = from_validated("ats_analysis", value).unwrap();
        assert_eq!(analysis.score, 72.0);
        assert_eq!(analysis.matched_keywords, vec!["rust"]);
        assert_eq!(analysis.missed_keywords, vec!["kubernetes"]);
    }

    #[test]
    fn test_resume_analysis_serializes_camel_case() {
        let analysis = ResumeAnalysis {
            score: 50.0,
            matched_keywords: vec![],
            missed_keywords: vec!["go".to_string()],
            suggestions: vec![],
        };
        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["missedKeywords"], json!(["go"]));
    }

    #[test]
    fn test_resume_content_mismatch_is_internal_error() {
        let err = from_validated::<ResumeContent>("resume_content", json!({"summary": 1}))
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
