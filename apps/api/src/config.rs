use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::analysis::service::RunMode;
use crate::llm_client::{
    GenerationOptions, DEFAULT_API_URL, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE,
};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

/// Application configuration loaded from environment variables.
/// Fails at startup if a present variable cannot be parsed.
///
/// The generation API key is deliberately absent: it is fetched per run through
/// the credential provider.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_max_output_tokens: u32,
    pub stage_timeout: Duration,
    /// Failure policy for requests that do not choose one.
    pub default_run_mode: RunMode,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_api_url: std::env::var("LLM_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            llm_temperature: parse_env("LLM_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            llm_max_output_tokens: parse_env("LLM_MAX_OUTPUT_TOKENS", DEFAULT_MAX_OUTPUT_TOKENS)?,
            stage_timeout: Duration::from_secs(parse_env("STAGE_TIMEOUT_SECS", 90u64)?),
            default_run_mode: parse_env("DEFAULT_RUN_MODE", RunMode::Strict)?,
        })
    }

    /// Run-level generation options derived from the config.
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            model: self.llm_model.clone(),
            temperature: self.llm_temperature,
            max_output_tokens: self.llm_max_output_tokens,
            system: JSON_ONLY_SYSTEM.to_string(),
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}
