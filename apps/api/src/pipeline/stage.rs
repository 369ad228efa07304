//! Stage — one render → generate → extract → validate unit.

use std::collections::BTreeSet;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::credentials::Credential;
use crate::llm_client::{GenerationOptions, ProviderError, TextGenerator};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::{FailureKind, StageFailure};
use crate::pipeline::extract::{extract_with_tier, ExtractionTier, NO_JSON_FOUND};
use crate::pipeline::schema::{violations, SchemaContract};
use crate::pipeline::template::{placeholders, render};

/// Immutable stage descriptor.
///
/// Required inputs are derived from the template's placeholders; `requires` adds
/// keys the template does not mention but the stage still depends on.
#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    template: String,
    required_inputs: BTreeSet<String>,
    output_key: String,
    schema: Option<SchemaContract>,
    temperature: Option<f32>,
    system: Option<String>,
}

impl Stage {
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        output_key: impl Into<String>,
    ) -> Self {
        let template = template.into();
        Self {
            name: name.into(),
            required_inputs: placeholders(&template).into_iter().collect(),
            template,
            output_key: output_key.into(),
            schema: None,
            temperature: None,
            system: None,
        }
    }

    // For inputs the template does not name, e.g. ones read by a custom system prompt
    #[allow(dead_code)]
    pub fn requires(mut self, key: impl Into<String>) -> Self {
        self.required_inputs.insert(key.into());
        self
    }

    pub fn with_schema(mut self, schema: SchemaContract) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required_inputs(&self) -> &BTreeSet<String> {
        &self.required_inputs
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    pub fn schema(&self) -> Option<&SchemaContract> {
        self.schema.as_ref()
    }

    /// Run-level options with this stage's overrides applied.
    pub fn effective_options(&self, base: &GenerationOptions) -> GenerationOptions {
        let mut options = base.clone();
        if let Some(temperature) = self.temperature {
            options.temperature = temperature;
        }
        if let Some(system) = &self.system {
            options.system = system.clone();
        }
        options
    }

    /// Executes the stage against `context`. Does not touch the context.
    pub async fn execute(
        &self,
        context: &PipelineContext,
        env: &StageEnv<'_>,
    ) -> Result<StageSuccess, StageFailure> {
        let prompt = render(&self.template, context)
            .map_err(|e| StageFailure::new(&self.name, FailureKind::Template, e.to_string()))?;

        let options = self.effective_options(env.options);
        let raw = match tokio::time::timeout(
            env.timeout,
            env.generator.generate(&prompt, &options, env.credential),
        )
        .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e @ ProviderError::Unauthorized(_))) => {
                return Err(StageFailure::new(&self.name, FailureKind::Configuration, e.to_string()))
            }
            Ok(Err(e)) => {
                return Err(StageFailure::new(&self.name, FailureKind::Provider, e.to_string()))
            }
            Err(_) => {
                let e = ProviderError::Timeout(env.timeout);
                return Err(StageFailure::new(&self.name, FailureKind::Provider, e.to_string()));
            }
        };

        debug!(stage = %self.name, raw_len = raw.len(), "raw generator output: {raw}");

        let Some((tier, value)) = extract_with_tier(&raw) else {
            return Err(
                StageFailure::new(&self.name, FailureKind::Extraction, NO_JSON_FOUND).with_raw(raw),
            );
        };

        if let Some(schema) = self.schema() {
            let problems = violations(&value, schema);
            if !problems.is_empty() {
                return Err(
                    StageFailure::new(&self.name, FailureKind::Validation, problems.join("; "))
                        .with_raw(raw),
                );
            }
        }

        Ok(StageSuccess { value, tier })
    }
}

/// Everything a stage needs from the run that is executing it.
pub struct StageEnv<'a> {
    pub generator: &'a dyn TextGenerator,
    pub credential: &'a Credential,
    pub options: &'a GenerationOptions,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageSuccess {
    pub value: Value,
    pub tier: ExtractionTier,
}
