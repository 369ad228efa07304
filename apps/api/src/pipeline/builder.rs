//! Pipeline assembly with static wiring validation.
//!
//! Every stage's required inputs must be covered by the seed keys plus the output
//! keys of the stages before it. That is checked once, in `build()`, so an ordering
//! bug surfaces at startup rather than in the middle of a run.

use std::collections::BTreeSet;

use crate::pipeline::error::WiringError;
use crate::pipeline::stage::Stage;

/// Ordered stages plus the seed keys a caller must supply. Immutable once built.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    seed_keys: BTreeSet<String>,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder {
            name: name.into(),
            seed_keys: BTreeSet::new(),
            stages: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seed_keys(&self) -> &BTreeSet<String> {
        &self.seed_keys
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Output keys in stage order.
    pub fn output_keys(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(Stage::output_key)
    }
}

#[derive(Debug)]
pub struct PipelineBuilder {
    name: String,
    seed_keys: BTreeSet<String>,
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    pub fn seed(mut self, key: impl Into<String>) -> Self {
        self.seed_keys.insert(key.into());
        self
    }

    pub fn seeds<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        keys.into_iter().fold(self, |builder, key| builder.seed(key))
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> Result<Pipeline, WiringError> {
        validate_wiring(&self.name, &self.seed_keys, &self.stages)?;
        Ok(Pipeline {
            name: self.name,
            seed_keys: self.seed_keys,
            stages: self.stages,
        })
    }
}

fn validate_wiring(
    pipeline: &str,
    seed_keys: &BTreeSet<String>,
    stages: &[Stage],
) -> Result<(), WiringError> {
    if stages.is_empty() {
        return Err(WiringError::Empty {
            pipeline: pipeline.to_string(),
        });
    }

    let mut available: BTreeSet<&str> = seed_keys.iter().map(String::as_str).collect();
    let mut names: BTreeSet<&str> = BTreeSet::new();

    for stage in stages {
        if !names.insert(stage.name()) {
            return Err(WiringError::DuplicateStageName(stage.name().to_string()));
        }

        if let Some(key) = stage
            .required_inputs()
            .iter()
            .find(|key| !available.contains(key.as_str()))
        {
            return Err(WiringError::UnsatisfiedInput {
                stage: stage.name().to_string(),
                key: key.clone(),
            });
        }

        if !available.insert(stage.output_key()) {
            return Err(WiringError::DuplicateOutput {
                stage: stage.name().to_string(),
                key: stage.output_key().to_string(),
            });
        }
    }

    Ok(())
}
