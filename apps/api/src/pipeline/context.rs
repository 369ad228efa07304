//! Pipeline context — the append-only variable map threaded through one run.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::pipeline::error::ContextError;

/// Variable name → value for a single pipeline run.
///
/// Keys are written at most once. Seeds go in before the first stage, then each
/// stage appends its output key. Nothing is ever overwritten or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PipelineContext {
    vars: BTreeMap<String, Value>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a variable. Fails if the key already holds a value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), ContextError> {
        let key = key.into();
        if self.vars.contains_key(&key) {
            return Err(ContextError::DuplicateKey(key));
        }
        self.vars.insert(key, value.into());
        Ok(())
    }

    /// Builder-style insert for seeding. Later duplicates are reported by `insert`.
    pub fn with(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, ContextError> {
        self.insert(key, value)?;
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    /// Like `get`, but a missing key is an error naming it.
    pub fn require(&self, key: &str) -> Result<&Value, ContextError> {
        self.vars
            .get(key)
            .ok_or_else(|| ContextError::UndeclaredKey(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }
}
