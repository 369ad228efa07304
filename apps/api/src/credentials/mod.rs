//! Credential Provider — read-only lookup of the secrets that authorize generation.
//!
//! Storage is someone else's job; the pipeline only ever reads. A missing
//! credential is a configuration error raised before any generation call.

use std::collections::HashMap;

/// Service and key name under which the generation API key is stored.
pub const LLM_SERVICE: &str = "anthropic";
pub const LLM_API_KEY: &str = "api_key";

/// A secret value. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

pub trait CredentialProvider: Send + Sync {
    fn get_credential(&self, service: &str, key: &str) -> Option<Credential>;
}

/// Reads `<SERVICE>_<KEY>` from the process environment,
/// e.g. `("anthropic", "api_key")` → `ANTHROPIC_API_KEY`. Empty values count as absent.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    pub fn var_name(service: &str, key: &str) -> String {
        format!("{service}_{key}")
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn get_credential(&self, service: &str, key: &str) -> Option<Credential> {
        std::env::var(Self::var_name(service, key))
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(Credential::new)
    }
}

/// Fixed in-memory credentials.
// The binary reads credentials from the environment; tests inject these.
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    entries: HashMap<(String, String), Credential>,
}

#[allow(dead_code)]
impl StaticCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, service: &str, key: &str, secret: &str) -> Self {
        self.entries
            .insert((service.to_string(), key.to_string()), Credential::new(secret));
        self
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn get_credential(&self, service: &str, key: &str) -> Option<Credential> {
        self.entries
            .get(&(service.to_string(), key.to_string()))
            .cloned()
    }
}
