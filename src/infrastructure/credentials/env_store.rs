use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::env;

use crate::domain::{BackendKind, Credential, CredentialStore, DomainError};

/// Environment variable mappings for one backend kind
#[derive(Debug, Clone)]
pub struct EnvMapping {
    pub api_key_var: String,
    pub additional_vars: HashMap<String, String>,
}

impl EnvMapping {
    pub fn new(api_key_var: impl Into<String>) -> Self {
        Self {
            api_key_var: api_key_var.into(),
            additional_vars: HashMap::new(),
        }
    }

    pub fn with_var(mut self, param_name: impl Into<String>, env_var: impl Into<String>) -> Self {
        self.additional_vars.insert(param_name.into(), env_var.into());
        self
    }
}

/// Credential store that reads from environment variables on every call
///
/// Keyless backends (the local model server) receive an empty credential.
#[derive(Debug)]
pub struct EnvCredentialStore {
    mappings: HashMap<BackendKind, EnvMapping>,
    keyless: HashSet<BackendKind>,
}

impl EnvCredentialStore {
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
            keyless: HashSet::new(),
        }
    }

    pub fn with_mapping(mut self, backend_kind: BackendKind, mapping: EnvMapping) -> Self {
        self.keyless.remove(&backend_kind);
        self.mappings.insert(backend_kind, mapping);
        self
    }

    pub fn with_keyless(mut self, backend_kind: BackendKind) -> Self {
        self.mappings.remove(&backend_kind);
        self.keyless.insert(backend_kind);
        self
    }

    pub fn with_defaults(self) -> Self {
        self.with_keyless(BackendKind::Local)
            .with_mapping(
                BackendKind::OpenAi,
                EnvMapping::new("OPENAI_API_KEY").with_var("organization", "OPENAI_ORG_ID"),
            )
            .with_mapping(BackendKind::Anthropic, EnvMapping::new("ANTHROPIC_API_KEY"))
    }

    fn read_credential(&self, backend_kind: BackendKind) -> Result<Credential, DomainError> {
        if self.keyless.contains(&backend_kind) {
            return Ok(Credential::new(backend_kind, ""));
        }

        let mapping = self.mappings.get(&backend_kind).ok_or_else(|| {
            DomainError::credential(format!(
                "No environment mapping configured for backend '{}'",
                backend_kind
            ))
        })?;

        let api_key = env::var(&mapping.api_key_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                DomainError::credential(format!(
                    "Environment variable '{}' not set for backend '{}'",
                    mapping.api_key_var, backend_kind
                ))
            })?;

        let mut credential = Credential::new(backend_kind, api_key);

        for (param_name, env_var) in &mapping.additional_vars {
            if let Ok(value) = env::var(env_var) {
                credential = credential.with_param(param_name, value);
            }
        }

        Ok(credential)
    }
}

impl Default for EnvCredentialStore {
    fn default() -> Self {
        Self::new().with_defaults()
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn credential_for(&self, backend_kind: BackendKind) -> Result<Credential, DomainError> {
        self.read_credential(backend_kind)
    }

    fn supports(&self, backend_kind: BackendKind) -> bool {
        if self.keyless.contains(&backend_kind) {
            return true;
        }

        self.mappings
            .get(&backend_kind)
            .is_some_and(|mapping| env::var(&mapping.api_key_var).is_ok())
    }

    fn store_name(&self) -> &'static str {
        "env"
    }
}
