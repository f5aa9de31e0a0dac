use std::collections::HashMap;

use crate::domain::BackendKind;

/// Secret material for one backend call
///
/// Fetched from a [`super::CredentialStore`] immediately before a hop is
/// issued and dropped as soon as the call returns. Never cached by clients.
#[derive(Clone)]
pub struct Credential {
    backend_kind: BackendKind,
    api_key: String,
    additional_params: HashMap<String, String>,
}

impl Credential {
    pub fn new(backend_kind: BackendKind, api_key: impl Into<String>) -> Self {
        Self {
            backend_kind,
            api_key: api_key.into(),
            additional_params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_params.insert(key.into(), value.into());
        self
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend_kind
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.additional_params.get(key).map(String::as_str)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("backend_kind", &self.backend_kind)
            .field("api_key", &"<redacted>")
            .field("params", &self.additional_params.keys().collect::<Vec<_>>())
            .finish()
    }
}
