//! Provider entity and related types

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Maximum length for provider IDs
pub const MAX_PROVIDER_ID_LENGTH: usize = 50;

/// Regex pattern for valid provider IDs
static PROVIDER_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]*[a-zA-Z0-9]$|^[a-zA-Z0-9]$")
        .expect("provider ID pattern is a valid regex")
});

/// Which backend client implementation serves a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Locally hosted model server (Ollama-compatible)
    Local,
    /// OpenAI-compatible chat completions API
    #[serde(rename = "openai")]
    OpenAi,
    /// Anthropic messages API
    Anthropic,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validate a provider identifier (alphanumeric, '-', '_' and '.'; max 50 chars)
pub fn validate_provider_id(id: &str) -> Result<(), DomainError> {
    if id.is_empty() {
        return Err(DomainError::validation("Provider ID cannot be empty"));
    }

    if id.len() > MAX_PROVIDER_ID_LENGTH {
        return Err(DomainError::validation(format!(
            "Provider ID too long: {} characters (max {})",
            id.len(),
            MAX_PROVIDER_ID_LENGTH
        )));
    }

    if !PROVIDER_ID_PATTERN.is_match(id) {
        return Err(DomainError::validation(format!(
            "Invalid provider ID format '{}'",
            id
        )));
    }

    Ok(())
}

/// Immutable catalog entry describing one backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    id: String,
    display_name: String,
    backend_kind: BackendKind,
    cost_per_token: f64,
    max_tokens: u32,
    quality_score: f64,
    #[serde(default)]
    specialty: String,
    #[serde(default)]
    model: Option<String>,
}

impl Provider {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        backend_kind: BackendKind,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            backend_kind,
            cost_per_token: 0.0,
            max_tokens: 4096,
            quality_score: 0.5,
            specialty: String::new(),
            model: None,
        }
    }

    pub fn with_cost_per_token(mut self, cost: f64) -> Self {
        self.cost_per_token = cost;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_quality_score(mut self, score: f64) -> Self {
        self.quality_score = score;
        self
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = specialty.into();
        self
    }

    /// Backend model name, when it differs from the provider ID
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    // Getters

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend_kind
    }

    /// Model name sent to the backend
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(&self.id)
    }

    pub fn cost_per_token(&self) -> f64 {
        self.cost_per_token
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    pub fn specialty(&self) -> &str {
        &self.specialty
    }

    /// Cost of a call that consumed `tokens` tokens
    pub fn cost_for_tokens(&self, tokens: u32) -> f64 {
        f64::from(tokens) * self.cost_per_token
    }

    /// Check the entry's invariants
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_provider_id(&self.id)?;

        if !self.cost_per_token.is_finite() || self.cost_per_token < 0.0 {
            return Err(DomainError::validation(format!(
                "Provider '{}' has invalid cost_per_token {}: must be >= 0",
                self.id, self.cost_per_token
            )));
        }

        if self.max_tokens == 0 {
            return Err(DomainError::validation(format!(
                "Provider '{}' has max_tokens 0: must be greater than 0",
                self.id
            )));
        }

        if !(0.0..=1.0).contains(&self.quality_score) {
            return Err(DomainError::validation(format!(
                "Provider '{}' has quality_score {} outside [0.0, 1.0]",
                self.id, self.quality_score
            )));
        }

        Ok(())
    }
}
