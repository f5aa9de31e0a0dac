use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core domain errors raised while loading configuration and building the catalog
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Credential error: {message}")]
    Credential { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Failure classification reported by a backend client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HopFailureKind {
    ProviderUnknown,
    CredentialMissing,
    Timeout,
    UpstreamError,
}

impl std::fmt::Display for HopFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProviderUnknown => write!(f, "provider_unknown"),
            Self::CredentialMissing => write!(f, "credential_missing"),
            Self::Timeout => write!(f, "timeout"),
            Self::UpstreamError => write!(f, "upstream_error"),
        }
    }
}

/// Errors raised by a single hop
///
/// These are handled by the chain executor according to the fallback policy
/// and never escape the chain boundary on their own.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HopError {
    #[error("Provider '{provider_id}' is not in the catalog")]
    ProviderUnknown { provider_id: String },

    #[error("Credential missing: {detail}")]
    CredentialMissing { detail: String },

    #[error("Hop timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Upstream error: {provider} - {detail}")]
    Upstream { provider: String, detail: String },
}

impl HopError {
    pub fn provider_unknown(provider_id: impl Into<String>) -> Self {
        Self::ProviderUnknown {
            provider_id: provider_id.into(),
        }
    }

    pub fn credential_missing(detail: impl Into<String>) -> Self {
        Self::CredentialMissing {
            detail: detail.into(),
        }
    }

    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    pub fn upstream(provider: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.into(),
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> HopFailureKind {
        match self {
            Self::ProviderUnknown { .. } => HopFailureKind::ProviderUnknown,
            Self::CredentialMissing { .. } => HopFailureKind::CredentialMissing,
            Self::Timeout { .. } => HopFailureKind::Timeout,
            Self::Upstream { .. } => HopFailureKind::UpstreamError,
        }
    }
}

/// Errors that terminate a chain
///
/// Every variant is routed through the failure handler so callers always
/// receive a well-formed response.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChainError {
    #[error("Invalid hop pattern: {message}")]
    PatternInvalid { message: String },

    #[error("Pattern references unknown provider '{provider_id}'")]
    ProviderUnknown { provider_id: String },

    #[error("Unknown pattern name '{name}'")]
    UnknownPatternName { name: String },

    #[error("Invalid execution settings: {message}")]
    SettingsInvalid { message: String },

    #[error("All {attempted} hops failed")]
    AllHopsFailed { attempted: usize },

    #[error("Hop {hop_index} ({provider_id}) failed and the chain was aborted: {source}")]
    HopAborted {
        hop_index: usize,
        provider_id: String,
        #[source]
        source: HopError,
    },

    #[error("Chain exceeded its {timeout_ms}ms time limit")]
    ChainTimeoutExceeded { timeout_ms: u64 },

    #[error("Invalid chain transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl ChainError {
    pub fn pattern_invalid(message: impl Into<String>) -> Self {
        Self::PatternInvalid {
            message: message.into(),
        }
    }

    pub fn provider_unknown(provider_id: impl Into<String>) -> Self {
        Self::ProviderUnknown {
            provider_id: provider_id.into(),
        }
    }

    pub fn unknown_pattern(name: impl Into<String>) -> Self {
        Self::UnknownPatternName { name: name.into() }
    }

    pub fn settings_invalid(message: impl Into<String>) -> Self {
        Self::SettingsInvalid {
            message: message.into(),
        }
    }

    /// Whether the error was raised before any backend call was attempted
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::PatternInvalid { .. }
                | Self::ProviderUnknown { .. }
                | Self::UnknownPatternName { .. }
                | Self::SettingsInvalid { .. }
        )
    }
}

impl From<ChainError> for DomainError {
    fn from(error: ChainError) -> Self {
        match error {
            ChainError::UnknownPatternName { .. } | ChainError::ProviderUnknown { .. } => {
                DomainError::not_found(error.to_string())
            }
            ChainError::PatternInvalid { .. } | ChainError::SettingsInvalid { .. } => {
                DomainError::validation(error.to_string())
            }
            other => DomainError::internal(other.to_string()),
        }
    }
}
