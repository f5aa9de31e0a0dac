//! Domain layer - Core business logic and entities

pub mod backend;
pub mod chain;
pub mod credentials;
pub mod error;
pub mod pattern;
pub mod provider;

pub use backend::{BackendClient, BackendRegistry, HopOutput, HopRequest};
pub use chain::{
    on_chain_failed, score, synthesize, Chain, ChainEvent, ChainExecutor, ChainId, ChainMetadata,
    ChainObserver, ChainResponse, ChainStatus, ExecutionMode, ExecutionSettings, FallbackPolicy,
    HopRecord, HopView, RarityTier, FALLBACK_APOLOGY,
};
pub use credentials::{Credential, CredentialStore};
pub use error::{ChainError, DomainError, HopError, HopFailureKind};
pub use pattern::{
    HopPattern, PatternSelector, PatternSet, SelectionRequest, SelectionThresholds,
    AD_HOC_PATTERN_NAME,
};
pub use provider::{validate_provider_id, BackendKind, Provider, ProviderCatalog};
