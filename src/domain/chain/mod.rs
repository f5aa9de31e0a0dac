//! Hop chains - execution state, orchestration, scoring and synthesis

mod entity;
mod events;
mod executor;
mod failure;
mod prompt;
mod response;
mod scoring;
mod synthesizer;

pub use entity::{
    Chain, ChainId, ChainMetadata, ChainStatus, ExecutionMode, FallbackPolicy, HopRecord,
};
pub use events::{ChainEvent, ChainObserver, ChannelObserver, NoopObserver, TracingObserver};
pub use executor::{ChainExecutor, ExecutionSettings, DEFAULT_MAX_HOPS};
pub use failure::on_chain_failed;
pub use prompt::{HopPosition, PromptTemplates};
pub use response::{ChainResponse, HopView};
pub use scoring::{score, score_hops, RarityTier};
pub use synthesizer::{synthesize, FALLBACK_APOLOGY};

#[cfg(test)]
pub use events::MockChainObserver;
