//! Converts chain-level failures into well-formed caller responses

use tracing::warn;

use super::{Chain, ChainResponse, HopView, RarityTier, FALLBACK_APOLOGY};
use crate::domain::ChainError;

/// Build the caller response for a failed chain
///
/// This is the only path by which an execution failure reaches the caller.
/// Cost and duration are reported as zero and the tier is always `normal`.
pub fn on_chain_failed(chain: &Chain, cause: &ChainError) -> ChainResponse {
    warn!(
        chain_id = %chain.id(),
        pattern = chain.pattern_name(),
        preflight = cause.is_preflight(),
        hops_recorded = chain.hops().len(),
        "Chain failed: {}",
        cause
    );

    ChainResponse {
        success: false,
        chain_id: chain.id().to_string(),
        response: FALLBACK_APOLOGY.to_string(),
        quality_score: 0.0,
        diversity_score: 0.0,
        rarity_tier: RarityTier::Normal,
        hops: chain.hops().iter().map(HopView::from).collect(),
        total_cost: 0.0,
        duration_ms: 0,
        error: Some(cause.to_string()),
    }
}
