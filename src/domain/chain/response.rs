//! Caller-facing result of processing an input

use serde::{Deserialize, Serialize};

use super::{Chain, HopRecord, RarityTier};

/// Public view of a hop record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HopView {
    pub hop_index: usize,
    pub provider_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_content: Option<String>,
    pub tokens_used: u32,
    pub cost: f64,
    pub duration_ms: u64,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl From<&HopRecord> for HopView {
    fn from(record: &HopRecord) -> Self {
        Self {
            hop_index: record.hop_index,
            provider_id: record.provider_id.clone(),
            response_content: record.response_content.clone(),
            tokens_used: record.tokens_used,
            cost: record.cost,
            duration_ms: record.duration_ms,
            succeeded: record.succeeded,
            failure_reason: record.failure_reason.clone(),
        }
    }
}

/// Response returned for every processed input, successful or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainResponse {
    pub success: bool,
    pub chain_id: String,
    pub response: String,
    pub quality_score: f64,
    pub diversity_score: f64,
    pub rarity_tier: RarityTier,
    pub hops: Vec<HopView>,
    pub total_cost: f64,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChainResponse {
    /// Build the response for a completed chain
    pub fn completed(chain: &Chain, response: impl Into<String>, duration_ms: u64) -> Self {
        let metadata = chain.metadata().copied().unwrap_or_default();

        Self {
            success: true,
            chain_id: chain.id().to_string(),
            response: response.into(),
            quality_score: metadata.quality_score,
            diversity_score: metadata.diversity_score,
            rarity_tier: metadata.rarity_tier,
            hops: chain.hops().iter().map(HopView::from).collect(),
            total_cost: chain.total_cost(),
            duration_ms,
            error: None,
        }
    }

    pub fn successful_hop_count(&self) -> usize {
        self.hops.iter().filter(|h| h.succeeded).count()
    }
}
