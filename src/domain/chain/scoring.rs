//! Quality, diversity and rarity scoring over the successful hops of a chain

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Chain, ChainMetadata, HopRecord};
use crate::domain::ProviderCatalog;

/// Coarse label derived from hop count, quality and diversity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RarityTier {
    #[default]
    Normal,
    Rare,
    Legendary,
}

impl RarityTier {
    /// Pure function of (successful hops, quality, diversity)
    ///
    /// Comparisons are exact: `q` and `d` must be strictly greater than the
    /// thresholds, the hop count at least the minimum.
    pub fn classify(successful_hops: usize, quality: f64, diversity: f64) -> Self {
        if successful_hops >= 6 && quality > 0.9 && diversity > 0.7 {
            Self::Legendary
        } else if successful_hops >= 4 && quality > 0.8 && diversity > 0.5 {
            Self::Rare
        } else {
            Self::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Rare => "rare",
            Self::Legendary => "legendary",
        }
    }
}

impl std::fmt::Display for RarityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Score a chain from its successful hop records
pub fn score(chain: &Chain, catalog: &ProviderCatalog) -> ChainMetadata {
    score_hops(chain.hops(), catalog)
}

/// Score a set of hop records; failed hops are ignored
pub fn score_hops(hops: &[HopRecord], catalog: &ProviderCatalog) -> ChainMetadata {
    let successful: Vec<&HopRecord> = hops.iter().filter(|h| h.succeeded).collect();
    let count = successful.len();

    if count == 0 {
        return ChainMetadata {
            quality_score: 0.0,
            diversity_score: 0.0,
            rarity_tier: RarityTier::Normal,
        };
    }

    let quality_sum: f64 = successful
        .iter()
        .map(|h| {
            catalog
                .lookup(&h.provider_id)
                .map(|p| p.quality_score())
                .unwrap_or(0.0)
        })
        .sum();
    let quality_score = quality_sum / count as f64;

    let distinct: HashSet<&str> = successful.iter().map(|h| h.provider_id.as_str()).collect();
    let diversity_score = distinct.len() as f64 / count as f64;

    ChainMetadata {
        quality_score,
        diversity_score,
        rarity_tier: RarityTier::classify(count, quality_score, diversity_score),
    }
}
