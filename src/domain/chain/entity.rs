//! Chain entity, hop records and execution options

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RarityTier;
use crate::domain::{ChainError, HopError, HopFailureKind, HopOutput};

/// Unique identifier of one chain execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(Uuid);

impl ChainId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ChainId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a chain
///
/// Transitions are one-directional: pending -> running -> completed | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ChainStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ChainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the hops of a pattern are issued
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One hop at a time, each seeing prior responses
    #[default]
    Sequential,
    /// All hops at once, each seeing only the original input
    Parallel,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

/// Behavior when a hop fails in sequential mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Record the failure and continue with the last successful context
    #[default]
    Continue,
    /// Fail the chain on the first hop failure
    Abort,
}

/// Outcome of one hop within a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HopRecord {
    pub hop_index: usize,
    pub provider_id: String,
    pub prompt: String,
    pub response_content: Option<String>,
    pub tokens_used: u32,
    pub cost: f64,
    pub duration_ms: u64,
    pub succeeded: bool,
    pub failure_reason: Option<String>,
    pub failure_kind: Option<HopFailureKind>,
}

impl HopRecord {
    pub fn success(
        hop_index: usize,
        provider_id: impl Into<String>,
        prompt: impl Into<String>,
        output: HopOutput,
        duration_ms: u64,
    ) -> Self {
        Self {
            hop_index,
            provider_id: provider_id.into(),
            prompt: prompt.into(),
            response_content: Some(output.content),
            tokens_used: output.tokens_used,
            cost: output.cost,
            duration_ms,
            succeeded: true,
            failure_reason: None,
            failure_kind: None,
        }
    }

    /// Failed calls are never billed, so cost and tokens are zero
    pub fn failure(
        hop_index: usize,
        provider_id: impl Into<String>,
        prompt: impl Into<String>,
        error: &HopError,
        duration_ms: u64,
    ) -> Self {
        Self {
            hop_index,
            provider_id: provider_id.into(),
            prompt: prompt.into(),
            response_content: None,
            tokens_used: 0,
            cost: 0.0,
            duration_ms,
            succeeded: false,
            failure_reason: Some(error.to_string()),
            failure_kind: Some(error.kind()),
        }
    }
}

/// Scores populated once a chain completes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChainMetadata {
    pub quality_score: f64,
    pub diversity_score: f64,
    pub rarity_tier: RarityTier,
}

/// One execution of a hop pattern against an input
///
/// Owned and mutated by a single execution task; immutable once terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    id: ChainId,
    pattern_name: String,
    original_input: String,
    hops: Vec<HopRecord>,
    status: ChainStatus,
    total_cost: f64,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    metadata: Option<ChainMetadata>,
    final_response: Option<String>,
}

impl Chain {
    pub fn new(pattern_name: impl Into<String>, original_input: impl Into<String>) -> Self {
        Self {
            id: ChainId::new(),
            pattern_name: pattern_name.into(),
            original_input: original_input.into(),
            hops: Vec::new(),
            status: ChainStatus::Pending,
            total_cost: 0.0,
            created_at: Utc::now(),
            completed_at: None,
            metadata: None,
            final_response: None,
        }
    }

    // Getters

    pub fn id(&self) -> ChainId {
        self.id
    }

    pub fn pattern_name(&self) -> &str {
        &self.pattern_name
    }

    pub fn original_input(&self) -> &str {
        &self.original_input
    }

    pub fn hops(&self) -> &[HopRecord] {
        &self.hops
    }

    pub fn status(&self) -> ChainStatus {
        self.status
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn metadata(&self) -> Option<&ChainMetadata> {
        self.metadata.as_ref()
    }

    pub fn final_response(&self) -> Option<&str> {
        self.final_response.as_deref()
    }

    pub fn successful_hops(&self) -> impl Iterator<Item = &HopRecord> {
        self.hops.iter().filter(|h| h.succeeded)
    }

    pub fn successful_hop_count(&self) -> usize {
        self.successful_hops().count()
    }

    /// Response contents of successful hops, in record order
    pub fn successful_contents(&self) -> Vec<&str> {
        self.successful_hops()
            .filter_map(|h| h.response_content.as_deref())
            .collect()
    }

    // State transitions

    pub fn start(&mut self) -> Result<(), ChainError> {
        self.transition(ChainStatus::Pending, ChainStatus::Running)
    }

    /// Append a hop outcome and accumulate its cost
    pub fn record_hop(&mut self, hop: HopRecord) -> Result<(), ChainError> {
        self.ensure_running("record hop")?;
        self.total_cost += hop.cost;
        self.hops.push(hop);
        Ok(())
    }

    /// Restore pattern-index order after out-of-order arrival
    pub fn sort_hops(&mut self) {
        if !self.status.is_terminal() {
            self.hops.sort_by_key(|h| h.hop_index);
        }
    }

    pub fn complete(
        &mut self,
        metadata: ChainMetadata,
        final_response: impl Into<String>,
    ) -> Result<(), ChainError> {
        self.transition(ChainStatus::Running, ChainStatus::Completed)?;
        self.metadata = Some(metadata);
        self.final_response = Some(final_response.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), ChainError> {
        self.transition(ChainStatus::Running, ChainStatus::Failed)?;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Drive a non-terminal chain to failed, passing through running if needed
    ///
    /// Returns false if the chain was already terminal.
    pub fn force_fail(&mut self) -> bool {
        match self.status {
            ChainStatus::Completed | ChainStatus::Failed => false,
            ChainStatus::Pending | ChainStatus::Running => {
                self.sort_hops();
                self.status = ChainStatus::Failed;
                self.completed_at = Some(Utc::now());
                true
            }
        }
    }

    fn ensure_running(&self, action: &str) -> Result<(), ChainError> {
        if self.status != ChainStatus::Running {
            return Err(ChainError::InvalidTransition {
                from: self.status.to_string(),
                to: action.to_string(),
            });
        }
        Ok(())
    }

    fn transition(&mut self, from: ChainStatus, to: ChainStatus) -> Result<(), ChainError> {
        if self.status != from {
            return Err(ChainError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(index: usize, provider: &str, content: &str, cost: f64) -> HopRecord {
        HopRecord::success(index, provider, "prompt", HopOutput::new(content, 5, cost), 1)
    }

    #[test]
    fn test_new_chain_is_pending() {
        let chain = Chain::new("quick", "What is Rust?");

        assert_eq!(chain.status(), ChainStatus::Pending);
        assert_eq!(chain.pattern_name(), "quick");
        assert_eq!(chain.original_input(), "What is Rust?");
        assert_eq!(chain.total_cost(), 0.0);
        assert!(chain.metadata().is_none());
        assert!(chain.completed_at().is_none());
    }

    #[test]
    fn test_chain_ids_are_unique() {
        assert_ne!(Chain::new("a", "x").id(), Chain::new("a", "x").id());
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut chain = Chain::new("quick", "input");
        chain.start().unwrap();
        chain.record_hop(success(0, "a", "answer", 0.25)).unwrap();

        let metadata = ChainMetadata {
            quality_score: 0.5,
            diversity_score: 1.0,
            rarity_tier: RarityTier::Normal,
        };
        chain.complete(metadata, "answer").unwrap();

        assert_eq!(chain.status(), ChainStatus::Completed);
        assert_eq!(chain.total_cost(), 0.25);
        assert_eq!(chain.final_response(), Some("answer"));
        assert!(chain.completed_at().is_some());
    }

    #[test]
    fn test_cannot_record_before_start() {
        let mut chain = Chain::new("quick", "input");
        assert!(chain.record_hop(success(0, "a", "x", 0.0)).is_err());
    }

    #[test]
    fn test_terminal_chain_is_immutable() {
        let mut chain = Chain::new("quick", "input");
        chain.start().unwrap();
        chain.fail().unwrap();

        assert!(chain.start().is_err());
        assert!(chain.fail().is_err());
        assert!(chain.record_hop(success(0, "a", "x", 0.0)).is_err());
        assert!(!chain.force_fail());
    }

    #[test]
    fn test_force_fail_from_pending() {
        let mut chain = Chain::new("quick", "input");
        assert!(chain.force_fail());
        assert_eq!(chain.status(), ChainStatus::Failed);
    }

    #[test]
    fn test_failed_hops_are_not_billed() {
        let mut chain = Chain::new("quick", "input");
        chain.start().unwrap();
        chain
            .record_hop(HopRecord::failure(0, "a", "p", &HopError::timeout(10), 10))
            .unwrap();
        chain.record_hop(success(1, "b", "ok", 0.1)).unwrap();

        assert_eq!(chain.total_cost(), 0.1);
        assert_eq!(chain.successful_hop_count(), 1);
        assert_eq!(chain.hops()[0].failure_kind, Some(HopFailureKind::Timeout));
    }

    #[test]
    fn test_sort_hops_by_index() {
        let mut chain = Chain::new("fan", "input");
        chain.start().unwrap();
        chain.record_hop(success(2, "c", "third", 0.0)).unwrap();
        chain.record_hop(success(0, "a", "first", 0.0)).unwrap();
        chain.record_hop(success(1, "b", "second", 0.0)).unwrap();
        chain.sort_hops();

        assert_eq!(chain.successful_contents(), vec!["first", "second", "third"]);
    }
}
