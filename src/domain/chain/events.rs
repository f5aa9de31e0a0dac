//! Chain lifecycle events and observers
//!
//! The executor reports progress through a [`ChainObserver`]. Nothing in the
//! executor depends on whether an observer is listening.

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::{ChainId, ExecutionMode, RarityTier};

#[cfg(test)]
use mockall::automock;

/// Progress notification emitted while a chain executes
#[derive(Debug, Clone, PartialEq)]
pub enum ChainEvent {
    ChainStarted {
        chain_id: ChainId,
        pattern_name: String,
        mode: ExecutionMode,
        hop_count: usize,
    },
    HopStarted {
        chain_id: ChainId,
        hop_index: usize,
        provider_id: String,
    },
    HopCompleted {
        chain_id: ChainId,
        hop_index: usize,
        provider_id: String,
        succeeded: bool,
        cost: f64,
        duration_ms: u64,
    },
    BudgetExceeded {
        chain_id: ChainId,
        total_cost: f64,
        budget: f64,
        skipped_hops: usize,
    },
    ChainCompleted {
        chain_id: ChainId,
        total_cost: f64,
        rarity_tier: RarityTier,
    },
    ChainFailed {
        chain_id: ChainId,
        reason: String,
    },
}

impl ChainEvent {
    pub fn chain_id(&self) -> ChainId {
        match self {
            Self::ChainStarted { chain_id, .. }
            | Self::HopStarted { chain_id, .. }
            | Self::HopCompleted { chain_id, .. }
            | Self::BudgetExceeded { chain_id, .. }
            | Self::ChainCompleted { chain_id, .. }
            | Self::ChainFailed { chain_id, .. } => *chain_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ChainStarted { .. } => "chain:started",
            Self::HopStarted { .. } => "hop:started",
            Self::HopCompleted { .. } => "hop:completed",
            Self::BudgetExceeded { .. } => "chain:budget_exceeded",
            Self::ChainCompleted { .. } => "chain:completed",
            Self::ChainFailed { .. } => "chain:failed",
        }
    }
}

/// Receiver of chain lifecycle events
#[cfg_attr(test, automock)]
pub trait ChainObserver: Send + Sync + std::fmt::Debug {
    fn on_event(&self, event: &ChainEvent);
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ChainObserver for NoopObserver {
    fn on_event(&self, _event: &ChainEvent) {}
}

/// Observer that writes events to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ChainObserver for TracingObserver {
    fn on_event(&self, event: &ChainEvent) {
        match event {
            ChainEvent::ChainStarted {
                chain_id,
                pattern_name,
                mode,
                hop_count,
            } => info!(%chain_id, pattern = %pattern_name, %mode, hop_count, "Chain started"),
            ChainEvent::HopStarted {
                chain_id,
                hop_index,
                provider_id,
            } => debug!(%chain_id, hop_index, provider = %provider_id, "Hop started"),
            ChainEvent::HopCompleted {
                chain_id,
                hop_index,
                provider_id,
                succeeded,
                cost,
                duration_ms,
            } => debug!(
                %chain_id,
                hop_index,
                provider = %provider_id,
                succeeded,
                cost,
                duration_ms,
                "Hop completed"
            ),
            ChainEvent::BudgetExceeded {
                chain_id,
                total_cost,
                budget,
                skipped_hops,
            } => warn!(%chain_id, total_cost, budget, skipped_hops, "Cost budget exceeded"),
            ChainEvent::ChainCompleted {
                chain_id,
                total_cost,
                rarity_tier,
            } => info!(%chain_id, total_cost, rarity = %rarity_tier, "Chain completed"),
            ChainEvent::ChainFailed { chain_id, reason } => {
                warn!(%chain_id, reason = %reason, "Chain failed")
            }
        }
    }
}

/// Observer that forwards events into a channel
///
/// A closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: UnboundedSender<ChainEvent>,
}

impl ChannelObserver {
    pub fn new(sender: UnboundedSender<ChainEvent>) -> Self {
        Self { sender }
    }
}

impl ChainObserver for ChannelObserver {
    fn on_event(&self, event: &ChainEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!(event = event.name(), "Event receiver dropped");
        }
    }
}
