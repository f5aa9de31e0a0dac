//! Hop pattern domain - Named provider sequences and pattern selection

mod entity;
mod selector;

pub use entity::{HopPattern, PatternSet, AD_HOC_PATTERN_NAME};
pub use selector::{PatternSelector, SelectionRequest, SelectionThresholds};
