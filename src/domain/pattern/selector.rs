//! Pattern selection - explicit name, explicit provider list, or inferred from input size

use serde::{Deserialize, Serialize};

use super::{HopPattern, PatternSet};
use crate::domain::{ChainError, DomainError};

/// Input-length boundaries used when no pattern is named
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionThresholds {
    /// Inputs shorter than this many characters use the short preset
    pub short_max_chars: usize,
    /// Inputs up to and including this many characters use the medium preset
    pub medium_max_chars: usize,
}

impl Default for SelectionThresholds {
    fn default() -> Self {
        Self {
            short_max_chars: 200,
            medium_max_chars: 500,
        }
    }
}

/// What the caller asked for
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionRequest<'a> {
    pub text: &'a str,
    pub pattern_name: Option<&'a str>,
    pub providers: Option<&'a [String]>,
}

impl<'a> SelectionRequest<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            ..Default::default()
        }
    }

    pub fn with_pattern_name(mut self, name: Option<&'a str>) -> Self {
        self.pattern_name = name;
        self
    }

    pub fn with_providers(mut self, providers: Option<&'a [String]>) -> Self {
        self.providers = providers;
        self
    }
}

/// Picks the hop pattern for a chain
///
/// Longer input never selects fewer hops: the presets are checked for
/// monotonic hop counts when the selector is built.
#[derive(Debug, Clone)]
pub struct PatternSelector {
    patterns: PatternSet,
    thresholds: SelectionThresholds,
    short: String,
    medium: String,
    long: String,
}

impl PatternSelector {
    pub fn new(
        patterns: PatternSet,
        thresholds: SelectionThresholds,
        short: impl Into<String>,
        medium: impl Into<String>,
        long: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let selector = Self {
            patterns,
            thresholds,
            short: short.into(),
            medium: medium.into(),
            long: long.into(),
        };

        selector.check()?;
        Ok(selector)
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.thresholds.short_max_chars > self.thresholds.medium_max_chars {
            return Err(DomainError::configuration(format!(
                "short_max_chars ({}) must not exceed medium_max_chars ({})",
                self.thresholds.short_max_chars, self.thresholds.medium_max_chars
            )));
        }

        let mut counts = Vec::with_capacity(3);

        for name in [&self.short, &self.medium, &self.long] {
            let pattern = self.patterns.get(name).ok_or_else(|| {
                DomainError::configuration(format!("Preset pattern '{}' is not defined", name))
            })?;
            counts.push(pattern.hop_count());
        }

        if counts.windows(2).any(|w| w[0] > w[1]) {
            return Err(DomainError::configuration(format!(
                "Preset hop counts must not decrease with input length (got {:?})",
                counts
            )));
        }

        Ok(())
    }

    /// Resolve the pattern for a request
    pub fn select(&self, request: &SelectionRequest<'_>) -> Result<HopPattern, ChainError> {
        if let Some(name) = request.pattern_name {
            return self
                .patterns
                .get(name)
                .cloned()
                .ok_or_else(|| ChainError::unknown_pattern(name));
        }

        if let Some(providers) = request.providers {
            return Ok(HopPattern::ad_hoc(providers.to_vec()));
        }

        let preset = self.preset_for_length(request.text.chars().count());

        self.patterns
            .get(preset)
            .cloned()
            .ok_or_else(|| ChainError::unknown_pattern(preset))
    }

    fn preset_for_length(&self, length: usize) -> &str {
        if length < self.thresholds.short_max_chars {
            &self.short
        } else if length <= self.thresholds.medium_max_chars {
            &self.medium
        } else {
            &self.long
        }
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn thresholds(&self) -> &SelectionThresholds {
        &self.thresholds
    }
}
