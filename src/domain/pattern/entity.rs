//! Hop pattern entity and the preset collection

use serde::{Deserialize, Serialize};

use crate::domain::{ChainError, DomainError, ProviderCatalog};

/// Name given to patterns built from an explicit per-request provider list
pub const AD_HOC_PATTERN_NAME: &str = "custom";

/// Named, ordered sequence of provider IDs defining a chain's shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopPattern {
    name: String,
    #[serde(default)]
    description: String,
    providers: Vec<String>,
}

impl HopPattern {
    pub fn new(name: impl Into<String>, providers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            providers,
        }
    }

    /// Pattern synthesized from an explicit provider list
    pub fn ad_hoc(providers: Vec<String>) -> Self {
        Self::new(AD_HOC_PATTERN_NAME, providers)
            .with_description("Explicit provider list supplied with the request")
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    // Getters

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    pub fn provider_at(&self, index: usize) -> Option<&str> {
        self.providers.get(index).map(String::as_str)
    }

    pub fn hop_count(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Preflight check run before any hop is issued
    pub fn validate(&self, catalog: &ProviderCatalog, max_hops: usize) -> Result<(), ChainError> {
        if self.providers.is_empty() {
            return Err(ChainError::pattern_invalid(format!(
                "Pattern '{}' has no hops",
                self.name
            )));
        }

        if self.providers.len() > max_hops {
            return Err(ChainError::pattern_invalid(format!(
                "Pattern '{}' has {} hops (max {})",
                self.name,
                self.providers.len(),
                max_hops
            )));
        }

        if let Some(unknown) = self.providers.iter().find(|id| !catalog.contains(id)) {
            return Err(ChainError::provider_unknown(unknown.clone()));
        }

        Ok(())
    }
}

/// Preset patterns loaded at startup, looked up by name
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<HopPattern>,
    max_hops: usize,
}

impl PatternSet {
    /// Build the preset collection, failing fast on any invalid pattern
    pub fn new(
        patterns: Vec<HopPattern>,
        catalog: &ProviderCatalog,
        max_hops: usize,
    ) -> Result<Self, DomainError> {
        if max_hops == 0 {
            return Err(DomainError::configuration("max_hops must be greater than 0"));
        }

        for (position, pattern) in patterns.iter().enumerate() {
            pattern.validate(catalog, max_hops)?;

            if patterns[..position].iter().any(|p| p.name() == pattern.name()) {
                return Err(DomainError::validation(format!(
                    "Duplicate pattern name '{}'",
                    pattern.name()
                )));
            }
        }

        Ok(Self { patterns, max_hops })
    }

    pub fn get(&self, name: &str) -> Option<&HopPattern> {
        self.patterns.iter().find(|p| p.name() == name)
    }

    pub fn all(&self) -> &[HopPattern] {
        &self.patterns
    }

    pub fn max_hops(&self) -> usize {
        self.max_hops
    }
}
