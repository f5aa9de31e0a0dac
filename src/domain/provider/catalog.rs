//! Read-only provider catalog shared by all chains

use std::collections::HashMap;

use super::{BackendKind, Provider};
use crate::domain::{DomainError, HopError};

/// Process-wide registry of available providers
///
/// Built once at startup and never mutated, so it can be shared behind an
/// `Arc` without locking.
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    providers: Vec<Provider>,
    index: HashMap<String, usize>,
}

impl ProviderCatalog {
    /// Build a catalog, rejecting invalid or duplicate entries
    pub fn new(providers: Vec<Provider>) -> Result<Self, DomainError> {
        let mut index = HashMap::with_capacity(providers.len());

        for (position, provider) in providers.iter().enumerate() {
            provider.validate()?;

            if index.insert(provider.id().to_string(), position).is_some() {
                return Err(DomainError::validation(format!(
                    "Duplicate provider ID '{}'",
                    provider.id()
                )));
            }
        }

        Ok(Self { providers, index })
    }

    /// Find a provider by ID
    pub fn lookup(&self, id: &str) -> Result<&Provider, HopError> {
        self.index
            .get(id)
            .map(|&position| &self.providers[position])
            .ok_or_else(|| HopError::provider_unknown(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All providers in insertion order
    pub fn all(&self) -> &[Provider] {
        &self.providers
    }

    pub fn by_kind(&self, kind: BackendKind) -> impl Iterator<Item = &Provider> {
        self.providers
            .iter()
            .filter(move |p| p.backend_kind() == kind)
    }

    /// Distinct backend kinds used by the catalog, in first-seen order
    pub fn backend_kinds(&self) -> Vec<BackendKind> {
        let mut kinds = Vec::new();

        for provider in &self.providers {
            if !kinds.contains(&provider.backend_kind()) {
                kinds.push(provider.backend_kind());
            }
        }

        kinds
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
