//! Lookup table from backend kind to client, built once at startup

use std::collections::HashMap;
use std::sync::Arc;

use super::BackendClient;
use crate::domain::{BackendKind, DomainError, HopError, ProviderCatalog};

/// Registry of backend clients keyed by [`BackendKind`]
#[derive(Debug, Default, Clone)]
pub struct BackendRegistry {
    clients: HashMap<BackendKind, Arc<dyn BackendClient>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client under the kind it reports
    pub fn with_client(mut self, client: Arc<dyn BackendClient>) -> Self {
        self.register(client);
        self
    }

    pub fn register(&mut self, client: Arc<dyn BackendClient>) {
        self.clients.insert(client.backend_kind(), client);
    }

    pub fn get(&self, kind: BackendKind) -> Result<Arc<dyn BackendClient>, HopError> {
        self.clients.get(&kind).cloned().ok_or_else(|| {
            HopError::upstream(kind.as_str(), "No backend client registered for this kind")
        })
    }

    pub fn kinds(&self) -> impl Iterator<Item = &BackendKind> {
        self.clients.keys()
    }

    /// Fail if any provider in the catalog has no client to serve it
    pub fn ensure_covers(&self, catalog: &ProviderCatalog) -> Result<(), DomainError> {
        for kind in catalog.backend_kinds() {
            if !self.clients.contains_key(&kind) {
                return Err(DomainError::configuration(format!(
                    "No backend client registered for backend kind '{}'",
                    kind
                )));
            }
        }

        Ok(())
    }
}
