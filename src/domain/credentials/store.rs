use async_trait::async_trait;

use super::Credential;
use crate::domain::{BackendKind, DomainError};

#[cfg(test)]
use mockall::automock;

/// Capability handed to backend clients for fetching secrets per call
///
/// Constructed once at process start and passed explicitly into the backend
/// factory; there is no global credential state.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    /// Fetch the credential for a backend kind
    async fn credential_for(&self, backend_kind: BackendKind) -> Result<Credential, DomainError>;

    /// Check if this store can serve the given backend kind
    fn supports(&self, backend_kind: BackendKind) -> bool;

    /// Store name for logging/debugging
    fn store_name(&self) -> &'static str;
}
