//! Provider catalog domain - Backend identities with cost and quality metadata

mod catalog;
mod entity;

pub use catalog::ProviderCatalog;
pub use entity::{validate_provider_id, BackendKind, Provider, MAX_PROVIDER_ID_LENGTH};
