//! PMP Hop Router
//!
//! Routes one input through an ordered chain of model backends ("hops"):
//! - Pattern selection by name, explicit provider list, or input length
//! - Sequential refinement or parallel fan-out
//! - Per-hop and per-chain timeouts, sequential cost budget, fallback policy
//! - Quality, diversity and rarity scoring of the completed chain

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use infrastructure::credentials::EnvCredentialStore;
use infrastructure::services::HopRouter;

/// Create a router from configuration using environment credentials
pub fn create_router() -> anyhow::Result<HopRouter> {
    let config = AppConfig::load()?;
    create_router_with_config(&config)
}

/// Create a router from an already loaded configuration
pub fn create_router_with_config(config: &AppConfig) -> anyhow::Result<HopRouter> {
    let router = HopRouter::from_config(config, Arc::new(EnvCredentialStore::default()))?;
    Ok(router)
}
