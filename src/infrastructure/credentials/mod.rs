//! Credential store implementations

mod env_store;

pub use env_store::{EnvCredentialStore, EnvMapping};
