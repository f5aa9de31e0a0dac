use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{BackendKind, HopError, Provider};

/// Normalized request for one hop
#[derive(Debug, Clone)]
pub struct HopRequest<'a> {
    pub provider: &'a Provider,
    pub prompt: &'a str,
    pub timeout: Duration,
}

impl<'a> HopRequest<'a> {
    pub fn new(provider: &'a Provider, prompt: &'a str, timeout: Duration) -> Self {
        Self {
            provider,
            prompt,
            timeout,
        }
    }
}

/// Successful hop result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HopOutput {
    pub content: String,
    pub tokens_used: u32,
    pub cost: f64,
}

impl HopOutput {
    pub fn new(content: impl Into<String>, tokens_used: u32, cost: f64) -> Self {
        Self {
            content: content.into(),
            tokens_used,
            cost,
        }
    }
}

/// Trait for backend clients (local server, OpenAI, Anthropic, etc.)
///
/// One implementation per [`BackendKind`]. The chain executor depends only on
/// this trait; wire protocols and authentication live behind it.
#[async_trait]
pub trait BackendClient: Send + Sync + std::fmt::Debug {
    /// Execute a single hop against the provider
    async fn execute_hop(&self, request: HopRequest<'_>) -> Result<HopOutput, HopError>;

    /// Backend kind served by this client
    fn backend_kind(&self) -> BackendKind;
}
