use std::sync::Arc;

use tracing::info;

use super::http_client::HttpClient;
use super::{AnthropicBackend, LocalBackend, OpenAiBackend};
use crate::config::BackendsConfig;
use crate::domain::{BackendRegistry, CredentialStore};

/// Factory for the startup backend registry
#[derive(Debug)]
pub struct BackendFactory;

impl BackendFactory {
    /// Build one client per backend kind, all sharing a credential store
    pub fn build(config: &BackendsConfig, credentials: Arc<dyn CredentialStore>) -> BackendRegistry {
        Self::build_with_client(config, credentials, HttpClient::new())
    }

    pub fn build_with_client(
        config: &BackendsConfig,
        credentials: Arc<dyn CredentialStore>,
        http_client: HttpClient,
    ) -> BackendRegistry {
        let local = LocalBackend::with_base_url(
            http_client.clone(),
            credentials.clone(),
            &config.local.base_url,
        )
        .with_fallback(config.local.fallback_enabled);

        let openai =
            OpenAiBackend::with_base_url(http_client.clone(), credentials.clone(), &config.openai.base_url);

        let anthropic =
            AnthropicBackend::with_base_url(http_client, credentials.clone(), &config.anthropic.base_url);

        info!(
            credential_store = credentials.store_name(),
            local = %config.local.base_url,
            openai = %config.openai.base_url,
            anthropic = %config.anthropic.base_url,
            "Backend registry built"
        );

        BackendRegistry::new()
            .with_client(Arc::new(local))
            .with_client(Arc::new(openai))
            .with_client(Arc::new(anthropic))
    }
}
