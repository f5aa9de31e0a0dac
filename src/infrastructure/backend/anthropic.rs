use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::http_client::HttpClientTrait;
use crate::domain::{
    BackendClient, BackendKind, CredentialStore, HopError, HopOutput, HopRequest,
};

pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages API backend
#[derive(Debug)]
pub struct AnthropicBackend<C: HttpClientTrait> {
    client: C,
    credentials: Arc<dyn CredentialStore>,
    base_url: String,
}

impl<C: HttpClientTrait> AnthropicBackend<C> {
    pub fn new(client: C, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::with_base_url(client, credentials, DEFAULT_ANTHROPIC_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        credentials: Arc<dyn CredentialStore>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            credentials,
            base_url,
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn build_request(&self, request: &HopRequest<'_>) -> serde_json::Value {
        serde_json::json!({
            "model": request.provider.model_name(),
            "max_tokens": request.provider.max_tokens(),
            "messages": [{ "role": "user", "content": request.prompt }],
        })
    }

    fn parse_response(
        &self,
        request: &HopRequest<'_>,
        json: serde_json::Value,
    ) -> Result<HopOutput, HopError> {
        let provider_id = request.provider.id();
        let response: AnthropicResponse = serde_json::from_value(json).map_err(|e| {
            HopError::upstream(provider_id, format!("Failed to parse response: {}", e))
        })?;

        let content = response
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if content.trim().is_empty() {
            return Err(HopError::upstream(provider_id, "Empty completion"));
        }

        let tokens_used = response
            .usage
            .map(|u| u.input_tokens.saturating_add(u.output_tokens))
            .unwrap_or(0);

        Ok(HopOutput::new(
            content,
            tokens_used,
            request.provider.cost_for_tokens(tokens_used),
        ))
    }
}

#[async_trait]
impl<C: HttpClientTrait> BackendClient for AnthropicBackend<C> {
    async fn execute_hop(&self, request: HopRequest<'_>) -> Result<HopOutput, HopError> {
        let credential = self
            .credentials
            .credential_for(BackendKind::Anthropic)
            .await
            .map_err(|e| HopError::credential_missing(e.to_string()))?;

        let headers = vec![
            ("x-api-key", credential.api_key()),
            ("anthropic-version", ANTHROPIC_VERSION),
            ("Content-Type", "application/json"),
        ];

        let url = self.messages_url();
        let body = self.build_request(&request);

        debug!(provider = request.provider.id(), url = %url, "Calling Anthropic backend");

        let json = self
            .client
            .post_json(&url, headers, &body, request.timeout)
            .await
            .map_err(|e| e.into_hop_error(request.provider.id(), request.timeout))?;

        self.parse_response(&request, json)
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::Anthropic
    }
}

// Anthropic API types

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}
