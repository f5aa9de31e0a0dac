use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::http_client::HttpClientTrait;
use crate::domain::{
    BackendClient, BackendKind, CredentialStore, HopError, HopOutput, HopRequest,
};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// OpenAI-compatible chat completions backend
#[derive(Debug)]
pub struct OpenAiBackend<C: HttpClientTrait> {
    client: C,
    credentials: Arc<dyn CredentialStore>,
    base_url: String,
}

impl<C: HttpClientTrait> OpenAiBackend<C> {
    pub fn new(client: C, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::with_base_url(client, credentials, DEFAULT_OPENAI_BASE_URL)
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

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request(&self, request: &HopRequest<'_>) -> serde_json::Value {
        serde_json::json!({
            "model": request.provider.model_name(),
            "messages": [{ "role": "user", "content": request.prompt }],
            "max_tokens": request.provider.max_tokens(),
            "stream": false,
        })
    }

    fn parse_response(
        &self,
        request: &HopRequest<'_>,
        json: serde_json::Value,
    ) -> Result<HopOutput, HopError> {
        let provider_id = request.provider.id();
        let response: OpenAiResponse = serde_json::from_value(json).map_err(|e| {
            HopError::upstream(provider_id, format!("Failed to parse response: {}", e))
        })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| HopError::upstream(provider_id, "Empty completion"))?;

        let tokens_used = response
            .usage
            .map(|u| u.total_tokens
                    .unwrap_or(u.prompt_tokens.saturating_add(u.completion_tokens)))
            .unwrap_or(0);

        Ok(HopOutput::new(
            content,
            tokens_used,
            request.provider.cost_for_tokens(tokens_used),
        ))
    }
}

#[async_trait]
impl<C: HttpClientTrait> BackendClient for OpenAiBackend<C> {
    async fn execute_hop(&self, request: HopRequest<'_>) -> Result<HopOutput, HopError> {
        let credential = self
            .credentials
            .credential_for(BackendKind::OpenAi)
            .await
            .map_err(|e| HopError::credential_missing(e.to_string()))?;

        let auth_header = format!("Bearer {}", credential.api_key());
        let mut headers = vec![
            ("Authorization", auth_header.as_str()),
            ("Content-Type", "application/json"),
        ];
        if let Some(organization) = credential.get_param("organization") {
            headers.push(("OpenAI-Organization", organization));
        }

        let url = self.chat_completions_url();
        let body = self.build_request(&request);

        debug!(provider = request.provider.id(), url = %url, "Calling OpenAI-compatible backend");

        let json = self
            .client
            .post_json(&url, headers, &body, request.timeout)
            .await
            .map_err(|e| e.into_hop_error(request.provider.id(), request.timeout))?;

        self.parse_response(&request, json)
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::OpenAi
    }
}

// OpenAI API types

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    total_tokens: Option<u32>,
}
