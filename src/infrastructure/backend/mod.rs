//! HTTP backend clients and the registry factory

mod anthropic;
mod factory;
mod http_client;
mod local;
mod openai;

pub use anthropic::{AnthropicBackend, DEFAULT_ANTHROPIC_BASE_URL};
pub use factory::BackendFactory;
pub use http_client::{HttpClient, HttpClientTrait, HttpError};
pub use local::{pick_fallback_text, LocalBackend, DEFAULT_LOCAL_BASE_URL};
pub use openai::{OpenAiBackend, DEFAULT_OPENAI_BASE_URL};
