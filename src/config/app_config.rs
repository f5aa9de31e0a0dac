use std::time::Duration;

use serde::Deserialize;

use crate::domain::chain::DEFAULT_MAX_HOPS;
use crate::domain::{
    BackendKind, DomainError, ExecutionMode, ExecutionSettings, FallbackPolicy, HopPattern,
    PatternSelector, PatternSet, Provider, ProviderCatalog, SelectionThresholds,
};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    #[serde(default = "default_patterns")]
    pub patterns: Vec<PatternConfig>,
    #[serde(default)]
    pub backends: BackendsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Chain execution defaults; request fields override them per call
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub max_hops: usize,
    pub default_per_hop_timeout_ms: u64,
    pub default_chain_timeout_ms: u64,
    pub default_cost_budget: f64,
    pub fallback_policy: FallbackPolicy,
    pub mode: ExecutionMode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub short_max_chars: usize,
    pub medium_max_chars: usize,
    pub short_pattern: String,
    pub medium_pattern: String,
    pub long_pattern: String,
}

/// Catalog entry as written in configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub display_name: String,
    pub backend_kind: BackendKind,
    #[serde(default)]
    pub cost_per_token: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_quality_score")]
    pub quality_score: f64,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatternConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub providers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendsConfig {
    #[serde(default)]
    pub local: LocalBackendConfig,
    #[serde(default = "default_openai_backend")]
    pub openai: RemoteBackendConfig,
    #[serde(default = "default_anthropic_backend")]
    pub anthropic: RemoteBackendConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalBackendConfig {
    pub base_url: String,
    pub fallback_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteBackendConfig {
    pub base_url: String,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_quality_score() -> f64 {
    0.5
}

fn default_openai_backend() -> RemoteBackendConfig {
    RemoteBackendConfig {
        base_url: "https://api.openai.com".to_string(),
    }
}

fn default_anthropic_backend() -> RemoteBackendConfig {
    RemoteBackendConfig {
        base_url: "https://api.anthropic.com".to_string(),
    }
}

fn provider(
    id: &str,
    display_name: &str,
    backend_kind: BackendKind,
    model: &str,
    cost_per_token: f64,
    quality_score: f64,
    specialty: &str,
) -> ProviderConfig {
    ProviderConfig {
        id: id.to_string(),
        display_name: display_name.to_string(),
        backend_kind,
        cost_per_token,
        max_tokens: default_max_tokens(),
        quality_score,
        specialty: specialty.to_string(),
        model: Some(model.to_string()),
    }
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        provider("local-llama", "Llama 3.1 (local)", BackendKind::Local, "llama3.1", 0.0, 0.62, "general"),
        provider("local-mistral", "Mistral (local)", BackendKind::Local, "mistral", 0.0, 0.58, "drafting"),
        provider("gpt-4o-mini", "GPT-4o mini", BackendKind::OpenAi, "gpt-4o-mini", 0.000_000_6, 0.78, "speed"),
        provider("gpt-4o", "GPT-4o", BackendKind::OpenAi, "gpt-4o", 0.000_01, 0.90, "reasoning"),
        provider("gpt-4.1", "GPT-4.1", BackendKind::OpenAi, "gpt-4.1", 0.000_008, 0.92, "analysis"),
        provider("claude-haiku", "Claude Haiku", BackendKind::Anthropic, "claude-3-5-haiku-latest", 0.000_004, 0.80, "summarization"),
        provider("claude-sonnet", "Claude Sonnet", BackendKind::Anthropic, "claude-3-5-sonnet-latest", 0.000_015, 0.94, "writing"),
    ]
}

fn pattern(name: &str, description: &str, providers: &[&str]) -> PatternConfig {
    PatternConfig {
        name: name.to_string(),
        description: description.to_string(),
        providers: providers.iter().map(|p| p.to_string()).collect(),
    }
}

fn default_patterns() -> Vec<PatternConfig> {
    vec![
        pattern(
            "quick",
            "Local draft refined by one hosted model",
            &["local-llama", "gpt-4o-mini"],
        ),
        pattern(
            "balanced",
            "Draft, critique and refine across three backends",
            &["local-llama", "gpt-4o-mini", "claude-haiku", "gpt-4o"],
        ),
        pattern(
            "deep",
            "Six-hop refinement across every backend",
            &[
                "local-llama",
                "local-mistral",
                "gpt-4o-mini",
                "claude-haiku",
                "gpt-4.1",
                "claude-sonnet",
            ],
        ),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            router: RouterConfig::default(),
            selection: SelectionConfig::default(),
            providers: default_providers(),
            patterns: default_patterns(),
            backends: BackendsConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            default_per_hop_timeout_ms: 30_000,
            default_chain_timeout_ms: 120_000,
            default_cost_budget: 0.50,
            fallback_policy: FallbackPolicy::default(),
            mode: ExecutionMode::default(),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        let thresholds = SelectionThresholds::default();
        Self {
            short_max_chars: thresholds.short_max_chars,
            medium_max_chars: thresholds.medium_max_chars,
            short_pattern: "quick".to_string(),
            medium_pattern: "balanced".to_string(),
            long_pattern: "deep".to_string(),
        }
    }
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            local: LocalBackendConfig::default(),
            openai: default_openai_backend(),
            anthropic: default_anthropic_backend(),
        }
    }
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            fallback_enabled: true,
        }
    }
}

impl ProviderConfig {
    pub fn to_provider(&self) -> Provider {
        let provider = Provider::new(&self.id, &self.display_name, self.backend_kind)
            .with_cost_per_token(self.cost_per_token)
            .with_max_tokens(self.max_tokens)
            .with_quality_score(self.quality_score)
            .with_specialty(&self.specialty);

        match &self.model {
            Some(model) => provider.with_model(model),
            None => provider,
        }
    }
}

impl PatternConfig {
    pub fn to_pattern(&self) -> HopPattern {
        HopPattern::new(&self.name, self.providers.clone()).with_description(&self.description)
    }
}

impl RouterConfig {
    /// Execution settings before per-request overrides
    pub fn settings(&self) -> ExecutionSettings {
        ExecutionSettings::default()
            .with_mode(self.mode)
            .with_cost_budget(self.default_cost_budget)
            .with_per_hop_timeout(Duration::from_millis(self.default_per_hop_timeout_ms))
            .with_chain_timeout(Duration::from_millis(self.default_chain_timeout_ms))
            .with_fallback_policy(self.fallback_policy)
            .with_max_hops(self.max_hops)
    }
}

impl SelectionConfig {
    pub fn thresholds(&self) -> SelectionThresholds {
        SelectionThresholds {
            short_max_chars: self.short_max_chars,
            medium_max_chars: self.medium_max_chars,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("HOPS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate the router settings that have no home in the catalog
    pub fn validate(&self) -> Result<(), DomainError> {
        let router = &self.router;

        if router.max_hops == 0 {
            return Err(DomainError::configuration("router.max_hops must be greater than 0"));
        }

        if router.default_per_hop_timeout_ms == 0 || router.default_chain_timeout_ms == 0 {
            return Err(DomainError::configuration(
                "router timeouts must be greater than 0",
            ));
        }

        if !router.default_cost_budget.is_finite() || router.default_cost_budget < 0.0 {
            return Err(DomainError::configuration(format!(
                "router.default_cost_budget must be >= 0, got {}",
                router.default_cost_budget
            )));
        }

        Ok(())
    }

    pub fn build_catalog(&self) -> Result<ProviderCatalog, DomainError> {
        ProviderCatalog::new(self.providers.iter().map(ProviderConfig::to_provider).collect())
    }

    pub fn build_selector(&self, catalog: &ProviderCatalog) -> Result<PatternSelector, DomainError> {
        let patterns = PatternSet::new(
            self.patterns.iter().map(PatternConfig::to_pattern).collect(),
            catalog,
            self.router.max_hops,
        )?;

        PatternSelector::new(
            patterns,
            self.selection.thresholds(),
            &self.selection.short_pattern,
            &self.selection.medium_pattern,
            &self.selection.long_pattern,
        )
    }
}
