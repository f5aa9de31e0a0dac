//! Hop router service - the caller-facing entry point
//!
//! Selects a pattern, resolves execution settings and drives the chain.
//! Every outcome, including selection and preflight failures, comes back as a
//! well-formed [`ChainResponse`].

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::domain::{
    on_chain_failed, Chain, ChainExecutor, ChainObserver, ChainResponse, CredentialStore,
    DomainError, ExecutionMode, ExecutionSettings, PatternSelector, ProviderCatalog,
    SelectionRequest, AD_HOC_PATTERN_NAME,
};
use crate::infrastructure::backend::BackendFactory;

/// One unit of input plus optional per-request overrides
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub text: String,
    #[serde(default)]
    pub pattern_name: Option<String>,
    #[serde(default)]
    pub providers: Option<Vec<String>>,
    #[serde(default)]
    pub mode: Option<ExecutionMode>,
    #[serde(default)]
    pub cost_budget: Option<f64>,
    #[serde(default)]
    pub per_hop_timeout_ms: Option<u64>,
    #[serde(default)]
    pub chain_timeout_ms: Option<u64>,
}

impl ProcessRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_pattern_name(mut self, name: impl Into<String>) -> Self {
        self.pattern_name = Some(name.into());
        self
    }

    pub fn with_providers(mut self, providers: Vec<String>) -> Self {
        self.providers = Some(providers);
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_cost_budget(mut self, budget: f64) -> Self {
        self.cost_budget = Some(budget);
        self
    }

    pub fn with_per_hop_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.per_hop_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_chain_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.chain_timeout_ms = Some(timeout_ms);
        self
    }
}

/// Routes input through hop chains
#[derive(Debug, Clone)]
pub struct HopRouter {
    selector: PatternSelector,
    executor: ChainExecutor,
    defaults: ExecutionSettings,
}

impl HopRouter {
    pub fn new(selector: PatternSelector, executor: ChainExecutor, defaults: ExecutionSettings) -> Self {
        Self {
            selector,
            executor,
            defaults,
        }
    }

    /// Build the router from configuration, failing fast on any invalid entry
    pub fn from_config(
        config: &AppConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, DomainError> {
        config.validate()?;

        let catalog = Arc::new(config.build_catalog()?);
        let selector = config.build_selector(&catalog)?;

        let registry = BackendFactory::build(&config.backends, credentials);
        registry.ensure_covers(&catalog)?;

        info!(
            providers = catalog.len(),
            patterns = selector.patterns().all().len(),
            max_hops = config.router.max_hops,
            "Hop router ready"
        );

        let executor = ChainExecutor::new(catalog, Arc::new(registry));
        Ok(Self::new(selector, executor, config.router.settings()))
    }

    pub fn with_observer(mut self, observer: Arc<dyn ChainObserver>) -> Self {
        self.executor = self.executor.with_observer(observer);
        self
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        self.executor.catalog()
    }

    pub fn selector(&self) -> &PatternSelector {
        &self.selector
    }

    pub fn defaults(&self) -> &ExecutionSettings {
        &self.defaults
    }

    /// Resolve request overrides against configured defaults
    pub fn settings_for(&self, request: &ProcessRequest) -> ExecutionSettings {
        let mut settings = self.defaults;

        if let Some(mode) = request.mode {
            settings.mode = mode;
        }
        if let Some(budget) = request.cost_budget {
            settings.cost_budget = budget;
        }
        if let Some(ms) = request.per_hop_timeout_ms {
            settings.per_hop_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = request.chain_timeout_ms {
            settings.chain_timeout = Duration::from_millis(ms);
        }

        settings
    }

    /// Process one input end to end; never fails
    #[instrument(skip(self, request), fields(input_chars = request.text.chars().count()))]
    pub async fn process_input(&self, request: ProcessRequest) -> ChainResponse {
        let started = Instant::now();

        let selection = SelectionRequest::new(&request.text)
            .with_pattern_name(request.pattern_name.as_deref())
            .with_providers(request.providers.as_deref());

        let pattern = match self.selector.select(&selection) {
            Ok(pattern) => pattern,
            Err(e) => {
                let name = request.pattern_name.as_deref().unwrap_or(AD_HOC_PATTERN_NAME);
                let mut chain = Chain::new(name, request.text.as_str());
                chain.force_fail();
                return on_chain_failed(&chain, &e);
            }
        };

        let settings = self.settings_for(&request);
        let mut chain = Chain::new(pattern.name(), request.text.as_str());

        match self.executor.execute(&mut chain, &pattern, &settings).await {
            Ok(response) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                info!(
                    chain_id = %chain.id(),
                    pattern = pattern.name(),
                    mode = %settings.mode,
                    hops = chain.hops().len(),
                    total_cost = chain.total_cost(),
                    duration_ms,
                    "Input processed"
                );
                ChainResponse::completed(&chain, response, duration_ms)
            }
            Err(e) => on_chain_failed(&chain, &e),
        }
    }
}
