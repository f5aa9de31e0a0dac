//! Chain executor - Drives a hop pattern in sequential or parallel mode
//!
//! Enforces the per-hop timeout, the chain-level timeout, the sequential cost
//! budget and the hop fallback policy. Every hop outcome is recorded on the
//! [`Chain`], including failures.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use super::{
    score, synthesize, Chain, ChainEvent, ChainId, ChainObserver, ExecutionMode, FallbackPolicy,
    HopPosition, HopRecord, PromptTemplates, TracingObserver,
};
use crate::domain::{
    BackendRegistry, ChainError, HopError, HopOutput, HopPattern, HopRequest, ProviderCatalog,
};

/// Default cap on pattern length
pub const DEFAULT_MAX_HOPS: usize = 8;

/// Per-execution knobs resolved from configuration and request overrides
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionSettings {
    pub mode: ExecutionMode,
    pub cost_budget: f64,
    pub per_hop_timeout: Duration,
    pub chain_timeout: Duration,
    pub fallback_policy: FallbackPolicy,
    pub max_hops: usize,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Sequential,
            cost_budget: 0.50,
            per_hop_timeout: Duration::from_secs(30),
            chain_timeout: Duration::from_secs(120),
            fallback_policy: FallbackPolicy::Continue,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }
}

impl ExecutionSettings {
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_cost_budget(mut self, budget: f64) -> Self {
        self.cost_budget = budget;
        self
    }

    pub fn with_per_hop_timeout(mut self, timeout: Duration) -> Self {
        self.per_hop_timeout = timeout;
        self
    }

    pub fn with_chain_timeout(mut self, timeout: Duration) -> Self {
        self.chain_timeout = timeout;
        self
    }

    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Reject settings that would make budget or timeout enforcement meaningless
    pub fn validate(&self) -> Result<(), ChainError> {
        if !self.cost_budget.is_finite() || self.cost_budget < 0.0 {
            return Err(ChainError::settings_invalid(format!(
                "cost budget must be a finite value >= 0, got {}",
                self.cost_budget
            )));
        }

        if self.per_hop_timeout.is_zero() || self.chain_timeout.is_zero() {
            return Err(ChainError::settings_invalid("timeouts must be greater than 0"));
        }

        Ok(())
    }
}

/// Chain executor - runs hop patterns against registered backends
#[derive(Debug, Clone)]
pub struct ChainExecutor {
    catalog: Arc<ProviderCatalog>,
    backends: Arc<BackendRegistry>,
    observer: Arc<dyn ChainObserver>,
    templates: PromptTemplates,
}

impl ChainExecutor {
    pub fn new(catalog: Arc<ProviderCatalog>, backends: Arc<BackendRegistry>) -> Self {
        Self {
            catalog,
            backends,
            observer: Arc::new(TracingObserver),
            templates: PromptTemplates::default(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ChainObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Execute a pattern, mutating the chain until it is terminal
    ///
    /// Returns the synthesized response on completion. On error the chain has
    /// already been moved to `Failed` with whatever hops were recorded.
    pub async fn execute(
        &self,
        chain: &mut Chain,
        pattern: &HopPattern,
        settings: &ExecutionSettings,
    ) -> Result<String, ChainError> {
        let result = self.run(chain, pattern, settings).await;

        match &result {
            Ok(_) => {
                let rarity_tier = chain.metadata().map(|m| m.rarity_tier).unwrap_or_default();
                self.observer.on_event(&ChainEvent::ChainCompleted {
                    chain_id: chain.id(),
                    total_cost: chain.total_cost(),
                    rarity_tier,
                });
            }
            Err(e) => {
                chain.force_fail();
                self.observer.on_event(&ChainEvent::ChainFailed {
                    chain_id: chain.id(),
                    reason: e.to_string(),
                });
            }
        }

        result
    }

    async fn run(
        &self,
        chain: &mut Chain,
        pattern: &HopPattern,
        settings: &ExecutionSettings,
    ) -> Result<String, ChainError> {
        settings.validate()?;
        pattern.validate(&self.catalog, settings.max_hops)?;
        chain.start()?;

        self.observer.on_event(&ChainEvent::ChainStarted {
            chain_id: chain.id(),
            pattern_name: pattern.name().to_string(),
            mode: settings.mode,
            hop_count: pattern.hop_count(),
        });

        let chain_timeout_ms = settings.chain_timeout.as_millis() as u64;

        let outcome = timeout(settings.chain_timeout, self.drive(chain, pattern, settings)).await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    chain_id = %chain.id(),
                    timeout_ms = chain_timeout_ms,
                    hops_recorded = chain.hops().len(),
                    "Chain timeout exceeded"
                );
                Err(ChainError::ChainTimeoutExceeded {
                    timeout_ms: chain_timeout_ms,
                })
            }
        }
    }

    async fn drive(
        &self,
        chain: &mut Chain,
        pattern: &HopPattern,
        settings: &ExecutionSettings,
    ) -> Result<String, ChainError> {
        match settings.mode {
            ExecutionMode::Sequential => self.run_sequential(chain, pattern, settings).await?,
            ExecutionMode::Parallel => self.run_parallel(chain, pattern, settings).await?,
        }

        if chain.successful_hop_count() == 0 {
            return Err(ChainError::AllHopsFailed {
                attempted: chain.hops().len(),
            });
        }

        let metadata = score(chain, &self.catalog);
        let response = synthesize(chain, settings.mode, &self.catalog);
        chain.complete(metadata, response.clone())?;

        Ok(response)
    }

    async fn run_sequential(
        &self,
        chain: &mut Chain,
        pattern: &HopPattern,
        settings: &ExecutionSettings,
    ) -> Result<(), ChainError> {
        let hop_count = pattern.hop_count();

        for (index, provider_id) in pattern.providers().iter().enumerate() {
            let position = HopPosition::for_index(index, hop_count);
            let prompt =
                self.templates
                    .render(position, chain.original_input(), &chain.successful_contents());

            let (record, error) = self
                .run_hop(chain.id(), index, provider_id, prompt, settings.per_hop_timeout)
                .await;
            chain.record_hop(record)?;

            if let Some(source) = error {
                match settings.fallback_policy {
                    FallbackPolicy::Abort => {
                        return Err(ChainError::HopAborted {
                            hop_index: index,
                            provider_id: provider_id.clone(),
                            source,
                        });
                    }
                    FallbackPolicy::Continue => continue,
                }
            }

            let remaining = hop_count - index - 1;
            if chain.total_cost() > settings.cost_budget && remaining > 0 {
                warn!(
                    chain_id = %chain.id(),
                    total_cost = chain.total_cost(),
                    budget = settings.cost_budget,
                    skipped_hops = remaining,
                    "Cost budget exceeded, skipping remaining hops"
                );
                self.observer.on_event(&ChainEvent::BudgetExceeded {
                    chain_id: chain.id(),
                    total_cost: chain.total_cost(),
                    budget: settings.cost_budget,
                    skipped_hops: remaining,
                });
                break;
            }
        }

        Ok(())
    }

    /// Fan out every hop with the original input as sole context
    ///
    /// The fallback policy and cost budget are not applied here: every hop is
    /// already in flight before any cost is known.
    async fn run_parallel(
        &self,
        chain: &mut Chain,
        pattern: &HopPattern,
        settings: &ExecutionSettings,
    ) -> Result<(), ChainError> {
        let chain_id = chain.id();
        let prompt = self
            .templates
            .render(HopPosition::First, chain.original_input(), &[]);

        let mut in_flight: FuturesUnordered<_> = pattern
            .providers()
            .iter()
            .enumerate()
            .map(|(index, provider_id)| {
                self.run_hop(
                    chain_id,
                    index,
                    provider_id,
                    prompt.clone(),
                    settings.per_hop_timeout,
                )
            })
            .collect();

        while let Some((record, _)) = in_flight.next().await {
            chain.record_hop(record)?;
        }
        chain.sort_hops();

        if chain.total_cost() > settings.cost_budget {
            debug!(
                chain_id = %chain_id,
                total_cost = chain.total_cost(),
                budget = settings.cost_budget,
                "Parallel chain finished over budget"
            );
            self.observer.on_event(&ChainEvent::BudgetExceeded {
                chain_id,
                total_cost: chain.total_cost(),
                budget: settings.cost_budget,
                skipped_hops: 0,
            });
        }

        Ok(())
    }

    /// Run one hop and turn its outcome into a record
    async fn run_hop(
        &self,
        chain_id: ChainId,
        hop_index: usize,
        provider_id: &str,
        prompt: String,
        hop_timeout: Duration,
    ) -> (HopRecord, Option<HopError>) {
        self.observer.on_event(&ChainEvent::HopStarted {
            chain_id,
            hop_index,
            provider_id: provider_id.to_string(),
        });

        let started = Instant::now();
        let outcome = self.call_backend(provider_id, &prompt, hop_timeout).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let (record, error) = match outcome {
            Ok(output) => (
                HopRecord::success(hop_index, provider_id, prompt, output, duration_ms),
                None,
            ),
            Err(e) => {
                warn!(
                    chain_id = %chain_id,
                    hop_index,
                    provider = provider_id,
                    kind = %e.kind(),
                    "Hop failed: {}",
                    e
                );
                (
                    HopRecord::failure(hop_index, provider_id, prompt, &e, duration_ms),
                    Some(e),
                )
            }
        };

        self.observer.on_event(&ChainEvent::HopCompleted {
            chain_id,
            hop_index,
            provider_id: provider_id.to_string(),
            succeeded: record.succeeded,
            cost: record.cost,
            duration_ms,
        });

        (record, error)
    }

    async fn call_backend(
        &self,
        provider_id: &str,
        prompt: &str,
        hop_timeout: Duration,
    ) -> Result<HopOutput, HopError> {
        let provider = self.catalog.lookup(provider_id)?;
        let client = self.backends.get(provider.backend_kind())?;
        let request = HopRequest::new(provider, prompt, hop_timeout);

        match timeout(hop_timeout, client.execute_hop(request)).await {
            Ok(result) => result,
            Err(_) => Err(HopError::timeout(hop_timeout.as_millis() as u64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backend::mock::MockBackendClient;
    use crate::domain::chain::{ChainStatus, MockChainObserver, RarityTier};
    use crate::domain::{BackendKind, HopFailureKind, Provider};

    fn catalog() -> Arc<ProviderCatalog> {
        Arc::new(
            ProviderCatalog::new(vec![
                Provider::new("local", "Local", BackendKind::Local).with_quality_score(0.6),
                Provider::new("alpha", "Alpha", BackendKind::OpenAi).with_quality_score(0.9),
                Provider::new("beta", "Beta", BackendKind::OpenAi).with_quality_score(0.8),
                Provider::new("gamma", "Gamma", BackendKind::OpenAi).with_quality_score(0.7),
            ])
            .unwrap(),
        )
    }

    fn executor(local: MockBackendClient, remote: MockBackendClient) -> ChainExecutor {
        let registry = BackendRegistry::new()
            .with_client(Arc::new(local))
            .with_client(Arc::new(remote));
        ChainExecutor::new(catalog(), Arc::new(registry))
    }

    fn pattern(providers: &[&str]) -> HopPattern {
        HopPattern::new("test", providers.iter().map(|p| p.to_string()).collect())
    }

    fn local_client() -> MockBackendClient {
        MockBackendClient::new(BackendKind::Local).with_reply("local", "local answer", 0.0)
    }

    #[tokio::test]
    async fn test_sample_budget_scenario_runs_all_three_hops() {
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_reply("alpha", "alpha answer", 0.30)
            .with_reply("beta", "beta answer", 0.30);
        let executor = executor(local_client(), remote);
        let settings = ExecutionSettings::default().with_cost_budget(0.50);

        let mut chain = Chain::new("test", "What is Rust?");
        let response = executor
            .execute(&mut chain, &pattern(&["local", "alpha", "beta"]), &settings)
            .await
            .unwrap();

        assert_eq!(response, "beta answer");
        assert_eq!(chain.status(), ChainStatus::Completed);
        assert_eq!(chain.hops().len(), 3);
        assert!((chain.total_cost() - 0.60).abs() < 1e-9);
        assert_eq!(chain.final_response(), Some("beta answer"));
    }

    #[tokio::test]
    async fn test_budget_stop_skips_remaining_hops() {
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_reply("alpha", "alpha answer", 0.60)
            .with_reply("beta", "beta answer", 0.30);
        let executor = executor(local_client(), remote);
        let settings = ExecutionSettings::default().with_cost_budget(0.50);

        let mut chain = Chain::new("test", "q");
        let response = executor
            .execute(&mut chain, &pattern(&["local", "alpha", "beta"]), &settings)
            .await
            .unwrap();

        assert_eq!(response, "alpha answer");
        assert_eq!(chain.hops().len(), 2);
        assert!(chain.hops().iter().all(|h| h.provider_id != "beta"));
        assert!((chain.total_cost() - 0.60).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_budget_equal_to_cost_does_not_stop() {
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_reply("alpha", "alpha answer", 0.50)
            .with_reply("beta", "beta answer", 0.0);
        let executor = executor(local_client(), remote);
        let settings = ExecutionSettings::default().with_cost_budget(0.50);

        let mut chain = Chain::new("test", "q");
        executor
            .execute(&mut chain, &pattern(&["alpha", "beta"]), &settings)
            .await
            .unwrap();

        assert_eq!(chain.hops().len(), 2);
    }

    #[tokio::test]
    async fn test_parallel_ignores_budget() {
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_reply("alpha", "alpha answer", 0.60)
            .with_reply("beta", "beta answer", 0.60);
        let executor = executor(local_client(), remote);
        let settings = ExecutionSettings::default()
            .with_mode(ExecutionMode::Parallel)
            .with_cost_budget(0.10);

        let mut chain = Chain::new("test", "q");
        executor
            .execute(&mut chain, &pattern(&["local", "alpha", "beta"]), &settings)
            .await
            .unwrap();

        assert_eq!(chain.hops().len(), 3);
        assert!((chain.total_cost() - 1.20).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_records_sorted_by_index_despite_arrival_order() {
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_delayed_reply("alpha", "slow", 0.0, Duration::from_millis(300))
            .with_delayed_reply("beta", "medium", 0.0, Duration::from_millis(200))
            .with_delayed_reply("gamma", "fast", 0.0, Duration::from_millis(100));
        let executor = executor(MockBackendClient::new(BackendKind::Local), remote);
        let settings = ExecutionSettings::default().with_mode(ExecutionMode::Parallel);

        let mut chain = Chain::new("test", "q");
        let response = executor
            .execute(&mut chain, &pattern(&["alpha", "beta", "gamma"]), &settings)
            .await
            .unwrap();

        let indices: Vec<usize> = chain.hops().iter().map(|h| h.hop_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(
            response,
            "## Alpha\n\nslow\n\n## Beta\n\nmedium\n\n## Gamma\n\nfast"
        );
    }

    #[tokio::test]
    async fn test_parallel_hops_share_first_prompt() {
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_reply("alpha", "a", 0.0)
            .with_reply("beta", "b", 0.0);
        let executor = executor(local_client(), remote);
        let settings = ExecutionSettings::default().with_mode(ExecutionMode::Parallel);

        let mut chain = Chain::new("test", "original question");
        executor
            .execute(&mut chain, &pattern(&["alpha", "beta"]), &settings)
            .await
            .unwrap();

        let expected = PromptTemplates::default().render(HopPosition::First, "original question", &[]);
        assert!(chain.hops().iter().all(|h| h.prompt == expected));
    }

    #[tokio::test]
    async fn test_continue_policy_skips_failed_context() {
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_reply("alpha", "first draft", 0.0)
            .with_error("beta", HopError::upstream("beta", "503"))
            .with_reply("gamma", "final", 0.0);
        let executor = executor(local_client(), remote);

        let mut chain = Chain::new("test", "q");
        let response = executor
            .execute(
                &mut chain,
                &pattern(&["alpha", "beta", "gamma"]),
                &ExecutionSettings::default(),
            )
            .await
            .unwrap();

        assert_eq!(response, "final");
        assert_eq!(chain.hops().len(), 3);
        assert!(!chain.hops()[1].succeeded);
        assert_eq!(chain.hops()[1].failure_kind, Some(HopFailureKind::UpstreamError));

        let templates = PromptTemplates::default();
        let expected_last = templates.render(HopPosition::Last, "q", &["first draft"]);
        assert_eq!(chain.hops()[2].prompt, expected_last);
    }

    #[tokio::test]
    async fn test_abort_policy_fails_chain_immediately() {
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_error("alpha", HopError::credential_missing("OPENAI_API_KEY not set"))
            .with_reply("beta", "unreached", 0.0);
        let executor = executor(local_client(), remote);
        let settings = ExecutionSettings::default().with_fallback_policy(FallbackPolicy::Abort);

        let mut chain = Chain::new("test", "q");
        let err = executor
            .execute(&mut chain, &pattern(&["local", "alpha", "beta"]), &settings)
            .await
            .unwrap_err();

        match err {
            ChainError::HopAborted {
                hop_index, source, ..
            } => {
                assert_eq!(hop_index, 1);
                assert_eq!(source.kind(), HopFailureKind::CredentialMissing);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(chain.status(), ChainStatus::Failed);
        assert_eq!(chain.hops().len(), 2);
    }

    #[tokio::test]
    async fn test_all_hops_failed_regardless_of_policy() {
        for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
            let remote = MockBackendClient::new(BackendKind::OpenAi)
                .with_error("alpha", HopError::upstream("alpha", "500"))
                .with_error("beta", HopError::upstream("beta", "500"));
            let executor = executor(MockBackendClient::new(BackendKind::Local), remote);
            let settings = ExecutionSettings::default().with_mode(mode);

            let mut chain = Chain::new("test", "q");
            let err = executor
                .execute(&mut chain, &pattern(&["alpha", "beta"]), &settings)
                .await
                .unwrap_err();

            assert_eq!(err, ChainError::AllHopsFailed { attempted: 2 });
            assert_eq!(chain.status(), ChainStatus::Failed);
            assert_eq!(chain.hops().len(), 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_hop_timeout_is_a_hop_failure() {
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_delayed_reply("alpha", "late", 0.0, Duration::from_secs(10))
            .with_reply("beta", "on time", 0.0);
        let executor = executor(local_client(), remote);
        let settings = ExecutionSettings::default().with_per_hop_timeout(Duration::from_secs(1));

        let mut chain = Chain::new("test", "q");
        let response = executor
            .execute(&mut chain, &pattern(&["alpha", "beta"]), &settings)
            .await
            .unwrap();

        assert_eq!(response, "on time");
        assert_eq!(chain.hops()[0].failure_kind, Some(HopFailureKind::Timeout));
        assert_eq!(
            chain.hops()[0].failure_reason.as_deref(),
            Some("Hop timed out after 1000ms")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_chain_timeout_keeps_completed_hops() {
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_delayed_reply("alpha", "done", 0.0, Duration::from_secs(1))
            .with_delayed_reply("beta", "never", 0.0, Duration::from_secs(20));
        let executor = executor(local_client(), remote);
        let settings = ExecutionSettings::default()
            .with_per_hop_timeout(Duration::from_secs(30))
            .with_chain_timeout(Duration::from_secs(5));

        let mut chain = Chain::new("test", "q");
        let err = executor
            .execute(&mut chain, &pattern(&["alpha", "beta"]), &settings)
            .await
            .unwrap_err();

        assert_eq!(err, ChainError::ChainTimeoutExceeded { timeout_ms: 5000 });
        assert_eq!(chain.status(), ChainStatus::Failed);
        assert_eq!(chain.hops().len(), 1);
        assert!(chain.hops()[0].succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_chain_timeout_keeps_completed_hops_sorted() {
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_delayed_reply("alpha", "never", 0.0, Duration::from_secs(20))
            .with_delayed_reply("beta", "slower", 0.0, Duration::from_secs(2))
            .with_delayed_reply("gamma", "faster", 0.0, Duration::from_secs(1));
        let executor = executor(local_client(), remote);
        let settings = ExecutionSettings::default()
            .with_mode(ExecutionMode::Parallel)
            .with_per_hop_timeout(Duration::from_secs(30))
            .with_chain_timeout(Duration::from_secs(5));

        let mut chain = Chain::new("test", "q");
        let err = executor
            .execute(&mut chain, &pattern(&["alpha", "beta", "gamma"]), &settings)
            .await
            .unwrap_err();

        assert_eq!(err, ChainError::ChainTimeoutExceeded { timeout_ms: 5000 });
        assert_eq!(chain.status(), ChainStatus::Failed);
        let indices: Vec<usize> = chain.hops().iter().map(|h| h.hop_index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_parallel_ignores_abort_policy() {
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_error("alpha", HopError::upstream("alpha", "500"))
            .with_reply("beta", "b", 0.0);
        let executor = executor(local_client(), remote);
        let settings = ExecutionSettings::default()
            .with_mode(ExecutionMode::Parallel)
            .with_fallback_policy(FallbackPolicy::Abort);

        let mut chain = Chain::new("test", "q");
        let response = executor
            .execute(&mut chain, &pattern(&["alpha", "beta"]), &settings)
            .await
            .unwrap();

        assert_eq!(response, "b");
        assert_eq!(chain.status(), ChainStatus::Completed);
        assert_eq!(chain.hops().len(), 2);
        assert!(!chain.hops()[0].succeeded);
    }

    #[tokio::test]
    async fn test_failed_first_hop_keeps_its_template_slot() {
        let remote = Arc::new(
            MockBackendClient::new(BackendKind::OpenAi)
                .with_error("alpha", HopError::upstream("alpha", "503"))
                .with_reply("beta", "middle answer", 0.0)
                .with_reply("gamma", "final", 0.0),
        );
        let registry = BackendRegistry::new()
            .with_client(Arc::new(local_client()))
            .with_client(remote.clone());
        let executor = ChainExecutor::new(catalog(), Arc::new(registry));

        let mut chain = Chain::new("test", "q");
        executor
            .execute(
                &mut chain,
                &pattern(&["alpha", "beta", "gamma"]),
                &ExecutionSettings::default(),
            )
            .await
            .unwrap();

        let templates = PromptTemplates::default();
        let prompts = remote.prompts();
        assert_eq!(prompts.len(), 3);
        assert_eq!(prompts[1].0, "beta");
        assert_eq!(prompts[1].1, templates.render(HopPosition::Middle, "q", &[]));
        assert_eq!(prompts[2].0, "gamma");
        assert_eq!(
            prompts[2].1,
            templates.render(HopPosition::Last, "q", &["middle answer"])
        );
    }

    #[tokio::test]
    async fn test_invalid_budget_fails_before_any_call() {
        for budget in [-1.0, f64::NAN, f64::INFINITY] {
            let remote = Arc::new(
                MockBackendClient::new(BackendKind::OpenAi).with_reply("alpha", "a", 0.0),
            );
            let registry = BackendRegistry::new()
                .with_client(Arc::new(local_client()))
                .with_client(remote.clone());
            let executor = ChainExecutor::new(catalog(), Arc::new(registry));
            let settings = ExecutionSettings::default().with_cost_budget(budget);

            let mut chain = Chain::new("test", "q");
            let err = executor
                .execute(&mut chain, &pattern(&["alpha", "alpha"]), &settings)
                .await
                .unwrap_err();

            assert!(matches!(err, ChainError::SettingsInvalid { .. }));
            assert!(err.is_preflight());
            assert_eq!(chain.status(), ChainStatus::Failed);
            assert_eq!(remote.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_zero_budget_stops_only_after_spending() {
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_reply("alpha", "a", 0.0)
            .with_reply("beta", "b", 0.0);
        let executor = executor(local_client(), remote);
        let settings = ExecutionSettings::default().with_cost_budget(0.0);

        let mut chain = Chain::new("test", "q");
        executor
            .execute(&mut chain, &pattern(&["alpha", "beta"]), &settings)
            .await
            .unwrap();

        assert_eq!(chain.hops().len(), 2);
    }

    #[test]
    fn test_zero_timeout_settings_are_invalid() {
        let settings = ExecutionSettings::default().with_chain_timeout(Duration::ZERO);
        assert!(matches!(
            settings.validate(),
            Err(ChainError::SettingsInvalid { .. })
        ));
        assert!(ExecutionSettings::default().validate().is_ok());
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_before_any_call() {
        let remote = Arc::new(MockBackendClient::new(BackendKind::OpenAi));
        let registry = BackendRegistry::new()
            .with_client(Arc::new(MockBackendClient::new(BackendKind::Local)))
            .with_client(remote.clone());
        let executor = ChainExecutor::new(catalog(), Arc::new(registry));

        let mut chain = Chain::new("test", "q");
        let err = executor
            .execute(
                &mut chain,
                &pattern(&["alpha", "nope"]),
                &ExecutionSettings::default(),
            )
            .await
            .unwrap_err();

        assert!(err.is_preflight());
        assert_eq!(chain.status(), ChainStatus::Failed);
        assert!(chain.hops().is_empty());
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn test_pattern_longer_than_max_hops_is_invalid() {
        let executor = executor(local_client(), MockBackendClient::new(BackendKind::OpenAi));
        let settings = ExecutionSettings::default().with_max_hops(2);

        let mut chain = Chain::new("test", "q");
        let err = executor
            .execute(&mut chain, &pattern(&["local", "local", "local"]), &settings)
            .await
            .unwrap_err();

        assert!(matches!(err, ChainError::PatternInvalid { .. }));
    }

    #[tokio::test]
    async fn test_single_hop_uses_first_template_and_is_verbatim() {
        let executor = executor(local_client(), MockBackendClient::new(BackendKind::OpenAi));

        let mut chain = Chain::new("test", "hello");
        let response = executor
            .execute(&mut chain, &pattern(&["local"]), &ExecutionSettings::default())
            .await
            .unwrap();

        assert_eq!(response, "local answer");
        let expected = PromptTemplates::default().render(HopPosition::First, "hello", &[]);
        assert_eq!(chain.hops()[0].prompt, expected);
    }

    #[tokio::test]
    async fn test_scores_are_attached_on_completion() {
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_reply("alpha", "a", 0.0)
            .with_reply("beta", "b", 0.0);
        let executor = executor(local_client(), remote);

        let mut chain = Chain::new("test", "q");
        executor
            .execute(
                &mut chain,
                &pattern(&["alpha", "alpha", "beta"]),
                &ExecutionSettings::default(),
            )
            .await
            .unwrap();

        let metadata = chain.metadata().copied().unwrap();
        assert!((metadata.quality_score - (0.9 + 0.9 + 0.8) / 3.0).abs() < 1e-9);
        assert!((metadata.diversity_score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(metadata.rarity_tier, RarityTier::Normal);
    }

    #[tokio::test]
    async fn test_observer_sees_lifecycle_events() {
        let mut observer = MockChainObserver::new();
        observer
            .expect_on_event()
            .withf(|e| matches!(e, ChainEvent::ChainStarted { hop_count: 1, .. }))
            .times(1)
            .return_const(());
        observer
            .expect_on_event()
            .withf(|e| matches!(e, ChainEvent::HopStarted { .. } | ChainEvent::HopCompleted { .. }))
            .times(2)
            .return_const(());
        observer
            .expect_on_event()
            .withf(|e| matches!(e, ChainEvent::ChainCompleted { .. }))
            .times(1)
            .return_const(());

        let executor = executor(local_client(), MockBackendClient::new(BackendKind::OpenAi))
            .with_observer(Arc::new(observer));

        let mut chain = Chain::new("test", "q");
        executor
            .execute(&mut chain, &pattern(&["local"]), &ExecutionSettings::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_chain_emits_failed_event_last() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let remote = MockBackendClient::new(BackendKind::OpenAi)
            .with_error("alpha", HopError::upstream("alpha", "500"));
        let executor = executor(local_client(), remote)
            .with_observer(Arc::new(super::super::ChannelObserver::new(tx)));

        let mut chain = Chain::new("test", "q");
        executor
            .execute(&mut chain, &pattern(&["alpha"]), &ExecutionSettings::default())
            .await
            .unwrap_err();

        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            names.push(event.name());
        }
        assert_eq!(
            names,
            vec!["chain:started", "hop:started", "hop:completed", "chain:failed"]
        );
        assert!(chain.final_response().is_none());
    }
}
