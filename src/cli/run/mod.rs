//! Run command - processes one input and prints the JSON response

use std::io::Read;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Args;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::{ChainEvent, ExecutionMode};
use crate::domain::chain::ChannelObserver;
use crate::infrastructure::services::ProcessRequest;

/// Arguments for the run command
#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Input text (read from stdin when omitted)
    #[arg(short, long)]
    pub text: Option<String>,

    /// Named pattern preset
    #[arg(short, long, conflicts_with = "providers")]
    pub pattern: Option<String>,

    /// Explicit provider sequence (repeatable)
    #[arg(long = "provider", value_name = "PROVIDER_ID")]
    pub providers: Vec<String>,

    /// Execution mode (overrides config)
    #[arg(long, value_enum)]
    pub mode: Option<ExecutionMode>,

    /// Cost budget for the chain (overrides config)
    #[arg(long)]
    pub budget: Option<f64>,

    /// Per-hop timeout in milliseconds (overrides config)
    #[arg(long)]
    pub per_hop_timeout_ms: Option<u64>,

    /// Chain timeout in milliseconds (overrides config)
    #[arg(long)]
    pub chain_timeout_ms: Option<u64>,

    /// Print lifecycle events to stderr as they happen
    #[arg(long)]
    pub events: bool,

    /// Print compact JSON instead of pretty JSON
    #[arg(long)]
    pub compact: bool,
}

impl RunArgs {
    fn into_request(self, text: String) -> ProcessRequest {
        ProcessRequest {
            text,
            pattern_name: self.pattern,
            providers: (!self.providers.is_empty()).then_some(self.providers),
            mode: self.mode,
            cost_budget: self.budget,
            per_hop_timeout_ms: self.per_hop_timeout_ms,
            chain_timeout_ms: self.chain_timeout_ms,
        }
    }
}

/// Run one input through the router
pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let text = match &args.text {
        Some(text) => text.clone(),
        None => read_stdin()?,
    };
    if text.trim().is_empty() {
        bail!("Input text is empty");
    }

    let mut router =
        crate::create_router_with_config(&config).context("Invalid router configuration")?;

    let printer = if args.events {
        let (tx, rx) = mpsc::unbounded_channel();
        router = router.with_observer(Arc::new(ChannelObserver::new(tx)));
        Some(tokio::spawn(print_events(rx)))
    } else {
        None
    };

    let compact = args.compact;
    let response = router.process_input(args.into_request(text)).await;

    // Dropping the router closes the event channel so the printer can finish
    drop(router);
    if let Some(printer) = printer {
        printer.await.context("Event printer task failed")?;
    }

    let json = if compact {
        serde_json::to_string(&response)?
    } else {
        serde_json::to_string_pretty(&response)?
    };
    println!("{}", json);

    if !response.success {
        bail!(
            "Chain failed: {}",
            response.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}

fn read_stdin() -> anyhow::Result<String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read input from stdin")?;
    debug!(chars = text.chars().count(), "Read input from stdin");
    Ok(text)
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<ChainEvent>) {
    while let Some(event) = rx.recv().await {
        eprintln!("{}", describe_event(&event));
    }
}

fn describe_event(event: &ChainEvent) -> String {
    match event {
        ChainEvent::ChainStarted {
            pattern_name,
            mode,
            hop_count,
            ..
        } => format!("[{}] {} ({} mode, {} hops)", event.name(), pattern_name, mode, hop_count),
        ChainEvent::HopStarted {
            hop_index,
            provider_id,
            ..
        } => format!("[{}] #{} {}", event.name(), hop_index, provider_id),
        ChainEvent::HopCompleted {
            hop_index,
            provider_id,
            succeeded,
            cost,
            duration_ms,
            ..
        } => format!(
            "[{}] #{} {} {} cost={:.6} {}ms",
            event.name(),
            hop_index,
            provider_id,
            if *succeeded { "ok" } else { "failed" },
            cost,
            duration_ms
        ),
        ChainEvent::BudgetExceeded {
            total_cost,
            budget,
            skipped_hops,
            ..
        } => format!(
            "[{}] total={:.6} budget={:.6} skipped={}",
            event.name(),
            total_cost,
            budget,
            skipped_hops
        ),
        ChainEvent::ChainCompleted {
            total_cost,
            rarity_tier,
            ..
        } => format!("[{}] total={:.6} tier={}", event.name(), total_cost, rarity_tier),
        ChainEvent::ChainFailed { reason, .. } => format!("[{}] {}", event.name(), reason),
    }
}
