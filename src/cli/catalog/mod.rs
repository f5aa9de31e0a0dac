//! Catalog commands - list providers and pattern presets

use anyhow::Context;
use clap::{Args, ValueEnum};
use serde_json::json;

use crate::config::AppConfig;
use crate::domain::{BackendKind, PatternSelector, Provider, ProviderCatalog};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Local,
    Openai,
    Anthropic,
}

impl From<KindArg> for BackendKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Local => BackendKind::Local,
            KindArg::Openai => BackendKind::OpenAi,
            KindArg::Anthropic => BackendKind::Anthropic,
        }
    }
}

/// Arguments for the providers command
#[derive(Args, Clone, Debug)]
pub struct ProvidersArgs {
    /// Only list providers served by this backend
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the patterns command
#[derive(Args, Clone, Debug)]
pub struct PatternsArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

fn load_catalog(config: &AppConfig) -> anyhow::Result<ProviderCatalog> {
    config
        .build_catalog()
        .context("Invalid provider catalog in configuration")
}

/// List the provider catalog
pub async fn run_providers(args: ProvidersArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let catalog = load_catalog(&config)?;

    let providers: Vec<&Provider> = match args.kind {
        Some(kind) => catalog.by_kind(kind.into()).collect(),
        None => catalog.all().iter().collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&providers)?);
    } else {
        print!("{}", render_providers(&providers));
    }

    Ok(())
}

/// List the hop pattern presets
pub async fn run_patterns(args: PatternsArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let catalog = load_catalog(&config)?;
    let selector = config
        .build_selector(&catalog)
        .context("Invalid pattern configuration")?;

    if args.json {
        let patterns: Vec<_> = selector
            .patterns()
            .all()
            .iter()
            .map(|p| {
                json!({
                    "name": p.name(),
                    "description": p.description(),
                    "providers": p.providers(),
                })
            })
            .collect();
        let body = json!({
            "maxHops": selector.patterns().max_hops(),
            "thresholds": selector.thresholds(),
            "patterns": patterns,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print!("{}", render_patterns(&selector));
    }

    Ok(())
}

fn render_providers(providers: &[&Provider]) -> String {
    let mut out = format!(
        "{:<16} {:<10} {:<28} {:>12} {:>8}  {}\n",
        "ID", "BACKEND", "MODEL", "COST/TOKEN", "QUALITY", "SPECIALTY"
    );

    for p in providers {
        out.push_str(&format!(
            "{:<16} {:<10} {:<28} {:>12.8} {:>8.2}  {}\n",
            p.id(),
            p.backend_kind().as_str(),
            p.model_name(),
            p.cost_per_token(),
            p.quality_score(),
            p.specialty()
        ));
    }

    out
}

fn render_patterns(selector: &PatternSelector) -> String {
    let thresholds = selector.thresholds();
    let mut out = format!(
        "Inputs under {} chars use the short preset, up to {} chars the medium preset, longer the long preset.\n\n",
        thresholds.short_max_chars, thresholds.medium_max_chars
    );

    for pattern in selector.patterns().all() {
        out.push_str(&format!(
            "{} ({} hops): {}\n",
            pattern.name(),
            pattern.hop_count(),
            pattern.providers().join(" -> ")
        ));
        if !pattern.description().is_empty() {
            out.push_str(&format!("    {}\n", pattern.description()));
        }
    }

    out
}
