//! CLI module for the PMP hop router
//!
//! Provides subcommands:
//! - `run`: route one input through a hop chain and print the response
//! - `providers`: list the provider catalog
//! - `patterns`: list the hop pattern presets

pub mod catalog;
pub mod run;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// PMP Hop Router - multi-backend hop chains with cost and timeout control
#[derive(Parser)]
#[command(name = "pmp-hop-router")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Route one input through a hop chain
    Run(run::RunArgs),

    /// List the provider catalog
    Providers(catalog::ProvidersArgs),

    /// List the hop pattern presets
    Patterns(catalog::PatternsArgs),
}

/// Load `.env` and layered configuration, then start logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);

    Ok(config)
}
