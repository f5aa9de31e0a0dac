use clap::Parser;
use pmp_hop_router::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => cli::run::run(args).await,
        Command::Providers(args) => cli::catalog::run_providers(args).await,
        Command::Patterns(args) => cli::catalog::run_patterns(args).await,
    }
}
