mod api;
mod cli;
mod router;
mod startup;
mod state;

use clap::Parser;

use crate::cli::{Cli, Command};

fn load_config() -> nlgql_core::Config {
    nlgql_core::config::load_dotenv();
    nlgql_core::Config::from_env()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Cli::parse();
    let config = load_config();

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => startup::serve(&config).await,
        Command::Analyze { sdl, json } => cli::analyze(sdl.as_deref(), json),
        Command::Introspect { url, headers } => cli::introspect(&config, &url, &headers).await,
    }
}
