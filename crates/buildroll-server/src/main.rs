mod cli;
mod config;
mod http;
mod render;
mod serve;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `build --format json` output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve => serve::run(cli.load_config()?).await,
        Commands::Build(args) => cli::build::run(args, cli.load_config()?).await,
        Commands::Refresh => cli::refresh::run(cli.load_config()?).await,
        Commands::Config(cmd) => cli::config_cmd::run(cmd, &cli).await,
    }
}
