pub mod build;
pub mod config_cmd;
pub mod refresh;

use crate::config::BuildrollConfig;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "buildroll")]
#[command(version, about = "Random hero and item builds from a cached game catalog")]
pub struct Cli {
    /// Path to buildroll.toml
    #[arg(
        long,
        global = true,
        env = "BUILDROLL_CONFIG",
        default_value = "buildroll.toml"
    )]
    pub config: PathBuf,

    /// Catalog base URL (overrides config file)
    #[arg(long, global = true, env = "BUILDROLL_CATALOG_URL")]
    pub catalog_url: Option<String>,

    /// HTTP listen address (overrides config file)
    #[arg(long, global = true, env = "BUILDROLL_HTTP_ADDR")]
    pub http_addr: Option<SocketAddr>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server and the refresh scheduler
    Serve,
    /// Fetch the catalog once and print a random build
    Build(BuildArgs),
    /// Fetch the catalog once and print per-dataset counts
    Refresh,
    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
    /// Number of heroes (defaults to config)
    #[arg(long)]
    pub characters: Option<usize>,
    /// Number of items (defaults to config)
    #[arg(long)]
    pub equipment: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    Validate,
    Show,
}

impl Cli {
    /// Config file contents (or defaults) with command-line and environment
    /// overrides applied.
    pub fn load_config(&self) -> anyhow::Result<BuildrollConfig> {
        let mut config = BuildrollConfig::load_or_default(&self.config)?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut BuildrollConfig) {
        if let Some(url) = &self.catalog_url {
            config.catalog.base_url = url.clone();
        }
        if let Some(addr) = self.http_addr {
            config.server.http_addr = addr;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_file_and_defaults() {
        let cli = Cli::parse_from([
            "buildroll",
            "--config",
            "/nonexistent/buildroll.toml",
            "--catalog-url",
            "http://localhost:9999/api",
            "--http-addr",
            "0.0.0.0:7000",
            "serve",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.catalog.base_url, "http://localhost:9999/api");
        assert_eq!(config.server.http_addr.port(), 7000);
        assert!(matches!(cli.command, Commands::Serve));
    }

    #[test]
    fn build_args_parse() {
        let cli = Cli::parse_from(["buildroll", "build", "--format", "json", "--characters", "5"]);
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.format, "json");
                assert_eq!(args.characters, Some(5));
                assert_eq!(args.equipment, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["buildroll", "build", "--format", "xml"]).is_err());
    }
}
