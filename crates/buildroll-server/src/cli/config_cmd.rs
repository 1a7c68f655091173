use crate::cli::{Cli, ConfigCommands};
use crate::config::BuildrollConfig;
use anyhow::Result;

pub async fn run(cmd: &ConfigCommands, cli: &Cli) -> Result<()> {
    match cmd {
        ConfigCommands::Validate => validate(cli),
        ConfigCommands::Show => show(cli),
    }
}

fn validate(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;
    let source = if config_path.exists() {
        config_path.display().to_string()
    } else {
        format!("defaults ({} not found)", config_path.display())
    };

    match BuildrollConfig::load_or_default(config_path) {
        Ok(mut config) => {
            cli.apply_overrides(&mut config);
            let errors = config.validate();
            if errors.is_empty() {
                println!("✅ {} is valid.", source);
            } else {
                println!("❌ Validation errors in {}:", source);
                for e in &errors {
                    println!("  - {}", e);
                }
                std::process::exit(1);
            }
        }
        Err(e) => {
            println!("❌ {:#}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn show(cli: &Cli) -> Result<()> {
    let config = cli.load_config()?;
    match toml::to_string_pretty(&config) {
        Ok(s) => println!("{}", s),
        Err(e) => anyhow::bail!("Failed to serialize config: {}", e),
    }
    Ok(())
}
