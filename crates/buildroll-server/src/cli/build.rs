use crate::cli::BuildArgs;
use crate::config::BuildrollConfig;
use crate::render::{BuildRenderer, JsonRenderer, TextRenderer};
use anyhow::Result;
use buildroll_core::BuildrollError;

pub async fn run(args: &BuildArgs, config: BuildrollConfig) -> Result<()> {
    let service = config.build_service()?;

    let result = match (args.characters, args.equipment) {
        (None, None) => service.get_random_build().await,
        (characters, equipment) => {
            let defaults = service.generator().config();
            service
                .get_random_build_with(
                    characters.unwrap_or(defaults.character_count),
                    equipment.unwrap_or(defaults.equipment_count),
                )
                .await
        }
    };

    let build = match result {
        Ok(build) => build,
        Err(BuildrollError::InsufficientData {
            dataset,
            requested,
            available,
        }) => anyhow::bail!(
            "Not enough {} in the catalog right now ({} needed, {} available). Try again later.",
            dataset,
            requested,
            available
        ),
        Err(e @ BuildrollError::Refresh { .. }) => {
            anyhow::bail!("Catalog unavailable, try again later: {}", e)
        }
        Err(e) => return Err(e.into()),
    };

    let output = match args.format.as_str() {
        "json" => JsonRenderer.render(&build)?,
        _ => TextRenderer.render(&build)?,
    };
    println!("{}", output);
    Ok(())
}
