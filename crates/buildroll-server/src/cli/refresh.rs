use crate::config::BuildrollConfig;
use anyhow::Result;

pub async fn run(config: BuildrollConfig) -> Result<()> {
    let service = config.build_service()?;
    let summary = service.refresh_all().await;

    println!("Catalog: {}", config.catalog.base_url);
    match &summary.characters {
        Ok(n) => println!("  characters: {} eligible", n),
        Err(e) => println!("  characters: {}", e),
    }
    match &summary.equipment {
        Ok(n) => println!("  equipment:  {} eligible", n),
        Err(e) => println!("  equipment:  {}", e),
    }

    if !summary.is_success() {
        anyhow::bail!("Refresh incomplete");
    }
    Ok(())
}
