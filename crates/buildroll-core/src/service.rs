use crate::build::{Build, BuildConfig, BuildGenerator};
use crate::catalog::CatalogSource;
use crate::eligibility::EligibilityRules;
use crate::error::{BuildrollError, Result};
use crate::repository::{
    CachedRepository, CharacterDataset, EquipmentDataset, Repository, RepositoryStats,
};
use crate::scheduler::TaskFn;
use crate::types::{Character, Equipment};
use futures::FutureExt;
use log::{info, warn};
use std::sync::Arc;

/// Name under which the catalog refresh is registered with the scheduler.
pub const REFRESH_TASK: &str = "catalog-refresh";

/// Outcome of refreshing both datasets. Both are always attempted.
#[derive(Debug)]
pub struct RefreshSummary {
    pub characters: Result<usize>,
    pub equipment: Result<usize>,
}

impl RefreshSummary {
    pub fn is_success(&self) -> bool {
        self.characters.is_ok() && self.equipment.is_ok()
    }

    /// Item counts on success, otherwise the first failure.
    pub fn into_result(self) -> Result<(usize, usize)> {
        Ok((self.characters?, self.equipment?))
    }
}

/// Entry points used by the scheduler, the HTTP surface and the CLI.
pub struct BuildService {
    characters: Arc<dyn Repository<Character>>,
    equipment: Arc<dyn Repository<Equipment>>,
    generator: BuildGenerator,
}

impl BuildService {
    pub fn new(
        characters: Arc<dyn Repository<Character>>,
        equipment: Arc<dyn Repository<Equipment>>,
        generator: BuildGenerator,
    ) -> Self {
        Self {
            characters,
            equipment,
            generator,
        }
    }

    /// Wire both cached repositories over one catalog source.
    pub fn from_catalog(
        catalog: Arc<dyn CatalogSource>,
        rules: EligibilityRules,
        config: BuildConfig,
    ) -> Result<Self> {
        rules.validate()?;
        let rules = Arc::new(rules);
        let characters = CachedRepository::new(CharacterDataset::new(catalog.clone(), rules.clone()));
        let equipment = CachedRepository::new(EquipmentDataset::new(catalog, rules));

        Ok(Self::new(
            Arc::new(characters),
            Arc::new(equipment),
            BuildGenerator::new(config)?,
        ))
    }

    pub fn generator(&self) -> &BuildGenerator {
        &self.generator
    }

    pub async fn get_random_build(&self) -> Result<Build> {
        let (characters, equipment) =
            tokio::try_join!(self.characters.get_all(), self.equipment.get_all())?;

        let mut rng = rand::thread_rng();
        self.generator.generate(&characters, &equipment, &mut rng)
    }

    /// Like [`get_random_build`](Self::get_random_build) with per-call counts.
    pub async fn get_random_build_with(
        &self,
        character_count: usize,
        equipment_count: usize,
    ) -> Result<Build> {
        let config = self
            .generator
            .config()
            .clone()
            .with_character_count(character_count)
            .with_equipment_count(equipment_count);
        let generator = BuildGenerator::new(config)?;

        let (characters, equipment) =
            tokio::try_join!(self.characters.get_all(), self.equipment.get_all())?;

        let mut rng = rand::thread_rng();
        generator.generate(&characters, &equipment, &mut rng)
    }

    pub async fn refresh_all(&self) -> RefreshSummary {
        let (characters, equipment) =
            tokio::join!(self.characters.refresh(), self.equipment.refresh());

        let summary = RefreshSummary {
            characters,
            equipment,
        };
        match (&summary.characters, &summary.equipment) {
            (Ok(c), Ok(e)) => info!("Catalog refresh complete: {} characters, {} equipment", c, e),
            _ => warn!("Catalog refresh finished with failures; previous caches kept"),
        }
        summary
    }

    pub fn stats(&self) -> Vec<RepositoryStats> {
        vec![self.characters.stats(), self.equipment.stats()]
    }

    /// Scheduler task wrapping [`refresh_all`](Self::refresh_all).
    pub fn refresh_task(self: Arc<Self>) -> TaskFn {
        Arc::new(move || {
            let service = self.clone();
            async move {
                let summary = service.refresh_all().await;
                summary.into_result().map(|_| ())
            }
            .boxed()
        })
    }
}

impl std::fmt::Display for RefreshSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn part(r: &Result<usize>) -> String {
            match r {
                Ok(n) => n.to_string(),
                Err(BuildrollError::Refresh { source, .. }) => format!("failed ({})", source.kind),
                Err(e) => format!("failed ({})", e),
            }
        }
        write!(
            f,
            "characters: {}, equipment: {}",
            part(&self.characters),
            part(&self.equipment)
        )
    }
}
