use anyhow::{Context, Result};
use buildroll_core::{
    BuildConfig, BuildService, CatalogConfig, CategoryTable, EligibilityRules, ExhaustionPolicy,
    HttpCatalog, ReferenceData, Schedule, DEFAULT_BASE_URL,
};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Contents of `buildroll.toml`. Every section and field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildrollConfig {
    pub server: ServerConfig,
    pub catalog: CatalogSection,
    pub schedule: ScheduleConfig,
    pub build: BuildSection,
    pub eligibility: EligibilitySection,
    pub reference: ReferenceData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Hours between catalog refreshes.
    pub interval_hours: u64,
    /// `HH:MM` in UTC. When set, replaces the fixed interval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_at: Option<String>,
    /// Refresh once before serving requests.
    pub run_on_startup: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: 24,
            daily_at: None,
            run_on_startup: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub character_count: usize,
    pub equipment_count: usize,
    pub oversample_factor: usize,
    pub exhaustion: ExhaustionPolicy,
    pub categories: CategoryTable,
}

impl Default for BuildSection {
    fn default() -> Self {
        let defaults = BuildConfig::default();
        Self {
            character_count: defaults.character_count,
            equipment_count: defaults.equipment_count,
            oversample_factor: defaults.oversample_factor,
            exhaustion: defaults.exhaustion,
            categories: defaults.categories,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilitySection {
    /// Equipment must cost strictly more than this.
    pub minimum_cost: u32,
}

impl Default for EligibilitySection {
    fn default() -> Self {
        Self {
            minimum_cost: EligibilityRules::default().minimum_cost,
        }
    }
}

impl BuildrollConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Defaults when the file does not exist. A file that exists but does not
    /// parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// All problems found, empty when the configuration is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Err(e) = self.catalog_config().validate() {
            errors.push(format!("[catalog] {}", e));
        }
        if let Err(e) = self.build_config().validate() {
            errors.push(format!("[build] {}", e));
        }
        if let Err(e) = self.reference.validate() {
            errors.push(format!("[reference] {}", e));
        }
        match self.schedule() {
            Ok(schedule) => {
                if let Err(e) = schedule.validate() {
                    errors.push(format!("[schedule] {}", e));
                }
            }
            Err(e) => errors.push(format!("[schedule] {}", e)),
        }

        errors
    }

    /// Validate, then wire the HTTP catalog and both repositories.
    pub fn build_service(&self) -> Result<BuildService> {
        let errors = self.validate();
        if !errors.is_empty() {
            anyhow::bail!("Invalid configuration:\n  - {}", errors.join("\n  - "));
        }

        let catalog = HttpCatalog::new(self.catalog_config())?;
        Ok(BuildService::from_catalog(
            Arc::new(catalog),
            self.eligibility_rules(),
            self.build_config(),
        )?)
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig::new()
            .with_base_url(self.catalog.base_url.clone())
            .with_timeout(Duration::from_secs(self.catalog.timeout_secs))
    }

    pub fn eligibility_rules(&self) -> EligibilityRules {
        EligibilityRules::new()
            .with_minimum_cost(self.eligibility.minimum_cost)
            .with_reference(Arc::new(self.reference.clone()))
    }

    pub fn build_config(&self) -> BuildConfig {
        BuildConfig::new()
            .with_character_count(self.build.character_count)
            .with_equipment_count(self.build.equipment_count)
            .with_oversample_factor(self.build.oversample_factor)
            .with_exhaustion(self.build.exhaustion)
            .with_categories(self.build.categories.clone())
    }

    pub fn schedule(&self) -> Result<Schedule> {
        match &self.schedule.daily_at {
            Some(at) => {
                let time = NaiveTime::parse_from_str(at, "%H:%M")
                    .with_context(|| format!("daily_at must be HH:MM, got '{}'", at))?;
                Ok(Schedule::DailyAt(time))
            }
            None => Ok(Schedule::Every(Duration::from_secs(
                self.schedule.interval_hours.saturating_mul(3600),
            ))),
        }
    }
}
