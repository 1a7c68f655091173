//! Per-dataset caches over the catalog.
//!
//! A [`CachedRepository`] holds the last successfully filtered collection as
//! an immutable `Arc<[T]>` snapshot. Refreshes are serialized by an async
//! mutex and publish a new snapshot in a single assignment, so readers see
//! either the old collection or the new one, never a mix.

use crate::catalog::CatalogSource;
use crate::eligibility::EligibilityRules;
use crate::error::{BuildrollError, FetchError, FetchResult, Result};
use crate::types::{Character, DatasetKind, Equipment};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;

/// Capability interface shared by both datasets.
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Current collection. Populates the cache first if it is empty.
    async fn get_all(&self) -> Result<Arc<[T]>>;

    /// Re-fetch and re-filter, replacing the cache on success. Returns the
    /// number of cached items.
    async fn refresh(&self) -> Result<usize>;

    fn stats(&self) -> RepositoryStats;
}

/// One dataset: how to load and filter it.
#[async_trait]
pub trait Dataset: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    fn kind(&self) -> DatasetKind;

    /// Fetch from the catalog and apply the eligibility filter.
    async fn load(&self) -> FetchResult<Vec<Self::Item>>;
}

pub struct CharacterDataset {
    catalog: Arc<dyn CatalogSource>,
    rules: Arc<EligibilityRules>,
}

impl CharacterDataset {
    pub fn new(catalog: Arc<dyn CatalogSource>, rules: Arc<EligibilityRules>) -> Self {
        Self { catalog, rules }
    }
}

#[async_trait]
impl Dataset for CharacterDataset {
    type Item = Character;

    fn kind(&self) -> DatasetKind {
        DatasetKind::Characters
    }

    async fn load(&self) -> FetchResult<Vec<Character>> {
        let raw = self.catalog.fetch_characters().await?;
        let fetched = raw.len();
        let outcome = self.rules.filter_characters(raw);
        debug!(
            "characters: {} fetched, {} admitted, rejected [{}]",
            fetched,
            outcome.admitted.len(),
            outcome.rejection_summary()
        );
        Ok(outcome.admitted)
    }
}

pub struct EquipmentDataset {
    catalog: Arc<dyn CatalogSource>,
    rules: Arc<EligibilityRules>,
}

impl EquipmentDataset {
    pub fn new(catalog: Arc<dyn CatalogSource>, rules: Arc<EligibilityRules>) -> Self {
        Self { catalog, rules }
    }
}

#[async_trait]
impl Dataset for EquipmentDataset {
    type Item = Equipment;

    fn kind(&self) -> DatasetKind {
        DatasetKind::Equipment
    }

    async fn load(&self) -> FetchResult<Vec<Equipment>> {
        let raw = self.catalog.fetch_equipment().await?;
        let fetched = raw.len();
        let outcome = self.rules.filter_equipment(raw);
        debug!(
            "equipment: {} fetched, {} admitted, rejected [{}]",
            fetched,
            outcome.admitted.len(),
            outcome.rejection_summary()
        );
        Ok(outcome.admitted)
    }
}

/// Point-in-time view of a repository for health and stats output.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryStats {
    pub dataset: DatasetKind,
    pub items: usize,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub refresh_count: u64,
    pub last_error: Option<String>,
}

struct CacheState<T> {
    items: Arc<[T]>,
    last_error: Option<FetchError>,
    last_refreshed_at: Option<DateTime<Utc>>,
    refresh_count: u64,
    /// Completed refresh attempts, successful or not. Lets cold-start
    /// waiters tell that someone else already tried.
    attempts: u64,
}

pub struct CachedRepository<D: Dataset> {
    dataset: D,
    state: RwLock<CacheState<D::Item>>,
    refresh_lock: Mutex<()>,
}

pub type CharacterRepository = CachedRepository<CharacterDataset>;
pub type EquipmentRepository = CachedRepository<EquipmentDataset>;

impl<D: Dataset> CachedRepository<D> {
    pub fn new(dataset: D) -> Self {
        Self {
            dataset,
            state: RwLock::new(CacheState {
                items: Arc::from(Vec::new()),
                last_error: None,
                last_refreshed_at: None,
                refresh_count: 0,
                attempts: 0,
            }),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn kind(&self) -> DatasetKind {
        self.dataset.kind()
    }

    /// The cached collection without triggering a fetch.
    pub fn snapshot(&self) -> Arc<[D::Item]> {
        self.read_state().items.clone()
    }

    pub fn last_error(&self) -> Option<FetchError> {
        self.read_state().last_error.clone()
    }

    // Lock poisoning can only come from a panic while assigning plain
    // fields, which leaves the state consistent, so recover the guard.
    fn read_state(&self) -> RwLockReadGuard<'_, CacheState<D::Item>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CacheState<D::Item>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Must be called with `refresh_lock` held.
    async fn refresh_locked(&self) -> Result<usize> {
        let kind = self.dataset.kind();

        match self.dataset.load().await {
            Ok(items) => {
                let count = items.len();
                let items: Arc<[D::Item]> = Arc::from(items);
                {
                    let mut state = self.write_state();
                    state.items = items;
                    state.last_error = None;
                    state.last_refreshed_at = Some(Utc::now());
                    state.refresh_count += 1;
                    state.attempts += 1;
                }
                info!("Refreshed {}: {} items cached", kind, count);
                Ok(count)
            }
            Err(e) => {
                {
                    let mut state = self.write_state();
                    state.last_error = Some(e.clone());
                    state.attempts += 1;
                }
                error!("Failed to refresh {}: {}", kind, e);
                Err(BuildrollError::Refresh {
                    dataset: kind,
                    source: e,
                })
            }
        }
    }
}

#[async_trait]
impl<D: Dataset> Repository<D::Item> for CachedRepository<D> {
    async fn get_all(&self) -> Result<Arc<[D::Item]>> {
        let attempts_seen = {
            let state = self.read_state();
            if !state.items.is_empty() {
                return Ok(state.items.clone());
            }
            state.attempts
        };

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have populated (or tried to) while we waited.
        {
            let state = self.read_state();
            if !state.items.is_empty() {
                return Ok(state.items.clone());
            }
            if state.attempts != attempts_seen {
                return match &state.last_error {
                    Some(e) => Err(BuildrollError::Refresh {
                        dataset: self.dataset.kind(),
                        source: e.clone(),
                    }),
                    None => Ok(state.items.clone()),
                };
            }
        }

        debug!("{} cache empty, populating", self.dataset.kind());
        self.refresh_locked().await?;
        Ok(self.snapshot())
    }

    async fn refresh(&self) -> Result<usize> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    fn stats(&self) -> RepositoryStats {
        let state = self.read_state();
        RepositoryStats {
            dataset: self.dataset.kind(),
            items: state.items.len(),
            last_refreshed_at: state.last_refreshed_at,
            refresh_count: state.refresh_count,
            last_error: state.last_error.as_ref().map(|e| e.to_string()),
        }
    }
}
