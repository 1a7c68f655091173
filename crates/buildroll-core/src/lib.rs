pub mod types;
pub mod error;
pub mod reference;
pub mod catalog;
pub mod eligibility;
pub mod repository;
pub mod build;
pub mod service;
pub mod scheduler;

pub use error::{BuildrollError, FetchError, FetchErrorKind, FetchResult, Result};
pub use types::*;
pub use reference::ReferenceData;
pub use catalog::{CatalogConfig, CatalogSource, Endpoint, HttpCatalog, DEFAULT_BASE_URL};
pub use eligibility::{CharacterRejection, EligibilityRules, EquipmentRejection, FilterOutcome};
pub use repository::{
    CachedRepository, CharacterDataset, CharacterRepository, Dataset, EquipmentDataset,
    EquipmentRepository, Repository, RepositoryStats,
};
pub use build::{
    Build, BuildConfig, BuildGenerator, CategoryMarker, CategoryTable, CharacterPick,
    EquipmentPick, ExhaustionPolicy, MAX_PICK_COUNT,
};
pub use service::{BuildService, RefreshSummary, REFRESH_TASK};
pub use scheduler::{Schedule, Scheduler, TaskFn};
