//! Remote catalog access.
//!
//! The [`CatalogSource`] trait is the seam between the repositories and the
//! network. [`HttpCatalog`] is the production implementation; tests drive the
//! repositories with in-memory sources.

mod http;

pub use http::{CatalogConfig, HttpCatalog, DEFAULT_BASE_URL};

use crate::error::FetchResult;
use crate::types::{RawCharacter, RawEquipment};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two read-only catalog endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    Characters,
    Equipment,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Characters => "/heroes",
            Endpoint::Equipment => "/constants/items",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Read-only access to the character and equipment catalogs.
///
/// One call is one outbound request. Implementations do not retry.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_characters(&self) -> FetchResult<Vec<RawCharacter>>;

    /// Equipment keyed by catalog key, in catalog order.
    async fn fetch_equipment(&self) -> FetchResult<IndexMap<String, RawEquipment>>;
}
