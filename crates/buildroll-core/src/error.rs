use crate::catalog::Endpoint;
use crate::types::DatasetKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildrollError>;

pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum BuildrollError {
    #[error("Refresh of {dataset} failed: {source}")]
    Refresh {
        dataset: DatasetKind,
        #[source]
        source: FetchError,
    },

    #[error("Insufficient data: requested {requested} {dataset}, only {available} available")]
    InsufficientData {
        dataset: DatasetKind,
        requested: usize,
        available: usize,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

/// Failure of a single catalog fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("catalog error ({endpoint}): {kind}")]
pub struct FetchError {
    pub endpoint: Endpoint,
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(endpoint: Endpoint, kind: FetchErrorKind) -> Self {
        Self { endpoint, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchErrorKind {
    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("bad status {0}")]
    BadStatus(u16),

    #[error("timed out")]
    Timeout,

    #[error("malformed response: {0}")]
    Malformed(String),
}
