use super::{CatalogSource, Endpoint};
use crate::error::{BuildrollError, FetchError, FetchErrorKind, FetchResult, Result};
use crate::types::{RawCharacter, RawEquipment};
use async_trait::async_trait;
use indexmap::IndexMap;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.opendota.com/api";

/// Connection settings for the HTTP catalog.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL without a trailing endpoint path.
    /// Default: the public OpenDota API.
    pub base_url: String,

    /// Per-request timeout covering connect, headers and body.
    /// Default: 5 seconds.
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(BuildrollError::Validation(format!(
                "catalog base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }

        if self.timeout.is_zero() {
            return Err(BuildrollError::Validation(
                "catalog timeout must be > 0".into(),
            ));
        }

        Ok(())
    }
}

/// JSON-over-HTTP catalog client.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| BuildrollError::Validation(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint) -> FetchResult<T> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        debug!("GET {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify(endpoint, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::new(
                endpoint,
                FetchErrorKind::BadStatus(status.as_u16()),
            ));
        }

        // Read the body before decoding so transport failures and bad JSON
        // stay distinguishable.
        let body = resp.bytes().await.map_err(|e| classify(endpoint, e))?;

        serde_json::from_slice(&body)
            .map_err(|e| FetchError::new(endpoint, FetchErrorKind::Malformed(e.to_string())))
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn fetch_characters(&self) -> FetchResult<Vec<RawCharacter>> {
        self.get(Endpoint::Characters).await
    }

    async fn fetch_equipment(&self) -> FetchResult<IndexMap<String, RawEquipment>> {
        self.get(Endpoint::Equipment).await
    }
}

fn classify(endpoint: Endpoint, err: reqwest::Error) -> FetchError {
    let kind = if err.is_timeout() {
        FetchErrorKind::Timeout
    } else if err.is_decode() {
        FetchErrorKind::Malformed(err.to_string())
    } else {
        FetchErrorKind::Unreachable(err.to_string())
    };
    FetchError::new(endpoint, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation() {
        assert!(CatalogConfig::default().validate().is_ok());
        assert!(CatalogConfig::new()
            .with_base_url("ftp://example.com")
            .validate()
            .is_err());
        assert!(CatalogConfig::new()
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let catalog =
            HttpCatalog::new(CatalogConfig::new().with_base_url("http://localhost:1234/api/"))
                .unwrap();
        assert_eq!(catalog.base_url(), "http://localhost:1234/api");
    }
}
