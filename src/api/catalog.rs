//! Station catalog client
//!
//! Fetches the remote station list as a single JSON document:
//!
//! ```json
//! { "stations": [ { "name": "...", "logo": "...", "url": ["...", "..."] } ] }
//! ```
//!
//! One GET, no retry. Retry policy, if any, belongs to the caller.

use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::models::Station;

/// Catalog fetch error types
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog endpoint returned {0}")]
    Status(u16),

    #[error("Invalid catalog body: {0}")]
    Parse(String),

    #[error("Request failed: {0}")]
    Fetch(#[from] reqwest::Error),
}

/// HTTP client for the station list endpoint
pub struct CatalogClient {
    url: String,
    client: reqwest::Client,
}

impl CatalogClient {
    /// Create a client for the given catalog URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// The configured catalog URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse the station list.
    ///
    /// Entries whose `url` array is missing or empty are dropped here, so
    /// every returned [`Station`] satisfies the non-empty-sources invariant
    /// and indices stay contiguous.
    pub async fn fetch(&self) -> Result<Vec<Station>, CatalogError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: CatalogResponse = serde_json::from_str(&body)
            .map_err(|e| CatalogError::Parse(format!("JSON parse error: {}", e)))?;

        Ok(parsed.into_stations())
    }
}

/// The ordered station list for a session.
///
/// Starts empty; `load` replaces the whole list atomically on success and
/// leaves it untouched on failure, so observers never see a partial catalog.
#[derive(Debug, Default)]
pub struct StationCatalog {
    stations: Vec<Station>,
    loaded: bool,
}

impl StationCatalog {
    /// Empty, not-yet-loaded catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog built from an already-materialized station list, reindexed
    /// to catalog order. Used by tests and offline tooling; network loads
    /// go through [`load`](Self::load).
    pub fn with_stations(mut stations: Vec<Station>) -> Self {
        for (i, station) in stations.iter_mut().enumerate() {
            station.index = i as i32;
        }
        Self {
            stations,
            loaded: true,
        }
    }

    /// Fetch the catalog and replace the current contents.
    ///
    /// On any failure (transport, non-2xx, malformed JSON) the previous
    /// contents stay in place and the catalog is not marked loaded.
    pub async fn load(&mut self, client: &CatalogClient) -> Result<(), CatalogError> {
        match client.fetch().await {
            Ok(stations) => {
                self.stations = stations;
                self.loaded = true;
                Ok(())
            }
            Err(e) => {
                warn!(url = client.url(), error = %e, "catalog load failed");
                Err(e)
            }
        }
    }

    /// Whether a fetch has ever succeeded. An empty `stations` array in the
    /// response still counts as loaded; a failed fetch does not.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Look up a station by its catalog index
    pub fn get(&self, index: usize) -> Option<&Station> {
        self.stations.get(index)
    }

    /// Look up a station by exact name
    pub fn find_by_name(&self, name: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.name == name)
    }
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    stations: Vec<StationRaw>,
}

impl CatalogResponse {
    fn into_stations(self) -> Vec<Station> {
        let mut stations = Vec::with_capacity(self.stations.len());
        for raw in self.stations {
            match raw.into_station(stations.len() as i32) {
                Some(station) => stations.push(station),
                None => warn!("skipping catalog entry with no sources"),
            }
        }
        stations
    }
}

#[derive(Debug, Deserialize)]
struct StationRaw {
    name: String,
    #[serde(default)]
    logo: String,
    #[serde(default)]
    url: Vec<String>,
}

impl StationRaw {
    fn into_station(self, index: i32) -> Option<Station> {
        if self.url.is_empty() {
            return None;
        }

        Some(Station {
            index,
            name: self.name,
            logo: self.logo,
            sources: self.url,
        })
    }
}
