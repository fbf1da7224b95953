//! Region search abstraction.
//!
//! The loader never talks to a backend directly; it asks a `RegionSearch`
//! for every place inside a fetch window. Implementations:
//! - `StaticPlaces`: an in-memory catalog (tests, replay, the dev server)
//! - `HttpRegionSearch`: the `/api/locations/search` endpoint over HTTP

use std::future::Future;
use std::pin::Pin;

use foundation::bounds::Region;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::protocol::{RawPlace, SearchResponse};

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("region search transport failed: {0}")]
    Transport(String),
    #[error("region search returned HTTP {status}")]
    Status { status: u16 },
    #[error("region search response could not be decoded: {0}")]
    Decode(String),
    #[error("region search unavailable: {0}")]
    Unavailable(String),
}

/// Returns the places whose coordinates fall inside a region.
///
/// Implementations must be idempotent and side-effect free, and own their
/// timeouts. Methods return boxed futures for dyn-compatibility.
pub trait RegionSearch: Send + Sync {
    fn search_region(&self, region: Region) -> BoxFuture<'_, Result<Vec<RawPlace>, SearchError>>;
}

/// In-memory catalog filtered by `Region::contains`.
///
/// Places without a usable position are never returned by a search.
#[derive(Debug, Default, Clone)]
pub struct StaticPlaces {
    places: Vec<RawPlace>,
}

impl StaticPlaces {
    pub fn new(places: Vec<RawPlace>) -> Self {
        Self { places }
    }

    /// Parse a catalog file: either a bare array of places or a search
    /// response (`{"locations": [...]}`). Badly shaped entries are logged
    /// and never match a search; they do not fail the catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Catalog {
            List(Vec<RawPlace>),
            Response(SearchResponse),
        }

        let places = match serde_json::from_str(json)? {
            Catalog::List(places) => places,
            Catalog::Response(resp) => resp.locations,
        };
        let undecodable = places.iter().filter(|p| p.undecodable.is_some()).count();
        if undecodable > 0 {
            warn!("{undecodable} of {} catalog places could not be decoded", places.len());
        }
        Ok(Self::new(places))
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn within(&self, region: &Region) -> Vec<RawPlace> {
        self.places
            .iter()
            .filter(|p| p.position().is_some_and(|pos| region.contains(pos)))
            .cloned()
            .collect()
    }
}

impl RegionSearch for StaticPlaces {
    fn search_region(&self, region: Region) -> BoxFuture<'_, Result<Vec<RawPlace>, SearchError>> {
        Box::pin(async move { Ok(self.within(&region)) })
    }
}
