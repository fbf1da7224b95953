use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::DEFAULT_BUFFER_FRACTION;
use crate::cache::DEFAULT_MAX_CACHED_PLACES;
use crate::fetch::DEFAULT_FETCH_THRESHOLD;

/// Configuration for viewport-driven loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamingConfig {
    /// Padding added on each side of the viewport, as a fraction of its span.
    pub buffer_fraction: f64,

    /// Fraction of the last window's span the viewport may reach toward an
    /// edge before a refetch.
    pub fetch_threshold: f64,

    /// Soft limit on cached places.
    pub max_cached_places: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            buffer_fraction: DEFAULT_BUFFER_FRACTION,
            fetch_threshold: DEFAULT_FETCH_THRESHOLD,
            max_cached_places: DEFAULT_MAX_CACHED_PLACES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidStreamingConfig {
    #[error("bufferFraction must be finite and non-negative, got {0}")]
    BufferFraction(f64),
    #[error("fetchThreshold must be in (0, 1], got {0}")]
    FetchThreshold(f64),
    #[error(
        "fetchThreshold {threshold} is below {minimum} for bufferFraction {buffer_fraction}; \
         every settle would refetch"
    )]
    Churning {
        threshold: f64,
        buffer_fraction: f64,
        minimum: f64,
    },
    #[error("maxCachedPlaces must be at least 1")]
    EmptyCache,
}

impl StreamingConfig {
    /// Smallest threshold at which a viewport does not immediately trigger a
    /// refetch against the window buffered from it.
    pub fn min_stable_threshold(buffer_fraction: f64) -> f64 {
        (1.0 + buffer_fraction) / (1.0 + 2.0 * buffer_fraction)
    }

    pub fn validate(&self) -> Result<(), InvalidStreamingConfig> {
        if !self.buffer_fraction.is_finite() || self.buffer_fraction < 0.0 {
            return Err(InvalidStreamingConfig::BufferFraction(self.buffer_fraction));
        }
        if !(self.fetch_threshold > 0.0 && self.fetch_threshold <= 1.0) {
            return Err(InvalidStreamingConfig::FetchThreshold(self.fetch_threshold));
        }
        let minimum = Self::min_stable_threshold(self.buffer_fraction);
        if self.fetch_threshold + 1e-12 < minimum {
            return Err(InvalidStreamingConfig::Churning {
                threshold: self.fetch_threshold,
                buffer_fraction: self.buffer_fraction,
                minimum,
            });
        }
        if self.max_cached_places == 0 {
            return Err(InvalidStreamingConfig::EmptyCache);
        }
        Ok(())
    }
}
