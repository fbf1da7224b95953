use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RegionError {
    #[error("region bounds must be finite")]
    NonFinite,
    #[error("north ({north}) must be greater than south ({south})")]
    Inverted { north: f64, south: f64 },
    #[error("east ({east}) must be greater than west ({west})")]
    Empty { east: f64, west: f64 },
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("zoom must be finite and non-negative, got {0}")]
    InvalidZoom(f64),
}

/// A geographic point in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Result<Self, RegionError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(RegionError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(RegionError::LatitudeOutOfRange(lat));
        }
        Ok(Self { lat, lng })
    }
}

/// Axis-aligned lat/lng rectangle.
///
/// Longitudes are unwrapped: a view that crosses the antimeridian has
/// `east > 180` (or `west < -180`), so `east > west` always holds and spans
/// are plain differences.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RegionRepr", into = "RegionRepr")]
pub struct Region {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
}

impl Region {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, RegionError> {
        if ![north, south, east, west].iter().all(|v| v.is_finite()) {
            return Err(RegionError::NonFinite);
        }
        if north <= south {
            return Err(RegionError::Inverted { north, south });
        }
        if east <= west {
            return Err(RegionError::Empty { east, west });
        }
        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }

    /// Build from south-west and north-east corners, the way map cameras
    /// report their visible bounds.
    pub fn from_corners(south_west: LatLng, north_east: LatLng) -> Result<Self, RegionError> {
        Self::new(north_east.lat, south_west.lat, north_east.lng, south_west.lng)
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lng_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.north + self.south) * 0.5,
            lng: (self.east + self.west) * 0.5,
        }
    }

    /// Inclusive containment. The point's longitude is shifted by whole turns
    /// so wrapped coordinates match unwrapped regions.
    pub fn contains(&self, point: LatLng) -> bool {
        if point.lat < self.south || point.lat > self.north {
            return false;
        }
        let lng = self.west + (point.lng - self.west).rem_euclid(360.0);
        lng <= self.east
    }

    pub fn contains_region(&self, other: &Region) -> bool {
        other.north <= self.north
            && other.south >= self.south
            && other.east <= self.east
            && other.west >= self.west
    }
}

#[derive(Serialize, Deserialize)]
struct RegionRepr {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
}

impl TryFrom<RegionRepr> for Region {
    type Error = RegionError;

    fn try_from(r: RegionRepr) -> Result<Self, Self::Error> {
        Region::new(r.north, r.south, r.east, r.west)
    }
}

impl From<Region> for RegionRepr {
    fn from(r: Region) -> Self {
        RegionRepr {
            north: r.north,
            south: r.south,
            east: r.east,
            west: r.west,
        }
    }
}
