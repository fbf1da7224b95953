use serde::{Deserialize, Serialize};

use crate::bounds::{Region, RegionError};

/// What the camera shows once it has settled: visible bounds plus zoom.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ViewportRepr", into = "ViewportRepr")]
pub struct ViewportState {
    region: Region,
    zoom: f64,
}

impl ViewportState {
    pub fn new(region: Region, zoom: f64) -> Result<Self, RegionError> {
        if !zoom.is_finite() || zoom < 0.0 {
            return Err(RegionError::InvalidZoom(zoom));
        }
        Ok(Self { region, zoom })
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }
}

#[derive(Serialize, Deserialize)]
struct ViewportRepr {
    bounds: Region,
    zoom: f64,
}

impl TryFrom<ViewportRepr> for ViewportState {
    type Error = RegionError;

    fn try_from(r: ViewportRepr) -> Result<Self, Self::Error> {
        ViewportState::new(r.bounds, r.zoom)
    }
}

impl From<ViewportState> for ViewportRepr {
    fn from(v: ViewportState) -> Self {
        ViewportRepr {
            bounds: v.region,
            zoom: v.zoom,
        }
    }
}
