use foundation::bounds::Region;
use serde::Serialize;

use crate::request::Sequence;

/// Default refetch trigger: fraction of the last window's span the viewport
/// may reach toward an edge before a new fetch is due.
pub const DEFAULT_FETCH_THRESHOLD: f64 = 0.75;

/// Tolerance for edge comparisons, in degrees.
///
/// A viewport sits exactly on the threshold of the window buffered from it
/// (with the default fraction and threshold), so re-reporting it must not
/// refetch because of rounding.
pub const EDGE_EPSILON_DEG: f64 = 1e-9;

/// The buffered region most recently requested, tagged with its sequence.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct FetchWindow {
    pub region: Region,
    pub sequence: Sequence,
}

/// Decides whether the current viewport has moved far enough into the last
/// fetch window to warrant a new fetch.
///
/// Every edge is checked independently and any one of them is enough:
/// - north: `current.north > last.south + t * lat_span`
/// - south: `current.south < last.north - t * lat_span`
/// - east:  `current.east > last.west + t * lng_span`
/// - west:  `current.west < last.east - t * lng_span`
pub fn should_fetch(current: &Region, last: Option<&Region>, threshold: f64) -> bool {
    let Some(last) = last else {
        return true;
    };

    let lat_reach = last.lat_span() * threshold;
    let lng_reach = last.lng_span() * threshold;

    current.north() > last.south() + lat_reach + EDGE_EPSILON_DEG
        || current.south() < last.north() - lat_reach - EDGE_EPSILON_DEG
        || current.east() > last.west() + lng_reach + EDGE_EPSILON_DEG
        || current.west() < last.east() - lng_reach - EDGE_EPSILON_DEG
}
