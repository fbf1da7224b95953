//! Wire types for the region search endpoint.
//!
//! The client posts the buffered fetch window and receives every known place
//! inside it:
//! - request:  `{"bounds": {"north", "south", "east", "west"}}`
//! - response: `{"locations": [RawPlace, ...]}`
//!
//! Places are decoded one element at a time. A record with the wrong shape
//! becomes an undecodable `RawPlace` instead of failing its whole response;
//! `PlaceRecord::try_from` is the validation boundary.

use foundation::bounds::{LatLng, Region};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path of the region search endpoint, relative to the service base URL.
pub const SEARCH_PATH: &str = "/api/locations/search";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub bounds: Region,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub locations: Vec<RawPlace>,
}

/// GeoJSON point: `{"type": "Point", "coordinates": [lng, lat]}`.
///
/// Positions may carry extra members (altitude); only the first two are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl GeoPoint {
    pub fn new(position: LatLng) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: vec![position.lng, position.lat],
        }
    }

    pub fn to_lat_lng(&self) -> Option<LatLng> {
        match self.coordinates.as_slice() {
            [lng, lat, ..] => LatLng::new(*lat, *lng).ok(),
            _ => None,
        }
    }
}

/// A place as the search backend sends it. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct RawPlace {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_score: Option<f64>,
    /// Review count; stands in for popularity when no score is sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ratings_total: Option<f64>,
    /// Star rating; stands in for reward when no score is sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub category_tags: Vec<String>,
    /// Why the record could not be read, if it could not.
    #[serde(skip)]
    pub undecodable: Option<String>,
}

impl RawPlace {
    /// Position of this place, if it carries a usable GeoJSON point.
    pub fn position(&self) -> Option<LatLng> {
        let point = self.coordinates.as_ref()?;
        if point.kind != "Point" {
            return None;
        }
        point.to_lat_lng()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePlace {
    #[serde(default, alias = "place_id")]
    id: Option<WireId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    coordinates: Option<GeoPoint>,
    #[serde(default)]
    popularity_score: Option<f64>,
    #[serde(default)]
    reward_score: Option<f64>,
    #[serde(default, alias = "user_ratings_total")]
    user_ratings_total: Option<f64>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default, alias = "types")]
    category_tags: Vec<String>,
}

/// Backends disagree on whether ids are strings or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl From<Value> for RawPlace {
    fn from(value: Value) -> Self {
        let id = ["id", "place_id"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .map(str::to_owned);
        match serde_json::from_value::<WirePlace>(value) {
            Ok(wire) => RawPlace {
                id: wire.id.map(|id| match id {
                    WireId::Text(text) => text,
                    WireId::Number(n) => n.to_string(),
                }),
                name: wire.name,
                coordinates: wire.coordinates,
                popularity_score: wire.popularity_score,
                reward_score: wire.reward_score,
                user_ratings_total: wire.user_ratings_total,
                rating: wire.rating,
                category_tags: wire.category_tags,
                undecodable: None,
            },
            Err(err) => RawPlace {
                id,
                undecodable: Some(err.to_string()),
                ..RawPlace::default()
            },
        }
    }
}
