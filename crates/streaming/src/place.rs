use std::collections::BTreeSet;

use foundation::bounds::LatLng;
use foundation::ids::PlaceId;
use serde::Serialize;
use thiserror::Error;

use crate::protocol::RawPlace;

/// Rating assumed for places that report neither a reward nor a rating.
pub const DEFAULT_RATING: f64 = 3.0;

/// Aura granted per rating star.
pub const REWARD_PER_STAR: f64 = 20.0;

/// A validated place. Replaced wholesale when the same id arrives again.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    pub id: PlaceId,
    pub name: String,
    pub coordinates: LatLng,
    pub popularity_score: f64,
    pub reward_score: f64,
    pub category_tags: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedPlace {
    #[error("place {} could not be decoded: {reason}", .id.as_deref().unwrap_or("without id"))]
    Undecodable { id: Option<String>, reason: String },
    #[error("place has no id")]
    MissingId,
    #[error("place {id} has no usable coordinates")]
    MissingCoordinates { id: String },
    #[error("place {id} has invalid {field}: {value}")]
    InvalidScore {
        id: String,
        field: &'static str,
        value: f64,
    },
}

impl TryFrom<RawPlace> for PlaceRecord {
    type Error = MalformedPlace;

    fn try_from(raw: RawPlace) -> Result<Self, Self::Error> {
        if let Some(reason) = raw.undecodable {
            return Err(MalformedPlace::Undecodable { id: raw.id, reason });
        }
        let id = raw
            .id
            .as_deref()
            .and_then(PlaceId::new)
            .ok_or(MalformedPlace::MissingId)?;
        let coordinates = raw
            .position()
            .ok_or_else(|| MalformedPlace::MissingCoordinates {
                id: id.to_string(),
            })?;

        let popularity_score = raw
            .popularity_score
            .or(raw.user_ratings_total)
            .unwrap_or(0.0);
        let reward_score = match raw.reward_score {
            Some(score) => score,
            None => (raw.rating.unwrap_or(DEFAULT_RATING) * REWARD_PER_STAR).floor(),
        };
        check_score(&id, "popularity score", popularity_score)?;
        check_score(&id, "reward score", reward_score)?;

        let name = match raw.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => id.to_string(),
        };

        Ok(PlaceRecord {
            id,
            name,
            coordinates,
            popularity_score,
            reward_score,
            category_tags: raw.category_tags.into_iter().collect(),
        })
    }
}

fn check_score(id: &PlaceId, field: &'static str, value: f64) -> Result<(), MalformedPlace> {
    if value.is_finite() && value >= 0.0 {
        return Ok(());
    }
    Err(MalformedPlace::InvalidScore {
        id: id.to_string(),
        field,
        value,
    })
}
