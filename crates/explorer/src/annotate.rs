use std::collections::BTreeMap;

use foundation::ids::PlaceId;
use layers::symbology::{Tier, TierTable};
use layers::zones::{Zone, determine_zone};
use serde::Serialize;
use streaming::place::PlaceRecord;
use streaming::request::Sequence;

/// A cached place with its derived tier and zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedPlace {
    #[serde(flatten)]
    pub record: PlaceRecord,
    /// `None` until the map is zoomed in far enough for this place's tier.
    pub tier: Option<Tier>,
    pub zone: Zone,
}

impl AnnotatedPlace {
    pub fn new(record: PlaceRecord, zoom: f64, tiers: &TierTable) -> Self {
        let tier = tiers.classify(record.popularity_score, zoom);
        let zone = determine_zone(&record.category_tags);
        Self { record, tier, zone }
    }

    pub fn is_revealed(&self) -> bool {
        self.tier.is_some()
    }
}

/// Full id → annotated place mapping handed to the rendering layer, which
/// reconciles its markers against it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceFeed {
    /// Latest fetch issued when the feed was built.
    pub sequence: Option<Sequence>,
    pub zoom: f64,
    pub places: BTreeMap<PlaceId, AnnotatedPlace>,
}

impl PlaceFeed {
    pub fn build<'a>(
        records: impl IntoIterator<Item = &'a PlaceRecord>,
        zoom: f64,
        tiers: &TierTable,
        sequence: Option<Sequence>,
    ) -> Self {
        let places = records
            .into_iter()
            .map(|r| (r.id.clone(), AnnotatedPlace::new(r.clone(), zoom, tiers)))
            .collect();
        Self {
            sequence,
            zoom,
            places,
        }
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn get(&self, id: &PlaceId) -> Option<&AnnotatedPlace> {
        self.places.get(id)
    }

    /// Places whose tier is revealed at the feed's zoom.
    pub fn revealed(&self) -> impl Iterator<Item = &AnnotatedPlace> {
        self.places.values().filter(|p| p.is_revealed())
    }
}
