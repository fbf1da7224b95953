use std::collections::BTreeMap;

use foundation::bounds::Region;
use foundation::ids::PlaceId;
use tracing::{debug, warn};

use crate::place::PlaceRecord;
use crate::protocol::RawPlace;

/// Default soft limit on cached places.
pub const DEFAULT_MAX_CACHED_PLACES: usize = 10_000;

/// Replace-by-id additive union.
///
/// Incoming records overwrite existing records with the same id in full;
/// existing records missing from `incoming` are kept.
pub fn merge(
    existing: &BTreeMap<PlaceId, PlaceRecord>,
    incoming: impl IntoIterator<Item = PlaceRecord>,
) -> BTreeMap<PlaceId, PlaceRecord> {
    let mut out = existing.clone();
    for record in incoming {
        out.insert(record.id.clone(), record);
    }
    out
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CacheBudget {
    pub max_places: usize,
}

impl CacheBudget {
    pub fn new(max_places: usize) -> Self {
        Self { max_places }
    }
}

impl Default for CacheBudget {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CACHED_PLACES)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub inserted: usize,
    pub replaced: usize,
    pub rejected: usize,
}

impl MergeReport {
    pub fn accepted(&self) -> usize {
        self.inserted + self.replaced
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    record: PlaceRecord,
    last_merged_tick: u64,
}

/// Places loaded so far, keyed by id.
///
/// Entries outside the active fetch window are kept as a soft cache so that
/// panning back does not blank markers. When the budget is exceeded the
/// least recently merged entries outside the window go first, ties broken by
/// id so eviction is deterministic.
#[derive(Debug)]
pub struct PlaceCache {
    budget: CacheBudget,
    tick: u64,
    entries: BTreeMap<PlaceId, CacheEntry>,
}

impl PlaceCache {
    pub fn new(budget: CacheBudget) -> Self {
        Self {
            budget,
            tick: 0,
            entries: BTreeMap::new(),
        }
    }

    pub fn budget(&self) -> CacheBudget {
        self.budget
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &PlaceId) -> Option<&PlaceRecord> {
        self.entries.get(id).map(|e| &e.record)
    }

    /// Records in id order.
    pub fn records(&self) -> impl Iterator<Item = &PlaceRecord> {
        self.entries.values().map(|e| &e.record)
    }

    pub fn to_map(&self) -> BTreeMap<PlaceId, PlaceRecord> {
        self.entries
            .iter()
            .map(|(id, e)| (id.clone(), e.record.clone()))
            .collect()
    }

    /// Merge already-validated records.
    pub fn merge_records(&mut self, incoming: impl IntoIterator<Item = PlaceRecord>) -> MergeReport {
        self.tick += 1;
        let mut report = MergeReport::default();
        for record in incoming {
            let entry = CacheEntry {
                record,
                last_merged_tick: self.tick,
            };
            match self.entries.insert(entry.record.id.clone(), entry) {
                Some(_) => report.replaced += 1,
                None => report.inserted += 1,
            }
        }
        report
    }

    /// Validate and merge a search batch.
    ///
    /// Malformed places are dropped with a diagnostic; the rest of the batch
    /// is still merged.
    pub fn merge_raw(&mut self, incoming: Vec<RawPlace>) -> MergeReport {
        let mut rejected = 0;
        let mut valid = Vec::with_capacity(incoming.len());
        for raw in incoming {
            match PlaceRecord::try_from(raw) {
                Ok(record) => valid.push(record),
                Err(err) => {
                    warn!("dropping malformed place: {err}");
                    rejected += 1;
                }
            }
        }
        let mut report = self.merge_records(valid);
        report.rejected = rejected;
        report
    }

    /// Evict down to the budget, never touching places inside `active`.
    ///
    /// Returns evicted ids in eviction order. If every remaining entry lies
    /// inside `active`, the cache is left over budget.
    pub fn evict_as_needed(&mut self, active: Option<&Region>) -> Vec<PlaceId> {
        let excess = self.entries.len().saturating_sub(self.budget.max_places);
        if excess == 0 {
            return Vec::new();
        }

        let mut candidates: Vec<(u64, &PlaceId)> = self
            .entries
            .iter()
            .filter(|(_, e)| !active.is_some_and(|r| r.contains(e.record.coordinates)))
            .map(|(id, e)| (e.last_merged_tick, id))
            .collect();
        candidates.sort();

        let evicted: Vec<PlaceId> = candidates
            .into_iter()
            .take(excess)
            .map(|(_, id)| id.clone())
            .collect();
        for id in &evicted {
            self.entries.remove(id);
        }

        if self.entries.len() > self.budget.max_places {
            debug!(
                "place cache over budget: {} > {} (remaining entries are in view)",
                self.entries.len(),
                self.budget.max_places
            );
        }
        evicted
    }
}

impl Default for PlaceCache {
    fn default() -> Self {
        Self::new(CacheBudget::default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{CacheBudget, PlaceCache, merge};
    use crate::place::PlaceRecord;
    use crate::protocol::{GeoPoint, RawPlace, SearchResponse};
    use foundation::bounds::{LatLng, Region};
    use foundation::ids::PlaceId;
    use pretty_assertions::assert_eq;

    fn record(id: &str, lat: f64, lng: f64, popularity: f64) -> PlaceRecord {
        PlaceRecord {
            id: PlaceId::new(id).unwrap(),
            name: id.to_uppercase(),
            coordinates: LatLng::new(lat, lng).unwrap(),
            popularity_score: popularity,
            reward_score: 60.0,
            category_tags: ["cafe".to_string()].into_iter().collect(),
        }
    }

    fn keyed(records: &[PlaceRecord]) -> BTreeMap<PlaceId, PlaceRecord> {
        records.iter().map(|r| (r.id.clone(), r.clone())).collect()
    }

    #[test]
    fn merging_nothing_is_a_no_op() {
        let existing = keyed(&[record("a", 1.0, 1.0, 5.0)]);
        assert_eq!(merge(&existing, Vec::new()), existing);
    }

    #[test]
    fn merging_into_empty_yields_incoming() {
        let incoming = vec![record("a", 1.0, 1.0, 5.0), record("b", 2.0, 2.0, 6.0)];
        assert_eq!(merge(&BTreeMap::new(), incoming.clone()), keyed(&incoming));
    }

    #[test]
    fn same_id_is_replaced_entirely_and_others_are_kept() {
        let existing = keyed(&[record("a", 1.0, 1.0, 5.0), record("b", 2.0, 2.0, 6.0)]);
        let mut newer = record("a", 3.0, 3.0, 7.0);
        newer.category_tags.clear();
        newer.name = "Renamed".into();

        let merged = merge(&existing, vec![newer.clone()]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[&newer.id], newer);
        assert!(merged[&newer.id].category_tags.is_empty());
        assert_eq!(merged[&PlaceId::new("b").unwrap()], existing[&PlaceId::new("b").unwrap()]);
    }

    #[test]
    fn cache_reports_inserted_and_replaced() {
        let mut cache = PlaceCache::default();
        let first = cache.merge_records(vec![record("a", 1.0, 1.0, 1.0), record("b", 1.0, 1.0, 1.0)]);
        assert_eq!((first.inserted, first.replaced), (2, 0));

        let second = cache.merge_records(vec![record("b", 2.0, 2.0, 2.0), record("c", 1.0, 1.0, 1.0)]);
        assert_eq!((second.inserted, second.replaced), (1, 1));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&PlaceId::new("b").unwrap()).unwrap().popularity_score, 2.0);
    }

    #[test]
    fn malformed_places_are_dropped_without_aborting_the_batch() {
        let good = RawPlace {
            id: Some("good".into()),
            coordinates: Some(GeoPoint::new(LatLng::new(1.0, 1.0).unwrap())),
            ..RawPlace::default()
        };
        let no_id = RawPlace {
            coordinates: Some(GeoPoint::new(LatLng::new(1.0, 1.0).unwrap())),
            ..RawPlace::default()
        };
        let no_coords = RawPlace {
            id: Some("lost".into()),
            ..RawPlace::default()
        };

        let mut cache = PlaceCache::default();
        let report = cache.merge_raw(vec![no_id, good, no_coords]);
        assert_eq!(report.accepted(), 1);
        assert_eq!(report.rejected, 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&PlaceId::new("lost").unwrap()).is_none());
    }

    #[test]
    fn eviction_spares_places_in_the_active_window() {
        let mut cache = PlaceCache::new(CacheBudget::new(2));
        cache.merge_records(vec![record("old-far", 10.0, 10.0, 1.0)]);
        cache.merge_records(vec![record("old-near", 0.5, 0.5, 1.0)]);
        cache.merge_records(vec![record("new-far", 20.0, 20.0, 1.0)]);

        let active = Region::new(1.0, 0.0, 1.0, 0.0).unwrap();
        let evicted = cache.evict_as_needed(Some(&active));
        assert_eq!(evicted, vec![PlaceId::new("old-far").unwrap()]);
        assert!(cache.get(&PlaceId::new("old-near").unwrap()).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_stays_over_budget_when_everything_is_in_view() {
        let mut cache = PlaceCache::new(CacheBudget::new(1));
        cache.merge_records(vec![record("a", 0.2, 0.2, 1.0), record("b", 0.4, 0.4, 1.0)]);
        let active = Region::new(1.0, 0.0, 1.0, 0.0).unwrap();
        assert!(cache.evict_as_needed(Some(&active)).is_empty());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn eviction_ties_break_by_id() {
        let mut cache = PlaceCache::new(CacheBudget::new(1));
        cache.merge_records(vec![record("b", 5.0, 5.0, 1.0), record("a", 6.0, 6.0, 1.0)]);
        let evicted = cache.evict_as_needed(None);
        assert_eq!(evicted, vec![PlaceId::new("a").unwrap()]);
    }

    #[test]
    fn badly_shaped_record_in_a_response_is_rejected_alone() {
        let body = r#"{"locations": [
            {"id": "good", "coordinates": {"type": "Point", "coordinates": [1.0, 1.0, 12.0]}},
            {"id": "bad", "coordinates": {"type": "Point", "coordinates": "nowhere"}}
        ]}"#;
        let resp: SearchResponse = serde_json::from_str(body).unwrap();

        let mut cache = PlaceCache::default();
        let report = cache.merge_raw(resp.locations);
        assert_eq!((report.accepted(), report.rejected), (1, 1));
        assert!(cache.get(&PlaceId::new("good").unwrap()).is_some());
        assert!(cache.get(&PlaceId::new("bad").unwrap()).is_none());
    }
}
