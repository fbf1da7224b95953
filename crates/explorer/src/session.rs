//! The explorer session: the single event-processing path between the
//! rendering layer and the region search backend.
//!
//! Viewport-settle events and fetch completions are applied one at a time
//! through `&mut self`. Searches may overlap in `run`, but only the latest
//! issued one is ever applied; older results are dropped when they arrive
//! rather than cancelled.

use std::sync::Arc;

use foundation::viewport::ViewportState;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use layers::symbology::TierTable;
use runtime::event_bus::{Event, EventBus, EventKind};
use runtime::metrics::LoaderMetrics;
use streaming::fetch::FetchWindow;
use streaming::pipeline::{Pipeline, Resolution};
use streaming::protocol::RawPlace;
use streaming::request::Sequence;
use streaming::search::{BoxFuture, RegionSearch, SearchError};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::annotate::PlaceFeed;
use crate::config::{ConfigError, ExplorerConfig};

type SearchOutcome = (Sequence, Result<Vec<RawPlace>, SearchError>);

pub struct Explorer<S> {
    pipeline: Pipeline,
    tiers: TierTable,
    search: Arc<S>,
    events: EventBus,
    metrics: LoaderMetrics,
    zoom: f64,
    feed: watch::Sender<Arc<PlaceFeed>>,
}

impl<S: RegionSearch + 'static> Explorer<S> {
    pub fn new(config: ExplorerConfig, search: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let (feed, _) = watch::channel(Arc::new(PlaceFeed::default()));
        Ok(Self {
            pipeline: Pipeline::new(config.streaming),
            tiers: config.tier_table,
            search: Arc::new(search),
            events: EventBus::new(),
            metrics: LoaderMetrics::new(),
            zoom: 0.0,
            feed,
        })
    }

    /// Receives every feed published from now on; the current one is
    /// available immediately.
    pub fn subscribe(&self) -> watch::Receiver<Arc<PlaceFeed>> {
        self.feed.subscribe()
    }

    pub fn feed(&self) -> Arc<PlaceFeed> {
        Arc::clone(&self.feed.borrow())
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn metrics(&self) -> &LoaderMetrics {
        &self.metrics
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    /// Record a settle event. Re-annotates the cache at the new zoom and
    /// returns the window to search if a fetch is due.
    pub fn begin_viewport(&mut self, viewport: ViewportState) -> Option<FetchWindow> {
        self.zoom = viewport.zoom();
        let window = self.pipeline.on_viewport(&viewport);
        if let Some(window) = window {
            self.metrics.record_issued();
            self.events.emit(
                window.sequence.0,
                EventKind::FetchIssued {
                    region: window.region,
                },
            );
        }
        self.publish();
        window
    }

    /// Apply (or discard) the result of the search issued as `sequence`.
    pub fn complete_fetch(
        &mut self,
        sequence: Sequence,
        result: Result<Vec<RawPlace>, SearchError>,
    ) -> Arc<PlaceFeed> {
        match self.pipeline.resolve(sequence, result) {
            Resolution::Applied { report, .. } => {
                self.metrics.record_applied(report.accepted());
                if report.rejected > 0 {
                    self.metrics.record_rejected(report.rejected);
                    self.events.emit(
                        sequence.0,
                        EventKind::RecordsRejected {
                            count: report.rejected,
                        },
                    );
                }
                self.events.emit(
                    sequence.0,
                    EventKind::FetchApplied {
                        inserted: report.inserted,
                        replaced: report.replaced,
                    },
                );
            }
            Resolution::Stale { latest, .. } => {
                self.metrics.record_stale();
                self.events
                    .emit(sequence.0, EventKind::StaleDiscarded { latest: latest.0 });
                // Nothing changed; the published feed is still current.
                return self.feed();
            }
            Resolution::Failed { error, .. } => {
                self.metrics.record_failed();
                self.events.emit(
                    sequence.0,
                    EventKind::FetchFailed {
                        message: error.to_string(),
                    },
                );
            }
        }
        self.publish()
    }

    /// Settle event handled end to end: decide, search, merge, annotate.
    pub async fn handle_viewport(&mut self, viewport: ViewportState) -> Arc<PlaceFeed> {
        let Some(window) = self.begin_viewport(viewport) else {
            return self.feed();
        };
        let result = self.search.search_region(window.region).await;
        self.complete_fetch(window.sequence, result)
    }

    /// Drive the session from a stream of settle events until the sender is
    /// dropped and every outstanding search has come back.
    pub async fn run(mut self, mut viewports: mpsc::Receiver<ViewportState>) -> Self {
        let mut inflight: FuturesUnordered<BoxFuture<'static, SearchOutcome>> =
            FuturesUnordered::new();
        loop {
            tokio::select! {
                next = viewports.recv() => {
                    let Some(viewport) = next else {
                        break;
                    };
                    if let Some(window) = self.begin_viewport(viewport) {
                        inflight.push(search_window(Arc::clone(&self.search), window));
                    }
                }
                Some((sequence, result)) = inflight.next(), if !inflight.is_empty() => {
                    self.complete_fetch(sequence, result);
                }
            }
        }

        debug!("viewport feed closed; draining {} searches", inflight.len());
        while let Some((sequence, result)) = inflight.next().await {
            self.complete_fetch(sequence, result);
        }
        info!("explorer session finished: {:?}", self.metrics.snapshot());
        self
    }

    fn publish(&mut self) -> Arc<PlaceFeed> {
        let cache = self.pipeline.cache();
        self.metrics.set_cached_places(cache.len());
        let feed = Arc::new(PlaceFeed::build(
            cache.records(),
            self.zoom,
            &self.tiers,
            self.pipeline.latest_sequence(),
        ));
        self.feed.send_replace(Arc::clone(&feed));
        feed
    }
}

fn search_window<S: RegionSearch + 'static>(
    search: Arc<S>,
    window: FetchWindow,
) -> BoxFuture<'static, SearchOutcome> {
    Box::pin(async move {
        let result = search.search_region(window.region).await;
        (window.sequence, result)
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Explorer;
    use crate::config::ExplorerConfig;
    use foundation::bounds::{LatLng, Region};
    use foundation::ids::PlaceId;
    use foundation::viewport::ViewportState;
    use layers::symbology::Tier;
    use layers::zones::Zone;
    use pretty_assertions::assert_eq;
    use runtime::event_bus::EventKind;
    use streaming::protocol::{GeoPoint, RawPlace};
    use streaming::request::Sequence;
    use streaming::search::{BoxFuture, RegionSearch, SearchError, StaticPlaces};
    use tokio::sync::mpsc;

    fn viewport(north: f64, south: f64, east: f64, west: f64, zoom: f64) -> ViewportState {
        ViewportState::new(Region::new(north, south, east, west).unwrap(), zoom).unwrap()
    }

    fn place(id: &str, lat: f64, lng: f64, popularity: f64, tags: &[&str]) -> RawPlace {
        RawPlace {
            id: Some(id.into()),
            name: Some(id.replace('-', " ")),
            coordinates: Some(GeoPoint::new(LatLng::new(lat, lng).unwrap())),
            popularity_score: Some(popularity),
            category_tags: tags.iter().map(|s| s.to_string()).collect(),
            ..RawPlace::default()
        }
    }

    fn manhattan() -> Vec<RawPlace> {
        vec![
            place("central-park", 40.785091, -73.968285, 150_000.0, &["park"]),
            place("met-museum", 40.7794, -73.9632, 60_000.0, &["museum", "cafe"]),
            place("corner-cafe", 40.7612, -73.9776, 500.0, &["cafe"]),
        ]
    }

    fn midtown(zoom: f64) -> ViewportState {
        viewport(40.80, 40.75, -73.94, -74.00, zoom)
    }

    fn id(s: &str) -> PlaceId {
        PlaceId::new(s).unwrap()
    }

    struct FailingSearch;

    impl RegionSearch for FailingSearch {
        fn search_region(
            &self,
            _region: Region,
        ) -> BoxFuture<'_, Result<Vec<RawPlace>, SearchError>> {
            Box::pin(async { Err(SearchError::Unavailable("offline".into())) })
        }
    }

    /// Answers regions north of 45° quickly and everything else slowly.
    struct SkewedSearch {
        inner: StaticPlaces,
    }

    impl RegionSearch for SkewedSearch {
        fn search_region(
            &self,
            region: Region,
        ) -> BoxFuture<'_, Result<Vec<RawPlace>, SearchError>> {
            let delay = if region.south() > 45.0 { 10 } else { 500 };
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(self.inner.within(&region))
            })
        }
    }

    #[tokio::test]
    async fn first_viewport_loads_and_annotates_three_places() {
        let mut explorer =
            Explorer::new(ExplorerConfig::default(), StaticPlaces::new(manhattan())).unwrap();
        let feed = explorer.handle_viewport(midtown(6.0)).await;

        assert_eq!(feed.len(), 3);
        assert_eq!(feed.sequence, Some(Sequence(1)));
        let park = feed.get(&id("central-park")).unwrap();
        assert_eq!((park.tier, park.zone), (Some(Tier::Legendary), Zone::Nature));
        let met = feed.get(&id("met-museum")).unwrap();
        assert_eq!((met.tier, met.zone), (Some(Tier::Epic), Zone::Cultural));
        let cafe = feed.get(&id("corner-cafe")).unwrap();
        assert_eq!((cafe.tier, cafe.zone), (None, Zone::Social));

        assert_eq!(explorer.pipeline().cache().len(), 3);
        assert_eq!(explorer.metrics().fetches_issued(), 1);
        assert_eq!(explorer.metrics().fetches_applied(), 1);
    }

    #[tokio::test]
    async fn zooming_in_reveals_common_places_without_refetching() {
        let mut explorer =
            Explorer::new(ExplorerConfig::default(), StaticPlaces::new(manhattan())).unwrap();
        explorer.handle_viewport(midtown(6.0)).await;

        let closer = viewport(40.79, 40.76, -73.95, -73.99, 13.0);
        let feed = explorer.handle_viewport(closer).await;
        assert_eq!(feed.zoom, 13.0);
        assert_eq!(feed.get(&id("corner-cafe")).unwrap().tier, Some(Tier::Common));
        assert_eq!(explorer.metrics().fetches_issued(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_published_feeds() {
        let mut explorer =
            Explorer::new(ExplorerConfig::default(), StaticPlaces::new(manhattan())).unwrap();
        let rx = explorer.subscribe();
        assert!(rx.borrow().is_empty());

        explorer.handle_viewport(midtown(12.0)).await;
        assert_eq!(rx.borrow().len(), 3);
        assert_eq!(rx.borrow().revealed().count(), 3);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_places_and_reports_notice() {
        let mut explorer = Explorer::new(ExplorerConfig::default(), FailingSearch).unwrap();
        let feed = explorer.handle_viewport(midtown(12.0)).await;
        assert!(feed.is_empty());
        assert_eq!(explorer.metrics().fetches_failed(), 1);

        let events = explorer.drain_events();
        assert!(matches!(events.last().map(|e| &e.kind), Some(EventKind::FetchFailed { .. })));

        // The same viewport retries because nothing was committed.
        explorer.handle_viewport(midtown(12.0)).await;
        assert_eq!(explorer.metrics().fetches_issued(), 2);
    }

    #[tokio::test]
    async fn late_response_for_superseded_fetch_is_discarded() {
        let mut explorer =
            Explorer::new(ExplorerConfig::default(), StaticPlaces::new(manhattan())).unwrap();
        explorer.handle_viewport(midtown(12.0)).await;

        let first = explorer.begin_viewport(viewport(41.5, 41.0, -73.0, -74.0, 12.0)).unwrap();
        let second = explorer.begin_viewport(viewport(51.5, 51.0, 0.5, -0.5, 12.0)).unwrap();
        assert_eq!((first.sequence, second.sequence), (Sequence(2), Sequence(3)));

        let london = vec![place("british-museum", 51.5194, -0.127, 80_000.0, &["museum"])];
        let upstate = vec![place("bear-mountain", 41.31, -73.99, 20_000.0, &["park"])];

        explorer.complete_fetch(second.sequence, Ok(london));
        let feed = explorer.complete_fetch(first.sequence, Ok(upstate));

        assert_eq!(feed.len(), 4);
        assert!(feed.get(&id("british-museum")).is_some());
        assert!(feed.get(&id("bear-mountain")).is_none());
        assert!(feed.get(&id("central-park")).is_some());
        assert_eq!(explorer.metrics().stale_discarded(), 1);
    }

    #[tokio::test]
    async fn malformed_records_are_reported_and_skipped() {
        let mut explorer =
            Explorer::new(ExplorerConfig::default(), StaticPlaces::default()).unwrap();
        let window = explorer.begin_viewport(midtown(12.0)).unwrap();

        let mut batch = manhattan();
        batch.push(RawPlace {
            coordinates: Some(GeoPoint::new(LatLng::new(40.77, -73.97).unwrap())),
            ..RawPlace::default()
        });
        let feed = explorer.complete_fetch(window.sequence, Ok(batch));
        assert_eq!(feed.len(), 3);
        assert_eq!(explorer.metrics().records_rejected(), 1);
        assert!(explorer
            .events()
            .iter()
            .any(|e| e.kind == EventKind::RecordsRejected { count: 1 }));
    }

    #[tokio::test(start_paused = true)]
    async fn run_drops_slow_superseded_search() {
        let mut places = manhattan();
        places.push(place("british-museum", 51.5194, -0.127, 80_000.0, &["museum"]));
        let search = SkewedSearch {
            inner: StaticPlaces::new(places),
        };
        let explorer = Explorer::new(ExplorerConfig::default(), search).unwrap();

        let (tx, rx) = mpsc::channel(8);
        tx.send(midtown(12.0)).await.unwrap();
        tx.send(viewport(51.55, 51.5, -0.1, -0.15, 12.0)).await.unwrap();
        drop(tx);

        let explorer = explorer.run(rx).await;
        let feed = explorer.feed();
        assert_eq!(feed.len(), 1);
        assert!(feed.get(&id("british-museum")).is_some());
        assert_eq!(explorer.metrics().fetches_issued(), 2);
        assert_eq!(explorer.metrics().stale_discarded(), 1);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = ExplorerConfig::default();
        config.streaming.fetch_threshold = 0.1;
        assert!(Explorer::new(config, StaticPlaces::default()).is_err());
    }
}
