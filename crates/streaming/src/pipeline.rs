use foundation::ids::PlaceId;
use foundation::viewport::ViewportState;
use tracing::{debug, info, warn};

use crate::buffer::compute_buffer;
use crate::cache::{CacheBudget, MergeReport, PlaceCache};
use crate::config::StreamingConfig;
use crate::fetch::{FetchWindow, should_fetch};
use crate::protocol::RawPlace;
use crate::request::Sequence;
use crate::search::SearchError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    FetchInFlight(Sequence),
}

/// What happened to a search result handed back to the pipeline.
#[derive(Debug)]
pub enum Resolution {
    Applied {
        sequence: Sequence,
        report: MergeReport,
        evicted: Vec<PlaceId>,
    },
    /// Superseded by a newer fetch; the result was dropped.
    Stale { sequence: Sequence, latest: Sequence },
    /// The current fetch failed; the cache is untouched.
    Failed {
        sequence: Sequence,
        error: SearchError,
    },
}

/// Fetch decisions plus the place cache, driven one event at a time.
///
/// State machine:
/// - `Idle` → `FetchInFlight(n + 1)` on a positive fetch decision
/// - `FetchInFlight(n)` → `FetchInFlight(n + 1)` when a newer decision
///   supersedes the fetch; the older result is dropped when it arrives
/// - `FetchInFlight(n)` → `Idle` when result `n` arrives
///
/// Decisions are made against the most recently *issued* window so an
/// in-flight fetch is not duplicated. If that fetch fails the window rolls
/// back to the last one that actually loaded, which lets the next settle
/// event retry the same area.
#[derive(Debug)]
pub struct Pipeline {
    config: StreamingConfig,
    cache: PlaceCache,
    state: LoadState,
    latest: Sequence,
    window: Option<FetchWindow>,
    committed: Option<FetchWindow>,
}

impl Pipeline {
    pub fn new(config: StreamingConfig) -> Self {
        let budget = CacheBudget::new(config.max_cached_places);
        Self {
            config,
            cache: PlaceCache::new(budget),
            state: LoadState::Idle,
            latest: Sequence(0),
            window: None,
            committed: None,
        }
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    pub fn cache(&self) -> &PlaceCache {
        &self.cache
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Window that fetch decisions are currently made against.
    pub fn window(&self) -> Option<&FetchWindow> {
        self.window.as_ref()
    }

    /// Window of the last fetch that was applied.
    pub fn committed_window(&self) -> Option<&FetchWindow> {
        self.committed.as_ref()
    }

    pub fn latest_sequence(&self) -> Option<Sequence> {
        (self.latest.0 > 0).then_some(self.latest)
    }

    /// Handle a camera-settle event. Returns the window to fetch, if any.
    pub fn on_viewport(&mut self, viewport: &ViewportState) -> Option<FetchWindow> {
        let last = self.window.as_ref().map(|w| &w.region);
        if !should_fetch(viewport.region(), last, self.config.fetch_threshold) {
            debug!("viewport within fetch window; no fetch");
            return None;
        }

        let sequence = self.latest.next();
        let window = FetchWindow {
            region: compute_buffer(viewport.region(), self.config.buffer_fraction),
            sequence,
        };
        if let LoadState::FetchInFlight(previous) = self.state {
            debug!("fetch {sequence} supersedes in-flight fetch {previous}");
        }
        info!("issuing fetch {sequence} for {:?}", window.region);

        self.latest = sequence;
        self.window = Some(window);
        self.state = LoadState::FetchInFlight(sequence);
        Some(window)
    }

    /// Hand back the outcome of the search issued as `sequence`.
    pub fn resolve(
        &mut self,
        sequence: Sequence,
        result: Result<Vec<RawPlace>, SearchError>,
    ) -> Resolution {
        if self.state != LoadState::FetchInFlight(sequence) {
            debug!(
                "discarding stale result for fetch {sequence} (latest {})",
                self.latest
            );
            return Resolution::Stale {
                sequence,
                latest: self.latest,
            };
        }

        self.state = LoadState::Idle;
        match result {
            Ok(places) => {
                let report = self.cache.merge_raw(places);
                self.committed = self.window;
                let active = self.window.as_ref().map(|w| &w.region);
                let evicted = self.cache.evict_as_needed(active);
                info!(
                    "applied fetch {sequence}: {} inserted, {} replaced, {} rejected, {} evicted",
                    report.inserted,
                    report.replaced,
                    report.rejected,
                    evicted.len()
                );
                Resolution::Applied {
                    sequence,
                    report,
                    evicted,
                }
            }
            Err(error) => {
                warn!("fetch {sequence} failed: {error}");
                self.window = self.committed;
                Resolution::Failed { sequence, error }
            }
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(StreamingConfig::default())
    }
}
