/// Loader counters.
///
/// Everything here is driven by events, never by wall-clock time, so two runs
/// over the same viewport script produce identical snapshots.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoaderMetrics {
    fetches_issued: u64,
    fetches_applied: u64,
    fetches_failed: u64,
    stale_discarded: u64,
    records_rejected: u64,
    cached_places: u64,
    batch_sizes: Histogram,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Histogram {
    pub count: u64,
    pub sum: u64,
    pub min: u64,
    pub max: u64,
}

impl Histogram {
    pub fn record(&mut self, value: u64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }
}

/// Sorted name/value view for logs and debug overlays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(&'static str, u64)>,
    pub batch_sizes: Histogram,
}

impl LoaderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_issued(&mut self) {
        self.fetches_issued += 1;
    }

    pub fn record_applied(&mut self, batch_len: usize) {
        self.fetches_applied += 1;
        self.batch_sizes.record(batch_len as u64);
    }

    pub fn record_failed(&mut self) {
        self.fetches_failed += 1;
    }

    pub fn record_stale(&mut self) {
        self.stale_discarded += 1;
    }

    pub fn record_rejected(&mut self, count: usize) {
        self.records_rejected += count as u64;
    }

    pub fn set_cached_places(&mut self, count: usize) {
        self.cached_places = count as u64;
    }

    pub fn fetches_issued(&self) -> u64 {
        self.fetches_issued
    }

    pub fn fetches_applied(&self) -> u64 {
        self.fetches_applied
    }

    pub fn fetches_failed(&self) -> u64 {
        self.fetches_failed
    }

    pub fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    pub fn records_rejected(&self) -> u64 {
        self.records_rejected
    }

    pub fn cached_places(&self) -> u64 {
        self.cached_places
    }

    pub fn batch_sizes(&self) -> Histogram {
        self.batch_sizes
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: vec![
                ("cached_places", self.cached_places),
                ("fetches_applied", self.fetches_applied),
                ("fetches_failed", self.fetches_failed),
                ("fetches_issued", self.fetches_issued),
                ("records_rejected", self.records_rejected),
                ("stale_discarded", self.stale_discarded),
            ],
            batch_sizes: self.batch_sizes,
        }
    }
}
