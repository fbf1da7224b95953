use foundation::bounds::Region;

/// Non-fatal notices the loader hands to the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    FetchIssued { region: Region },
    FetchApplied { inserted: usize, replaced: usize },
    StaleDiscarded { latest: u64 },
    FetchFailed { message: String },
    RecordsRejected { count: usize },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::FetchIssued { .. } => "fetch_issued",
            EventKind::FetchApplied { .. } => "fetch_applied",
            EventKind::StaleDiscarded { .. } => "stale_discarded",
            EventKind::FetchFailed { .. } => "fetch_failed",
            EventKind::RecordsRejected { .. } => "records_rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Fetch sequence the event belongs to.
    pub sequence: u64,
    pub kind: EventKind,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, sequence: u64, kind: EventKind) {
        self.events.push(Event { sequence, kind });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
