//! Poll loop state machine
//!
//! `PollState::update` is the whole transition function: it mutates the state
//! for one event and returns the effects the runner must carry out. It never
//! performs I/O itself, so it can be driven directly in tests.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};

use crate::poll::{Effect, PollEvent};
use crate::series::{SeriesEntry, SeriesTable};

#[derive(Debug, Clone)]
pub struct PollState {
    tracked: Vec<String>,
    table: SeriesTable,
    interval: Duration,
    last_fetch: Option<DateTime<Utc>>,
    last_error: Option<String>,
    in_flight: usize,
    finished: bool,
}

impl PollState {
    /// Track `names` (duplicates removed, order kept) with `history` samples each
    pub fn new(names: Vec<String>, interval: Duration, history: usize) -> Self {
        let mut tracked: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !tracked.contains(&name) {
                tracked.push(name);
            }
        }
        let table = SeriesTable::new(tracked.iter().cloned(), history);

        Self {
            tracked,
            table,
            interval,
            last_fetch: None,
            last_error: None,
            in_flight: 0,
            finished: false,
        }
    }

    /// Apply one event and return the effects it requires
    pub fn update(&mut self, event: PollEvent, now: DateTime<Utc>) -> Vec<Effect> {
        if self.finished {
            return Vec::new();
        }

        match event {
            PollEvent::Start => {
                debug!(series = self.tracked.len(), interval = ?self.interval, "Poll loop started");
                self.in_flight += 1;
                vec![
                    Effect::Fetch { rearm: true },
                    Effect::ArmTimer(self.interval),
                ]
            }
            PollEvent::Tick => {
                // The clock is re-armed by the completion, not here
                self.in_flight += 1;
                vec![Effect::Fetch { rearm: true }]
            }
            PollEvent::Refresh => {
                // Off-schedule; must not start another timer chain
                self.in_flight += 1;
                vec![Effect::Fetch { rearm: false }]
            }
            PollEvent::FetchCompleted { outcome, rearm } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.last_fetch = Some(now);
                match outcome {
                    Ok(batch) => {
                        self.last_error = None;
                        let report = self.table.ingest(&batch, now);
                        debug!(
                            accepted = report.accepted,
                            dropped = report.dropped_non_finite,
                            unmatched = report.unmatched,
                            "Ingested batch"
                        );
                    }
                    Err(e) => {
                        warn!(error = %e, "Fetch failed, keeping existing history");
                        self.last_error = Some(e.to_string());
                    }
                }
                if rearm {
                    vec![Effect::ArmTimer(self.interval)]
                } else {
                    Vec::new()
                }
            }
            PollEvent::Redraw => Vec::new(),
            PollEvent::Shutdown => {
                self.finished = true;
                vec![Effect::Exit]
            }
        }
    }

    /// Tracked identifiers in display order
    pub fn tracked(&self) -> &[String] {
        &self.tracked
    }

    pub fn table(&self) -> &SeriesTable {
        &self.table
    }

    pub fn series(&self, name: &str) -> Option<&SeriesEntry> {
        self.table.get(name)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Completion time of the most recent fetch, successful or not
    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch
    }

    /// Message of the most recent fetch failure, cleared by the next success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fetches issued and not yet completed
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
