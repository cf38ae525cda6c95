use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

use crate::series::SeriesBuffer;
use crate::source::MetricSample;

/// History and metadata of one tracked series
#[derive(Debug, Clone)]
pub struct SeriesEntry {
    pub name: String,
    pub buffer: SeriesBuffer,
    /// HELP text from the most recent accepted sample
    pub help: Option<String>,
    /// When a sample was last pushed into `buffer`
    pub last_updated: Option<DateTime<Utc>>,
}

/// Counts from a single ingest call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub accepted: usize,
    pub dropped_non_finite: usize,
    pub unmatched: usize,
}

/// Tracked series keyed by identifier
#[derive(Debug, Clone)]
pub struct SeriesTable {
    entries: HashMap<String, SeriesEntry>,
}

impl SeriesTable {
    /// Create one empty buffer of `capacity` per tracked name
    pub fn new<I, S>(names: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                let entry = SeriesEntry {
                    name: name.clone(),
                    buffer: SeriesBuffer::new(capacity),
                    help: None,
                    last_updated: None,
                };
                (name, entry)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&SeriesEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Push every finite sample of a tracked series into its buffer
    ///
    /// Samples for untracked names are ignored. NaN and infinite values are
    /// dropped before they reach a buffer.
    pub fn ingest(&mut self, batch: &[MetricSample], at: DateTime<Utc>) -> IngestReport {
        let mut report = IngestReport::default();

        for sample in batch {
            let Some(entry) = self.entries.get_mut(&sample.name) else {
                report.unmatched += 1;
                continue;
            };

            if !sample.value.is_finite() {
                debug!(series = %sample.name, value = sample.value, "Dropping non-finite sample");
                report.dropped_non_finite += 1;
                continue;
            }

            entry.buffer.push(sample.value);
            entry.last_updated = Some(at);
            if !sample.help.is_empty() {
                entry.help = Some(sample.help.clone());
            }
            report.accepted += 1;
        }

        report
    }
}
