//! Bounded per-series history
//!
//! `SeriesBuffer` holds the recent samples of one series and computes
//! statistics over them; `SeriesTable` maps tracked identifiers to buffers.

pub mod buffer;
pub mod table;

pub use buffer::{SeriesBuffer, Trend};
pub use table::{IngestReport, SeriesEntry, SeriesTable};
