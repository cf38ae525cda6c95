use std::time::Duration;

use crate::error::SourceResult;
use crate::source::MetricSample;

/// Everything the poll loop reacts to, processed one at a time
#[derive(Debug)]
pub enum PollEvent {
    /// Loop start: fetch immediately and arm the clock
    Start,
    /// Clock fired
    Tick,
    /// User asked for a fetch outside the schedule
    Refresh,
    /// A background fetch finished
    ///
    /// `rearm` is copied from the `Effect::Fetch` that started it.
    FetchCompleted {
        outcome: SourceResult<Vec<MetricSample>>,
        rearm: bool,
    },
    /// Nothing changed but the view should be rendered again
    Redraw,
    /// Stop processing events
    Shutdown,
}

/// Work the runner performs on behalf of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Start a background fetch; a scheduled one re-arms the clock when it completes
    Fetch { rearm: bool },
    /// Deliver a `Tick` after the given delay
    ArmTimer(Duration),
    /// Leave the event loop
    Exit,
}
