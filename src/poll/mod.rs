//! Poll-and-ingest loop
//!
//! `PollState` is a pure state machine over `PollEvent`s; `PollRunner` feeds
//! it from a single queue and executes the `Effect`s it returns.

pub mod event;
pub mod runner;
pub mod state;

pub use event::{Effect, PollEvent};
pub use runner::{PollHandle, PollRunner};
pub use state::PollState;
