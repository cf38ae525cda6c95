//! Terminal UI for the picker and the live dashboard
//!
//! Both screens are plain ratatui renderers; the terminal setup and event
//! plumbing live in the `graph` command.

pub mod dashboard;
pub mod picker;

pub use dashboard::Dashboard;
pub use picker::{Picker, PickerAction};
