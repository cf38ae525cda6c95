//! Command implementations for the CLI
//!
//! This module contains the implementation of all CLI commands:
//! - graph: Pick series and display the live dashboard
//! - list: Print a one-off scrape
//! - config: Configuration display and validation

pub mod config;
pub mod graph;
pub mod list;
