//! List command implementation
//!
//! Fetches every configured endpoint once and prints the samples that pass
//! the configured filters.

use anyhow::Result;
use colored::Colorize;
use promgraph::{
    config::Config,
    source::{parser::SampleFilter, MetricSample, MetricSource, MultiSource},
};
use tracing::info;

/// Execute the list command
pub async fn execute(cfg: &Config, json: bool) -> Result<()> {
    let filter = SampleFilter::new(cfg.filter.metrics.clone(), &cfg.filter.labels)?;
    let source = MultiSource::from_urls(&cfg.sources.urls, &filter, cfg.sources.timeout())?;

    info!(endpoints = cfg.sources.urls.len(), "Fetching metrics");
    let samples = source.fetch().await?;
    info!(samples = samples.len(), "Fetched metrics");

    if json {
        println!("{}", serde_json::to_string_pretty(&samples)?);
        return Ok(());
    }

    if samples.is_empty() {
        println!("{}", "No metrics found".yellow());
        return Ok(());
    }

    for line in format_table(&samples) {
        println!("{}", line);
    }
    Ok(())
}

/// One aligned line per sample: identifier, value, help
fn format_table(samples: &[MetricSample]) -> Vec<String> {
    let width = samples.iter().map(|s| s.name.len()).max().unwrap_or(0);

    samples
        .iter()
        .map(|s| {
            format!(
                "{}  {}  {}",
                format!("{:<width$}", s.name, width = width).cyan(),
                format!("{:>14}", s.value),
                s.help.dimmed()
            )
        })
        .collect()
}
