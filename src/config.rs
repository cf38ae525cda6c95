use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::source::parser::parse_label_spec;
use crate::LogTarget;

/// Longest accepted poll interval
const MAX_INTERVAL_SECONDS: f64 = 3600.0;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: f64,
    /// Samples retained per series
    #[serde(default = "default_history")]
    pub history: usize,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Bare metric names to keep; empty keeps everything
    #[serde(default)]
    pub metrics: Vec<String>,
    /// `key=value` label requirements
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_timeout_seconds() -> u64 {
    5
}

fn default_interval_seconds() -> f64 {
    1.0
}

fn default_history() -> usize {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            history: default_history(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_seconds)
    }
}

impl LogConfig {
    /// Where to log for a command; `interactive` commands own the terminal
    /// and only ever log to a file
    pub fn target(&self, interactive: bool) -> LogTarget<'_> {
        match &self.file {
            Some(path) => LogTarget::File(path),
            None if interactive => LogTarget::Disabled,
            None => LogTarget::Stderr,
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Values given on the command line, applied on top of file and environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub urls: Vec<String>,
    pub interval_seconds: Option<f64>,
    pub history: Option<usize>,
    pub metrics: Vec<String>,
    pub labels: Vec<String>,
    pub log_file: Option<PathBuf>,
}

/// Load configuration from `path` (optional), the environment and `overrides`
///
/// Environment variables use the `PROMGRAPH` prefix with `__` between
/// sections, e.g. `PROMGRAPH__POLL__INTERVAL_SECONDS=2`. List values are
/// comma separated.
pub fn load_config(path: &Path, overrides: &ConfigOverrides) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("PROMGRAPH")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("sources.urls")
                .with_list_parse_key("filter.metrics")
                .with_list_parse_key("filter.labels")
                .try_parsing(true),
        )
        .build()?;

    let mut cfg: Config = config.try_deserialize()?;
    apply_overrides(&mut cfg, overrides);
    validate_config(&cfg)?;

    Ok(cfg)
}

fn apply_overrides(cfg: &mut Config, overrides: &ConfigOverrides) {
    if !overrides.urls.is_empty() {
        cfg.sources.urls = overrides.urls.clone();
    }
    if let Some(interval) = overrides.interval_seconds {
        cfg.poll.interval_seconds = interval;
    }
    if let Some(history) = overrides.history {
        cfg.poll.history = history;
    }
    if !overrides.metrics.is_empty() {
        cfg.filter.metrics = overrides.metrics.clone();
    }
    if !overrides.labels.is_empty() {
        cfg.filter.labels = overrides.labels.clone();
    }
    if let Some(file) = &overrides.log_file {
        cfg.log.file = Some(file.clone());
    }
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.sources.urls.is_empty() {
        anyhow::bail!("At least one metrics URL must be configured");
    }

    for url in &cfg.sources.urls {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| anyhow::anyhow!("Invalid metrics URL '{}': {}", url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Metrics URL '{}' must use http or https", url);
        }
    }

    let interval = cfg.poll.interval_seconds;
    if !(interval > 0.0 && interval <= MAX_INTERVAL_SECONDS) {
        anyhow::bail!(
            "Invalid interval: {}. Must be greater than 0 and at most {} seconds",
            interval,
            MAX_INTERVAL_SECONDS
        );
    }

    if cfg.poll.history == 0 {
        anyhow::bail!("History must keep at least one sample");
    }

    if cfg.sources.timeout_seconds == 0 {
        anyhow::bail!("Request timeout must be at least one second");
    }

    for spec in &cfg.filter.labels {
        if parse_label_spec(spec).is_none() {
            anyhow::bail!("Invalid label filter '{}': expected key=value", spec);
        }
    }

    Ok(())
}
