use clap::{Parser, Subcommand};
use std::path::PathBuf;

use promgraph::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(
    name = "promgraph",
    version,
    about = "Live terminal graphs for Prometheus metrics endpoints"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "promgraph.toml", global = true)]
    pub config: PathBuf,

    /// Metrics endpoint URL (repeatable)
    #[arg(short, long = "url", global = true)]
    pub urls: Vec<String>,

    /// Poll interval in seconds
    #[arg(short, long, global = true)]
    pub interval: Option<f64>,

    /// Only keep metrics with this name (repeatable)
    #[arg(short, long = "metric", global = true)]
    pub metrics: Vec<String>,

    /// Only keep samples carrying this key=value label (repeatable)
    #[arg(short, long = "label", global = true)]
    pub labels: Vec<String>,

    /// Samples kept per series
    #[arg(long, global = true)]
    pub history: Option<usize>,

    /// Write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Pick series and graph them live (default)
    Graph {
        /// Series to graph; skips the picker (repeatable)
        #[arg(short, long)]
        series: Vec<String>,
    },

    /// Fetch once and print every sample
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display effective configuration
    Show,

    /// Validate configuration
    Validate,
}

impl Cli {
    /// Get the command to execute, defaulting to Graph if none provided
    pub fn get_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Graph { series: Vec::new() })
    }

    /// Flags that override file and environment configuration
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            urls: self.urls.clone(),
            interval_seconds: self.interval,
            history: self.history,
            metrics: self.metrics.clone(),
            labels: self.labels.clone(),
            log_file: self.log_file.clone(),
        }
    }
}
