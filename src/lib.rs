pub mod config;
pub mod error;
pub mod poll;
pub mod series;
pub mod source;
pub mod ui;

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Where log output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    /// No subscriber is installed
    Disabled,
}

/// Initialize tracing/logging
///
/// `RUST_LOG` takes precedence over `level`. For a file target the returned
/// guard must be kept alive until exit so buffered lines are flushed.
///
/// Note: This function can only be called once.
pub fn init_tracing(level: &str, target: LogTarget<'_>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match target {
        LogTarget::Disabled => Ok(None),
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .try_init()?;
            Ok(None)
        }
        LogTarget::File(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .try_init()?;
            Ok(Some(guard))
        }
    }
}
