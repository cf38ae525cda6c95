use thiserror::Error;

/// Failure of a single fetch cycle against a metrics endpoint
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport failure or unreadable body
    #[error("Failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Endpoint answered with a non-2xx status
    #[error("Failed to fetch {url}: HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Body is not valid Prometheus text format
    #[error("Failed to parse metrics from {url}: {message}")]
    Parse { url: String, message: String },
}

impl SourceError {
    /// Endpoint the failure belongs to
    pub fn url(&self) -> &str {
        match self {
            Self::Http { url, .. } | Self::Status { url, .. } | Self::Parse { url, .. } => url,
        }
    }
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;
