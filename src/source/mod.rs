//! Metric sources feeding the poll loop
//!
//! A source produces one batch of `MetricSample`s per fetch, or fails as a
//! whole. `PrometheusSource` scrapes a single endpoint; `MultiSource` chains
//! several endpoints into one batch.

pub mod fetcher;
pub mod parser;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Serialize;

use crate::error::{SourceError, SourceResult};
use fetcher::MetricsFetcher;
use parser::{parse_samples, SampleFilter};

/// Label added to every sample when several endpoints are scraped together
pub const ENDPOINT_LABEL: &str = "endpoint";

/// One reading of one series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    /// Series identifier, `metric{k="v",...}` or the bare metric name
    pub name: String,
    /// Bare metric name
    pub metric: String,
    pub labels: Vec<(String, String)>,
    pub value: f64,
    /// HELP text, opaque to the core
    pub help: String,
}

impl MetricSample {
    /// Build a sample; `labels` are expected to be sorted by key
    pub fn new(metric: String, labels: Vec<(String, String)>, value: f64, help: String) -> Self {
        let name = series_identifier(&metric, &labels);
        Self {
            name,
            metric,
            labels,
            value,
            help,
        }
    }

    /// Re-key the sample under `endpoint`, replacing any label of that name
    pub fn with_endpoint(self, endpoint: &str) -> Self {
        let mut labels = self.labels;
        labels.retain(|(k, _)| k != ENDPOINT_LABEL);
        labels.push((ENDPOINT_LABEL.to_string(), endpoint.to_string()));
        labels.sort();
        Self::new(self.metric, labels, self.value, self.help)
    }
}

/// Format `metric{k1="v1",k2="v2"}`, or just `metric` without labels
pub fn series_identifier(metric: &str, labels: &[(String, String)]) -> String {
    if labels.is_empty() {
        return metric.to_string();
    }
    let pairs: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, v))
        .collect();
    format!("{}{{{}}}", metric, pairs.join(","))
}

/// Anything that can produce a batch of samples on demand
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Fetch one batch; a failure applies to the whole batch
    async fn fetch(&self) -> SourceResult<Vec<MetricSample>>;
}

/// A single Prometheus text endpoint
pub struct PrometheusSource {
    fetcher: MetricsFetcher,
    filter: SampleFilter,
    label_endpoint: bool,
}

impl PrometheusSource {
    pub fn new(fetcher: MetricsFetcher, filter: SampleFilter) -> Self {
        Self {
            fetcher,
            filter,
            label_endpoint: false,
        }
    }

    /// Tag every sample with an `endpoint` label holding this source's URL
    pub fn with_endpoint_label(mut self) -> Self {
        self.label_endpoint = true;
        self
    }

    pub fn url(&self) -> &str {
        self.fetcher.url()
    }
}

#[async_trait]
impl MetricSource for PrometheusSource {
    async fn fetch(&self) -> SourceResult<Vec<MetricSample>> {
        let text = self.fetcher.fetch().await?;
        let samples = parse_samples(&text, &self.filter).map_err(|e| SourceError::Parse {
            url: self.url().to_string(),
            message: e.to_string(),
        })?;

        if !self.label_endpoint {
            return Ok(samples);
        }
        Ok(samples
            .into_iter()
            .map(|s| s.with_endpoint(self.url()))
            .collect())
    }
}

/// Several sources fetched together into one batch
///
/// Batches are concatenated in source order. The first failure fails the
/// whole batch.
pub struct MultiSource<S> {
    sources: Vec<S>,
}

impl<S: MetricSource> MultiSource<S> {
    pub fn new(sources: Vec<S>) -> Self {
        Self { sources }
    }

    pub fn sources(&self) -> &[S] {
        &self.sources
    }
}

impl MultiSource<PrometheusSource> {
    /// One `PrometheusSource` per URL, sharing the same filter
    ///
    /// With more than one URL every sample carries an `endpoint` label, so
    /// the same series exposed by two hosts stays two series.
    pub fn from_urls(
        urls: &[String],
        filter: &SampleFilter,
        timeout: std::time::Duration,
    ) -> anyhow::Result<Self> {
        let sources = urls
            .iter()
            .map(|url| {
                let source = PrometheusSource::new(
                    MetricsFetcher::with_timeout(url.clone(), timeout)?,
                    filter.clone(),
                );
                Ok(if urls.len() > 1 {
                    source.with_endpoint_label()
                } else {
                    source
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self::new(sources))
    }
}

#[async_trait]
impl<S: MetricSource> MetricSource for MultiSource<S> {
    async fn fetch(&self) -> SourceResult<Vec<MetricSample>> {
        let batches = try_join_all(self.sources.iter().map(|s| s.fetch())).await?;
        Ok(batches.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(SourceResult<Vec<MetricSample>>);

    #[async_trait]
    impl MetricSource for FixedSource {
        async fn fetch(&self) -> SourceResult<Vec<MetricSample>> {
            match &self.0 {
                Ok(samples) => Ok(samples.clone()),
                Err(e) => Err(SourceError::Parse {
                    url: e.url().to_string(),
                    message: "broken".to_string(),
                }),
            }
        }
    }

    fn sample(name: &str, value: f64) -> MetricSample {
        MetricSample::new(name.to_string(), vec![], value, String::new())
    }

    #[test]
    fn test_series_identifier() {
        assert_eq!(series_identifier("up", &[]), "up");
        let labels = vec![
            ("code".to_string(), "200".to_string()),
            ("method".to_string(), "GET".to_string()),
        ];
        assert_eq!(
            series_identifier("http_requests_total", &labels),
            r#"http_requests_total{code="200",method="GET"}"#
        );
    }

    #[test]
    fn test_with_endpoint_relabels() {
        let labels = vec![
            ("endpoint".to_string(), "stale".to_string()),
            ("job".to_string(), "node".to_string()),
        ];
        let sample = MetricSample::new("up".to_string(), labels, 1.0, "Target up".to_string())
            .with_endpoint("http://a:9100/metrics");

        assert_eq!(sample.metric, "up");
        assert_eq!(
            sample.name,
            r#"up{endpoint="http://a:9100/metrics",job="node"}"#
        );
        assert_eq!(sample.help, "Target up");
    }

    #[test]
    fn test_from_urls_labels_only_with_several_endpoints() {
        let filter = SampleFilter::default();
        let timeout = std::time::Duration::from_secs(1);

        let single =
            MultiSource::from_urls(&["http://a:9100/metrics".to_string()], &filter, timeout)
                .unwrap();
        assert!(!single.sources()[0].label_endpoint);

        let urls = vec![
            "http://a:9100/metrics".to_string(),
            "http://b:9100/metrics".to_string(),
        ];
        let multi = MultiSource::from_urls(&urls, &filter, timeout).unwrap();
        assert!(multi.sources().iter().all(|s| s.label_endpoint));
    }

    #[tokio::test]
    async fn test_multi_source_concatenates_in_order() {
        let multi = MultiSource::new(vec![
            FixedSource(Ok(vec![sample("a", 1.0)])),
            FixedSource(Ok(vec![sample("b", 2.0), sample("c", 3.0)])),
        ]);

        let batch = multi.fetch().await.unwrap();
        let names: Vec<&str> = batch.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_multi_source_fails_whole_batch() {
        let multi = MultiSource::new(vec![
            FixedSource(Ok(vec![sample("a", 1.0)])),
            FixedSource(Err(SourceError::Parse {
                url: "http://down/metrics".to_string(),
                message: String::new(),
            })),
        ]);

        let err = multi.fetch().await.unwrap_err();
        assert_eq!(err.url(), "http://down/metrics");
    }
}
