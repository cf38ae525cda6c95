//! Prometheus text format parsing
//!
//! This module turns a scrape body into a flat list of `MetricSample`s, one
//! per plottable series, and applies the name/label filters the user asked for.

use prometheus_parse::{Sample, Scrape, Value};
use std::collections::HashSet;

use crate::source::MetricSample;

/// Which samples of a scrape to keep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleFilter {
    /// Bare metric names; empty keeps every metric
    pub metrics: Vec<String>,
    /// Label pairs that must all be present with the given value
    pub labels: Vec<(String, String)>,
}

impl SampleFilter {
    /// Build a filter from metric names and `key=value` label specs
    ///
    /// # Errors
    /// Returns an error if a label spec has no `=` or an empty key
    pub fn new(metrics: Vec<String>, label_specs: &[String]) -> anyhow::Result<Self> {
        let labels = label_specs
            .iter()
            .map(|spec| {
                parse_label_spec(spec).ok_or_else(|| {
                    anyhow::anyhow!("Invalid label filter '{}': expected key=value", spec)
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self { metrics, labels })
    }

    /// A histogram or summary name also selects its `_bucket`, `_count` and
    /// `_sum` series
    pub fn matches(&self, metric: &str, labels: &[(String, String)]) -> bool {
        if !self.metrics.is_empty()
            && !self
                .metrics
                .iter()
                .any(|m| m == metric || base_name(metric) == Some(m.as_str()))
        {
            return false;
        }
        self.labels
            .iter()
            .all(|(key, value)| labels.iter().any(|(k, v)| k == key && v == value))
    }
}

const FAMILY_SUFFIXES: [&str; 3] = ["_bucket", "_count", "_sum"];

/// Histogram/summary family name of a suffixed series
fn base_name(metric: &str) -> Option<&str> {
    FAMILY_SUFFIXES
        .iter()
        .find_map(|suffix| metric.strip_suffix(suffix))
}

/// Split `key=value` into its parts
pub fn parse_label_spec(spec: &str) -> Option<(String, String)> {
    let (key, value) = spec.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

/// Parse Prometheus text and return the samples passing `filter`
///
/// Identifiers are unique within the result; when a scrape yields the same
/// identifier twice the first occurrence wins.
pub fn parse_samples(prometheus_text: &str, filter: &SampleFilter) -> anyhow::Result<Vec<MetricSample>> {
    let lines: Vec<_> = prometheus_text.lines().map(|s| Ok(s.to_owned())).collect();
    let scrape = Scrape::parse(lines.into_iter())?;

    let mut seen = HashSet::new();
    let mut samples = Vec::new();

    for sample in &scrape.samples {
        let help = lookup_help(&scrape, &sample.metric);
        for (metric, labels, value) in flatten_sample(sample) {
            if !filter.matches(&metric, &labels) {
                continue;
            }
            let parsed = MetricSample::new(metric, labels, value, help.clone());
            if seen.insert(parsed.name.clone()) {
                samples.push(parsed);
            }
        }
    }

    Ok(samples)
}

/// Expand one scrape sample into `(metric, labels, value)` series
fn flatten_sample(sample: &Sample) -> Vec<(String, Vec<(String, String)>, f64)> {
    let labels = sorted_labels(sample);

    match &sample.value {
        Value::Counter(v) | Value::Gauge(v) | Value::Untyped(v) => {
            vec![(sample.metric.clone(), labels, *v)]
        }
        // Bucket counts are not plotted; the family's `_count` and `_sum`
        // lines arrive as samples of their own
        Value::Histogram(_) => Vec::new(),
        Value::Summary(quantiles) => quantiles
            .iter()
            .map(|q| {
                let mut labels = labels.clone();
                labels.push(("quantile".to_string(), q.quantile.to_string()));
                labels.sort();
                (sample.metric.clone(), labels, q.count)
            })
            .collect(),
    }
}

fn sorted_labels(sample: &Sample) -> Vec<(String, String)> {
    let mut labels: Vec<(String, String)> = sample
        .labels
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    labels.sort();
    labels
}

/// HELP text for a metric, falling back to the histogram/summary base name
fn lookup_help(scrape: &Scrape, metric: &str) -> String {
    if let Some(doc) = scrape.docs.get(metric) {
        return doc.clone();
    }
    base_name(metric)
        .and_then(|base| scrape.docs.get(base).cloned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRAPE: &str = r#"# HELP http_requests_total Total number of HTTP requests
# TYPE http_requests_total counter
http_requests_total{method="GET",code="200"} 120
http_requests_total{method="POST",code="500"} 3

# HELP node_cpu_usage_percent Current CPU usage percentage
# TYPE node_cpu_usage_percent gauge
node_cpu_usage_percent 42.5

# HELP queue_depth Current queue depth
# TYPE queue_depth gauge
queue_depth 7
"#;

    fn find<'a>(samples: &'a [MetricSample], name: &str) -> &'a MetricSample {
        samples
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("missing sample {}", name))
    }

    #[test]
    fn test_parse_all_samples() {
        let samples = parse_samples(SCRAPE, &SampleFilter::default()).unwrap();
        assert_eq!(samples.len(), 4);

        let cpu = find(&samples, "node_cpu_usage_percent");
        assert_eq!(cpu.value, 42.5);
        assert_eq!(cpu.help, "Current CPU usage percentage");
        assert!(cpu.labels.is_empty());
    }

    #[test]
    fn test_identifier_sorts_labels() {
        let samples = parse_samples(SCRAPE, &SampleFilter::default()).unwrap();
        let get = find(&samples, r#"http_requests_total{code="200",method="GET"}"#);
        assert_eq!(get.metric, "http_requests_total");
        assert_eq!(get.value, 120.0);
        assert_eq!(get.help, "Total number of HTTP requests");
    }

    #[test]
    fn test_filter_by_metric_name() {
        let filter = SampleFilter::new(vec!["queue_depth".to_string()], &[]).unwrap();
        let samples = parse_samples(SCRAPE, &filter).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].name, "queue_depth");
    }

    #[test]
    fn test_filter_by_label() {
        let filter = SampleFilter::new(vec![], &["code=500".to_string()]).unwrap();
        let samples = parse_samples(SCRAPE, &filter).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 3.0);
    }

    #[test]
    fn test_invalid_label_spec() {
        let result = SampleFilter::new(vec![], &["nonsense".to_string()]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("nonsense"));
        assert_eq!(parse_label_spec("=x"), None);
        assert_eq!(
            parse_label_spec(" job = mock "),
            Some(("job".to_string(), "mock".to_string()))
        );
    }

    #[test]
    fn test_histogram_exposes_count_and_sum() {
        let text = r#"# HELP latency_seconds Request latency
# TYPE latency_seconds histogram
latency_seconds_bucket{le="0.1"} 4
latency_seconds_bucket{le="1"} 9
latency_seconds_bucket{le="+Inf"} 10
latency_seconds_sum 3.2
latency_seconds_count 10
"#;
        let samples = parse_samples(text, &SampleFilter::default()).unwrap();
        let names: Vec<&str> = samples.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), 2, "unexpected samples: {:?}", names);

        let count = find(&samples, "latency_seconds_count");
        assert_eq!(count.value, 10.0);
        assert_eq!(count.help, "Request latency");
        assert_eq!(find(&samples, "latency_seconds_sum").value, 3.2);

        // Selecting the family name keeps its count and sum
        let filter = SampleFilter::new(vec!["latency_seconds".to_string()], &[]).unwrap();
        assert_eq!(parse_samples(text, &filter).unwrap().len(), 2);
    }

    #[test]
    fn test_family_name_matching() {
        let filter = SampleFilter::new(vec!["latency_seconds".to_string()], &[]).unwrap();
        assert!(filter.matches("latency_seconds", &[]));
        assert!(filter.matches("latency_seconds_count", &[]));
        assert!(filter.matches("latency_seconds_sum", &[]));
        assert!(!filter.matches("latency_seconds_total", &[]));
        assert!(!filter.matches("queue_depth", &[]));
    }

    #[test]
    fn test_non_finite_values_pass_through() {
        let text = "# TYPE weird gauge\nweird NaN\n";
        let samples = parse_samples(text, &SampleFilter::default()).unwrap();
        assert_eq!(samples.len(), 1);
        assert!(samples[0].value.is_nan());
    }
}
