/// Integration tests for scraping Prometheus endpoints over HTTP
use httpmock::prelude::*;
use promgraph::{
    error::SourceError,
    source::{
        fetcher::MetricsFetcher, parser::SampleFilter, MetricSource, MultiSource,
        PrometheusSource,
    },
};
use std::time::Duration;

const NODE_METRICS: &str = r#"# HELP node_cpu_usage_percent Current CPU usage percentage
# TYPE node_cpu_usage_percent gauge
node_cpu_usage_percent 37.25
# HELP synthetic_gauge_value Synthetic gauge metrics for testing
# TYPE synthetic_gauge_value gauge
synthetic_gauge_value{instance="0",job="mock"} 50.5
synthetic_gauge_value{instance="1",job="mock"} 61
"#;

const QUEUE_METRICS: &str = r#"# HELP queue_depth Current queue depth
# TYPE queue_depth gauge
queue_depth 12
"#;

async fn serve(server: &MockServer, body: &'static str) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/metrics");
            then.status(200)
                .header("content-type", "text/plain; version=0.0.4")
                .body(body);
        })
        .await;
}

fn source(url: String, filter: SampleFilter) -> PrometheusSource {
    PrometheusSource::new(MetricsFetcher::new(url).unwrap(), filter)
}

#[tokio::test]
async fn test_fetch_parses_endpoint() {
    let server = MockServer::start_async().await;
    serve(&server, NODE_METRICS).await;

    let samples = source(server.url("/metrics"), SampleFilter::default())
        .fetch()
        .await
        .unwrap();

    assert_eq!(samples.len(), 3);
    let cpu = samples
        .iter()
        .find(|s| s.name == "node_cpu_usage_percent")
        .unwrap();
    assert_eq!(cpu.value, 37.25);
    assert_eq!(cpu.help, "Current CPU usage percentage");
    assert!(samples
        .iter()
        .any(|s| s.name == r#"synthetic_gauge_value{instance="1",job="mock"}"#));
}

#[tokio::test]
async fn test_repeated_fetches_hit_endpoint() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/metrics");
            then.status(200).body(QUEUE_METRICS);
        })
        .await;

    let src = source(server.url("/metrics"), SampleFilter::default());
    for _ in 0..3 {
        let samples = src.fetch().await.unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 12.0);
    }

    mock.assert_hits_async(3).await;
}

#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/metrics");
            then.status(503);
        })
        .await;

    let err = source(server.url("/metrics"), SampleFilter::default())
        .fetch()
        .await
        .unwrap_err();

    match err {
        SourceError::Status { status, .. } => assert_eq!(status.as_u16(), 503),
        other => panic!("Expected Status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused() {
    let fetcher =
        MetricsFetcher::with_timeout("http://127.0.0.1:1/metrics".to_string(), Duration::from_secs(2))
            .unwrap();

    let err = fetcher.fetch().await.unwrap_err();
    assert!(matches!(err, SourceError::Http { .. }));
    assert_eq!(err.url(), "http://127.0.0.1:1/metrics");
}

#[tokio::test]
async fn test_multi_source_applies_filter_across_endpoints() {
    let node = MockServer::start_async().await;
    serve(&node, NODE_METRICS).await;
    let queue = MockServer::start_async().await;
    serve(&queue, QUEUE_METRICS).await;

    let filter = SampleFilter::new(
        vec!["synthetic_gauge_value".to_string(), "queue_depth".to_string()],
        &["job=mock".to_string()],
    )
    .unwrap();
    let urls = vec![node.url("/metrics"), queue.url("/metrics")];
    let multi = MultiSource::from_urls(&urls, &filter, Duration::from_secs(2)).unwrap();

    let samples = multi.fetch().await.unwrap();

    // queue_depth has no job label, so only the synthetic gauges remain
    let names: Vec<String> = samples.iter().map(|s| s.name.clone()).collect();
    let node_url = node.url("/metrics");
    assert_eq!(
        names,
        vec![
            format!(
                r#"synthetic_gauge_value{{endpoint="{}",instance="0",job="mock"}}"#,
                node_url
            ),
            format!(
                r#"synthetic_gauge_value{{endpoint="{}",instance="1",job="mock"}}"#,
                node_url
            ),
        ]
    );
}

#[tokio::test]
async fn test_same_series_on_two_endpoints_stays_separate() {
    let first = MockServer::start_async().await;
    serve(&first, QUEUE_METRICS).await;
    let second = MockServer::start_async().await;
    second
        .mock_async(|when, then| {
            when.method(GET).path("/metrics");
            then.status(200).body("# TYPE queue_depth gauge\nqueue_depth 99\n");
        })
        .await;

    let urls = vec![first.url("/metrics"), second.url("/metrics")];
    let multi = MultiSource::from_urls(&urls, &SampleFilter::default(), Duration::from_secs(2))
        .unwrap();

    let samples = multi.fetch().await.unwrap();

    assert_eq!(samples.len(), 2);
    assert_ne!(samples[0].name, samples[1].name);
    assert_eq!(samples[0].metric, "queue_depth");
    assert_eq!(samples[0].value, 12.0);
    assert_eq!(samples[1].value, 99.0);
    assert!(samples[1].name.contains(&second.url("/metrics")));

    // Each endpoint scraped on its own carries the same identifiers
    let own = multi.sources()[1].fetch().await.unwrap();
    assert_eq!(own[0].name, samples[1].name);
}

#[tokio::test]
async fn test_multi_source_one_endpoint_down_fails_batch() {
    let node = MockServer::start_async().await;
    serve(&node, NODE_METRICS).await;
    let broken = MockServer::start_async().await;
    broken
        .mock_async(|when, then| {
            when.method(GET).path("/metrics");
            then.status(500);
        })
        .await;

    let urls = vec![node.url("/metrics"), broken.url("/metrics")];
    let multi = MultiSource::from_urls(&urls, &SampleFilter::default(), Duration::from_secs(2)).unwrap();

    let err = multi.fetch().await.unwrap_err();
    assert_eq!(err.url(), broken.url("/metrics"));
}
