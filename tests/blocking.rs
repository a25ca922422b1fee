use reqbatch::{run_batch, HttpMethod, RequestOptions};
use std::collections::BTreeMap;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// The façade must be driven from a plain thread, so the mock server lives on
// its own runtime.
fn start_server(routes: &[(&str, u16, u64)]) -> (tokio::runtime::Runtime, MockServer) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(MockServer::start());
    for &(route, status, delay_ms) in routes {
        runtime.block_on(
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(
                    ResponseTemplate::new(status).set_delay(Duration::from_millis(delay_ms)),
                )
                .mount(&server),
        );
    }
    (runtime, server)
}

#[test]
fn single_request_stats() {
    let (_runtime, server) = start_server(&[("/missing", 404, 50)]);

    let result = run_batch([(HttpMethod::Get, format!("{}/missing", server.uri()))]).unwrap();
    let stats = &result.stats;

    assert_eq!(stats.status_codes, BTreeMap::from([(404, 1)]));
    assert_eq!(stats.failed, 0);
    let elapsed = result.records[0].elapsed.unwrap();
    assert!(elapsed >= 0.05);
    assert_eq!(stats.min, Some(elapsed));
    assert_eq!(stats.max, Some(elapsed));
    // One request: the average is the batch wall-clock time.
    assert_eq!(stats.average, Some(stats.total_elapsed));
}

#[test]
fn variadic_tuples_with_options() {
    let (_runtime, server) = start_server(&[("/a", 200, 0), ("/b", 204, 0)]);

    let result = run_batch([
        (HttpMethod::Get, format!("{}/a", server.uri()), RequestOptions::default()),
        (
            HttpMethod::Get,
            format!("{}/b", server.uri()),
            RequestOptions::default().header("Accept", "text/plain"),
        ),
    ])
    .unwrap();

    assert_eq!(result.records.len(), 2);
    assert_eq!(result.records[0].status(), Some(200));
    assert_eq!(result.records[1].status(), Some(204));
    assert_eq!(result.failures().count(), 0);
    let avg = result.stats.average.unwrap();
    assert!((avg * 2.0 - result.stats.total_elapsed).abs() < 1e-9);
}
