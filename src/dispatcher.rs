use crate::error::Result;
use crate::metrics::collector::MetricsCollector;
use crate::record::{CapturedError, ErrorKind, ResponseRecord};
use crate::request::RequestSpec;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;

/// Issues a batch of requests concurrently and collects one record per
/// request, in input order.
#[derive(Clone)]
pub struct Dispatcher {
    client: Client,
    concurrency: Option<usize>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Dispatcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            concurrency: None,
            metrics: None,
        }
    }

    /// Caps the number of requests in flight. `None` starts all of them at once.
    pub fn with_concurrency(mut self, concurrency: Option<usize>) -> Self {
        self.concurrency = concurrency.map(|n| n.max(1));
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fails only on malformed input, before any request is sent.
    /// Per-request failures are captured in the returned records.
    pub async fn dispatch(&self, specs: &[RequestSpec]) -> Result<Vec<ResponseRecord>> {
        if specs.is_empty() {
            return Ok(Vec::new());
        }

        for (index, spec) in specs.iter().enumerate() {
            spec.validate(index)?;
        }

        if let Some(metrics) = &self.metrics {
            metrics.add_queued(specs.len() as u64);
        }

        let limit = self.concurrency.unwrap_or(specs.len());
        log::debug!("Dispatching {} requests (limit {})", specs.len(), limit);

        // `buffered` yields in input order regardless of completion order.
        let records = stream::iter(specs.iter().enumerate())
            .map(|(index, spec)| self.send_one(index, spec))
            .buffered(limit)
            .collect::<Vec<_>>()
            .await;

        Ok(records)
    }

    async fn send_one(&self, index: usize, spec: &RequestSpec) -> ResponseRecord {
        if let Some(metrics) = &self.metrics {
            metrics.request_started();
        }
        log::debug!("-> #{} {} {}", index, spec.method, spec.url);

        let start = Instant::now();
        let result = match spec.build(&self.client).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                response.text().await.map(|body| (status, body))
            }
            Err(e) => Err(e),
        };
        let duration = start.elapsed();

        match result {
            Ok((status, body)) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_success(duration);
                }
                log::debug!("<- #{} {} in {:?}", index, status, duration);
                ResponseRecord::success(
                    index,
                    spec.method,
                    spec.url.clone(),
                    duration.as_secs_f64(),
                    status,
                    body,
                )
            }
            Err(e) => {
                let error = CapturedError::from_reqwest(&e);
                // Only failures that ran to a deadline or got as far as the
                // body carry a meaningful timing.
                let elapsed = match error.kind {
                    ErrorKind::Timeout | ErrorKind::Body => Some(duration),
                    _ => None,
                };
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(elapsed);
                }
                log::warn!(
                    "Request #{} {} {} failed ({}): {}",
                    index,
                    spec.method,
                    spec.url,
                    error.kind,
                    error.message
                );
                ResponseRecord::failure(
                    index,
                    spec.method,
                    spec.url.clone(),
                    elapsed.map(|d| d.as_secs_f64()),
                    error,
                )
            }
        }
    }
}
