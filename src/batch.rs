use crate::aggregator::BatchResult;
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::metrics::collector::MetricsCollector;
use crate::metrics::snapshot::MetricsSnapshot;
use crate::request::RequestSpec;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

pub const DEFAULT_USER_AGENT: &str = "reqbatch/0.1";

#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Maximum requests in flight. `None` fires the whole batch at once.
    pub concurrency: Option<usize>,
    /// Client-wide timeout, overridable per request.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            concurrency: None,
            timeout: Some(Duration::from_secs(30)),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

pub struct Batcher {
    dispatcher: Dispatcher,
    metrics: Arc<MetricsCollector>,
}

impl Batcher {
    pub fn new(settings: BatchSettings) -> Result<Self> {
        let mut builder = Client::builder().user_agent(settings.user_agent);
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self::with_client(client, settings.concurrency))
    }

    pub fn with_client(client: Client, concurrency: Option<usize>) -> Self {
        let metrics = Arc::new(MetricsCollector::new());
        let dispatcher = Dispatcher::new(client)
            .with_concurrency(concurrency)
            .with_metrics(metrics.clone());
        Self {
            dispatcher,
            metrics,
        }
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(BatchSettings::default())
    }

    /// Fans out every request, waits for all of them, then aggregates.
    ///
    /// Live metrics are reset at the start of each run, so runs on one
    /// `Batcher` are expected to be sequential.
    pub async fn run<I, S>(&self, specs: I) -> Result<BatchResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<RequestSpec>,
    {
        let specs: Vec<RequestSpec> = specs.into_iter().map(Into::into).collect();
        self.metrics.reset();

        let start = Instant::now();
        let records = self.dispatcher.dispatch(&specs).await?;
        let total_elapsed = start.elapsed();

        let result = BatchResult::new(records, total_elapsed.as_secs_f64());
        log::info!(
            "Batch of {} finished in {:?}: {} ok, {} failed",
            result.stats.total_requests,
            total_elapsed,
            result.stats.succeeded(),
            result.stats.failed
        );
        Ok(result)
    }

    /// Blocking entry point for synchronous callers. Builds a
    /// current-thread runtime and parks the calling thread until the batch
    /// completes, so it must not be called from async code.
    pub fn run_blocking<I, S>(&self, specs: I) -> Result<BatchResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<RequestSpec>,
    {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(Error::NestedRuntime);
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run(specs))
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Republishes metric snapshots every 250ms until the receiver is
    /// dropped. Spawns a task, so it must be called from within a tokio
    /// runtime.
    pub fn watch_metrics(&self) -> watch::Receiver<MetricsSnapshot> {
        let (tx, rx) = watch::channel(self.metrics.snapshot());
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(250));
            loop {
                interval.tick().await;
                if tx.send(metrics.snapshot()).is_err() {
                    break;
                }
            }
        });
        rx
    }
}

/// Runs a batch with default settings and blocks until it completes.
///
/// Accepts anything convertible to [`RequestSpec`], including
/// `(HttpMethod, url)` and `(HttpMethod, url, RequestOptions)` tuples.
pub fn run_batch<I, S>(specs: I) -> Result<BatchResult>
where
    I: IntoIterator<Item = S>,
    S: Into<RequestSpec>,
{
    Batcher::with_defaults()?.run_blocking(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpMethod;

    #[test]
    fn empty_batch_needs_no_network() {
        let result = run_batch(Vec::<RequestSpec>::new()).unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.stats.average, None);
        assert_eq!(result.stats.failed, 0);
    }

    #[test]
    fn malformed_spec_fails_fast() {
        let err = run_batch([
            (HttpMethod::Get, "http://127.0.0.1:1/"),
            (HttpMethod::Get, ""),
        ])
        .unwrap_err();
        match err {
            Error::MalformedSpec { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn blocking_inside_runtime_is_rejected() {
        let batcher = Batcher::with_defaults().unwrap();
        let err = batcher
            .run_blocking(Vec::<RequestSpec>::new())
            .unwrap_err();
        assert!(matches!(err, Error::NestedRuntime));
    }
}
