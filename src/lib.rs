pub mod aggregator;
pub mod batch;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod output;
pub mod record;
pub mod request;

pub use aggregator::{aggregate, BatchResult, BatchStats};
pub use batch::{run_batch, BatchSettings, Batcher};
pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use metrics::collector::MetricsCollector;
pub use metrics::snapshot::MetricsSnapshot;
pub use record::{CapturedError, ErrorKind, Outcome, ResponseRecord};
pub use request::{HttpMethod, RequestBody, RequestOptions, RequestSpec};
