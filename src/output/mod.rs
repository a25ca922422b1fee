use crate::aggregator::{BatchResult, BatchStats};
use crate::error::Result;
use crate::record::ResponseRecord;
use async_trait::async_trait;

pub mod console;
pub mod csv;
pub mod json;

#[async_trait]
pub trait ReportHandler: Send + Sync {
    async fn write_record(&mut self, record: &ResponseRecord) -> Result<()>;
    async fn finish(&mut self, _stats: &BatchStats) -> Result<()> {
        Ok(())
    }
}

/// Feeds every record, then the summary, to `handler`.
pub async fn write_report(handler: &mut dyn ReportHandler, result: &BatchResult) -> Result<()> {
    for record in &result.records {
        handler.write_record(record).await?;
    }
    handler.finish(&result.stats).await
}
