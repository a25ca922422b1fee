use super::ReportHandler;
use crate::aggregator::BatchStats;
use crate::error::Result;
use crate::record::ResponseRecord;
use async_trait::async_trait;
use std::path::PathBuf;

const HEADERS: [&str; 7] = [
    "index",
    "method",
    "url",
    "status",
    "elapsed",
    "error_kind",
    "error_message",
];

pub struct CsvReport {
    writer: csv::Writer<std::fs::File>,
    headers_written: bool,
}

impl CsvReport {
    pub fn new(path: PathBuf) -> Result<Self> {
        let writer = csv::Writer::from_path(path)?;

        Ok(Self {
            writer,
            headers_written: false,
        })
    }
}

#[async_trait]
impl ReportHandler for CsvReport {
    async fn write_record(&mut self, record: &ResponseRecord) -> Result<()> {
        if !self.headers_written {
            self.writer.write_record(HEADERS)?;
            self.headers_written = true;
        }

        let (kind, message) = match record.error() {
            Some(err) => (err.kind.to_string(), err.message.clone()),
            None => (String::new(), String::new()),
        };
        self.writer.write_record([
            record.index.to_string(),
            record.method.to_string(),
            record.url.clone(),
            record.status().map(|s| s.to_string()).unwrap_or_default(),
            record.elapsed.map(|e| format!("{:.6}", e)).unwrap_or_default(),
            kind,
            message,
        ])?;
        Ok(())
    }

    async fn finish(&mut self, _stats: &BatchStats) -> Result<()> {
        if !self.headers_written {
            self.writer.write_record(HEADERS)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
