use super::ReportHandler;
use crate::aggregator::BatchStats;
use crate::error::Result;
use crate::record::ResponseRecord;
use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Streams records into a single JSON document, stats last.
pub struct JsonReport {
    writer: BufWriter<File>,
    first: bool,
}

impl JsonReport {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);

        write!(
            writer,
            "{{\"generated_at\":{},\"records\":[",
            serde_json::to_string(&chrono::Utc::now().to_rfc3339())?
        )?;

        Ok(Self {
            writer,
            first: true,
        })
    }
}

#[async_trait]
impl ReportHandler for JsonReport {
    async fn write_record(&mut self, record: &ResponseRecord) -> Result<()> {
        if !self.first {
            write!(self.writer, ",")?;
        } else {
            self.first = false;
        }

        serde_json::to_writer(&mut self.writer, record)?;
        Ok(())
    }

    async fn finish(&mut self, stats: &BatchStats) -> Result<()> {
        write!(self.writer, "],\"stats\":")?;
        serde_json::to_writer(&mut self.writer, stats)?;
        write!(self.writer, "}}")?;
        self.writer.flush()?;
        Ok(())
    }
}
