use super::ReportHandler;
use crate::aggregator::BatchStats;
use crate::error::{Error, Result};
use crate::record::{Outcome, ResponseRecord};
use async_trait::async_trait;
use indicatif::MultiProgress;
use std::sync::Arc;

pub struct ConsoleReport {
    multi: Option<Arc<MultiProgress>>,
}

impl ConsoleReport {
    pub fn new(multi: Option<Arc<MultiProgress>>) -> Self {
        Self { multi }
    }

    fn emit(&self, line: &str) -> Result<()> {
        if let Some(multi) = &self.multi {
            multi
                .println(line)
                .map_err(|e| Error::Internal(e.to_string()))?;
        } else {
            println!("{}", line);
        }
        Ok(())
    }
}

impl Default for ConsoleReport {
    fn default() -> Self {
        Self::new(None)
    }
}

fn format_secs(value: Option<f64>) -> String {
    value
        .map(|s| format!("{:.1}ms", s * 1000.0))
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_record(record: &ResponseRecord) -> String {
    let outcome = match &record.outcome {
        Outcome::Success { status, body } => format!("{} ({} bytes)", status, body.len()),
        Outcome::Failure(err) => format!("ERROR {}: {}", err.kind, err.message),
    };
    format!(
        "#{:<3} {:<7} {} -> {} in {}",
        record.index,
        record.method,
        record.url,
        outcome,
        format_secs(record.elapsed)
    )
}

pub fn format_summary(stats: &BatchStats) -> Vec<String> {
    let mut lines = vec![
        format!("Requests:      {}", stats.total_requests),
        format!("Failed:        {}", stats.failed),
        format!("Total time:    {:.3}s", stats.total_elapsed),
        format!("Average:       {}", format_secs(stats.average)),
        format!("Fastest:       {}", format_secs(stats.min)),
        format!("Slowest:       {}", format_secs(stats.max)),
    ];
    if !stats.status_codes.is_empty() {
        lines.push("Status codes:".to_string());
        for (status, count) in &stats.status_codes {
            lines.push(format!("  {}: {}", status, count));
        }
    }
    lines
}

#[async_trait]
impl ReportHandler for ConsoleReport {
    async fn write_record(&mut self, record: &ResponseRecord) -> Result<()> {
        self.emit(&format_record(record))
    }

    async fn finish(&mut self, stats: &BatchStats) -> Result<()> {
        self.emit("")?;
        for line in format_summary(stats) {
            self.emit(&line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::record::{CapturedError, ErrorKind};
    use crate::request::HttpMethod;

    #[test]
    fn formats_success_and_failure() {
        let ok = ResponseRecord::success(0, HttpMethod::Get, "http://a/", 0.25, 200, "hello");
        assert_eq!(format_record(&ok), "#0   GET     http://a/ -> 200 (5 bytes) in 250.0ms");

        let err = CapturedError::new(ErrorKind::Connect, "refused");
        let failed = ResponseRecord::failure(1, HttpMethod::Post, "http://b/", None, err);
        assert!(format_record(&failed).ends_with("ERROR connect: refused in -"));
    }

    #[test]
    fn summary_lists_status_codes() {
        let records = vec![
            ResponseRecord::success(0, HttpMethod::Get, "http://a/", 0.1, 200, ""),
            ResponseRecord::success(1, HttpMethod::Get, "http://a/", 0.1, 404, ""),
        ];
        let lines = format_summary(&aggregate(&records, 0.2));
        assert!(lines.contains(&"  200: 1".to_string()));
        assert!(lines.contains(&"  404: 1".to_string()));
    }
}
