use crate::record::ResponseRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary statistics over one completed batch. Times are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_requests: usize,
    /// Wall-clock time of the whole batch.
    pub total_elapsed: f64,
    /// `total_elapsed / total_requests`; `None` for an empty batch.
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub status_codes: BTreeMap<u16, usize>,
    pub failed: usize,
}

impl BatchStats {
    pub fn succeeded(&self) -> usize {
        self.total_requests - self.failed
    }
}

/// Reduces records to [`BatchStats`]. Pure: no I/O, inputs untouched.
///
/// The average divides batch wall-clock time by the number of requests,
/// failures included. Requests overlap in time, so this is not the mean
/// per-request latency.
pub fn aggregate(records: &[ResponseRecord], total_elapsed: f64) -> BatchStats {
    let total_requests = records.len();

    let average = if total_requests > 0 {
        Some(total_elapsed / total_requests as f64)
    } else {
        None
    };

    let (min, max) = records
        .iter()
        .filter_map(|r| r.elapsed)
        .fold((None, None), |(min, max): (Option<f64>, Option<f64>), e| {
            (
                Some(min.map_or(e, |m| m.min(e))),
                Some(max.map_or(e, |m| m.max(e))),
            )
        });

    let mut status_codes = BTreeMap::new();
    let mut failed = 0;
    for record in records {
        match record.status() {
            Some(status) => *status_codes.entry(status).or_insert(0) += 1,
            None => failed += 1,
        }
    }

    BatchStats {
        total_requests,
        total_elapsed,
        average,
        min,
        max,
        status_codes,
        failed,
    }
}

/// Statistics together with the records they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub stats: BatchStats,
    pub records: Vec<ResponseRecord>,
}

impl BatchResult {
    pub fn new(records: Vec<ResponseRecord>, total_elapsed: f64) -> Self {
        let stats = aggregate(&records, total_elapsed);
        Self { stats, records }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResponseRecord> {
        self.records.iter().filter(|r| !r.is_success())
    }

    pub fn successes(&self) -> impl Iterator<Item = &ResponseRecord> {
        self.records.iter().filter(|r| r.is_success())
    }
}
