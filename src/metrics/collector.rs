use crate::metrics::snapshot::MetricsSnapshot;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::{Duration, Instant};

/// Live counters for a running batch. Cloning shares the same counters.
#[derive(Clone)]
pub struct MetricsCollector {
    requests_queued: Arc<AtomicU64>,
    requests_in_flight: Arc<AtomicU64>,
    requests_success: Arc<AtomicU64>,
    requests_failed: Arc<AtomicU64>,
    total_response_time_us: Arc<AtomicU64>,
    start_time: Arc<Mutex<Instant>>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            requests_queued: Arc::new(AtomicU64::new(0)),
            requests_in_flight: Arc::new(AtomicU64::new(0)),
            requests_success: Arc::new(AtomicU64::new(0)),
            requests_failed: Arc::new(AtomicU64::new(0)),
            total_response_time_us: Arc::new(AtomicU64::new(0)),
            start_time: Arc::new(Mutex::new(Instant::now())),
        }
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes every counter and restarts the clock.
    pub fn reset(&self) {
        for counter in [
            &self.requests_queued,
            &self.requests_in_flight,
            &self.requests_success,
            &self.requests_failed,
            &self.total_response_time_us,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
        if let Ok(mut start) = self.start_time.lock() {
            *start = Instant::now();
        }
    }

    pub fn add_queued(&self, count: u64) {
        self.requests_queued.fetch_add(count, Ordering::SeqCst);
    }

    pub fn request_started(&self) {
        self.requests_in_flight.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_success(&self, duration: Duration) {
        self.requests_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.requests_success.fetch_add(1, Ordering::SeqCst);
        self.add_response_time(duration);
    }

    pub fn record_failure(&self, duration: Option<Duration>) {
        self.requests_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.requests_failed.fetch_add(1, Ordering::SeqCst);
        if let Some(duration) = duration {
            self.add_response_time(duration);
        }
    }

    fn add_response_time(&self, duration: Duration) {
        self.total_response_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let success = self.requests_success.load(Ordering::SeqCst);
        let failed = self.requests_failed.load(Ordering::SeqCst);
        let completed = success + failed;
        let total_time_us = self.total_response_time_us.load(Ordering::SeqCst);

        let success_rate = if completed > 0 {
            (success as f64 / completed as f64) * 100.0
        } else {
            0.0
        };

        let avg_response_time_ms = if completed > 0 {
            total_time_us as f64 / completed as f64 / 1000.0
        } else {
            0.0
        };

        let elapsed = self
            .start_time
            .lock()
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or(0.0);

        MetricsSnapshot {
            requests_queued: self.requests_queued.load(Ordering::SeqCst),
            requests_in_flight: self.requests_in_flight.load(Ordering::SeqCst),
            requests_completed: completed,
            requests_success: success,
            requests_failed: failed,
            success_rate,
            avg_response_time_ms,
            requests_per_second: if elapsed > 0.0 {
                completed as f64 / elapsed
            } else {
                0.0
            },
            elapsed_seconds: elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_tracks_lifecycle() {
        let metrics = MetricsCollector::new();
        metrics.add_queued(3);
        for _ in 0..3 {
            metrics.request_started();
        }
        metrics.record_success(Duration::from_millis(10));
        metrics.record_failure(None);

        let snap = metrics.snapshot();
        assert_eq!(snap.requests_queued, 3);
        assert_eq!(snap.requests_in_flight, 1);
        assert_eq!(snap.requests_completed, 2);
        assert_eq!(snap.requests_failed, 1);
        assert!((snap.success_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_snapshot_has_no_rates() {
        let snap = MetricsCollector::new().snapshot();
        assert_eq!(snap.requests_completed, 0);
        assert_eq!(snap.success_rate, 0.0);
        assert_eq!(snap.avg_response_time_ms, 0.0);
    }

    #[test]
    fn reset_clears_previous_batch() {
        let metrics = MetricsCollector::new();
        metrics.add_queued(2);
        metrics.request_started();
        metrics.record_failure(Some(Duration::from_millis(5)));

        metrics.reset();
        let snap = metrics.snapshot();
        assert_eq!(snap.requests_queued, 0);
        assert_eq!(snap.requests_completed, 0);
        assert_eq!(snap.avg_response_time_ms, 0.0);
        assert!(snap.elapsed_seconds < 1.0);
    }
}
