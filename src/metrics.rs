//! Request metrics and statistics tracking for the prediction service.

use crate::form::SubmitOutcome;
use crate::models::ScoreBand;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the prediction service
pub struct PipelineMetrics {
    /// Total requests handled
    pub requests: AtomicU64,
    /// Requests that produced a prediction
    pub predictions: AtomicU64,
    /// Submissions rejected by validation
    pub validation_failures: AtomicU64,
    /// Requests the pipeline failed on
    pub prediction_failures: AtomicU64,
    /// Predictions outside the expected score band
    pub out_of_band: AtomicU64,
    /// Request latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Predicted score histogram, ten buckets over the band
    score_buckets: RwLock<[u64; 10]>,
    band: ScoreBand,
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a metrics collector for the default [0, 100] band
    pub fn new() -> Self {
        Self::with_band(ScoreBand::default())
    }

    pub fn with_band(band: ScoreBand) -> Self {
        Self {
            requests: AtomicU64::new(0),
            predictions: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            prediction_failures: AtomicU64::new(0),
            out_of_band: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            band,
            start_time: Instant::now(),
        }
    }

    /// Record one handled request
    pub fn record_request(&self, latency: Duration, outcome: SubmitOutcome, prediction: Option<f64>) {
        self.requests.fetch_add(1, Ordering::Relaxed);

        match outcome {
            SubmitOutcome::Predicted => self.predictions.fetch_add(1, Ordering::Relaxed),
            SubmitOutcome::Invalid => self.validation_failures.fetch_add(1, Ordering::Relaxed),
            SubmitOutcome::Failed => self.prediction_failures.fetch_add(1, Ordering::Relaxed),
        };

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency.as_micros() as u64);
            // Keep only last 10000
            if latencies.len() > 10000 {
                latencies.drain(0..5000);
            }
        }

        if let Some(score) = prediction {
            self.record_score(score);
        }
    }

    fn record_score(&self, score: f64) {
        if !self.band.contains(score) {
            self.out_of_band.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let width = self.band.max - self.band.min;
        let position = if width > 0.0 {
            (score - self.band.min) / width
        } else {
            0.0
        };
        let bucket = ((position * 10.0) as usize).min(9);
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Get latency statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let latencies = self.latencies.read().unwrap_or_else(|p| p.into_inner());
        if latencies.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted: Vec<u64> = latencies.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get score distribution
    pub fn get_score_distribution(&self) -> [u64; 10] {
        *self.score_buckets.read().unwrap_or_else(|p| p.into_inner())
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let requests = self.requests.load(Ordering::Relaxed);
        let latency = self.get_latency_stats();

        info!(
            requests,
            predictions = self.predictions.load(Ordering::Relaxed),
            validation_failures = self.validation_failures.load(Ordering::Relaxed),
            prediction_failures = self.prediction_failures.load(Ordering::Relaxed),
            out_of_band = self.out_of_band.load(Ordering::Relaxed),
            throughput = format!("{:.1} req/s", self.get_throughput()),
            "Request summary"
        );
        info!(
            mean_us = latency.mean_us,
            p50_us = latency.p50_us,
            p95_us = latency.p95_us,
            p99_us = latency.p99_us,
            max_us = latency.max_us,
            "Request latency"
        );

        let distribution = self.get_score_distribution();
        let total: u64 = distribution.iter().sum();
        let step = (self.band.max - self.band.min) / 10.0;
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar: String = "█".repeat(((pct / 5.0) as usize).min(20));
            info!(
                "  {:>5.1}-{:>5.1}: {:>6} ({:>5.1}%) {}",
                self.band.min + step * i as f64,
                self.band.min + step * (i + 1) as f64,
                count,
                pct,
                bar
            );
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics reporter
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
