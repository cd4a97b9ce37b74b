//! Prometheus metrics for group role management policy lookups
//!
//! - **Lookups**: `rolepolicy_lookups_total{outcome}` where `outcome` is
//!   `success` or the failure's `ErrorKind` (`validation` for rejected input)
//! - **Latency**: `rolepolicy_lookup_duration_seconds`, observed for every
//!   read that reached the directory

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry, Encoder,
    Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};
use rolepolicy_core::ErrorKind;
use std::time::Duration;

/// Histogram buckets for read latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 30.0, 300.0];

/// Outcome label of a successful read
const SUCCESS: &str = "success";

/// Point-in-time copy of the lookup metrics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// Reads that reached the directory
    pub reads: u64,

    /// Reads that produced a policy id
    pub successes: u64,

    /// Reads that failed because nothing usable was found
    pub not_found: u64,

    /// Reads that failed talking to the directory
    pub transport_errors: u64,

    /// Reads cut short by cancellation or timeout
    pub cancelled: u64,

    /// Invocations rejected by input validation
    pub rejected: u64,

    /// Summed latency of all reads, in seconds
    pub latency_sum_secs: f64,
}

impl MetricsSnapshot {
    /// Fraction of reads that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.reads == 0 {
            0.0
        } else {
            self.successes as f64 / self.reads as f64
        }
    }

    /// Mean read latency
    pub fn avg_latency(&self) -> Duration {
        if self.reads == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(self.latency_sum_secs / self.reads as f64)
        }
    }
}

/// Lookup metrics registered on their own Prometheus registry
pub struct LookupMetrics {
    registry: Registry,

    /// Lookups per outcome (Counter)
    pub lookups_total: IntCounterVec,

    /// Read latency (Histogram)
    pub lookup_duration: Histogram,
}

impl LookupMetrics {
    /// Create metrics on a fresh registry
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Create metrics on `registry`
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let lookups_total = register_int_counter_vec_with_registry!(
            Opts::new("rolepolicy_lookups_total", "Group role management policy lookups by outcome"),
            &["outcome"],
            registry
        )?;

        let lookup_duration = register_histogram_with_registry!(
            HistogramOpts::new(
                "rolepolicy_lookup_duration_seconds",
                "Latency of group role management policy reads in seconds"
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            registry
        )?;

        Ok(Self {
            registry,
            lookups_total,
            lookup_duration,
        })
    }

    /// Get Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a successful read
    pub fn record_success(&self, latency: Duration) {
        self.lookup_duration.observe(latency.as_secs_f64());
        self.lookups_total.with_label_values(&[SUCCESS]).inc();
    }

    /// Record a failed read by its classification
    pub fn record_failure(&self, kind: ErrorKind, latency: Duration) {
        self.lookup_duration.observe(latency.as_secs_f64());
        self.lookups_total.with_label_values(&[kind.as_str()]).inc();
    }

    /// Record an invocation rejected before any directory call
    pub fn record_rejected(&self) {
        self.lookups_total
            .with_label_values(&[ErrorKind::Validation.as_str()])
            .inc();
    }

    /// Read the current values
    pub fn snapshot(&self) -> MetricsSnapshot {
        let count = |outcome: &str| self.lookups_total.with_label_values(&[outcome]).get();
        MetricsSnapshot {
            reads: self.lookup_duration.get_sample_count(),
            successes: count(SUCCESS),
            not_found: count(ErrorKind::NotFound.as_str()),
            transport_errors: count(ErrorKind::Transport.as_str()),
            cancelled: count(ErrorKind::Cancellation.as_str()),
            rejected: count(ErrorKind::Validation.as_str()),
            latency_sum_secs: self.lookup_duration.get_sample_sum(),
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl std::fmt::Debug for LookupMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupMetrics")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
