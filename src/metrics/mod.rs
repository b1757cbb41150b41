//! Prometheus metrics for a harvest run
//!
//! Each run owns its own [`RunMetrics`] registry, so several runs (or tests)
//! in one process never share counters. When registration fails the binary
//! carries on without metrics.

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

use crate::models::SiteResult;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for the per-run metrics
#[derive(Clone)]
pub struct RunMetrics {
    registry: Registry,
    site_runs: CounterVec,
    items_collected: CounterVec,
    site_duration: HistogramVec,
}

impl std::fmt::Debug for RunMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunMetrics").finish_non_exhaustive()
    }
}

// ============================================================================
// Initialization
// ============================================================================

impl RunMetrics {
    /// Create and register all run metrics
    ///
    /// # Errors
    ///
    /// Returns the prometheus error if a metric cannot be created or registered
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let site_runs = CounterVec::new(
            Opts::new("haul_site_runs_total", "Site runs by outcome"),
            &["status"],
        )?;
        let items_collected = CounterVec::new(
            Opts::new("haul_items_collected_total", "Items collected per site"),
            &["site"],
        )?;
        let site_duration = HistogramVec::new(
            HistogramOpts::new(
                "haul_site_duration_seconds",
                "Time spent collecting a site in seconds",
            )
            .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0]),
            &["site"],
        )?;

        registry.register(Box::new(site_runs.clone()))?;
        registry.register(Box::new(items_collected.clone()))?;
        registry.register(Box::new(site_duration.clone()))?;

        Ok(Self {
            registry,
            site_runs,
            items_collected,
            site_duration,
        })
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Record the outcome of one site run
    pub fn record_site(&self, result: &SiteResult) {
        self.site_runs
            .with_label_values(&[result.status.as_str()])
            .inc();

        if result.item_count > 0 {
            self.items_collected
                .with_label_values(&[result.site_name.as_str()])
                .inc_by(result.item_count as f64);
        }

        self.site_duration
            .with_label_values(&[result.site_name.as_str()])
            .observe(result.duration_seconds);
    }

    /// Encode all metrics to Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or produces invalid UTF-8
    pub fn encode(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
