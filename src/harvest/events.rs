//! Progress notifications emitted while a run is initialized and executed

use std::path::Path;
use std::time::Duration;

use crate::models::{ScraperCategory, SiteResult};

/// One observable step of a harvest run
#[derive(Debug, Clone, Copy)]
pub enum HarvestEvent<'a> {
    /// Initialization of `total` registry entries is starting
    InitStarted { total: usize },

    /// A scraper instance was constructed
    ScraperReady {
        site: &'a str,
        category: ScraperCategory,
    },

    /// A registry entry could not be turned into a scraper
    ScraperFailed { site: &'a str, error: &'a str },

    /// Collection of a site is starting (`index` is 1-based)
    SiteStarted {
        site: &'a str,
        index: usize,
        total: usize,
    },

    /// A site finished, successfully or not
    SiteFinished {
        result: &'a SiteResult,
        running_total: usize,
    },

    SnapshotSaved { path: &'a Path },

    SnapshotFailed { site: &'a str, error: &'a str },

    /// Pausing before the next site
    Waiting { delay: Duration },

    /// Shutdown was requested; `completed` sites have results
    Interrupted { completed: usize },
}

/// Receiver of [`HarvestEvent`]s
pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: &HarvestEvent<'_>);
}

/// Sink that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn notify(&self, _event: &HarvestEvent<'_>) {}
}

/// Sink that turns events into structured log records
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn notify(&self, event: &HarvestEvent<'_>) {
        match *event {
            HarvestEvent::InitStarted { total } => {
                tracing::info!(total, "Initializing scrapers");
            }
            HarvestEvent::ScraperReady { site, category } => {
                tracing::info!(site, category = %category, "Scraper ready");
            }
            HarvestEvent::ScraperFailed { site, error } => {
                tracing::warn!(site, error, "Scraper initialization failed");
            }
            HarvestEvent::SiteStarted { site, index, total } => {
                tracing::info!(site, index, total, "Collecting site");
            }
            HarvestEvent::SiteFinished {
                result,
                running_total,
            } => {
                if result.is_success() {
                    tracing::info!(
                        site = %result.site_name,
                        items = result.item_count,
                        duration_secs = result.duration_seconds,
                        items_per_minute = result.items_per_minute,
                        running_total,
                        "Site completed"
                    );
                } else {
                    tracing::warn!(
                        site = %result.site_name,
                        error = result.error_message.as_deref().unwrap_or_default(),
                        duration_secs = result.duration_seconds,
                        "Site failed"
                    );
                }
            }
            HarvestEvent::SnapshotSaved { path } => {
                tracing::debug!(path = %path.display(), "Snapshot saved");
            }
            HarvestEvent::SnapshotFailed { site, error } => {
                tracing::error!(site, error, "Snapshot write failed");
            }
            HarvestEvent::Waiting { delay } => {
                tracing::debug!(delay_secs = delay.as_secs(), "Waiting before next site");
            }
            HarvestEvent::Interrupted { completed } => {
                tracing::warn!(completed, "Run interrupted");
            }
        }
    }
}

/// Forwards every event to each inner sink in order
pub struct FanOut<'a> {
    sinks: Vec<&'a dyn ProgressSink>,
}

impl<'a> FanOut<'a> {
    pub fn new(sinks: Vec<&'a dyn ProgressSink>) -> Self {
        Self { sinks }
    }
}

impl ProgressSink for FanOut<'_> {
    fn notify(&self, event: &HarvestEvent<'_>) {
        for sink in &self.sinks {
            sink.notify(event);
        }
    }
}
