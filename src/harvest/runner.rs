//! Sequential site runner
//!
//! Collects ready scrapers one at a time in registry order, records a
//! [`SiteResult`] per site and writes a cumulative snapshot after each one.
//! A shutdown signal is honored before a site starts, while it is being
//! collected and during the inter-site pause.

use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::Config;
use crate::harvest::events::{HarvestEvent, ProgressSink};
use crate::harvest::init::ScraperHandle;
use crate::metrics::RunMetrics;
use crate::models::{Asset, RunResults, ScraperCategory, ScraperDescriptor, SiteResult};
use crate::report::Reporter;
use crate::scraper::Scraper;
use crate::utils::error::CollectionError;

/// Default pause between sites
pub const DEFAULT_INTER_SITE_DELAY: Duration = Duration::from_secs(30);

/// Timing settings of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerSettings {
    pub inter_site_delay: Duration,
    /// `None` lets a site run for as long as it takes
    pub site_timeout: Option<Duration>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            inter_site_delay: DEFAULT_INTER_SITE_DELAY,
            site_timeout: Some(Duration::from_secs(3600)),
        }
    }
}

impl RunnerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            inter_site_delay: config.inter_site_delay(),
            site_timeout: config.site_timeout(),
        }
    }
}

/// What happened during [`Runner::run`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProgress {
    /// Sites that produced a result in this run
    pub completed: usize,
    /// Shutdown stopped the loop before every ready site ran
    pub interrupted: bool,
    /// Snapshot artifacts written, in order
    pub snapshots: Vec<PathBuf>,
    pub snapshot_failures: usize,
}

/// Drives the collection loop
pub struct Runner<'a> {
    settings: RunnerSettings,
    reporter: &'a Reporter,
    sink: &'a dyn ProgressSink,
    metrics: Option<&'a RunMetrics>,
    shutdown: watch::Receiver<bool>,
}

impl<'a> Runner<'a> {
    pub fn new(
        settings: RunnerSettings,
        reporter: &'a Reporter,
        sink: &'a dyn ProgressSink,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            settings,
            reporter,
            sink,
            metrics: None,
            shutdown,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: &'a RunMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Run every ready handle, inserting results into `results`
    pub async fn run(&self, handles: &[ScraperHandle], results: &mut RunResults) -> RunProgress {
        let ready: Vec<(&ScraperDescriptor, &dyn Scraper)> = handles
            .iter()
            .filter_map(|h| h.instance.as_deref().map(|s| (&h.descriptor, s)))
            .collect();
        let total = ready.len();

        tracing::info!(ready = total, skipped = handles.len() - total, "Starting run");

        let mut progress = RunProgress::default();

        for (position, (descriptor, scraper)) in ready.into_iter().enumerate() {
            let index = position + 1;

            if self.shutdown_requested() {
                progress.interrupted = true;
                break;
            }

            self.sink.notify(&HarvestEvent::SiteStarted {
                site: &descriptor.name,
                index,
                total,
            });

            let timestamp = Utc::now();
            let started = Instant::now();

            let outcome = tokio::select! {
                outcome = self.collect(descriptor, scraper) => outcome,
                () = wait_for_shutdown(self.shutdown.clone()) => {
                    tracing::warn!(site = %descriptor.name, "Collection abandoned on shutdown");
                    progress.interrupted = true;
                    break;
                }
            };
            let elapsed = started.elapsed();

            let result = match outcome {
                Ok(items) => SiteResult::success(&descriptor.name, items, elapsed, timestamp),
                Err(e) => SiteResult::failure(&descriptor.name, &e, elapsed, timestamp),
            };

            if let Some(metrics) = self.metrics {
                metrics.record_site(&result);
            }

            results.insert(result);
            progress.completed += 1;

            if let Some(result) = results.get(&descriptor.name) {
                self.sink.notify(&HarvestEvent::SiteFinished {
                    result,
                    running_total: results.total_items(),
                });
            }

            match self
                .reporter
                .snapshot_persist(results, index, &descriptor.name)
            {
                Ok(path) => {
                    self.sink.notify(&HarvestEvent::SnapshotSaved { path: &path });
                    progress.snapshots.push(path);
                }
                Err(e) => {
                    let error = e.to_string();
                    self.sink.notify(&HarvestEvent::SnapshotFailed {
                        site: &descriptor.name,
                        error: &error,
                    });
                    progress.snapshot_failures += 1;
                }
            }

            if index < total && !self.settings.inter_site_delay.is_zero() {
                let delay = self.settings.inter_site_delay;
                self.sink.notify(&HarvestEvent::Waiting { delay });

                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    () = wait_for_shutdown(self.shutdown.clone()) => {
                        progress.interrupted = true;
                        break;
                    }
                }
            }
        }

        if progress.interrupted {
            self.sink.notify(&HarvestEvent::Interrupted {
                completed: progress.completed,
            });
        }

        progress
    }

    /// Invoke the scraper's entry point for its category, bounded by the site timeout
    async fn collect(
        &self,
        descriptor: &ScraperDescriptor,
        scraper: &dyn Scraper,
    ) -> Result<Vec<Asset>, CollectionError> {
        let limit = descriptor.collection_limit;
        let collection = async {
            match descriptor.category {
                ScraperCategory::Analytical => scraper.analyze_and_scrape(limit).await,
                ScraperCategory::Standard => scraper.scrape(limit).await,
            }
        };

        match self.settings.site_timeout {
            Some(budget) => tokio::time::timeout(budget, collection)
                .await
                .unwrap_or(Err(CollectionError::TimedOut {
                    secs: budget.as_secs(),
                })),
            None => collection.await,
        }
    }
}

/// Resolves once shutdown is signalled; never resolves if the sender is gone
async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.harvest.inter_site_delay_secs = 5;
        config.harvest.site_timeout_secs = 0;

        let settings = RunnerSettings::from_config(&config);
        assert_eq!(settings.inter_site_delay, Duration::from_secs(5));
        assert_eq!(settings.site_timeout, None);
    }

    #[test]
    fn test_default_settings() {
        let settings = RunnerSettings::default();
        assert_eq!(settings.inter_site_delay, Duration::from_secs(30));
        assert_eq!(settings.site_timeout, Some(Duration::from_secs(3600)));
    }
}
