//! One complete harvest: confirm, initialize, run, finalize, persist

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::Config;
use crate::harvest::events::ProgressSink;
use crate::harvest::init::Initializer;
use crate::harvest::runner::{RunProgress, Runner, RunnerSettings};
use crate::metrics::RunMetrics;
use crate::models::{RunResults, RunSummary};
use crate::registry::Registry;
use crate::report::{RunClock, Reporter};
use crate::scraper::ScraperFactory;
use crate::storage::ArtifactWriter;
use crate::utils::error::PersistenceError;

/// Process exit status for a finished session
pub mod exit_status {
    pub const OK: u8 = 0;
    pub const FATAL: u8 = 1;
    pub const SITE_FAILURES: u8 = 2;
    pub const INTERRUPTED: u8 = 130;
}

/// Ask `question` and read one answer line; only `y`/`yes` proceed
///
/// # Errors
///
/// Returns an I/O error if the prompt cannot be written or the answer read
pub fn confirm<R: BufRead, W: Write>(mut input: R, mut output: W, question: &str) -> io::Result<bool> {
    write!(output, "{question} (y/N) ")?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Result of [`Session::execute_confirmed`]
#[derive(Debug)]
pub enum SessionOutcome {
    /// The operator did not confirm; nothing was initialized or written
    Declined,
    Completed(RunReport),
}

/// Everything a finished session produced
#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    /// `(site, error)` for each entry that could not be initialized
    pub init_failures: Vec<(String, String)>,
    pub results: RunResults,
    pub summary: RunSummary,
    pub progress: RunProgress,
    pub final_artifact: Result<PathBuf, PersistenceError>,
    pub metrics_file: Option<PathBuf>,
}

impl RunReport {
    pub fn exit_status(&self) -> u8 {
        if self.final_artifact.is_err() {
            exit_status::FATAL
        } else if self.progress.interrupted {
            exit_status::INTERRUPTED
        } else if !self.init_failures.is_empty() || self.results.failed_count() > 0 {
            exit_status::SITE_FAILURES
        } else {
            exit_status::OK
        }
    }

    /// Human-readable report of the run
    pub fn render(&self) -> String {
        Reporter::render(&self.results, &self.summary)
    }
}

/// A configured harvest, ready to execute
pub struct Session<'a> {
    config: &'a Config,
    registry: &'a Registry,
    factory: &'a dyn ScraperFactory,
    sink: &'a dyn ProgressSink,
}

impl<'a> Session<'a> {
    pub fn new(
        config: &'a Config,
        registry: &'a Registry,
        factory: &'a dyn ScraperFactory,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            config,
            registry,
            factory,
            sink,
        }
    }

    /// Question put to the operator before a run
    pub fn confirmation_question(&self) -> String {
        let names: Vec<&str> = self
            .registry
            .list_descriptors()
            .iter()
            .map(|d| d.name.as_str())
            .collect();

        format!(
            "This will collect every available item from {} site(s): {}.\nContinue?",
            names.len(),
            names.join(", ")
        )
    }

    /// Ask the operator first, then execute
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the confirmation prompt fails
    pub async fn execute_confirmed<R: BufRead, W: Write>(
        &self,
        input: R,
        output: W,
        shutdown: watch::Receiver<bool>,
    ) -> io::Result<SessionOutcome> {
        if !confirm(input, output, &self.confirmation_question())? {
            tracing::info!("Run declined by operator");
            return Ok(SessionOutcome::Declined);
        }

        Ok(SessionOutcome::Completed(self.execute(shutdown).await))
    }

    /// Initialize every registry entry, run the ready ones and persist the final artifact
    pub async fn execute(&self, shutdown: watch::Receiver<bool>) -> RunReport {
        let run_id = Uuid::new_v4().simple().to_string()[..8].to_string();
        let harvest = &self.config.harvest;

        let writer = ArtifactWriter::new(&harvest.output_dir, &harvest.snapshot_prefix, &run_id);
        let reporter = Reporter::new(writer);

        let metrics = if harvest.write_metrics {
            RunMetrics::new()
                .map_err(|e| tracing::warn!(error = %e, "Metrics disabled for this run"))
                .ok()
        } else {
            None
        };

        tracing::info!(
            run_id = %run_id,
            sites = self.registry.len(),
            output_dir = %harvest.output_dir.display(),
            "Harvest starting"
        );

        let clock = RunClock::start();

        let handles = Initializer::new(self.factory, self.sink).initialize_all(self.registry);
        let init_failures = handles
            .iter()
            .filter_map(|h| {
                h.initialization_error
                    .as_ref()
                    .map(|e| (h.descriptor.name.clone(), e.clone()))
            })
            .collect();

        let mut runner = Runner::new(
            RunnerSettings::from_config(self.config),
            &reporter,
            self.sink,
            shutdown,
        );
        if let Some(metrics) = &metrics {
            runner = runner.with_metrics(metrics);
        }

        let mut results = RunResults::new();
        let progress = runner.run(&handles, &mut results).await;

        let window = clock.stop();
        let summary = Reporter::finalize(&results, &window, progress.interrupted);

        let final_artifact = reporter.final_persist(&results, &summary);
        if let Err(e) = &final_artifact {
            tracing::error!(error = %e, "Failed to write final artifact");
        }

        let metrics_file = metrics.and_then(|m| write_metrics(reporter.writer(), &m));

        tracing::info!(
            run_id = %run_id,
            total_items = summary.total_items,
            successful = summary.successful_site_count,
            sites = summary.total_site_count,
            interrupted = summary.interrupted,
            "Harvest finished"
        );

        RunReport {
            run_id,
            init_failures,
            results,
            summary,
            progress,
            final_artifact,
            metrics_file,
        }
    }
}

fn write_metrics(writer: &ArtifactWriter, metrics: &RunMetrics) -> Option<PathBuf> {
    let text = match metrics.encode() {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode metrics");
            return None;
        }
    };

    writer
        .write_bytes(&writer.metrics_name(), text.as_bytes())
        .map_err(|e| tracing::warn!(error = %e, "Failed to write metrics"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(text: &str) -> bool {
        let mut out = Vec::new();
        confirm(Cursor::new(text.as_bytes()), &mut out, "Continue?").unwrap()
    }

    #[test]
    fn test_confirm_accepts_only_yes() {
        assert!(answer("y\n"));
        assert!(answer("YES\n"));
        assert!(answer("  Yes  \n"));

        assert!(!answer("n\n"));
        assert!(!answer("\n"));
        assert!(!answer(""));
        assert!(!answer("yep\n"));
    }

    #[test]
    fn test_confirm_writes_question() {
        let mut out = Vec::new();
        confirm(Cursor::new(b"n\n".as_slice()), &mut out, "Go?").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Go? (y/N) ");
    }

    #[test]
    fn test_exit_status_priority() {
        use crate::models::SiteResult;
        use chrono::Utc;
        use std::time::Duration;

        let mut results = RunResults::new();
        results.insert(SiteResult::failure("b", "x", Duration::ZERO, Utc::now()));

        let summary = RunSummary {
            total_items: 0,
            successful_site_count: 0,
            total_site_count: 1,
            total_duration_minutes: 0.0,
            average_rate_per_minute: 0.0,
            start_timestamp: Utc::now(),
            end_timestamp: Utc::now(),
            interrupted: false,
        };

        let mut report = RunReport {
            run_id: String::from("r"),
            init_failures: Vec::new(),
            results: RunResults::new(),
            summary,
            progress: RunProgress::default(),
            final_artifact: Ok(PathBuf::from("final.json")),
            metrics_file: None,
        };
        assert_eq!(report.exit_status(), exit_status::OK);

        report.init_failures.push((String::from("x"), String::from("unknown")));
        assert_eq!(report.exit_status(), exit_status::SITE_FAILURES);

        report.init_failures.clear();
        report.results = results;
        assert_eq!(report.exit_status(), exit_status::SITE_FAILURES);

        report.progress.interrupted = true;
        assert_eq!(report.exit_status(), exit_status::INTERRUPTED);

        report.final_artifact = Err(PersistenceError::Io {
            path: PathBuf::from("x"),
            source: io::Error::other("disk full"),
        });
        assert_eq!(report.exit_status(), exit_status::FATAL);
    }
}
