//! Run reporting: summary aggregation, artifacts and the ranked breakdown

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::{items_per_minute, RunResults, RunSummary, SiteResult};
use crate::storage::ArtifactWriter;
use crate::utils::error::PersistenceError;
use crate::utils::format_count;

/// Contents of the final artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalArtifact {
    pub summary: RunSummary,
    pub results: RunResults,
}

/// Wall-clock and monotonic start of a run
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    started_at: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl RunClock {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            started: tokio::time::Instant::now(),
        }
    }

    /// Close the window at the current instant
    pub fn stop(&self) -> RunWindow {
        RunWindow {
            start: self.started_at,
            end: Utc::now(),
            elapsed: self.started.elapsed(),
        }
    }
}

/// Start and end of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Monotonic duration between `start` and `end`
    pub elapsed: Duration,
}

/// Overall verdict derived from the total item count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeTier {
    FullSuccess,
    PartialSuccess,
    NeedsImprovement,
}

impl OutcomeTier {
    pub const FULL_SUCCESS_ITEMS: usize = 1000;
    pub const PARTIAL_SUCCESS_ITEMS: usize = 500;

    pub fn classify(total_items: usize) -> Self {
        if total_items >= Self::FULL_SUCCESS_ITEMS {
            Self::FullSuccess
        } else if total_items >= Self::PARTIAL_SUCCESS_ITEMS {
            Self::PartialSuccess
        } else {
            Self::NeedsImprovement
        }
    }
}

impl fmt::Display for OutcomeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FullSuccess => "Harvest successful",
            Self::PartialSuccess => "Harvest partially successful",
            Self::NeedsImprovement => "Harvest needs improvement",
        })
    }
}

/// Aggregates results and writes run artifacts
#[derive(Debug, Clone)]
pub struct Reporter {
    writer: ArtifactWriter,
}

impl Reporter {
    pub fn new(writer: ArtifactWriter) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &ArtifactWriter {
        &self.writer
    }

    /// Write the cumulative results after the `index`-th site (1-based)
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the artifact cannot be written
    pub fn snapshot_persist(
        &self,
        results: &RunResults,
        index: usize,
        site: &str,
    ) -> Result<PathBuf, PersistenceError> {
        let name = self.writer.snapshot_name(index, site, Utc::now());
        self.writer.write_json(&name, results)
    }

    /// Compute the run summary
    pub fn finalize(results: &RunResults, window: &RunWindow, interrupted: bool) -> RunSummary {
        let total_items = results.total_items();
        let elapsed_secs = window.elapsed.as_secs_f64();

        RunSummary {
            total_items,
            successful_site_count: results.successful_count(),
            total_site_count: results.len(),
            total_duration_minutes: elapsed_secs / 60.0,
            average_rate_per_minute: items_per_minute(total_items, elapsed_secs),
            start_timestamp: window.start,
            end_timestamp: window.end,
            interrupted,
        }
    }

    /// Write the final artifact with the summary and every result
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the artifact cannot be written
    pub fn final_persist(
        &self,
        results: &RunResults,
        summary: &RunSummary,
    ) -> Result<PathBuf, PersistenceError> {
        let artifact = FinalArtifact {
            summary: summary.clone(),
            results: results.clone(),
        };
        let name = self.writer.final_name(Utc::now());
        self.writer.write_json(&name, &artifact)
    }

    /// Results ordered by item count descending; ties keep insertion order
    pub fn ranked(results: &RunResults) -> Vec<&SiteResult> {
        let mut ranked: Vec<&SiteResult> = results.iter().collect();
        ranked.sort_by(|a, b| b.item_count.cmp(&a.item_count));
        ranked
    }

    /// Human-readable report
    pub fn render(results: &RunResults, summary: &RunSummary) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = Self::write_report(&mut out, results, summary);
        out
    }

    fn write_report(out: &mut String, results: &RunResults, summary: &RunSummary) -> fmt::Result {
        let title = if summary.interrupted {
            "Harvest Interrupted"
        } else {
            "Harvest Completed"
        };
        writeln!(out, "{title}")?;
        writeln!(out, "{}", "=".repeat(title.len()))?;
        writeln!(out, "Total items: {}", format_count(summary.total_items))?;
        writeln!(
            out,
            "Successful sites: {}/{}",
            summary.successful_site_count, summary.total_site_count
        )?;
        writeln!(
            out,
            "Total duration: {:.1} minutes",
            summary.total_duration_minutes
        )?;
        writeln!(
            out,
            "Average rate: {:.1} items/minute",
            summary.average_rate_per_minute
        )?;

        let ranked = Self::ranked(results);

        writeln!(out)?;
        writeln!(out, "Site Results")?;
        writeln!(out, "------------")?;
        for result in &ranked {
            let mark = if result.is_success() { "[ok]" } else { "[failed]" };
            writeln!(out, "{mark} {}", result.site_name.to_uppercase())?;
            writeln!(out, "    Items: {}", format_count(result.item_count))?;
            writeln!(out, "    Duration: {:.1} minutes", result.duration_minutes())?;
            writeln!(out, "    Rate: {:.1} items/minute", result.items_per_minute)?;
            if let Some(error) = &result.error_message {
                writeln!(out, "    Error: {error}")?;
            }
        }

        writeln!(out)?;
        writeln!(out, "{}", OutcomeTier::classify(summary.total_items))?;

        if let Some(best) = ranked.first() {
            writeln!(
                out,
                "Best performer: {} ({} items)",
                best.site_name.to_uppercase(),
                format_count(best.item_count)
            )?;
        }

        Ok(())
    }
}
