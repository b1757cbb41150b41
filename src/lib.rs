//! haul - Sequential multi-site asset harvester
//!
//! Instantiates a fixed set of site scrapers, runs them one after another,
//! records timing and throughput per site and persists JSON snapshots after
//! every site plus a final artifact at the end.
//!
//! # Architecture
//!
//! - [`registry`] - Static table of scrape targets
//! - [`scraper`] - Scraper capability, fetcher and built-in listing scrapers
//! - [`harvest`] - Initializer, runner and the end-to-end session
//! - [`report`] - Summary aggregation, ranking and artifacts
//! - [`storage`] - Atomic JSON artifact writer
//! - [`config`] - Configuration management and settings
//! - [`metrics`] - Prometheus run metrics
//! - [`models`] - Core data structures and types
//!
//! # Example
//!
//! ```no_run
//! use haul::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let registry = Registry::builtin();
//!     let factory = CatalogFactory::from_config(&config);
//!     let (_stop, shutdown) = tokio::sync::watch::channel(false);
//!
//!     let report = Session::new(&config, &registry, &factory, &TracingSink)
//!         .execute(shutdown)
//!         .await;
//!     println!("{}", report.render());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod harvest;
pub mod metrics;
pub mod models;
pub mod registry;
pub mod report;
pub mod scraper;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, HaulErrorTrait, Result};
    pub use crate::harvest::{
        Initializer, ProgressSink, RunReport, Runner, RunnerSettings, ScraperHandle, Session,
        SessionOutcome, TracingSink,
    };
    pub use crate::models::{Asset, RunResults, RunSummary, ScraperDescriptor, SiteResult};
    pub use crate::registry::Registry;
    pub use crate::report::Reporter;
    pub use crate::scraper::{CatalogFactory, Scraper, ScraperFactory};
}

// Direct re-exports for convenience
pub use models::{Asset, RunResults, RunSummary, SiteResult};
