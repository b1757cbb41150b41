//! Run orchestration
//!
//! The [`Initializer`] turns registry descriptors into [`ScraperHandle`]s and
//! the [`Runner`] collects every ready handle in order, feeding results to the
//! caller-owned [`RunResults`](crate::models::RunResults) and snapshots to the
//! [`Reporter`](crate::report::Reporter).

pub mod events;
pub mod init;
pub mod runner;
pub mod session;

pub use events::{FanOut, HarvestEvent, NullSink, ProgressSink, TracingSink};
pub use init::{Initializer, ScraperHandle};
pub use runner::{RunProgress, Runner, RunnerSettings};
pub use session::{confirm, exit_status, RunReport, Session, SessionOutcome};
