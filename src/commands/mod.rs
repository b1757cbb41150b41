pub mod report;
pub mod run;
pub mod sites;

// Re-export command functions for convenience
pub use report::report;
pub use run::{run, RunArgs};
pub use sites::sites;
