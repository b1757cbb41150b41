//! Durable run artifacts
//!
//! Every artifact is written as a full, independent JSON file through a
//! temp-file-then-rename sequence, so a reader never sees a torn write.

pub mod snapshot;

pub use snapshot::ArtifactWriter;
