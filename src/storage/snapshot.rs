//! Atomic JSON artifact writer
//!
//! # Example
//!
//! ```no_run
//! use haul::storage::ArtifactWriter;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let writer = ArtifactWriter::new(Path::new("./output"), "haul", "3f2a9c1b");
//! let path = writer.write_json(&writer.final_name(chrono::Utc::now()), &serde_json::json!({}))?;
//! println!("saved {}", path.display());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::utils::error::PersistenceError;
use crate::utils::sanitize_filename;

const FILE_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

/// Writes run-qualified, timestamp-suffixed JSON artifacts into one directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
    prefix: String,
    run_id: String,
}

impl ArtifactWriter {
    /// The directory is created on first write
    pub fn new(dir: &Path, prefix: &str, run_id: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            prefix: sanitize_filename(prefix),
            run_id: sanitize_filename(run_id),
        }
    }

    /// `{prefix}_results_{run}_{index:02}_{site}_{timestamp}.json`
    pub fn snapshot_name(&self, index: usize, site: &str, at: DateTime<Utc>) -> String {
        format!(
            "{}_results_{}_{index:02}_{}_{}.json",
            self.prefix,
            self.run_id,
            sanitize_filename(site),
            at.format(FILE_TIMESTAMP)
        )
    }

    /// `{prefix}_final_results_{run}_{timestamp}.json`
    pub fn final_name(&self, at: DateTime<Utc>) -> String {
        format!(
            "{}_final_results_{}_{}.json",
            self.prefix,
            self.run_id,
            at.format(FILE_TIMESTAMP)
        )
    }

    /// `{prefix}_metrics_{run}.prom`
    pub fn metrics_name(&self) -> String {
        format!("{}_metrics_{}.prom", self.prefix, self.run_id)
    }

    /// Serialize `value` as pretty JSON into `file_name`
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the directory or file cannot be written
    pub fn write_json<T: Serialize>(
        &self,
        file_name: &str,
        value: &T,
    ) -> Result<PathBuf, PersistenceError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(file_name, &bytes)
    }

    /// Write raw bytes into `file_name`
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Io` if the directory or file cannot be written
    pub fn write_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, PersistenceError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| PersistenceError::Io { path, source }
        };

        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;

        let filepath = self.dir.join(file_name);
        let temp_path = self.dir.join(format!("{file_name}.tmp"));

        let file = File::create(&temp_path).map_err(io_err(&temp_path))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes).map_err(io_err(&temp_path))?;
        writer.flush().map_err(io_err(&temp_path))?;
        drop(writer);

        // Atomic rename
        fs::rename(&temp_path, &filepath).map_err(io_err(&filepath))?;

        tracing::debug!(path = %filepath.display(), "Artifact saved");
        Ok(filepath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_names() {
        let writer = ArtifactWriter::new(Path::new("out"), "haul", "abc123");

        assert_eq!(
            writer.snapshot_name(2, "open game art", at()),
            "haul_results_abc123_02_open_game_art_20260314_092653.json"
        );
        assert_eq!(
            writer.final_name(at()),
            "haul_final_results_abc123_20260314_092653.json"
        );
        assert_eq!(writer.metrics_name(), "haul_metrics_abc123.prom");
    }

    #[test]
    fn test_write_json_creates_dir_and_leaves_no_temp() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested/output");
        let writer = ArtifactWriter::new(&dir, "haul", "run");

        let path = writer
            .write_json("a.json", &serde_json::json!({"kenney": {"itemCount": 3}}))
            .unwrap();

        let content: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content["kenney"]["itemCount"], 3);

        let entries: Vec<_> = fs::read_dir(&dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_rewrite_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(temp_dir.path(), "haul", "run");

        writer.write_json("a.json", &vec![1]).unwrap();
        let path = writer.write_json("a.json", &vec![1, 2]).unwrap();

        let content: Vec<u32> = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(content, vec![1, 2]);
    }

    #[test]
    fn test_unwritable_dir_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let writer = ArtifactWriter::new(&blocker.join("sub"), "haul", "run");
        let result = writer.write_json("a.json", &1);
        assert!(matches!(result, Err(PersistenceError::Io { .. })));
    }
}
