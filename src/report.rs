//! Append-only log of model recommendations.
//!
//! Every recommendation is appended verbatim to a single text file. Nothing
//! is ever rewritten or rotated.

use crate::error::{AdvisorError, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Filename of the recommendation log inside the output directory.
pub const DEFAULT_LOG_FILENAME: &str = "recommendations.txt";

/// Writer for the recommendation log.
#[derive(Debug)]
pub struct RecommendationLog {
    dir: PathBuf,
    path: PathBuf,
    dir_ready: bool,
}

impl RecommendationLog {
    /// Log to `recommendations.txt` inside `output_dir`. Nothing is touched on
    /// disk until the first append.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let dir = output_dir.into();
        let path = dir.join(DEFAULT_LOG_FILENAME);
        Self {
            dir,
            path,
            dir_ready: false,
        }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `text` to the log, creating the output directory first if this
    /// log has not done so yet.
    pub fn append(&mut self, text: &str) -> Result<()> {
        if !self.dir_ready {
            fs::create_dir_all(&self.dir).map_err(|e| AdvisorError::io(&self.dir, e))?;
            self.dir_ready = true;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AdvisorError::io(&self.path, e))?;

        file.write_all(text.as_bytes())
            .map_err(|e| AdvisorError::io(&self.path, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_appends_in_call_order() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("output");
        let mut log = RecommendationLog::new(&output);

        assert!(!output.exists());

        log.append("A").unwrap();
        assert!(output.is_dir());
        assert!(log.dir_ready);

        log.append("B").unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content, "AB");
    }

    #[test]
    fn test_directory_created_once() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("nested").join("output");
        let mut log = RecommendationLog::new(&output);

        log.append("first").unwrap();

        // A second append must not try to create the directory again.
        fs::remove_dir_all(&output).unwrap();
        let err = log.append("second").unwrap_err();
        assert!(matches!(err, AdvisorError::Io { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULT_LOG_FILENAME), "earlier run\n").unwrap();

        let mut log = RecommendationLog::new(dir.path());
        log.append("Start Allen.").unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content, "earlier run\nStart Allen.");
    }
}
