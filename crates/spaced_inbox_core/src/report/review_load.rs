//! Append-only review-load log.
//!
//! # Responsibility
//! - Record live/due counts once per run as a CSV row.
//! - Read the log back for history summaries.
//!
//! # Invariants
//! - The header `timestamp,num_notes,num_due_notes` is written only when the
//!   file is new or empty.
//! - Existing rows are never rewritten.

use crate::schedule::scheduler::ReviewStats;
use chrono::NaiveDateTime;
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One row of the review-load log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewLoadEntry {
    pub timestamp: String,
    pub num_notes: usize,
    pub num_due_notes: usize,
}

impl ReviewLoadEntry {
    pub fn new(recorded_at: NaiveDateTime, stats: ReviewStats) -> Self {
        Self {
            timestamp: recorded_at.format(TIMESTAMP_FORMAT).to_string(),
            num_notes: stats.num_notes,
            num_due_notes: stats.num_due_notes,
        }
    }
}

#[derive(Debug)]
pub enum ReviewLoadError {
    Io { path: PathBuf, source: std::io::Error },
    Csv { path: PathBuf, source: csv::Error },
}

impl Display for ReviewLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "review load log `{}`: {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "review load log `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ReviewLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
        }
    }
}

/// Appends one row, creating the file (and its parent directory) if needed.
pub fn record_review_load(
    path: &Path,
    recorded_at: NaiveDateTime,
    stats: ReviewStats,
) -> Result<(), ReviewLoadError> {
    let io_err = |source| ReviewLoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source| ReviewLoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    let needs_header = file.metadata().map_err(io_err)?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer
        .serialize(ReviewLoadEntry::new(recorded_at, stats))
        .map_err(csv_err)?;
    writer.flush().map_err(io_err)?;

    debug!(
        "event=review_load module=report status=ok num_notes={} num_due_notes={}",
        stats.num_notes, stats.num_due_notes
    );
    Ok(())
}

/// Reads every row of the log. A missing file yields no rows.
pub fn read_review_load(path: &Path) -> Result<Vec<ReviewLoadEntry>, ReviewLoadError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path).map_err(|source| ReviewLoadError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    reader
        .deserialize()
        .collect::<Result<Vec<ReviewLoadEntry>, _>>()
        .map_err(|source| ReviewLoadError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::{read_review_load, record_review_load, ReviewLoadEntry};
    use crate::schedule::scheduler::ReviewStats;
    use chrono::NaiveDate;

    fn at(hour: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 30)
            .unwrap()
            .and_hms_micro_opt(hour, 4, 5, 120)
            .unwrap()
    }

    #[test]
    fn header_written_once_and_rows_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("review_load.csv");

        record_review_load(&path, at(9), ReviewStats { num_notes: 10, num_due_notes: 2 })
            .unwrap();
        record_review_load(&path, at(21), ReviewStats { num_notes: 11, num_due_notes: 0 })
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "timestamp,num_notes,num_due_notes",
                "2025-03-30T09:04:05.000120,10,2",
                "2025-03-30T21:04:05.000120,11,0",
            ]
        );

        let rows = read_review_load(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1],
            ReviewLoadEntry {
                timestamp: "2025-03-30T21:04:05.000120".into(),
                num_notes: 11,
                num_due_notes: 0,
            }
        );
    }

    #[test]
    fn missing_log_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_review_load(&dir.path().join("absent.csv"))
            .unwrap()
            .is_empty());
    }
}
