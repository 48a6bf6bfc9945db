//! Parsed inbox chunk model.
//!
//! # Responsibility
//! - Carry one note's reviewable text, location and inline reactions from
//!   the parser to the reconciler.
//!
//! # Invariants
//! - `fingerprint == fingerprint(text)`; reactions never contribute to it.
//! - `reactions` are sorted ascending by date.

use crate::model::note::Fingerprint;
use chrono::NaiveDate;
use std::path::PathBuf;

/// Inline review annotation `YYYY-MM-DD: <label>` found inside a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub date: NaiveDate,
    pub label: String,
}

/// One note chunk parsed out of an inbox file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChunk {
    pub fingerprint: Fingerprint,
    /// Trimmed note text with reaction lines removed.
    pub text: String,
    /// 1-based inclusive start line.
    pub line_start: i64,
    /// 1-based inclusive end line (includes trailing separator lines).
    pub line_end: i64,
    pub reactions: Vec<Reaction>,
}

impl ParsedChunk {
    /// Returns the most recent reaction, if any.
    pub fn latest_reaction(&self) -> Option<&Reaction> {
        self.reactions.last()
    }
}

/// A parsed chunk tagged with the inbox file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedChunk {
    pub file_path: PathBuf,
    pub chunk: ParsedChunk,
}

impl SourcedChunk {
    pub fn new(file_path: impl Into<PathBuf>, chunk: ParsedChunk) -> Self {
        Self {
            file_path: file_path.into(),
            chunk,
        }
    }
}
