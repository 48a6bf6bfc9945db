//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted review record for one inbox note.
//! - Provide lifecycle helpers for soft-delete semantics.
//!
//! # Invariants
//! - `fingerprint` is stable and equals the digest of `text`.
//! - `interval < 0` marks a tombstone; `interval == 0` is never persisted.
//! - `created_on <= last_reviewed_on`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Content hash used as the stable identity key of a note.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type Fingerprint = String;

/// Interval (in days) assigned to new and resurrected notes.
pub const INITIAL_INTERVAL: i64 = 50;
/// Ease factor (percent) assigned to new and resurrected notes.
pub const DEFAULT_EASE_FACTOR: i64 = 300;
/// Interval written when a note is soft-deleted.
pub const TOMBSTONE_INTERVAL: i64 = -1;

/// Review state of a note, derived from the most recent reaction label.
///
/// Only `Normal` and `Exciting` change selection behavior; every other label
/// is carried as `Other` so new labels need no code change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum NoteState {
    /// Never reacted to since creation or resurrection.
    Normal,
    /// Marked exciting; gets its own selection tier.
    Exciting,
    /// Any other free-form reaction label.
    Other(String),
}

impl NoteState {
    pub fn from_label(label: &str) -> Self {
        match label {
            "normal" => Self::Normal,
            "exciting" => Self::Exciting,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Normal => "normal",
            Self::Exciting => "exciting",
            Self::Other(label) => label.as_str(),
        }
    }
}

impl Display for NoteState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for NoteState {
    fn from(value: String) -> Self {
        Self::from_label(value.as_str())
    }
}

impl From<NoteState> for String {
    fn from(value: NoteState) -> Self {
        value.as_str().to_string()
    }
}

/// Validation errors for note invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    EmptyFingerprint,
    EmptyText,
    InvalidLineRange { start: i64, end: i64 },
    ZeroInterval,
    NonPositiveEaseFactor(i64),
    NegativeReviewedCount(i64),
    CreatedAfterLastReview {
        created_on: NaiveDate,
        last_reviewed_on: NaiveDate,
    },
    EmptyState,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFingerprint => write!(f, "fingerprint cannot be empty"),
            Self::EmptyText => write!(f, "note text cannot be empty"),
            Self::InvalidLineRange { start, end } => {
                write!(f, "invalid line range {start}-{end}")
            }
            Self::ZeroInterval => write!(f, "interval cannot be zero"),
            Self::NonPositiveEaseFactor(value) => {
                write!(f, "ease factor must be positive, got {value}")
            }
            Self::NegativeReviewedCount(value) => {
                write!(f, "reviewed count cannot be negative, got {value}")
            }
            Self::CreatedAfterLastReview {
                created_on,
                last_reviewed_on,
            } => write!(
                f,
                "created_on {created_on} is after last_reviewed_on {last_reviewed_on}"
            ),
            Self::EmptyState => write!(f, "state label cannot be empty"),
        }
    }
}

impl Error for NoteValidationError {}

/// Persisted review record for one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable identity: digest of `text`.
    pub fingerprint: Fingerprint,
    /// Inbox file the note was last seen in. `None` only for legacy rows.
    pub file_path: Option<PathBuf>,
    /// 1-based inclusive start line.
    pub line_start: i64,
    /// 1-based inclusive end line.
    pub line_end: i64,
    /// Percentage multiplier applied on each accepted reaction.
    pub ease_factor: i64,
    /// Days until due, counted from `last_reviewed_on`. Negative = tombstone.
    pub interval: i64,
    pub last_reviewed_on: NaiveDate,
    pub created_on: NaiveDate,
    pub reviewed_count: i64,
    pub state: NoteState,
    /// Reviewable content with reaction lines removed.
    pub text: String,
}

impl Note {
    /// Creates a fresh note with the default schedule, created `today`.
    pub fn new(
        fingerprint: impl Into<Fingerprint>,
        text: impl Into<String>,
        file_path: impl Into<PathBuf>,
        line_start: i64,
        line_end: i64,
        today: NaiveDate,
    ) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            file_path: Some(file_path.into()),
            line_start,
            line_end,
            ease_factor: DEFAULT_EASE_FACTOR,
            interval: INITIAL_INTERVAL,
            last_reviewed_on: today,
            created_on: today,
            reviewed_count: 0,
            state: NoteState::Normal,
            text: text.into(),
        }
    }

    /// Validates field-level invariants before persistence.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.fingerprint.trim().is_empty() {
            return Err(NoteValidationError::EmptyFingerprint);
        }
        if self.text.trim().is_empty() {
            return Err(NoteValidationError::EmptyText);
        }
        if self.line_start < 1 || self.line_end < self.line_start {
            return Err(NoteValidationError::InvalidLineRange {
                start: self.line_start,
                end: self.line_end,
            });
        }
        if self.interval == 0 {
            return Err(NoteValidationError::ZeroInterval);
        }
        if self.ease_factor <= 0 {
            return Err(NoteValidationError::NonPositiveEaseFactor(
                self.ease_factor,
            ));
        }
        if self.reviewed_count < 0 {
            return Err(NoteValidationError::NegativeReviewedCount(
                self.reviewed_count,
            ));
        }
        if self.created_on > self.last_reviewed_on {
            return Err(NoteValidationError::CreatedAfterLastReview {
                created_on: self.created_on,
                last_reviewed_on: self.last_reviewed_on,
            });
        }
        if self.state.as_str().trim().is_empty() {
            return Err(NoteValidationError::EmptyState);
        }
        Ok(())
    }

    /// Marks this note as soft-deleted (tombstoned).
    pub fn soft_delete(&mut self) {
        self.interval = TOMBSTONE_INTERVAL;
    }

    /// Returns whether this note is live (not tombstoned).
    pub fn is_live(&self) -> bool {
        self.interval >= 0
    }

    /// Returns the first `words` whitespace-separated words of the text.
    pub fn fragment(&self, words: usize) -> String {
        self.text
            .split_whitespace()
            .take(words)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Display for Note {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let path = self
            .file_path
            .as_ref()
            .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
        write!(
            f,
            "Note({path}:L{}-{} interval={} ease_factor={} state={} reviewed_count={} created_on={} last_reviewed_on={} {})",
            self.line_start,
            self.line_end,
            self.interval,
            self.ease_factor,
            self.state,
            self.reviewed_count,
            self.created_on,
            self.last_reviewed_on,
            self.fragment(20)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Note, NoteState, NoteValidationError, INITIAL_INTERVAL};
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn state_labels_map_to_closed_variants() {
        assert_eq!(NoteState::from_label("normal"), NoteState::Normal);
        assert_eq!(NoteState::from_label("exciting"), NoteState::Exciting);
        assert_eq!(
            NoteState::from_label("taxing"),
            NoteState::Other("taxing".to_string())
        );
        assert_eq!(NoteState::Other("lol".to_string()).as_str(), "lol");
    }

    #[test]
    fn new_note_uses_default_schedule_and_validates() {
        let note = Note::new("abc", "hello", "/tmp/inbox.txt", 1, 2, day(2025, 1, 1));
        assert_eq!(note.interval, INITIAL_INTERVAL);
        assert_eq!(note.state, NoteState::Normal);
        assert!(note.is_live());
        note.validate().expect("fresh note should validate");
    }

    #[test]
    fn validate_rejects_zero_interval_and_bad_dates() {
        let mut note = Note::new("abc", "hello", "/tmp/inbox.txt", 1, 1, day(2025, 1, 1));
        note.interval = 0;
        assert_eq!(note.validate(), Err(NoteValidationError::ZeroInterval));

        note.interval = 10;
        note.created_on = day(2025, 2, 1);
        assert!(matches!(
            note.validate(),
            Err(NoteValidationError::CreatedAfterLastReview { .. })
        ));
    }

    #[test]
    fn soft_delete_marks_tombstone() {
        let mut note = Note::new("abc", "hello", "/tmp/inbox.txt", 1, 1, day(2025, 1, 1));
        note.soft_delete();
        assert!(!note.is_live());
        note.validate().expect("tombstones remain valid records");
    }

    #[test]
    fn display_includes_location_and_fragment() {
        let note = Note::new(
            "abc",
            "one two\nthree",
            "/tmp/inbox.txt",
            3,
            5,
            day(2025, 1, 1),
        );
        let rendered = note.to_string();
        assert!(rendered.starts_with("Note(/tmp/inbox.txt:L3-5"));
        assert!(rendered.ends_with("one two three)"));
    }

    #[test]
    fn json_uses_plain_state_label_and_iso_dates() {
        let mut note = Note::new("abc", "hello", "/tmp/inbox.txt", 1, 1, day(2025, 1, 1));
        note.state = NoteState::Other("meh".to_string());
        let value = serde_json::to_value(&note).expect("note serializes");
        assert_eq!(value["state"], "meh");
        assert_eq!(value["created_on"], "2025-01-01");

        let back: Note = serde_json::from_value(value).expect("note deserializes");
        assert_eq!(back, note);
    }
}
