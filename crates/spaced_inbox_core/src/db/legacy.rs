//! Reader for databases written by the pre-2025 schema.
//!
//! # Responsibility
//! - Detect which optional legacy columns exist.
//! - Convert legacy rows into current `Note` records, recomputing the
//!   fingerprint from the stored text.
//!
//! # Invariants
//! - The legacy database is only read, never modified.
//! - Rows that cannot form a valid `Note` are counted and skipped.
//!
//! Two legacy layouts are understood: the original one without
//! `created_on`/`reviewed_count`/`note_state`, and the January 2023 one
//! that added them. `filepath` is optional in both.

use crate::db::{DbError, DbResult};
use crate::inbox::identity::fingerprint;
use crate::inbox::parser::strip_reactions;
use crate::model::note::{Note, NoteState};
use chrono::NaiveDate;
use log::warn;
use rusqlite::Connection;
use std::path::PathBuf;

const REQUIRED_COLUMNS: &[&str] = &[
    "note_text",
    "line_number_start",
    "line_number_end",
    "ease_factor",
    "interval",
    "last_reviewed_on",
];
const LEGACY_JUST_CREATED: &str = "just created";
const LEGACY_REVIEWED_STATE: &str = "meh";
/// Interval values the original tool assigned before any review.
const LEGACY_INITIAL_INTERVALS: [i64; 2] = [50, 60];
const LEGACY_GROWTH: f64 = 2.5;

/// Notes recovered from a legacy database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyNotes {
    pub notes: Vec<Note>,
    pub skipped_invalid: usize,
}

/// Reads every row of the legacy `notes` table.
pub fn read_legacy_notes(conn: &Connection) -> DbResult<LegacyNotes> {
    let columns = legacy_columns(conn)?;
    for required in REQUIRED_COLUMNS {
        if !columns.iter().any(|column| column == required) {
            return Err(DbError::LegacySchema {
                missing_column: required,
            });
        }
    }
    let optional = |name: &str| {
        if columns.iter().any(|column| column == name) {
            name.to_string()
        } else {
            format!("NULL AS {name}")
        }
    };

    let sql = format!(
        "SELECT note_text, line_number_start, line_number_end, ease_factor, interval,
                last_reviewed_on, {}, {}, {}, {}
         FROM notes
         ORDER BY rowid ASC;",
        optional("created_on"),
        optional("reviewed_count"),
        optional("note_state"),
        optional("filepath"),
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut recovered = LegacyNotes::default();
    while let Some(row) = rows.next()? {
        let raw = LegacyRow {
            note_text: row.get(0)?,
            line_start: row.get(1)?,
            line_end: row.get(2)?,
            ease_factor: row.get(3)?,
            interval: row.get(4)?,
            last_reviewed_on: row.get(5)?,
            created_on: row.get(6)?,
            reviewed_count: row.get(7)?,
            note_state: row.get(8)?,
            file_path: row.get(9)?,
        };
        match raw.into_note() {
            Some(note) => recovered.notes.push(note),
            None => recovered.skipped_invalid += 1,
        }
    }
    Ok(recovered)
}

/// Estimates how often a legacy note was reviewed from its interval, for
/// layouts that did not record it.
pub fn guess_reviewed_count(interval: i64) -> i64 {
    if interval <= 0 || LEGACY_INITIAL_INTERVALS.contains(&interval) {
        return 0;
    }
    let ratio = interval as f64 / LEGACY_INITIAL_INTERVALS[0] as f64;
    (ratio.ln() / LEGACY_GROWTH.ln()).ceil().max(0.0) as i64
}

struct LegacyRow {
    note_text: String,
    line_start: i64,
    line_end: i64,
    ease_factor: i64,
    interval: i64,
    last_reviewed_on: String,
    created_on: Option<String>,
    reviewed_count: Option<i64>,
    note_state: Option<String>,
    file_path: Option<String>,
}

impl LegacyRow {
    fn into_note(self) -> Option<Note> {
        let (text, _) = strip_reactions(&self.note_text);
        let last_reviewed_on = parse_date(&self.last_reviewed_on)?;
        let created_on = match self.created_on.as_deref() {
            Some(value) => parse_date(value)?,
            None => last_reviewed_on,
        };
        let reviewed_count = self
            .reviewed_count
            .unwrap_or_else(|| guess_reviewed_count(self.interval));
        let state = match self.note_state.as_deref() {
            Some(LEGACY_JUST_CREATED) => NoteState::Normal,
            Some(label) => NoteState::from_label(label),
            None if reviewed_count == 0 => NoteState::Normal,
            None => NoteState::from_label(LEGACY_REVIEWED_STATE),
        };

        let note = Note {
            fingerprint: fingerprint(&text),
            file_path: self.file_path.map(PathBuf::from),
            line_start: self.line_start,
            line_end: self.line_end,
            ease_factor: self.ease_factor,
            interval: self.interval,
            last_reviewed_on,
            created_on: created_on.min(last_reviewed_on),
            reviewed_count,
            state,
            text,
        };
        match note.validate() {
            Ok(()) => Some(note),
            Err(err) => {
                warn!(
                    "event=legacy_read module=db status=skip reason=invalid_row error={err}"
                );
                None
            }
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            warn!("event=legacy_read module=db status=skip reason=invalid_date");
            None
        }
    }
}

fn legacy_columns(conn: &Connection) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare("PRAGMA table_info(notes);")?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::guess_reviewed_count;

    #[test]
    fn reviewed_count_guess_follows_growth_curve() {
        assert_eq!(guess_reviewed_count(50), 0);
        assert_eq!(guess_reviewed_count(60), 0);
        assert_eq!(guess_reviewed_count(-1), 0);
        assert_eq!(guess_reviewed_count(125), 1);
        assert_eq!(guess_reviewed_count(300), 2);
    }
}
