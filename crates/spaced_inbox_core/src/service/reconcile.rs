//! Reconciliation of parsed inbox chunks against stored note state.
//!
//! # Responsibility
//! - Match chunks to stored notes by fingerprint.
//! - Decide per chunk: unchanged/moved, new reaction, resurrected or new.
//! - Tombstone live notes whose fingerprint no longer appears anywhere.
//! - Emit the storage mutations needed to reach the merged state.
//!
//! # Invariants
//! - Pure: no I/O; `today` is injected.
//! - Running twice on the same input yields no mutations the second time.
//! - Only the newest reaction dated on or before `today` is applied per
//!   pass, and only when it is dated after `last_reviewed_on`. Future-dated
//!   reactions are skipped.
//! - A fingerprint seen twice in one pass is a fatal duplicate.

use crate::config::ReviewSettings;
use crate::inbox::identity::short_fingerprint;
use crate::model::chunk::SourcedChunk;
use crate::model::note::{Fingerprint, Note, NoteState};
use crate::repo::note_repo::NoteMutation;
use crate::schedule::scheduler::next_interval;
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Reconciliation failure. Never retried: it signals data the user must fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The same reviewable text appears more than once across the inboxes.
    DuplicateContent {
        fingerprint: Fingerprint,
        file_path: PathBuf,
        line_start: i64,
        text: String,
    },
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateContent {
                file_path,
                line_start,
                text,
                ..
            } => write!(
                f,
                "duplicate note text found at {}:{line_start}; remove all duplicates and re-import:\n{text}",
                file_path.display()
            ),
        }
    }
}

impl ReconcileError {
    /// Single-line `key=value` fields for logging. Never includes note text.
    pub fn log_fields(&self) -> String {
        match self {
            Self::DuplicateContent {
                fingerprint,
                file_path,
                line_start,
                ..
            } => format!(
                "error_code=duplicate_content fingerprint={} file_path={} line_start={line_start}",
                short_fingerprint(fingerprint),
                file_path.display()
            ),
        }
    }
}

impl Error for ReconcileError {}

/// Per-outcome counters for one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub reacted: usize,
    pub resurrected: usize,
    /// Same schedule, new location.
    pub relocated: usize,
    pub unchanged: usize,
    pub soft_deleted: usize,
}

/// Merged note set plus the mutations that persist it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Every note after the pass: inbox order first, then notes that were
    /// not seen (now tombstoned) in stored order.
    pub notes: Vec<Note>,
    pub mutations: Vec<NoteMutation>,
    pub report: ReconcileReport,
}

/// Diffs `chunks` against `stored` and returns the merged state.
pub fn reconcile(
    stored: &[Note],
    chunks: &[SourcedChunk],
    today: NaiveDate,
    settings: &ReviewSettings,
) -> Result<ReconcileOutcome, ReconcileError> {
    let by_fingerprint: HashMap<&str, &Note> = stored
        .iter()
        .map(|note| (note.fingerprint.as_str(), note))
        .collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(chunks.len());
    let mut outcome = ReconcileOutcome::default();

    for sourced in chunks {
        let chunk = &sourced.chunk;
        if !seen.insert(chunk.fingerprint.as_str()) {
            return Err(ReconcileError::DuplicateContent {
                fingerprint: chunk.fingerprint.clone(),
                file_path: sourced.file_path.clone(),
                line_start: chunk.line_start,
                text: chunk.text.clone(),
            });
        }

        let merged = match by_fingerprint.get(chunk.fingerprint.as_str()) {
            Some(existing) if existing.is_live() => {
                let merged = merge_live(existing, sourced, today, &mut outcome.report);
                if merged != **existing {
                    outcome.mutations.push(NoteMutation::Update(merged.clone()));
                }
                merged
            }
            Some(_) => {
                let revived = fresh_note(sourced, today, settings);
                outcome.report.resurrected += 1;
                debug!(
                    "event=reconcile module=reconciler status=resurrected fingerprint={}",
                    short_fingerprint(&revived.fingerprint)
                );
                outcome.mutations.push(NoteMutation::Update(revived.clone()));
                revived
            }
            None => {
                let created = fresh_note(sourced, today, settings);
                outcome.report.created += 1;
                outcome.mutations.push(NoteMutation::Insert(created.clone()));
                created
            }
        };
        outcome.notes.push(merged);
    }

    for note in stored {
        if seen.contains(note.fingerprint.as_str()) {
            continue;
        }
        let mut kept = note.clone();
        if kept.is_live() {
            kept.soft_delete();
            outcome.report.soft_deleted += 1;
            outcome
                .mutations
                .push(NoteMutation::SoftDelete(kept.fingerprint.clone()));
        }
        outcome.notes.push(kept);
    }

    let report = outcome.report;
    info!(
        "event=reconcile module=reconciler status=ok created={} reacted={} resurrected={} relocated={} unchanged={} soft_deleted={}",
        report.created,
        report.reacted,
        report.resurrected,
        report.relocated,
        report.unchanged,
        report.soft_deleted
    );
    Ok(outcome)
}

fn merge_live(
    existing: &Note,
    sourced: &SourcedChunk,
    today: NaiveDate,
    report: &mut ReconcileReport,
) -> Note {
    let chunk = &sourced.chunk;
    let mut merged = existing.clone();
    merged.file_path = Some(sourced.file_path.clone());
    merged.line_start = chunk.line_start;
    merged.line_end = chunk.line_end;
    merged.text = chunk.text.clone();

    if let Some(future) = chunk.reactions.iter().rev().find(|r| r.date > today) {
        warn!(
            "event=reconcile module=reconciler status=skip reason=future_reaction fingerprint={} reaction_date={}",
            short_fingerprint(&existing.fingerprint),
            future.date
        );
    }
    let applicable = chunk.reactions.iter().rev().find(|r| r.date <= today);
    if let Some(reaction) = applicable.filter(|r| r.date > existing.last_reviewed_on) {
        merged.interval = next_interval(
            existing.interval,
            existing.ease_factor,
            reaction.label.as_str(),
        );
        merged.last_reviewed_on = reaction.date;
        merged.reviewed_count += 1;
        merged.state = NoteState::from_label(reaction.label.as_str());
        report.reacted += 1;
        return merged;
    }

    if merged == *existing {
        report.unchanged += 1;
    } else {
        report.relocated += 1;
    }
    merged
}

fn fresh_note(sourced: &SourcedChunk, today: NaiveDate, settings: &ReviewSettings) -> Note {
    let chunk = &sourced.chunk;
    let mut note = Note::new(
        chunk.fingerprint.clone(),
        chunk.text.clone(),
        sourced.file_path.clone(),
        chunk.line_start,
        chunk.line_end,
        today,
    );
    note.interval = settings.initial_interval;
    note.ease_factor = settings.default_ease_factor;
    note
}
