//! Import of legacy notes into the current store.
//!
//! # Invariants
//! - Existing rows are never overwritten; a fingerprint already stored
//!   (live or tombstoned) is skipped.
//! - Legacy rows sharing a fingerprint keep only the first occurrence.

use crate::db::legacy::LegacyNotes;
use crate::inbox::identity::short_fingerprint;
use crate::repo::note_repo::{NoteListQuery, NoteMutation, NoteRepository, RepoResult};
use log::{info, warn};
use std::collections::HashSet;

/// Counts produced by a legacy import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyImportReport {
    pub imported: usize,
    pub skipped_existing: usize,
    pub skipped_duplicate: usize,
    pub skipped_invalid: usize,
}

/// Inserts recovered legacy notes that the store does not know yet.
pub fn import_legacy_notes<R: NoteRepository + ?Sized>(
    repo: &mut R,
    recovered: LegacyNotes,
) -> RepoResult<LegacyImportReport> {
    let existing: HashSet<String> = repo
        .list_notes(&NoteListQuery::all())?
        .into_iter()
        .map(|note| note.fingerprint)
        .collect();
    let mut report = LegacyImportReport {
        skipped_invalid: recovered.skipped_invalid,
        ..LegacyImportReport::default()
    };
    let mut seen: HashSet<String> = HashSet::new();
    let mut mutations = Vec::new();

    for note in recovered.notes {
        if existing.contains(&note.fingerprint) {
            report.skipped_existing += 1;
            continue;
        }
        if !seen.insert(note.fingerprint.clone()) {
            warn!(
                "event=legacy_import module=import status=skip reason=duplicate fingerprint={}",
                short_fingerprint(&note.fingerprint)
            );
            report.skipped_duplicate += 1;
            continue;
        }
        mutations.push(NoteMutation::Insert(note));
    }

    let written = repo.apply_mutations(&mutations)?;
    report.imported = written.inserted;
    info!(
        "event=legacy_import module=import status=ok imported={} skipped_existing={} skipped_duplicate={} skipped_invalid={}",
        report.imported, report.skipped_existing, report.skipped_duplicate, report.skipped_invalid
    );
    Ok(report)
}
