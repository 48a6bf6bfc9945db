//! Future review-load forecast and schedule smoothing.
//!
//! Both functions are read-only views over live notes; nothing here writes
//! back to the store.

use crate::model::note::{Fingerprint, Note};
use crate::schedule::scheduler::{days_overdue, due_on};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Counts live notes by days until due. Overdue notes get negative keys.
pub fn forecast(notes: &[Note], today: NaiveDate) -> BTreeMap<i64, usize> {
    let mut histogram = BTreeMap::new();
    for note in notes.iter().filter(|note| note.interval > 0) {
        *histogram
            .entry(0i64.saturating_sub(days_overdue(note, today)))
            .or_insert(0) += 1;
    }
    histogram
}

/// Spreads due dates so that no day holds more than `max_per_day` notes.
///
/// Overdue notes are moved to `today`. Notes with the earliest original due
/// date keep their slot; the rest are pushed to the following day.
pub fn smooth_schedule(
    notes: &[Note],
    today: NaiveDate,
    max_per_day: usize,
) -> BTreeMap<NaiveDate, Vec<Fingerprint>> {
    let max_per_day = max_per_day.max(1);
    let mut pending: Vec<(NaiveDate, &Note)> = notes
        .iter()
        .filter(|note| note.interval > 0)
        .filter_map(|note| due_on(note).map(|due| (due, note)))
        .collect();
    pending.sort_by(|(a_due, a), (b_due, b)| {
        a_due.cmp(b_due).then_with(|| a.fingerprint.cmp(&b.fingerprint))
    });

    let mut schedule: BTreeMap<NaiveDate, Vec<Fingerprint>> = BTreeMap::new();
    let mut day = today;
    let mut filled = 0;
    for (due, note) in pending {
        let target = due.max(today);
        if target > day {
            day = target;
            filled = 0;
        }
        if filled == max_per_day {
            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
            filled = 0;
        }
        schedule
            .entry(day)
            .or_default()
            .push(note.fingerprint.clone());
        filled += 1;
    }
    schedule
}
