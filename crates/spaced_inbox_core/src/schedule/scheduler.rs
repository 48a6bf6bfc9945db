//! Interval arithmetic and due-date predicates.
//!
//! Ease factors are integer percentages; label modifiers are applied as
//! exact ratios so `floor` never suffers from binary float rounding.
//! Intervals come from the store unchecked, so arithmetic saturates
//! instead of overflowing.

use crate::model::note::Note;
use chrono::{Duration, NaiveDate};

/// Ease factor floor applied by `again_interval`.
pub const MIN_EASE_FACTOR: i64 = 130;
/// Ease factor penalty applied by `again_interval`.
pub const AGAIN_EASE_PENALTY: i64 = 20;

/// `floor(interval * ease_factor / 100)`.
pub fn good_interval(interval: i64, ease_factor: i64) -> i64 {
    scaled(interval, ease_factor, 1, 100)
}

/// Ease factor modifier for a reaction label as a `(numerator, denominator)`
/// ratio.
pub fn ease_modifier(label: &str) -> (i64, i64) {
    match label {
        "exciting" => (83, 100),
        "taxing" => (3, 2),
        _ => (1, 1),
    }
}

/// Next interval after a reaction with `label`.
///
/// The label modifier scales the ease factor before it is applied; the
/// stored ease factor itself is not changed. Result is at least one day.
pub fn next_interval(interval: i64, ease_factor: i64, label: &str) -> i64 {
    let (num, den) = ease_modifier(label);
    scaled(interval, ease_factor, num, 100 * den).max(1)
}

/// Manual "again" path: shrink to 90% and penalize the ease factor.
///
/// Returns `(interval, ease_factor)`.
pub fn again_interval(interval: i64, ease_factor: i64) -> (i64, i64) {
    let shrunk = scaled(interval, 90, 1, 100).max(1);
    let eased = ease_factor
        .saturating_sub(AGAIN_EASE_PENALTY)
        .max(MIN_EASE_FACTOR);
    (shrunk, eased)
}

/// Days elapsed since the last review minus the interval.
pub fn days_overdue(note: &Note, today: NaiveDate) -> i64 {
    (today - note.last_reviewed_on)
        .num_days()
        .saturating_sub(note.interval)
}

/// A note is due once its interval has elapsed. Non-positive intervals are
/// never due.
pub fn is_due(note: &Note, today: NaiveDate) -> bool {
    note.interval > 0 && days_overdue(note, today) >= 0
}

/// Calendar date on which the note becomes due, if representable.
pub fn due_on(note: &Note) -> Option<NaiveDate> {
    let interval = Duration::try_days(note.interval)?;
    note.last_reviewed_on.checked_add_signed(interval)
}

/// Returns due notes in input order.
pub fn due_notes(notes: &[Note], today: NaiveDate) -> Vec<&Note> {
    notes.iter().filter(|note| is_due(note, today)).collect()
}

/// Live/due counts recorded in the review-load log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewStats {
    /// Notes with a positive interval.
    pub num_notes: usize,
    /// Subset of `num_notes` that is due today.
    pub num_due_notes: usize,
}

pub fn review_stats(notes: &[Note], today: NaiveDate) -> ReviewStats {
    notes
        .iter()
        .filter(|note| note.interval > 0)
        .fold(ReviewStats::default(), |mut stats, note| {
            stats.num_notes += 1;
            if is_due(note, today) {
                stats.num_due_notes += 1;
            }
            stats
        })
}

/// Renders a day count as seconds/minutes/hours/days/months/years.
pub fn human_friendly(days: f64) -> String {
    if days < 0.0 {
        return format!("-{}", human_friendly(-days));
    }
    if days * 24.0 * 60.0 < 1.0 {
        format!("{} seconds", round2(days * 24.0 * 60.0 * 60.0))
    } else if days * 24.0 < 1.0 {
        format!("{} minutes", round2(days * 24.0 * 60.0))
    } else if days < 1.0 {
        format!("{} hours", round2(days * 24.0))
    } else if days < 30.0 {
        format!("{} days", round2(days))
    } else if days < 365.0 {
        format!("{} months", round2(days / (365.25 / 12.0)))
    } else {
        format!("{} years", round2(days / 365.25))
    }
}

/// `floor(a * b * num / den)` in 128 bits, saturated to the `i64` range.
fn scaled(a: i64, b: i64, num: i64, den: i64) -> i64 {
    let product = i128::from(a)
        .saturating_mul(i128::from(b))
        .saturating_mul(i128::from(num));
    let value = product.div_euclid(i128::from(den));
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

fn round2(value: f64) -> String {
    let rendered = format!("{value:.2}");
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
