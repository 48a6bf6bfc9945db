//! Tiered weighted-random selection of the next note to review.
//!
//! # Responsibility
//! - Draw one uniform sample and walk three tiers in order:
//!   recent unreviewed notes, exciting notes, everything else.
//! - Weight overdue notes by `max(days_overdue, 1)^2`.
//!
//! # Invariants
//! - Only due notes are ever returned.
//! - A candidate with weight 0 is never selected.
//! - Randomness is injected so selection is reproducible under a seed.

use crate::config::ReviewSettings;
use crate::model::note::{Note, NoteState};
use crate::schedule::scheduler::{days_overdue, is_due};
use chrono::NaiveDate;
use log::debug;
use rand::Rng;

/// Samples below this value try the recent-unreviewed tier first.
pub const RECENT_TIER_THRESHOLD: f64 = 0.5;
/// Samples below this value (and not served by tier one) try exciting notes.
pub const EXCITING_TIER_THRESHOLD: f64 = 0.7;

/// Tier that produced a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTier {
    RecentUnreviewed,
    Exciting,
    Other,
}

impl SelectionTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RecentUnreviewed => "recent_unreviewed",
            Self::Exciting => "exciting",
            Self::Other => "other",
        }
    }
}

/// Selected note plus the tier that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pick<'a> {
    pub note: &'a Note,
    pub tier: SelectionTier,
}

/// Cumulative weight table sampled with one uniform draw and a binary search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedIndex {
    cumulative: Vec<u64>,
}

impl WeightedIndex {
    /// Builds the table. Returns `None` when there is nothing selectable
    /// (no items, or every weight is zero).
    pub fn new<I>(weights: I) -> Option<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut total: u64 = 0;
        let cumulative: Vec<u64> = weights
            .into_iter()
            .map(|weight| {
                total = total.saturating_add(weight);
                total
            })
            .collect();
        if total == 0 {
            return None;
        }
        Some(Self { cumulative })
    }

    pub fn total(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    /// Maps a point in `[0, total)` to an item index.
    pub fn index_for(&self, point: u64) -> usize {
        self.cumulative.partition_point(|&bound| bound <= point)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let point = rng.gen_range(0..self.total());
        self.index_for(point)
    }
}

/// Selection weight for a due note.
pub fn overdue_weight(note: &Note, today: NaiveDate) -> u64 {
    let overdue = u64::try_from(days_overdue(note, today).max(1)).unwrap_or(1);
    overdue.saturating_mul(overdue)
}

/// Due, never-reviewed `normal` notes created between one and two initial
/// intervals ago.
pub fn recent_unreviewed_candidates<'a>(
    notes: &'a [Note],
    today: NaiveDate,
    settings: &ReviewSettings,
) -> Vec<&'a Note> {
    notes
        .iter()
        .filter(|note| {
            let age = (today - note.created_on).num_days();
            is_due(note, today)
                && note.state == NoteState::Normal
                && note.reviewed_count == 0
                && age >= settings.initial_interval
                && age <= 2 * settings.initial_interval
        })
        .collect()
}

pub fn exciting_candidates(notes: &[Note], today: NaiveDate) -> Vec<&Note> {
    notes
        .iter()
        .filter(|note| is_due(note, today) && note.state == NoteState::Exciting)
        .collect()
}

pub fn other_candidates(notes: &[Note], today: NaiveDate) -> Vec<&Note> {
    notes
        .iter()
        .filter(|note| is_due(note, today) && note.state != NoteState::Exciting)
        .collect()
}

/// Weighted choice by `overdue_weight`.
pub fn weighted_choice<'a, R: Rng + ?Sized>(
    candidates: &[&'a Note],
    today: NaiveDate,
    rng: &mut R,
) -> Option<&'a Note> {
    let index = WeightedIndex::new(
        candidates
            .iter()
            .map(|note| overdue_weight(note, today)),
    )?;
    candidates.get(index.sample(rng)).copied()
}

/// Picks the next note to present, or `None` when nothing is due.
pub fn pick_note<'a, R: Rng + ?Sized>(
    notes: &'a [Note],
    today: NaiveDate,
    settings: &ReviewSettings,
    rng: &mut R,
) -> Option<Pick<'a>> {
    let sample: f64 = rng.gen();
    debug!("event=pick_note module=selector status=start sample={sample:.4}");

    if sample < RECENT_TIER_THRESHOLD {
        let pool = recent_unreviewed_candidates(notes, today, settings);
        if !pool.is_empty() {
            let note = pool[rng.gen_range(0..pool.len())];
            return Some(finish(note, SelectionTier::RecentUnreviewed, pool.len()));
        }
        debug!("event=pick_note module=selector status=fallthrough tier=recent_unreviewed");
    }

    if sample < EXCITING_TIER_THRESHOLD {
        let pool = exciting_candidates(notes, today);
        if let Some(note) = weighted_choice(&pool, today, rng) {
            return Some(finish(note, SelectionTier::Exciting, pool.len()));
        }
        debug!("event=pick_note module=selector status=fallthrough tier=exciting");
    }

    let pool = other_candidates(notes, today);
    if let Some(note) = weighted_choice(&pool, today, rng) {
        return Some(finish(note, SelectionTier::Other, pool.len()));
    }

    debug!("event=pick_note module=selector status=ok result=none");
    None
}

fn finish(note: &Note, tier: SelectionTier, pool_size: usize) -> Pick<'_> {
    debug!(
        "event=pick_note module=selector status=ok tier={} pool_size={}",
        tier.as_str(),
        pool_size
    );
    Pick { note, tier }
}

#[cfg(test)]
mod tests {
    use super::{
        overdue_weight, pick_note, recent_unreviewed_candidates, weighted_choice,
        SelectionTier, WeightedIndex,
    };
    use crate::config::ReviewSettings;
    use crate::model::note::{Note, NoteState};
    use chrono::{Duration, NaiveDate};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
    }

    fn note(name: &str, days_overdue: i64, state: NoteState) -> Note {
        let interval = 10;
        let reviewed = today() - Duration::days(interval + days_overdue);
        let mut note = Note::new(name, name, "/tmp/inbox.txt", 1, 1, reviewed);
        note.interval = interval;
        note.state = state;
        note.reviewed_count = 1;
        note
    }

    #[test]
    fn weighted_index_skips_zero_weights() {
        let index = WeightedIndex::new([0, 3, 0, 1]).expect("non-zero total");
        assert_eq!(index.total(), 4);
        assert_eq!(index.index_for(0), 1);
        assert_eq!(index.index_for(2), 1);
        assert_eq!(index.index_for(3), 3);
        assert!(WeightedIndex::new([0, 0]).is_none());
        assert!(WeightedIndex::new(Vec::<u64>::new()).is_none());
    }

    #[test]
    fn exactly_due_note_has_minimum_weight() {
        let exact = note("exact", 0, NoteState::Normal);
        assert_eq!(overdue_weight(&exact, today()), 1);
        let late = note("late", 3, NoteState::Normal);
        assert_eq!(overdue_weight(&late, today()), 9);
    }

    #[test]
    fn exactly_due_note_is_selectable() {
        let notes = vec![note("exact", 0, NoteState::Other("meh".into()))];
        let mut rng = StdRng::seed_from_u64(7);
        let candidates: Vec<&Note> = notes.iter().collect();
        let chosen = weighted_choice(&candidates, today(), &mut rng).expect("selectable");
        assert_eq!(chosen.fingerprint, "exact");
    }

    #[test]
    fn nothing_due_returns_none() {
        let mut not_due = note("later", 0, NoteState::Normal);
        not_due.last_reviewed_on = today();
        let notes = vec![not_due];
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert!(pick_note(&notes, today(), &ReviewSettings::default(), &mut rng).is_none());
        }
    }

    #[test]
    fn exciting_notes_only_come_from_exciting_tier() {
        let notes = vec![note("hot", 5, NoteState::Exciting)];
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = 0;
        for _ in 0..200 {
            if let Some(pick) = pick_note(&notes, today(), &ReviewSettings::default(), &mut rng) {
                assert_eq!(pick.tier, SelectionTier::Exciting);
                seen += 1;
            }
        }
        // Samples >= 0.7 skip the exciting tier and the fallback excludes it.
        assert!(seen > 0 && seen < 200);
    }

    #[test]
    fn recent_unreviewed_window() {
        let settings = ReviewSettings::default();
        let mut fresh = Note::new(
            "fresh",
            "fresh",
            "/tmp/inbox.txt",
            1,
            1,
            today() - Duration::days(60),
        );
        fresh.interval = settings.initial_interval;
        let mut too_old = fresh.clone();
        too_old.fingerprint = "old".into();
        too_old.created_on = today() - Duration::days(101);
        too_old.last_reviewed_on = too_old.created_on;
        let notes = vec![fresh, too_old];

        let pool = recent_unreviewed_candidates(&notes, today(), &settings);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].fingerprint, "fresh");
    }
}
