//! Spaced-repetition scheduling.
//!
//! # Responsibility
//! - Compute next intervals from reaction labels.
//! - Decide which notes are due and how overdue they are.
//! - Pick the next note to present and forecast future review load.
//!
//! # Invariants
//! - Everything here is pure: no I/O, `today` and randomness are injected.
//! - Tombstones (`interval < 0`) and zero intervals are never due.

pub mod forecast;
pub mod scheduler;
pub mod selector;
