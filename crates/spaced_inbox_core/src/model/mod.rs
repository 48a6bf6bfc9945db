//! Domain model for scheduled inbox notes.
//!
//! # Responsibility
//! - Define canonical data structures used by reconciliation and scheduling.
//! - Keep identity (`Fingerprint`) separate from location fields.
//!
//! # Invariants
//! - Every note is identified by the fingerprint of its reviewable text.
//! - Deletion is represented by a negative interval (tombstone), not by
//!   removing the row.

pub mod chunk;
pub mod note;
