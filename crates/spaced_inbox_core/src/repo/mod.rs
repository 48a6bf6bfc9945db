//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the store contract the reconciler writes through.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Note::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`,
//!   `DuplicateFingerprint`) in addition to DB transport errors.

pub mod note_repo;
