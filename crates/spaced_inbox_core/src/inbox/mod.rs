//! Inbox text parsing and content identity.
//!
//! # Responsibility
//! - Split raw inbox files into note chunks with line ranges.
//! - Extract inline reactions and compute the content fingerprint.
//!
//! # Invariants
//! - Parsing is pure: the same lines always yield the same chunks.
//! - Two chunks that differ only by reaction lines share a fingerprint.

pub mod identity;
pub mod parser;
