//! Core use-case services.
//!
//! # Responsibility
//! - Turn inbox files into persisted note state.
//! - Keep the CLI decoupled from parsing and storage details.

pub mod inbox_service;
pub mod legacy_import;
pub mod reconcile;
