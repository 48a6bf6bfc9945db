//! Core engine for spaced-inbox.
//! This crate is the single source of truth for note identity, sync and
//! scheduling invariants.

pub mod config;
pub mod db;
pub mod inbox;
pub mod logging;
pub mod model;
pub mod repo;
pub mod report;
pub mod schedule;
pub mod service;

pub use config::{AppConfig, AppPaths, ConfigError, ReviewSettings};
pub use db::{open_db, open_db_in_memory, open_db_read_only, DbError, DbResult};
pub use inbox::identity::fingerprint;
pub use inbox::parser::{parse_inbox, parse_inbox_text};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::chunk::{ParsedChunk, Reaction, SourcedChunk};
pub use model::note::{Fingerprint, Note, NoteState, NoteValidationError};
pub use repo::note_repo::{
    MutationSummary, NoteListQuery, NoteMutation, NoteRepository, RepoError, RepoResult,
    SqliteNoteRepository,
};
pub use schedule::scheduler::{review_stats, ReviewStats};
pub use schedule::selector::{pick_note, Pick, SelectionTier};
pub use service::inbox_service::{InboxService, SyncError, SyncOutcome, SyncResult};
pub use service::reconcile::{reconcile, ReconcileError, ReconcileOutcome, ReconcileReport};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
