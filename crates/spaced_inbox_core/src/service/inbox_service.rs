//! Inbox sync use-case service.
//!
//! # Responsibility
//! - Read and parse every configured inbox file.
//! - Reconcile parsed chunks with stored notes and persist the result.
//! - Import legacy databases through the same repository contract.
//!
//! # Invariants
//! - All inbox files are read before any reconciliation starts, so an
//!   unreadable file aborts the run with the store untouched.
//! - Storage is written only through `NoteRepository::apply_mutations`.

use crate::config::ReviewSettings;
use crate::db::legacy::read_legacy_notes;
use crate::db::DbError;
use crate::inbox::parser::parse_inbox_text;
use crate::model::chunk::SourcedChunk;
use crate::model::note::Note;
use crate::repo::note_repo::{MutationSummary, NoteListQuery, NoteRepository, RepoError};
use crate::service::legacy_import::{import_legacy_notes, LegacyImportReport};
use crate::service::reconcile::{reconcile, ReconcileError, ReconcileReport};
use chrono::NaiveDate;
use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub type SyncResult<T> = Result<T, SyncError>;

/// Failure of a sync or import run.
#[derive(Debug)]
pub enum SyncError {
    /// An inbox file could not be read.
    ReadInbox {
        path: PathBuf,
        source: std::io::Error,
    },
    Reconcile(ReconcileError),
    Repo(RepoError),
    Db(DbError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadInbox { path, source } => {
                write!(f, "failed to read inbox `{}`: {source}", path.display())
            }
            Self::Reconcile(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReadInbox { source, .. } => Some(source),
            Self::Reconcile(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<ReconcileError> for SyncError {
    fn from(value: ReconcileError) -> Self {
        Self::Reconcile(value)
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for SyncError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Result of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Every note after the run, tombstones included.
    pub notes: Vec<Note>,
    pub report: ReconcileReport,
    pub written: MutationSummary,
}

impl SyncOutcome {
    /// Notes that are not tombstoned.
    pub fn live_notes(&self) -> Vec<Note> {
        self.notes.iter().filter(|n| n.is_live()).cloned().collect()
    }
}

/// Reads and parses one inbox file.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn read_inbox_file(path: &Path) -> SyncResult<Vec<SourcedChunk>> {
    let bytes = std::fs::read(path).map_err(|source| SyncError::ReadInbox {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(parse_inbox_text(&text)
        .into_iter()
        .map(|chunk| SourcedChunk::new(path, chunk))
        .collect())
}

/// Reads every inbox in order. Fails on the first unreadable file.
pub fn read_inbox_files(paths: &[PathBuf]) -> SyncResult<Vec<SourcedChunk>> {
    let mut chunks = Vec::new();
    for path in paths {
        let parsed = read_inbox_file(path)?;
        info!(
            "event=inbox_read module=sync status=ok path={} chunks={}",
            path.display(),
            parsed.len()
        );
        chunks.extend(parsed);
    }
    Ok(chunks)
}

/// Use-case service wrapper around a note repository.
pub struct InboxService<R: NoteRepository> {
    repo: R,
    settings: ReviewSettings,
}

impl<R: NoteRepository> InboxService<R> {
    pub fn new(repo: R, settings: ReviewSettings) -> Self {
        Self { repo, settings }
    }

    /// Syncs the store with the given inbox files.
    pub fn sync_files(
        &mut self,
        inbox_paths: &[PathBuf],
        today: NaiveDate,
    ) -> SyncResult<SyncOutcome> {
        let chunks = read_inbox_files(inbox_paths)?;
        self.sync_chunks(&chunks, today)
    }

    /// Syncs the store with already-parsed chunks.
    ///
    /// # Contract
    /// - On a reconcile error nothing is written.
    /// - Returns the merged note set as reconciled, tombstones included.
    pub fn sync_chunks(
        &mut self,
        chunks: &[SourcedChunk],
        today: NaiveDate,
    ) -> SyncResult<SyncOutcome> {
        let started_at = Instant::now();
        let stored = self.repo.list_notes(&NoteListQuery::all())?;
        let outcome = match reconcile(&stored, chunks, today, &self.settings) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("event=sync module=sync status=error {}", err.log_fields());
                return Err(err.into());
            }
        };
        let written = self.repo.apply_mutations(&outcome.mutations)?;
        info!(
            "event=sync module=sync status=ok chunks={} stored={} inserted={} updated={} soft_deleted={} duration_ms={}",
            chunks.len(),
            stored.len(),
            written.inserted,
            written.updated,
            written.soft_deleted,
            started_at.elapsed().as_millis()
        );
        Ok(SyncOutcome {
            notes: outcome.notes,
            report: outcome.report,
            written,
        })
    }

    /// Lists live notes currently in the store.
    pub fn live_notes(&self) -> SyncResult<Vec<Note>> {
        Ok(self.repo.list_notes(&NoteListQuery::default())?)
    }

    /// Copies notes from a legacy database into the store.
    pub fn import_legacy(&mut self, legacy: &Connection) -> SyncResult<LegacyImportReport> {
        let recovered = read_legacy_notes(legacy)?;
        Ok(import_legacy_notes(&mut self.repo, recovered)?)
    }
}
