//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs over the `notes` table keyed by fingerprint.
//! - Apply reconciliation mutations in two atomic phases: upserts, then
//!   soft-deletes.
//!
//! # Invariants
//! - Write paths call `Note::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Mutation phases take an IMMEDIATE transaction so concurrent writers
//!   are serialized.

use crate::db::DbError;
use crate::inbox::identity::short_fingerprint;
use crate::model::note::{Fingerprint, Note, NoteState, NoteValidationError, TOMBSTONE_INTERVAL};
use chrono::NaiveDate;
use log::{error, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

const NOTE_SELECT_SQL: &str = "SELECT
    fingerprint,
    line_start,
    line_end,
    ease_factor,
    interval,
    last_reviewed_on,
    created_on,
    reviewed_count,
    state,
    file_path,
    text
FROM notes";

const NOTE_COLUMNS: &[&str] = &[
    "fingerprint",
    "line_start",
    "line_end",
    "ease_factor",
    "interval",
    "last_reviewed_on",
    "created_on",
    "reviewed_count",
    "state",
    "file_path",
    "text",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    NotFound(Fingerprint),
    /// A row with this fingerprint already exists.
    DuplicateFingerprint(Fingerprint),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(fingerprint) => write!(f, "note not found: {fingerprint}"),
            Self::DuplicateFingerprint(fingerprint) => {
                write!(f, "duplicate note content: fingerprint {fingerprint} already stored")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One storage change produced by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteMutation {
    Insert(Note),
    Update(Note),
    SoftDelete(Fingerprint),
}

impl NoteMutation {
    pub fn fingerprint(&self) -> &str {
        match self {
            Self::Insert(note) | Self::Update(note) => note.fingerprint.as_str(),
            Self::SoftDelete(fingerprint) => fingerprint.as_str(),
        }
    }

    fn is_upsert(&self) -> bool {
        !matches!(self, Self::SoftDelete(_))
    }
}

/// Row counts written by `apply_mutations`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationSummary {
    pub inserted: usize,
    pub updated: usize,
    pub soft_deleted: usize,
}

/// Query options for listing notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    /// Include tombstoned rows (`interval < 0`).
    pub include_deleted: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl NoteListQuery {
    /// Every row, tombstones included.
    pub fn all() -> Self {
        Self {
            include_deleted: true,
            ..Self::default()
        }
    }
}

/// Repository interface for the note store.
pub trait NoteRepository {
    /// Lists notes ordered by `file_path, line_start, fingerprint`.
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    /// Gets one note by fingerprint, tombstones included.
    fn get_note(&self, fingerprint: &str) -> RepoResult<Option<Note>>;
    fn insert_note(&self, note: &Note) -> RepoResult<()>;
    fn update_note(&self, note: &Note) -> RepoResult<()>;
    /// Tombstones a note. Already-deleted notes stay unchanged.
    fn soft_delete_note(&self, fingerprint: &str) -> RepoResult<()>;
    /// Applies upserts then soft-deletes, each phase in its own transaction.
    fn apply_mutations(&mut self, mutations: &[NoteMutation]) -> RepoResult<MutationSummary>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_note_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND interval >= 0");
        }

        sql.push_str(" ORDER BY file_path ASC, line_start ASC, fingerprint ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn get_note(&self, fingerprint: &str) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE fingerprint = ?1;"))?;
        let mut rows = stmt.query([fingerprint])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }

    fn insert_note(&self, note: &Note) -> RepoResult<()> {
        insert_note_in(&*self.conn, note)
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        update_note_in(&*self.conn, note)
    }

    fn soft_delete_note(&self, fingerprint: &str) -> RepoResult<()> {
        soft_delete_in(&*self.conn, fingerprint)
    }

    fn apply_mutations(&mut self, mutations: &[NoteMutation]) -> RepoResult<MutationSummary> {
        let started_at = Instant::now();
        let mut summary = MutationSummary::default();

        let upserts = mutations.iter().filter(|m| m.is_upsert());
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for mutation in upserts {
            let result = match mutation {
                NoteMutation::Insert(note) => {
                    insert_note_in(&tx, note).map(|()| summary.inserted += 1)
                }
                NoteMutation::Update(note) => {
                    update_note_in(&tx, note).map(|()| summary.updated += 1)
                }
                NoteMutation::SoftDelete(_) => Ok(()),
            };
            if let Err(err) = result {
                error!(
                    "event=store_apply module=repo status=error phase=upsert fingerprint={} error={}",
                    short_fingerprint(mutation.fingerprint()),
                    err
                );
                return Err(err);
            }
        }
        tx.commit()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for mutation in mutations {
            if let NoteMutation::SoftDelete(fingerprint) = mutation {
                soft_delete_in(&tx, fingerprint)?;
                summary.soft_deleted += 1;
            }
        }
        tx.commit()?;

        info!(
            "event=store_apply module=repo status=ok inserted={} updated={} soft_deleted={} duration_ms={}",
            summary.inserted,
            summary.updated,
            summary.soft_deleted,
            started_at.elapsed().as_millis()
        );
        Ok(summary)
    }
}

fn insert_note_in(conn: &Connection, note: &Note) -> RepoResult<()> {
    note.validate()?;

    let result = conn.execute(
        "INSERT INTO notes (
            fingerprint,
            line_start,
            line_end,
            ease_factor,
            interval,
            last_reviewed_on,
            created_on,
            reviewed_count,
            state,
            file_path,
            text
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
        params![
            note.fingerprint.as_str(),
            note.line_start,
            note.line_end,
            note.ease_factor,
            note.interval,
            date_to_db(note.last_reviewed_on),
            date_to_db(note.created_on),
            note.reviewed_count,
            note.state.as_str(),
            path_to_db(note),
            note.text.as_str(),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation =>
        {
            Err(RepoError::DuplicateFingerprint(note.fingerprint.clone()))
        }
        Err(err) => Err(err.into()),
    }
}

fn update_note_in(conn: &Connection, note: &Note) -> RepoResult<()> {
    note.validate()?;

    let changed = conn.execute(
        "UPDATE notes
         SET
            line_start = ?2,
            line_end = ?3,
            ease_factor = ?4,
            interval = ?5,
            last_reviewed_on = ?6,
            created_on = ?7,
            reviewed_count = ?8,
            state = ?9,
            file_path = ?10,
            text = ?11
         WHERE fingerprint = ?1;",
        params![
            note.fingerprint.as_str(),
            note.line_start,
            note.line_end,
            note.ease_factor,
            note.interval,
            date_to_db(note.last_reviewed_on),
            date_to_db(note.created_on),
            note.reviewed_count,
            note.state.as_str(),
            path_to_db(note),
            note.text.as_str(),
        ],
    )?;

    if changed == 0 {
        return Err(RepoError::NotFound(note.fingerprint.clone()));
    }
    Ok(())
}

fn soft_delete_in(conn: &Connection, fingerprint: &str) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE notes
         SET interval = CASE WHEN interval >= 0 THEN ?2 ELSE interval END
         WHERE fingerprint = ?1;",
        params![fingerprint, TOMBSTONE_INTERVAL],
    )?;

    if changed == 0 {
        return Err(RepoError::NotFound(fingerprint.to_string()));
    }
    Ok(())
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let fingerprint: String = row.get("fingerprint")?;
    let last_reviewed_text: String = row.get("last_reviewed_on")?;
    let created_text: String = row.get("created_on")?;
    let state_text: String = row.get("state")?;

    let note = Note {
        last_reviewed_on: parse_date(&last_reviewed_text, "notes.last_reviewed_on")?,
        created_on: parse_date(&created_text, "notes.created_on")?,
        line_start: row.get("line_start")?,
        line_end: row.get("line_end")?,
        ease_factor: row.get("ease_factor")?,
        interval: row.get("interval")?,
        reviewed_count: row.get("reviewed_count")?,
        state: NoteState::from_label(state_text.as_str()),
        file_path: row.get::<_, Option<String>>("file_path")?.map(PathBuf::from),
        text: row.get("text")?,
        fingerprint,
    };
    note.validate().map_err(|err| {
        RepoError::InvalidData(format!(
            "note {}: {err}",
            short_fingerprint(&note.fingerprint)
        ))
    })?;
    Ok(note)
}

fn parse_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn path_to_db(note: &Note) -> Option<String> {
    note.file_path
        .as_ref()
        .map(|path| path.to_string_lossy().into_owned())
}

fn ensure_note_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, "notes")? {
        return Err(RepoError::MissingRequiredTable("notes"));
    }
    for column in NOTE_COLUMNS {
        if !table_has_column(conn, "notes", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "notes",
                column,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
