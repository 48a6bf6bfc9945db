use chrono::NaiveDate;
use spaced_inbox_core::db::open_db_in_memory;
use spaced_inbox_core::report::review_load::{read_review_load, record_review_load};
use spaced_inbox_core::{
    fingerprint, review_stats, InboxService, MutationSummary, NoteListQuery, NoteRepository,
    NoteState, ReconcileError, ReviewSettings, SqliteNoteRepository, SyncError,
};
use std::path::{Path, PathBuf};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write(path: &Path, content: &str) -> PathBuf {
    std::fs::write(path, content).unwrap();
    path.to_path_buf()
}

#[test]
fn repeated_sync_writes_nothing_the_second_time() {
    let dir = tempfile::tempdir().unwrap();
    let inbox = write(&dir.path().join("inbox.txt"), "Fact A\n\n\nFact B\n");
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = InboxService::new(repo, ReviewSettings::default());
    let today = day(2025, 3, 1);

    let first = service.sync_files(&[inbox.clone()], today).unwrap();
    assert_eq!(first.written.inserted, 2);
    assert_eq!(first.notes[0].line_start, 1);
    assert_eq!(first.notes[0].line_end, 3);
    assert_eq!(first.notes[1].line_start, 4);

    let second = service.sync_files(&[inbox], today).unwrap();
    assert_eq!(second.written, MutationSummary::default());
    assert_eq!(second.notes, first.notes);
    assert_eq!(service.live_notes().unwrap().len(), 2);
}

#[test]
fn reaction_line_advances_schedule_without_changing_identity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox.txt");
    let mut conn = open_db_in_memory().unwrap();

    {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let mut service = InboxService::new(repo, ReviewSettings::default());
        service
            .sync_files(&[write(&path, "Fact A\n\n\nFact B\n")], day(2025, 1, 1))
            .unwrap();
        let outcome = service
            .sync_files(
                &[write(&path, "Fact A\n\n\nFact B\n2025-02-25: exciting\n")],
                day(2025, 3, 1),
            )
            .unwrap();
        assert_eq!(outcome.report.reacted, 1);
        assert_eq!(outcome.written.updated, 1);
    }

    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let stored = repo.get_note(&fingerprint("Fact B")).unwrap().unwrap();
    assert_eq!(stored.interval, 124);
    assert_eq!(stored.state, NoteState::Exciting);
    assert_eq!(stored.reviewed_count, 1);
    assert_eq!(stored.last_reviewed_on, day(2025, 2, 25));
    assert_eq!(stored.text, "Fact B");
}

#[test]
fn removed_text_is_tombstoned_and_readding_resets_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox.txt");
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = InboxService::new(repo, ReviewSettings::default());

    service
        .sync_files(&[write(&path, "Keep\n\n\nGone\n")], day(2025, 1, 1))
        .unwrap();
    service
        .sync_files(
            &[write(&path, "Keep\n\n\nGone\n2025-02-01: meh\n")],
            day(2025, 2, 2),
        )
        .unwrap();

    let removed = service
        .sync_files(&[write(&path, "Keep\n")], day(2025, 2, 3))
        .unwrap();
    assert_eq!(removed.written.soft_deleted, 1);
    assert_eq!(service.live_notes().unwrap().len(), 1);

    let today = day(2025, 4, 1);
    let revived = service
        .sync_files(&[write(&path, "Keep\n\n\nGone\n")], today)
        .unwrap();
    assert_eq!(revived.report.resurrected, 1);
    let note = revived
        .notes
        .iter()
        .find(|n| n.fingerprint == fingerprint("Gone"))
        .unwrap();
    assert_eq!(note.reviewed_count, 0);
    assert_eq!(note.state, NoteState::Normal);
    assert_eq!(note.interval, 50);
    assert_eq!(note.created_on, today);
    assert_eq!(service.live_notes().unwrap().len(), 2);
}

#[test]
fn note_moved_between_inboxes_keeps_its_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = InboxService::new(repo, ReviewSettings::default());

    service
        .sync_files(&[write(&a, "Traveller\n"), write(&b, "Resident\n")], day(2025, 1, 1))
        .unwrap();
    let moved = service
        .sync_files(
            &[write(&a, ""), write(&b, "Resident\n\n\nTraveller\n")],
            day(2025, 1, 9),
        )
        .unwrap();

    assert_eq!(moved.written.soft_deleted, 0);
    let traveller = moved.notes.iter().find(|n| n.text == "Traveller").unwrap();
    assert_eq!(traveller.file_path.as_deref(), Some(b.as_path()));
    assert_eq!(traveller.line_start, 4);
    assert_eq!(traveller.created_on, day(2025, 1, 1));
}

#[test]
fn duplicate_text_across_inboxes_aborts_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(&dir.path().join("a.txt"), "Shared fact\n");
    let b = write(&dir.path().join("b.txt"), "Other\n\n\nShared fact\n");
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = InboxService::new(repo, ReviewSettings::default());

    let err = service.sync_files(&[a, b.clone()], day(2025, 1, 1)).unwrap_err();
    match err {
        SyncError::Reconcile(ReconcileError::DuplicateContent {
            file_path,
            line_start,
            text,
            ..
        }) => {
            assert_eq!(file_path, b);
            assert_eq!(line_start, 4);
            assert_eq!(text, "Shared fact");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(service.live_notes().unwrap().is_empty());
}

#[test]
fn unreadable_inbox_aborts_before_reconciling() {
    let dir = tempfile::tempdir().unwrap();
    let present = write(&dir.path().join("a.txt"), "Fact\n");
    let missing = dir.path().join("missing.txt");
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = InboxService::new(repo, ReviewSettings::default());

    let err = service
        .sync_files(&[present, missing.clone()], day(2025, 1, 1))
        .unwrap_err();
    assert!(matches!(err, SyncError::ReadInbox { ref path, .. } if *path == missing));
    assert!(service.live_notes().unwrap().is_empty());
}

#[test]
fn sync_then_review_load_row_counts_due_notes() {
    let dir = tempfile::tempdir().unwrap();
    let inbox = write(&dir.path().join("inbox.txt"), "Old\n\n\nNew\n");
    let log = dir.path().join("review-load.csv");
    let mut conn = open_db_in_memory().unwrap();

    {
        let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
        let mut service = InboxService::new(repo, ReviewSettings::default());
        service
            .sync_files(&[inbox.clone()], day(2025, 1, 1))
            .unwrap();
    }
    conn.execute(
        "UPDATE notes SET created_on = '2024-10-01', last_reviewed_on = '2024-10-01'
         WHERE text = 'Old';",
        [],
    )
    .unwrap();

    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = InboxService::new(repo, ReviewSettings::default());
    let today = day(2025, 1, 2);
    let outcome = service.sync_files(&[inbox], today).unwrap();
    let stats = review_stats(&outcome.live_notes(), today);
    assert_eq!(stats.num_notes, 2);
    assert_eq!(stats.num_due_notes, 1);

    record_review_load(&log, today.and_hms_opt(8, 0, 0).unwrap(), stats).unwrap();
    let rows = read_review_load(&log).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].num_due_notes, 1);
}

#[test]
fn legacy_rows_without_path_adopt_inbox_location() {
    let dir = tempfile::tempdir().unwrap();
    let inbox = write(&dir.path().join("inbox.txt"), "Legacy fact\n");
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO notes (fingerprint, line_start, line_end, ease_factor, interval,
                            last_reviewed_on, created_on, reviewed_count, state, text)
         VALUES (?1, 3, 3, 300, 125, '2024-06-01', '2024-01-01', 1, 'meh', 'Legacy fact');",
        [fingerprint("Legacy fact")],
    )
    .unwrap();

    let repo = SqliteNoteRepository::try_new(&mut conn).unwrap();
    let mut service = InboxService::new(repo, ReviewSettings::default());
    let outcome = service.sync_files(&[inbox.clone()], day(2025, 1, 1)).unwrap();

    assert_eq!(outcome.report.relocated, 1);
    let stored = service.live_notes().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].file_path.as_deref(), Some(inbox.as_path()));
    assert_eq!(stored[0].line_start, 1);
    assert_eq!(stored[0].interval, 125);
    let all = SqliteNoteRepository::try_new(&mut conn)
        .unwrap()
        .list_notes(&NoteListQuery::all())
        .unwrap();
    assert_eq!(all.len(), 1);
}
