//! `spaced-inbox` entry point.
//!
//! # Responsibility
//! - Resolve paths, start logging and open the store.
//! - Sync inboxes, record review load and dispatch the selected mode.

mod cli;
mod output;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use cli::Cli;
use log::info;
use rusqlite::Connection;
use spaced_inbox_core::report::review_load::record_review_load;
use spaced_inbox_core::schedule::forecast::{forecast, smooth_schedule};
use spaced_inbox_core::schedule::scheduler::due_notes;
use spaced_inbox_core::{
    default_log_level, init_logging, open_db, open_db_read_only, pick_note, review_stats,
    AppConfig, AppPaths, InboxService, SqliteNoteRepository,
};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = resolve_paths(&cli)?;

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, &paths.log_dir).context("failed to start logging")?;

    if let Some(legacy_path) = cli.import_legacy.as_deref() {
        let mut conn = open_store(&paths.db_path)?;
        let legacy = open_db_read_only(legacy_path).with_context(|| {
            format!("failed to open legacy database {}", legacy_path.display())
        })?;
        let repo = SqliteNoteRepository::try_new(&mut conn)?;
        let report = InboxService::new(repo, Default::default()).import_legacy(&legacy)?;
        return output::print_import(cli.format, report);
    }

    let config = AppConfig::load(paths).context("invalid configuration")?;
    let mut conn = open_store(&config.db_path)?;
    let today = Local::now().date_naive();

    let repo = SqliteNoteRepository::try_new(&mut conn)?;
    let mut service = InboxService::new(repo, config.review);
    let outcome = service.sync_files(&config.inbox_paths, today)?;
    let live = outcome.live_notes();

    let stats = review_stats(&live, today);
    record_review_load(&config.review_load_path, Local::now().naive_local(), stats)?;
    info!(
        "event=run module=cli status=ok num_notes={} num_due_notes={}",
        stats.num_notes, stats.num_due_notes
    );

    if cli.roll {
        let pick = pick_note(&live, today, &config.review, &mut rand::thread_rng());
        output::print_pick(cli.format, pick)
    } else if cli.compile {
        output::print_due(cli.format, &due_notes(&live, today))
    } else if cli.forecast {
        let smoothed = cli
            .max_per_day
            .map(|max_per_day| smooth_schedule(&live, today, max_per_day));
        output::print_forecast(cli.format, &forecast(&live, today), smoothed.as_ref())
    } else {
        output::print_stats(cli.format, stats)
    }
}

fn open_store(path: &Path) -> Result<Connection> {
    open_db(path).with_context(|| format!("failed to open database {}", path.display()))
}

fn resolve_paths(cli: &Cli) -> Result<AppPaths> {
    let defaults = AppPaths::default_paths()?;
    Ok(AppPaths {
        config_file: cli.config.clone().unwrap_or(defaults.config_file),
        db_path: cli.db.clone().unwrap_or(defaults.db_path),
        review_load_path: cli.review_load.clone().unwrap_or(defaults.review_load_path),
        log_dir: cli.log_dir.clone().unwrap_or(defaults.log_dir),
    })
}
