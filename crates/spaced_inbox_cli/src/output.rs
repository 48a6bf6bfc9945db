//! Plain and JSON renderings of command results.

use crate::cli::OutputFormat;
use anyhow::Result;
use chrono::NaiveDate;
use serde_json::json;
use spaced_inbox_core::report::locations::{compile_lines, location_line};
use spaced_inbox_core::schedule::scheduler::human_friendly;
use spaced_inbox_core::service::legacy_import::LegacyImportReport;
use spaced_inbox_core::{Fingerprint, Note, Pick, ReviewStats};
use std::collections::BTreeMap;

pub fn print_stats(format: OutputFormat, stats: ReviewStats) -> Result<()> {
    match format {
        OutputFormat::Plain => {
            println!("Number of notes: {}", stats.num_notes);
            println!("Number of notes that are due: {}", stats.num_due_notes);
        }
        OutputFormat::Json => print_json(&json!({
            "num_notes": stats.num_notes,
            "num_due_notes": stats.num_due_notes,
        }))?,
    }
    Ok(())
}

pub fn print_pick(format: OutputFormat, pick: Option<Pick<'_>>) -> Result<()> {
    match (format, pick) {
        (OutputFormat::Plain, Some(pick)) => println!("{}", location_line(pick.note)),
        (OutputFormat::Plain, None) => println!("No notes are due"),
        (OutputFormat::Json, Some(pick)) => print_json(&json!({
            "tier": pick.tier.as_str(),
            "location": location_line(pick.note),
            "note": pick.note,
        }))?,
        (OutputFormat::Json, None) => print_json(&json!({ "note": null }))?,
    }
    Ok(())
}

pub fn print_due(format: OutputFormat, due: &[&Note]) -> Result<()> {
    match format {
        OutputFormat::Plain => {
            for line in compile_lines(due.iter().copied()) {
                println!("{line}");
            }
        }
        OutputFormat::Json => print_json(&json!({ "due": due }))?,
    }
    Ok(())
}

pub fn print_forecast(
    format: OutputFormat,
    histogram: &BTreeMap<i64, usize>,
    smoothed: Option<&BTreeMap<NaiveDate, Vec<Fingerprint>>>,
) -> Result<()> {
    match format {
        OutputFormat::Plain => {
            let notes: usize = histogram.values().sum();
            if notes > 0 {
                let total_days: f64 = histogram
                    .iter()
                    .map(|(days, count)| *days as f64 * *count as f64)
                    .sum();
                let mean = total_days / notes as f64;
                println!("Mean days until due: {}", human_friendly(mean));
            }
            println!("days_until_due,num_notes");
            for (days, count) in histogram {
                println!("{days},{count}");
            }
            if let Some(smoothed) = smoothed {
                println!();
                println!("date,num_notes");
                for (date, fingerprints) in smoothed {
                    println!("{date},{}", fingerprints.len());
                }
            }
        }
        OutputFormat::Json => {
            let smoothed = smoothed.map(|days| {
                days.iter()
                    .map(|(date, fps)| (date.to_string(), fps.len()))
                    .collect::<BTreeMap<_, _>>()
            });
            print_json(&json!({
                "forecast": histogram
                    .iter()
                    .map(|(days, count)| (days.to_string(), *count))
                    .collect::<BTreeMap<_, _>>(),
                "smoothed": smoothed,
            }))?;
        }
    }
    Ok(())
}

pub fn print_import(format: OutputFormat, report: LegacyImportReport) -> Result<()> {
    match format {
        OutputFormat::Plain => {
            println!("Imported notes: {}", report.imported);
            println!("Skipped (already stored): {}", report.skipped_existing);
            println!("Skipped (duplicate text): {}", report.skipped_duplicate);
            println!("Skipped (invalid row): {}", report.skipped_invalid);
        }
        OutputFormat::Json => print_json(&json!({
            "imported": report.imported,
            "skipped_existing": report.skipped_existing,
            "skipped_duplicate": report.skipped_duplicate,
            "skipped_invalid": report.skipped_invalid,
        }))?,
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
