//! Inbox file parser.
//!
//! # Responsibility
//! - Split inbox lines into chunks with a three-state machine
//!   (`Text`, `OneBlank`, `TwoOrMoreBlank`).
//! - Strip reaction lines out of each chunk and fingerprint the rest.
//!
//! # Invariants
//! - Two or more blank lines, or a line of three or more `=`, end a chunk.
//! - A single blank line stays inside the chunk as one paragraph break.
//! - The final chunk is always emitted before filtering.
//! - Chunks that are empty, reaction-only, or a bare `YYYY-MM-DD` divider
//!   are dropped.

use crate::inbox::identity::fingerprint;
use crate::model::chunk::{ParsedChunk, Reaction};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^===+$").expect("valid separator regex"));
static DATE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date line regex"));
static REACTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}):\s*#?(\w+)$").expect("valid reaction regex")
});

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Text,
    OneBlank,
    TwoOrMoreBlank,
}

/// Parses the ordered lines of one inbox file into note chunks.
pub fn parse_inbox<I, S>(lines: I) -> Vec<ParsedChunk>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut chunks = Vec::new();
    let mut note_text = String::new();
    let mut state = ParseState::Text;
    let mut line_number: i64 = 0;
    let mut line_start: i64 = 1;

    for raw_line in lines {
        let line = raw_line.as_ref().trim();
        line_number += 1;
        let is_separator = SEPARATOR_RE.is_match(line);

        match state {
            ParseState::Text => {
                if line.is_empty() {
                    state = ParseState::OneBlank;
                } else if is_separator {
                    state = ParseState::TwoOrMoreBlank;
                } else {
                    note_text.push_str(line);
                    note_text.push('\n');
                }
            }
            ParseState::OneBlank => {
                if line.is_empty() || is_separator {
                    state = ParseState::TwoOrMoreBlank;
                } else {
                    state = ParseState::Text;
                    note_text.push('\n');
                    note_text.push_str(line);
                    note_text.push('\n');
                }
            }
            ParseState::TwoOrMoreBlank => {
                if !line.is_empty() && !is_separator {
                    state = ParseState::Text;
                    chunks.extend(build_chunk(&note_text, line_start, line_number - 1));
                    line_start = line_number;
                    note_text.clear();
                    note_text.push_str(line);
                    note_text.push('\n');
                }
            }
        }
    }
    chunks.extend(build_chunk(&note_text, line_start, line_number));

    chunks
}

/// Parses a whole inbox file body.
pub fn parse_inbox_text(text: &str) -> Vec<ParsedChunk> {
    parse_inbox(text.lines())
}

/// Returns the reaction encoded by `line`, or `None` when the line is
/// ordinary text (including reaction-shaped lines with an invalid date).
pub fn parse_reaction(line: &str) -> Option<Reaction> {
    let caps = REACTION_RE.captures(line.trim())?;
    let date = NaiveDate::parse_from_str(caps.get(1)?.as_str(), DATE_FORMAT).ok()?;
    Some(Reaction {
        date,
        label: caps.get(2)?.as_str().to_string(),
    })
}

/// Removes reaction lines from `raw` and returns the trimmed remainder and
/// the reactions sorted by date.
pub fn strip_reactions(raw: &str) -> (String, Vec<Reaction>) {
    let mut kept: Vec<&str> = Vec::new();
    let mut reactions = Vec::new();
    for line in raw.trim().lines() {
        match parse_reaction(line) {
            Some(reaction) => reactions.push(reaction),
            None => kept.push(line),
        }
    }
    reactions.sort_by(|a, b| a.date.cmp(&b.date));
    (kept.join("\n").trim().to_string(), reactions)
}

fn is_date_divider(text: &str) -> bool {
    DATE_LINE_RE.is_match(text) && NaiveDate::parse_from_str(text, DATE_FORMAT).is_ok()
}

fn build_chunk(raw: &str, line_start: i64, line_end: i64) -> Option<ParsedChunk> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_date_divider(trimmed) {
        return None;
    }

    let (text, reactions) = strip_reactions(trimmed);
    if text.is_empty() {
        return None;
    }

    Some(ParsedChunk {
        fingerprint: fingerprint(&text),
        text,
        line_start,
        line_end,
        reactions,
    })
}
