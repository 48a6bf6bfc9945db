//! Editor-friendly note locations.
//!
//! Each line reads `path:line:1:fragment`, the quickfix format understood by
//! vim and emacs compilation buffers. Colons inside the fragment are escaped
//! as `\:` so the line stays splittable.

use crate::model::note::Note;

/// Words of note text shown after the location.
pub const FRAGMENT_WORDS: usize = 20;

/// Escapes `:` in a fragment.
pub fn escape_fragment(fragment: &str) -> String {
    fragment.replace(':', "\\:")
}

/// Formats one note location line.
pub fn location_line(note: &Note) -> String {
    let path = note
        .file_path
        .as_ref()
        .map_or_else(String::new, |p| p.display().to_string());
    format!(
        "{path}:{}:1:{}",
        note.line_start,
        escape_fragment(&note.fragment(FRAGMENT_WORDS))
    )
}

/// Formats location lines for live notes ordered by path then line.
pub fn compile_lines<'a, I>(notes: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Note>,
{
    let mut live: Vec<&Note> = notes.into_iter().filter(|n| n.is_live()).collect();
    live.sort_by(|a, b| {
        a.file_path
            .cmp(&b.file_path)
            .then(a.line_start.cmp(&b.line_start))
    });
    live.into_iter().map(location_line).collect()
}

#[cfg(test)]
mod tests {
    use super::{compile_lines, escape_fragment, location_line};
    use crate::model::note::Note;
    use chrono::NaiveDate;

    fn note(path: &str, line: i64, text: &str) -> Note {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        Note::new(format!("fp-{path}-{line}"), text, path, line, line, today)
    }

    #[test]
    fn location_line_escapes_colons() {
        let n = note("/n/inbox.txt", 12, "Ratio: 3:2 holds");
        assert_eq!(location_line(&n), "/n/inbox.txt:12:1:Ratio\\: 3\\:2 holds");
        assert_eq!(escape_fragment("a:b"), "a\\:b");
    }

    #[test]
    fn fragment_is_capped_at_twenty_words() {
        let text = (1..=30).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let line = location_line(&note("/n/a.txt", 1, &text));
        assert!(line.ends_with(":1:1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20"));
    }

    #[test]
    fn compile_lines_sorts_and_skips_tombstones() {
        let mut gone = note("/n/a.txt", 1, "gone");
        gone.soft_delete();
        let notes = vec![
            note("/n/b.txt", 1, "b one"),
            note("/n/a.txt", 9, "a nine"),
            gone,
            note("/n/a.txt", 4, "a four"),
        ];
        assert_eq!(
            compile_lines(&notes),
            vec![
                "/n/a.txt:4:1:a four".to_string(),
                "/n/a.txt:9:1:a nine".to_string(),
                "/n/b.txt:1:1:b one".to_string(),
            ]
        );
    }
}
