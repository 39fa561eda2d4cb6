//! Text cleanup helpers shared by the extractor and the notifier
//! formatting.

use std::sync::LazyLock;

use regex::Regex;

use crate::extract::date::normalize_date;

static TRAILING_WS_BEFORE_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\n").unwrap());
static RUNS_OF_BLANKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Trim, collapse whitespace runs and cap the text at `limit` characters.
pub fn clean_text(s: &str, limit: usize) -> String {
    let s = s.trim();
    let s = TRAILING_WS_BEFORE_NEWLINE.replace_all(s, "\n");
    let s = RUNS_OF_BLANKS.replace_all(&s, " ");
    s.chars().take(limit).collect()
}

/// Drop empty lines and collapse consecutive duplicate lines,
/// case-insensitively. Non-adjacent repeats are kept.
pub fn dedupe_adjacent_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut prev_lower: Option<String> = None;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();
        if prev_lower.as_deref() == Some(lower.as_str()) {
            continue;
        }
        out.push(line);
        prev_lower = Some(lower);
    }
    out.join("\n")
}

/// Remove lines that merely repeat the title or the already-extracted
/// date, so previews do not duplicate the message header.
pub fn strip_title_and_date_lines(snippet: &str, title: &str, date: Option<&str>) -> String {
    let title_lower = title.trim().to_lowercase();
    let mut out: Vec<&str> = Vec::new();
    for line in snippet.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !title_lower.is_empty() && line.to_lowercase() == title_lower {
            continue;
        }
        if let Some(date) = date {
            if line == date || normalize_date(line).as_deref() == Some(date) {
                continue;
            }
        }
        out.push(line);
    }
    out.join("\n")
}

/// Flatten to a single paragraph and cut at a word boundary, appending
/// an ellipsis when truncated.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if flat.chars().count() <= max_chars {
        return flat;
    }

    let cut: String = flat.chars().take(max_chars).collect();
    let cut = match cut.rsplit_once(' ') {
        Some((head, _)) => head,
        None => cut.as_str(),
    };
    format!("{}…", cut.trim_end())
}
