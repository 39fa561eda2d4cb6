//! Best-effort date recognition for announcement pages.
//!
//! Two grammars are understood: numeric `D.M.YYYY[ H:MM[:SS]]` and
//! `D <month-name> YYYY` with Turkish month names (the language of the
//! watched sites). Both normalize to `DD.MM.YYYY[ HH:MM[:SS]]`.

use std::sync::LazyLock;

use regex::Regex;

/// Month-name table, lowercase.
const MONTHS: [(&str, u32); 12] = [
    ("ocak", 1),
    ("şubat", 2),
    ("mart", 3),
    ("nisan", 4),
    ("mayıs", 5),
    ("haziran", 6),
    ("temmuz", 7),
    ("ağustos", 8),
    ("eylül", 9),
    ("ekim", 10),
    ("kasım", 11),
    ("aralık", 12),
];

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\.(\d{1,2})\.(\d{4})(?:\s+(\d{1,2}:\d{2}(?::\d{2})?))?").unwrap()
});

static NAMED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\s+([[:alpha:]çğıöşüÇĞİÖŞÜ]+)\s+(\d{4})").unwrap()
});

/// Scan `text` for the first recognizable date and return it normalized,
/// or `None` when neither grammar matches.
pub fn normalize_date(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = NUMERIC_DATE.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = &caps[3];
        if (1..=31).contains(&day) && (1..=12).contains(&month) {
            let mut out = format!("{:02}.{:02}.{}", day, month, year);
            if let Some(time) = caps.get(4) {
                out.push(' ');
                out.push_str(time.as_str());
            }
            return Some(out);
        }
    }

    if let Some(caps) = NAMED_DATE.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let name = caps[2].trim_matches(|c: char| " ,().".contains(c)).to_lowercase();
        let year = &caps[3];
        let month = MONTHS.iter().find(|(n, _)| *n == name).map(|(_, m)| *m)?;
        if (1..=31).contains(&day) {
            return Some(format!("{:02}.{:02}.{}", day, month, year));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_date_with_time() {
        assert_eq!(
            normalize_date("15.03.2024 14:30").as_deref(),
            Some("15.03.2024 14:30")
        );
    }

    #[test]
    fn test_numeric_date_with_seconds() {
        assert_eq!(
            normalize_date("Published 1.9.2023 08:05:59 by staff").as_deref(),
            Some("01.09.2023 08:05:59")
        );
    }

    #[test]
    fn test_numeric_date_zero_pads() {
        assert_eq!(normalize_date("5.3.2024").as_deref(), Some("05.03.2024"));
    }

    #[test]
    fn test_named_month() {
        assert_eq!(normalize_date("5 Mart 2024").as_deref(), Some("05.03.2024"));
        assert_eq!(
            normalize_date("23 Ağustos 2025").as_deref(),
            Some("23.08.2025")
        );
    }

    #[test]
    fn test_named_month_in_free_text() {
        assert_eq!(
            normalize_date("Duyuru: 12 Ekim 2024 tarihinde yayınlandı").as_deref(),
            Some("12.10.2024")
        );
    }

    #[test]
    fn test_unknown_month_name() {
        assert_eq!(normalize_date("5 Floop 2024"), None);
    }

    #[test]
    fn test_out_of_range_numeric_rejected() {
        assert_eq!(normalize_date("45.99.2024"), None);
    }

    #[test]
    fn test_no_date() {
        assert_eq!(normalize_date("nothing to see here"), None);
        assert_eq!(normalize_date(""), None);
    }
}
