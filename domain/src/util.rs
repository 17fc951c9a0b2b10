//! Shared utility functions.

use chrono::NaiveDate;

/// Truncate a string to approximately `max_bytes` without splitting a UTF-8
/// character boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Compact JSON rendering for prompts and summaries, cut at `max_bytes`.
pub fn json_preview(value: &serde_json::Value, max_bytes: usize) -> String {
    let text = value.to_string();
    if text.len() <= max_bytes {
        text
    } else {
        format!("{}…", truncate_str(&text, max_bytes))
    }
}

/// Spelling of a date parameter, preserved when a guardrail rewrites it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `2024-01-31`
    Dashed,
    /// `20240131`
    Compact,
}

/// Parse `YYYY-MM-DD` or `YYYYMMDD`.
pub fn parse_date(s: &str) -> Option<(NaiveDate, DateFormat)> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some((date, DateFormat::Dashed));
    }
    if s.len() == 8
        && s.bytes().all(|b| b.is_ascii_digit())
        && let Ok(date) = NaiveDate::parse_from_str(s, "%Y%m%d")
    {
        return Some((date, DateFormat::Compact));
    }
    None
}

pub fn format_date(date: NaiveDate, format: DateFormat) -> String {
    match format {
        DateFormat::Dashed => date.format("%Y-%m-%d").to_string(),
        DateFormat::Compact => date.format("%Y%m%d").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_multibyte_boundary() {
        let s = "あのね";
        assert_eq!(truncate_str(s, 4), "あ");
        assert_eq!(truncate_str("hi", 10), "hi");
    }

    #[test]
    fn parse_both_date_spellings() {
        let (d1, f1) = parse_date("2024-03-01").unwrap();
        let (d2, f2) = parse_date("20240301").unwrap();
        assert_eq!(d1, d2);
        assert_eq!(f1, DateFormat::Dashed);
        assert_eq!(f2, DateFormat::Compact);
        assert_eq!(format_date(d1, DateFormat::Compact), "20240301");
        assert!(parse_date("March 1").is_none());
        assert!(parse_date("20241301").is_none());
    }

    #[test]
    fn preview_is_bounded() {
        let value = serde_json::json!({"data": "x".repeat(100)});
        let preview = json_preview(&value, 20);
        assert!(preview.ends_with('…'));
        assert!(preview.len() <= 20 + '…'.len_utf8());
    }
}
