//! Text utilities for comparing and flattening upstream data
//!
//! Upstream services return human-oriented strings ("3:45", "1.2M views",
//! "3 weeks ago"). These helpers turn them into values, returning `None`
//! when the text does not carry the information.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize a string for fuzzy comparison
///
/// Canonical decomposition (NFD), combining marks removed, everything
/// outside `[A-Za-z0-9]` removed, lowercased. Idempotent.
///
/// ```
/// use virome_common::text::normalize_for_match;
///
/// assert_eq!(normalize_for_match("Beyoncé & Jay-Z"), "beyoncejayz");
/// ```
pub fn normalize_for_match(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Parse a clock-style duration ("3:45", "1:02:03") into seconds
///
/// Unparseable parts count as zero. Anything other than two or three
/// parts, or a total that does not fit in `u64`, yields `None`.
pub fn parse_duration_text(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let parts: Vec<u64> = text
        .split(':')
        .map(|p| p.trim().parse::<u64>().unwrap_or(0))
        .collect();

    let (h, m, s) = match parts.as_slice() {
        [m, s] => (0, *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return None,
    };

    h.checked_mul(3600)?
        .checked_add(m.checked_mul(60)?)?
        .checked_add(s)
}

/// Parse a view count ("1,234 views", "1.2M views", "3K") into a number
pub fn parse_view_count(text: &str) -> Option<u64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];

    let number_end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
        .unwrap_or(rest.len());
    let number: f64 = rest[..number_end].replace(',', "").parse().ok()?;

    let multiplier = match rest[number_end..].chars().next() {
        Some('K') => 1_000.0,
        Some('M') => 1_000_000.0,
        Some('B') => 1_000_000_000.0,
        _ => 1.0,
    };

    Some((number * multiplier).floor() as u64)
}

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;
const WEEK_MS: i64 = 604_800_000;
const MONTH_MS: i64 = 2_592_000_000;
const YEAR_MS: i64 = 31_536_000_000;

/// Approximate the epoch-millisecond timestamp described by a relative
/// published-time text ("2 days ago", "Streamed 3 weeks ago")
///
/// Text without a recognised unit resolves to `now_ms`. A missing count
/// means one unit. Counts too large to represent clamp to `i64::MIN`.
pub fn relative_time_to_epoch_ms(text: &str, now_ms: i64) -> i64 {
    let lower = text.to_lowercase();

    let unit_ms = if lower.contains("hour") {
        HOUR_MS
    } else if lower.contains("day") {
        DAY_MS
    } else if lower.contains("week") {
        WEEK_MS
    } else if lower.contains("month") {
        MONTH_MS
    } else if lower.contains("year") {
        YEAR_MS
    } else {
        return now_ms;
    };

    let count = lower
        .split(|c: char| !c.is_ascii_digit())
        .find(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(1);

    count
        .checked_mul(unit_ms)
        .and_then(|offset| now_ms.checked_sub(offset))
        .unwrap_or(i64::MIN)
}

/// Remove HTML tags from a snippet (scrobble-service bios and wikis)
pub fn strip_html_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
