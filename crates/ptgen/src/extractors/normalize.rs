// ABOUTME: Per-field normalization rules shared by the site extractors.
// ABOUTME: Date sorting, alias sorting, rating strings, number scraping and free-text cleanup.

//! Normalization rules.
//!
//! - Date lists sort ascending by parsed calendar date. The sort is stable
//!   and entries whose date cannot be parsed keep their relative order at
//!   the end of the list.
//! - Alias lists are split, trimmed, deduplicated and sorted by Unicode
//!   code point order (`str::cmp`), so `"Beta / alpha / Gamma"` becomes
//!   `["Beta", "Gamma", "alpha"]` on every platform.
//! - Ratings render as `"{average}/10 from {count} users"` only when both
//!   parts are known.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(?:-(\d{1,2}))?(?:-(\d{1,2}))?").unwrap());

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\d,]+").unwrap());

/// Parse the calendar date at the start of an upstream date string.
///
/// Handles `2019-05-30(中国大陆)`, bare years, `14 October 1994` and
/// anything dateparser understands.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = LEADING_DATE_RE.captures(s) {
        let year: i32 = caps.get(1)?.as_str().parse().ok()?;
        let month: u32 = caps.get(2).map_or(Some(1), |m| m.as_str().parse().ok())?;
        let day: u32 = caps.get(3).map_or(Some(1), |m| m.as_str().parse().ok())?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    // Loose date-only formats are tried before dateparser so midnight never
    // shifts across a day boundary through a local timezone.
    const LOOSE_PATTERNS: &[&str] = &[
        "%e %B %Y", // 14 October 1994
        "%d %B %Y", // 04 October 1994
        "%B %e, %Y", // October 14, 1994
        "%e %b %Y", // 14 Oct 1994
        "%b %e, %Y", // Oct 14, 1994
    ];
    for pat in LOOSE_PATTERNS {
        if let Ok(date) = NaiveDate::parse_from_str(s, pat) {
            return Some(date);
        }
    }

    if let Ok(dt) = dateparser::parse(s) {
        return Some(dt.date_naive());
    }

    None
}

/// Stable ascending sort by the date each item carries. Unparseable dates go last.
pub fn sort_by_date<T, F>(items: &mut [T], date_of: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by_cached_key(|item| match parse_date(date_of(item)) {
        Some(date) => (0u8, Some(date)),
        None => (1u8, None),
    });
}

/// Sort a list of date strings ascending by calendar date.
pub fn sort_dates(mut dates: Vec<String>) -> Vec<String> {
    sort_by_date(&mut dates, |d| d.as_str());
    dates
}

/// Split an alias list on `sep`, then trim, deduplicate and sort it.
pub fn sort_aliases(raw: &str, sep: &str) -> Vec<String> {
    let mut aliases: Vec<String> = raw
        .split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    aliases.sort();
    aliases.dedup();
    aliases
}

/// Render a rating as `"{average}/10 from {count} users"`.
pub fn rating_string(average: f64, count: u64) -> String {
    format!("{}/10 from {} users", average, count)
}

/// Render a rating when both parts resolved.
pub fn rating(average: Option<f64>, count: Option<u64>) -> Option<String> {
    match (average, count) {
        (Some(a), Some(c)) => Some(rating_string(a, c)),
        _ => None,
    }
}

/// Read a JSON number, accepting numeric strings as upstreams often quote them.
pub fn json_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a JSON count, accepting numeric strings.
pub fn json_u64(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

/// First run of digits (commas allowed) in `raw`, with the commas removed.
pub fn number_from_str(raw: &str) -> Option<String> {
    NUMBER_RE
        .find_iter(raw)
        .map(|m| m.as_str().replace(',', ""))
        .find(|digits| !digits.is_empty())
}

/// Collapse every run of whitespace into a single space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim each line and drop the empty ones.
pub fn clean_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prefix every continuation line of a multi-line value.
pub fn indent_continuation(text: &str, prefix: &str) -> String {
    text.replace('\n', &format!("\n{}", prefix))
}

/// Deduplicate while keeping first occurrences in order.
pub fn dedup_stable(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
