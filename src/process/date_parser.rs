use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::table::Timestamp;

const DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y", "%d %b %Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Parse the leading field of a data row.
///
/// Tokens with a `-` must be `YYYY-MM-DD`, anything else a bare year. When the
/// strict reading fails the permissive one gets a go; a token neither accepts
/// yields [`Timestamp::Unresolved`].
pub fn parse_index_token(token: &str) -> Timestamp {
    let token = token.trim();
    if token.is_empty() {
        return Timestamp::Unresolved;
    }

    let strict = if token.contains('-') {
        NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()
    } else {
        parse_year(token)
    };

    strict
        .map(|d| d.and_time(NaiveTime::MIN))
        .or_else(|| parse_permissive(token))
        .map(Timestamp::Resolved)
        .unwrap_or(Timestamp::Unresolved)
}

/// `YYYY` → January 1st of that year.
fn parse_year(s: &str) -> Option<NaiveDate> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(s.parse().ok()?, 1, 1)
}

/// Fallback for the other shapes seen in exports: compact `YYYYMMDD` and
/// `YYYYMM`, month-only `YYYY-MM`, slashed and month-name dates, timestamps.
pub fn parse_permissive(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return parse_compact(s).map(|d| d.and_time(NaiveTime::MIN));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| parse_year_month(s))
        .or_else(|| NaiveDate::parse_from_str(&format!("1 {}", s), "%d %b %Y").ok())?;
    Some(date.and_time(NaiveTime::MIN))
}

fn parse_compact(s: &str) -> Option<NaiveDate> {
    match s.len() {
        4 => parse_year(s),
        6 => NaiveDate::from_ymd_opt(s[0..4].parse().ok()?, s[4..6].parse().ok()?, 1),
        8 => NaiveDate::from_ymd_opt(
            s[0..4].parse().ok()?,
            s[4..6].parse().ok()?,
            s[6..8].parse().ok()?,
        ),
        _ => None,
    }
}

/// `YYYY-MM` or `YYYY/MM` → first day of the month.
fn parse_year_month(s: &str) -> Option<NaiveDate> {
    let (y, m) = s.split_once(['-', '/'])?;
    if y.len() != 4 || m.is_empty() || m.len() > 2 {
        return None;
    }
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, 1)
}
