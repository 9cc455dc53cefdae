use lazy_static::lazy_static;
use regex::Regex;
pub use time::Date;
use time::{macros::format_description, Month, UtcOffset};

pub type StaticDateFormat<'a> =
    &'static [time::format_description::BorrowedFormatItem<'a>];

pub const STANDARD_DATE_FORMAT: StaticDateFormat =
    format_description!("[year]-[month]-[day]");

// Attempted in order. The first that consumes the entire string wins.
// Day-first forms precede the US month-first form, so an ambiguous
// 03/12/2025 is read as the 3rd of December.
const STATEMENT_DATE_FORMATS: [StaticDateFormat; 5] = [
    STANDARD_DATE_FORMAT,
    format_description!("[day padding:none].[month padding:none].[year]"),
    format_description!("[day padding:none]/[month padding:none]/[year]"),
    format_description!("[year][month][day]"),
    format_description!("[month padding:none]/[day padding:none]/[year]"),
];

lazy_static! {
    static ref LEADING_ISO_DATE_RE: Regex =
        Regex::new(r"^(\d{4}-\d{2}-\d{2})").unwrap();
    static ref LONG_DATE_RE: Regex =
        Regex::new(r"^([A-Za-z]+)\s+(\d{1,2}),?\s+(\d{4})$").unwrap();
}

pub fn parse_standard_date(date_str: &str) -> Result<Date, time::error::Parse> {
    Date::parse(date_str, STANDARD_DATE_FORMAT)
}

/// Parses a date cell as it may appear in a broker statement.
///
/// Accepts YYYY-MM-DD, DD.MM.YYYY, DD/MM/YYYY, YYYYMMDD and MM/DD/YYYY,
/// and finally any string that begins with a YYYY-MM-DD date (such as
/// "2025-12-03, 14:30:00"). Returns None for anything else, including
/// empty cells.
pub fn parse_statement_date(date_str: &str) -> Option<Date> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    for fmt in STATEMENT_DATE_FORMATS {
        if let Ok(d) = Date::parse(trimmed, fmt) {
            return Some(d);
        }
    }

    LEADING_ISO_DATE_RE
        .captures(trimmed)
        .and_then(|caps| parse_standard_date(&caps[1]).ok())
}

/// Parses dates like "January 1, 2025" or "Dec 3 2025".
pub fn parse_long_date(date_str: &str) -> Option<Date> {
    let caps = LONG_DATE_RE.captures(date_str.trim())?;
    let month = parse_month(&caps[1]).ok()?;
    let day: u8 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

pub fn parse_month(m: &str) -> Result<Month, ()> {
    let m_lower = m.to_lowercase();
    let trimmed = m_lower.trim();
    if trimmed.starts_with("jan") {
        Ok(Month::January)
    } else if trimmed.starts_with("feb") {
        Ok(Month::February)
    } else if trimmed.starts_with("mar") {
        Ok(Month::March)
    } else if trimmed.starts_with("apr") {
        Ok(Month::April)
    } else if trimmed.starts_with("may") {
        Ok(Month::May)
    } else if trimmed.starts_with("jun") {
        Ok(Month::June)
    } else if trimmed.starts_with("jul") {
        Ok(Month::July)
    } else if trimmed.starts_with("aug") {
        Ok(Month::August)
    } else if trimmed.starts_with("sep") {
        Ok(Month::September)
    } else if trimmed.starts_with("oct") {
        Ok(Month::October)
    } else if trimmed.starts_with("nov") {
        Ok(Month::November)
    } else if trimmed.starts_with("dec") {
        Ok(Month::December)
    } else {
        Err(())
    }
}

/// For serde `serialize_with`. Dates are always written as YYYY-MM-DD.
pub fn serialize_date<S: serde::Serializer>(d: &Date, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&d.to_string())
}

pub fn serialize_opt_date<S: serde::Serializer>(
    d: &Option<Date>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match d {
        Some(d) => s.serialize_str(&d.to_string()),
        None => s.serialize_none(),
    }
}

// Using UtcOffset::current_local_offset is unsound on Linux, and will
// return an error without some "unsafe" feature enabled. chrono does not
// block it, so go through chrono.
pub fn local_utc_offset() -> Result<UtcOffset, time::error::ComponentRange> {
    let now = chrono::offset::Local::now();
    let offset = now.offset();
    UtcOffset::from_whole_seconds(-1 * offset.utc_minus_local())
}
