//! Canonical calendar dates from the sheet's mixed cell encodings.
//!
//! Every date the engine compares goes through [`normalize`]. The encodings are
//! sniffed in a fixed order so a value such as `05/03/2024` always means
//! 5 March 2024, whichever data-source dialect produced it.

use super::domain::CellValue;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime};

/// Recognized raw encodings, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DateEncoding<'a> {
    /// `Date(Y,M,D[,h,m,s])` with a zero-based month.
    Serialized { year: i32, month0: i64, day: i64 },
    /// `DD/MM/YYYY`, optionally followed by a time of day.
    DayFirst { day: u32, month: u32, year: i32 },
    /// Spreadsheet serial day number.
    Serial(f64),
    /// Anything else; handed to the generic parser.
    Generic(&'a str),
}

const GENERIC_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const GENERIC_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Converts a cell into a calendar date. Empty or unparsable input is `None`, never an error.
pub fn normalize(cell: &CellValue) -> Option<NaiveDate> {
    sniff(cell).and_then(resolve)
}

/// Same as [`normalize`] for text that did not come from a cell.
pub fn normalize_str(raw: &str) -> Option<NaiveDate> {
    normalize(&CellValue::from_text(raw))
}

/// Calendar date of an RFC 3339 instant as seen at `offset`.
///
/// Sheet scripts serialize a local midnight as UTC, so a date cell only keeps
/// its day when read back at the sheet's own offset.
pub fn instant_date_at(raw: &str, offset: FixedOffset) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|instant| instant.with_timezone(&offset).date_naive())
}

/// Renders the `DD/MM/YYYY` form that [`normalize`] reads back unchanged.
pub fn format_day_first(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn sniff(cell: &CellValue) -> Option<DateEncoding<'_>> {
    match cell {
        CellValue::Empty | CellValue::Bool(_) => None,
        CellValue::Number(value) => Some(DateEncoding::Serial(*value)),
        CellValue::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            Some(
                sniff_serialized(trimmed)
                    .or_else(|| sniff_day_first(trimmed))
                    .unwrap_or(DateEncoding::Generic(trimmed)),
            )
        }
    }
}

fn sniff_serialized(value: &str) -> Option<DateEncoding<'_>> {
    let inner = value.strip_prefix("Date(")?.strip_suffix(')')?;
    let mut parts = inner.split(',').map(|part| part.trim().parse::<i64>());
    let year = parts.next()?.ok()?;
    let month0 = parts.next()?.ok()?;
    let day = parts.next()?.ok()?;
    // Trailing time components only need to be well formed.
    if parts.any(|part| part.is_err()) {
        return None;
    }

    Some(DateEncoding::Serialized {
        year: i32::try_from(year).ok()?,
        month0,
        day,
    })
}

fn sniff_day_first(value: &str) -> Option<DateEncoding<'_>> {
    let date_part = value.split_whitespace().next()?;
    let mut fields = date_part.split('/');
    let day = fields.next()?;
    let month = fields.next()?;
    let year = fields.next()?;
    if fields.next().is_some() {
        return None;
    }

    let is_digits = |field: &str, min: usize, max: usize| {
        (min..=max).contains(&field.len()) && field.bytes().all(|b| b.is_ascii_digit())
    };
    if !(is_digits(day, 1, 2) && is_digits(month, 1, 2) && is_digits(year, 4, 4)) {
        return None;
    }

    Some(DateEncoding::DayFirst {
        day: day.parse().ok()?,
        month: month.parse().ok()?,
        year: year.parse().ok()?,
    })
}

fn resolve(encoding: DateEncoding<'_>) -> Option<NaiveDate> {
    match encoding {
        DateEncoding::Serialized { year, month0, day } => {
            let month = u32::try_from(month0.checked_add(1)?).ok()?;
            let day = u32::try_from(day).ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        }
        DateEncoding::DayFirst { day, month, year } => NaiveDate::from_ymd_opt(year, month, day),
        DateEncoding::Serial(value) => from_serial(value),
        DateEncoding::Generic(raw) => parse_generic(raw),
    }
}

fn from_serial(value: f64) -> Option<NaiveDate> {
    // Day 0 of the spreadsheet epoch; 1.0 is 31 December 1899.
    if !value.is_finite() || value < 1.0 || value > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(value.floor() as i64))
}

/// Instants without a known sheet offset are read in UTC.
fn parse_generic(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    GENERIC_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            GENERIC_DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        })
}
