use anyhow::{Context, anyhow};
use chrono::{Datelike, NaiveDate};

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Parses a strict `YYYY-MM-DD` date key as a plain calendar date.
///
/// No timezone is involved anywhere in layout; a date key names the
/// same grid cell regardless of where it was typed.
pub fn parse_date_key(text: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_KEY_FORMAT)
        .with_context(|| format!("invalid date key (expected YYYY-MM-DD): {text}"))
}

/// Canonical zero-padded `YYYY-MM-DD` key; left inverse of
/// [`parse_date_key`].
#[must_use]
pub fn format_date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

#[must_use]
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

#[must_use]
pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) { 366 } else { 365 }
}

/// 1-based ordinal day within the date's own year.
#[must_use]
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

pub fn year_start(year: i32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| anyhow!("year {year} is outside the supported calendar range"))
}

pub fn year_end(year: i32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .ok_or_else(|| anyhow!("year {year} is outside the supported calendar range"))
}

/// Weekday index of January 1st of `year`, Sunday = 0.
pub fn start_offset(year: i32) -> anyhow::Result<u32> {
    Ok(year_start(year)?.weekday().num_days_from_sunday())
}
