//! Show dates, and the month keys they get bucketed under.
//!
//! Venue listings print dates without a year, like `Fri 3.15`, so the year
//! has to be guessed. The guess is the current year, unless the month has
//! already passed, in which case it's assumed the show is next year.
//!
//! This is an approximation: it's wrong for shows announced more than a year
//! ahead, and for listings which still show last month's dates.

use std::fmt;

use chrono::{Datelike, Month, NaiveDate, Weekday};

/// Reasons a raw listing date can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("date is empty")]
    Empty,

    #[error("expected \"weekday month.day\", got {0:?}")]
    Format(String),

    #[error("unknown weekday {0:?}")]
    Weekday(String),

    #[error("no such day: {0:?}")]
    Invalid(String),
}

/// Identifies a calendar month of a specific year.
///
/// Displays as `<MonthName>.<Year>`, for example `March.2024`,
/// and orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    /// The full year.
    pub year: i32,

    /// The month.
    pub month: Month,
}

impl MonthKey {
    /// Creates a key from a year and a month number from 1 to 12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let month = Month::try_from(u8::try_from(month).ok()?).ok()?;
        Some(Self { year, month })
    }

    /// The month key a given date falls in.
    pub fn of(date: NaiveDate) -> Self {
        // A date's month is always in range.
        Self::new(date.year(), date.month()).unwrap_or(Self {
            year: date.year(),
            month: Month::January,
        })
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.month.name(), self.year)
    }
}

/// Parses a year-less `weekday month.day` date, relative to `today`.
///
/// The weekday has to be a real weekday name, but it isn't checked
/// against the resulting date, since the year is only a guess anyway.
pub fn parse(raw: &str, today: NaiveDate) -> Result<NaiveDate, Error> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::Empty);
    }

    let mut parts = raw.split_whitespace();
    let (Some(weekday), Some(day), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(Error::Format(raw.to_owned()));
    };

    weekday
        .trim_end_matches(',')
        .parse::<Weekday>()
        .map_err(|_| Error::Weekday(weekday.to_owned()))?;

    let (month, day) = day
        .split_once('.')
        .and_then(|(m, d)| Some((m.parse::<u32>().ok()?, d.parse::<u32>().ok()?)))
        .ok_or_else(|| Error::Format(raw.to_owned()))?;

    let year = if month < today.month() {
        today.year() + 1
    } else {
        today.year()
    };

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| Error::Invalid(raw.to_owned()))
}
