// ABOUTME: Timezone-aware parsing of dates typed by users or models
// ABOUTME: Local wall-clock inputs resolve in the user's timezone and are stored as UTC
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone,
    Utc,
};
use chrono_tz::Tz;

use crate::errors::{AppError, AppResult};

/// Wall-clock formats accepted without an offset, most specific first
const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// A date or date-time as given in a tool argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDateTime {
    /// A precise instant (had a time component)
    At(DateTime<Utc>),
    /// A calendar day in the user's timezone
    Day(NaiveDate),
}

impl UserDateTime {
    /// Parse RFC 3339, local `YYYY-MM-DDTHH:MM[:SS]` (also with a space), or `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` when none of the forms match, and `InvalidInput`
    /// for a wall-clock time that cannot be placed in `tz`.
    pub fn parse(raw: &str, tz: Tz) -> AppResult<Self> {
        let raw = raw.trim();
        if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Self::At(at.with_timezone(&Utc)));
        }
        for format in LOCAL_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return local_to_utc(naive, tz).map(Self::At);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Ok(Self::Day(date));
        }
        Err(AppError::invalid_format(format!(
            "Unrecognized date '{raw}'. Use YYYY-MM-DD or YYYY-MM-DDTHH:MM"
        )))
    }

    /// Whether only a calendar day was given
    #[must_use]
    pub const fn is_date_only(self) -> bool {
        matches!(self, Self::Day(_))
    }

    /// The instant, or local midnight for a bare day
    ///
    /// # Errors
    ///
    /// Returns an error if midnight cannot be placed in `tz`.
    pub fn start(self, tz: Tz) -> AppResult<DateTime<Utc>> {
        match self {
            Self::At(at) => Ok(at),
            Self::Day(date) => local_midnight(date, tz),
        }
    }

    /// The instant, or the midnight that ends a bare day (exclusive bound)
    ///
    /// # Errors
    ///
    /// Returns an error if the day is the last representable date.
    pub fn end(self, tz: Tz) -> AppResult<DateTime<Utc>> {
        match self {
            Self::At(at) => Ok(at),
            Self::Day(date) => local_midnight(next_day(date)?, tz),
        }
    }

    /// The instant, or the last second of a bare day (used for deadlines)
    ///
    /// # Errors
    ///
    /// Returns an error if the day is the last representable date.
    pub fn deadline(self, tz: Tz) -> AppResult<DateTime<Utc>> {
        match self {
            Self::At(at) => Ok(at),
            Self::Day(_) => Ok(self.end(tz)? - Duration::seconds(1)),
        }
    }
}

/// Place a wall-clock time in `tz`. Ambiguous times take the earlier
/// offset; times skipped by a DST jump move forward one hour.
///
/// # Errors
///
/// Returns an error if no offset matches even after the shift.
pub fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> AppResult<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            AppError::invalid_input(format!("{naive} does not exist in timezone {}", tz.name()))
        })
}

/// Start of `date` in `tz`, as UTC
///
/// # Errors
///
/// Returns an error if midnight cannot be placed in `tz`.
pub fn local_midnight(date: NaiveDate, tz: Tz) -> AppResult<DateTime<Utc>> {
    local_to_utc(date.and_time(NaiveTime::MIN), tz)
}

/// `[start, end)` of the local day containing `now`
///
/// # Errors
///
/// Returns an error if a boundary cannot be placed in `tz`.
pub fn day_bounds(now: DateTime<Utc>, tz: Tz) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let today = now.with_timezone(&tz).date_naive();
    Ok((local_midnight(today, tz)?, local_midnight(next_day(today)?, tz)?))
}

/// `[monday, next monday)` of the local ISO week containing `now`
///
/// # Errors
///
/// Returns an error if a boundary cannot be placed in `tz`.
pub fn week_bounds(now: DateTime<Utc>, tz: Tz) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let today = now.with_timezone(&tz).date_naive();
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let next_monday = monday + Duration::days(7);
    Ok((local_midnight(monday, tz)?, local_midnight(next_monday, tz)?))
}

/// Render an instant in the user's timezone with its offset
#[must_use]
pub fn format_local(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz)
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn next_day(date: NaiveDate) -> AppResult<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| AppError::invalid_input(format!("No day after {date}")))
}
