//! Temporal value family
//!
//! Date, time and date/time values carry an explicit declared precision.
//! Fields below that precision are defined as their minimum value (month and
//! day are 1, clock fields are 0), so projections are always total.
//!
//! Comparison walks the fields in descending significance. When the operands
//! have different precisions and every shared field is equal, the order is
//! undecidable ([`Comparison::Empty`]) unless both are at second precision or
//! finer, in which case a missing sub-second part counts as zero.

mod arithmetic;
mod date;
mod date_time;
mod time;

pub use date::DateValue;
pub use date_time::DateTimeValue;
pub use time::TimeValue;

use crate::equality::Comparison;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use octofhir_fhirpath_diagnostics::{FhirPathError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Precision for temporal values
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateTimePrecision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Nanosecond,
}

impl DateTimePrecision {
    pub const ALL: [DateTimePrecision; 7] = [
        Self::Year,
        Self::Month,
        Self::Day,
        Self::Hour,
        Self::Minute,
        Self::Second,
        Self::Nanosecond,
    ];

    /// Position in [`DateTimePrecision::ALL`]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Check whether this precision carries a clock part
    pub const fn has_time(self) -> bool {
        matches!(self, Self::Hour | Self::Minute | Self::Second | Self::Nanosecond)
    }
}

impl fmt::Display for DateTimePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year => write!(f, "year"),
            Self::Month => write!(f, "month"),
            Self::Day => write!(f, "day"),
            Self::Hour => write!(f, "hour"),
            Self::Minute => write!(f, "minute"),
            Self::Second => write!(f, "second"),
            Self::Nanosecond => write!(f, "nanosecond"),
        }
    }
}

pub(crate) const MIN_YEAR: i32 = 0;
pub(crate) const MAX_YEAR: i32 = 9999;

/// Calendar and clock fields, most significant first
pub(crate) type Components = [i64; 7];

pub(crate) fn components(value: &NaiveDateTime) -> Components {
    [
        i64::from(value.year()),
        i64::from(value.month()),
        i64::from(value.day()),
        i64::from(value.hour()),
        i64::from(value.minute()),
        i64::from(value.second()),
        i64::from(value.nanosecond()),
    ]
}

/// Field-by-field comparison starting at `first`
pub(crate) fn compare_components(
    left: &Components,
    left_precision: DateTimePrecision,
    right: &Components,
    right_precision: DateTimePrecision,
    first: DateTimePrecision,
) -> Comparison {
    let common = left_precision.min(right_precision);
    let last = if left_precision == right_precision
        || (left_precision >= DateTimePrecision::Second
            && right_precision >= DateTimePrecision::Second)
    {
        left_precision.max(right_precision)
    } else {
        common
    };

    for idx in first.index()..=last.index() {
        match left[idx].cmp(&right[idx]) {
            Ordering::Equal => continue,
            ordering => return Comparison::Evaluated(ordering),
        }
    }

    if last == common && left_precision != right_precision {
        Comparison::Empty
    } else {
        Comparison::Evaluated(Ordering::Equal)
    }
}

/// Equality of the full projected fields, ignoring declared precision
pub(crate) fn equivalent_components(
    left: &Components,
    right: &Components,
    first: DateTimePrecision,
) -> bool {
    left[first.index()..] == right[first.index()..]
}

/// Reset every field below `precision` to its minimum value
pub(crate) fn truncate(value: NaiveDateTime, precision: DateTimePrecision) -> NaiveDateTime {
    let date = value.date();
    let month = if precision >= DateTimePrecision::Month { date.month() } else { 1 };
    let day = if precision >= DateTimePrecision::Day { date.day() } else { 1 };
    let hour = if precision >= DateTimePrecision::Hour { value.hour() } else { 0 };
    let minute = if precision >= DateTimePrecision::Minute { value.minute() } else { 0 };
    let second = if precision >= DateTimePrecision::Second { value.second() } else { 0 };
    let nano = if precision >= DateTimePrecision::Nanosecond { value.nanosecond() } else { 0 };

    NaiveDate::from_ymd_opt(date.year(), month, day)
        .and_then(|d| d.and_hms_nano_opt(hour, minute, second, nano))
        .unwrap_or(value)
}

pub(crate) fn validate_year(year: i64) -> Result<()> {
    if year < i64::from(MIN_YEAR) || year > i64::from(MAX_YEAR) {
        return Err(FhirPathError::year_out_of_range(year));
    }
    Ok(())
}

/// Parse a fractional-second digit string into nanoseconds
///
/// Digits beyond the ninth are truncated.
pub(crate) fn parse_fraction(digits: &str) -> u32 {
    let mut nanos = 0_u32;
    for (idx, c) in digits.chars().take(9).enumerate() {
        let digit = c.to_digit(10).unwrap_or(0);
        nanos += digit * 10_u32.pow(8 - idx as u32);
    }
    nanos
}

/// Render a nanosecond fraction with at least millisecond digits
pub(crate) fn format_fraction(nanos: u32) -> String {
    let digits = format!("{:09}", nanos);
    let trimmed = digits.trim_end_matches('0');
    if trimmed.len() < 3 {
        digits[..3].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Midnight, the anchor date-less times are projected onto
pub(crate) fn anchor_date() -> NaiveDate {
    NaiveDate::default()
}

pub(crate) fn time_components(time: &NaiveTime) -> Components {
    components(&anchor_date().and_time(*time))
}
