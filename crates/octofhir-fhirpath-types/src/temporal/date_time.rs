use super::time::{format_clock, parse_clock};
use super::{
    DateTimePrecision, MAX_YEAR, MIN_YEAR, compare_components, components, equivalent_components,
    truncate,
};
use crate::equality::{Comparison, Equality, Ordered};
use crate::system_types::DataType;
use crate::temporal::{DateValue, TimeValue};
use crate::value::{ForeignNode, Value, impl_value_accessor};
use chrono::{Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use octofhir_fhirpath_diagnostics::{FhirPathError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

static DATE_TIME_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(\d{4})(?:-(\d{2})(?:-(\d{2}))?)?",
        r"(?:T(?:(\d{2})(?::(\d{2})(?::(\d{2})(?:\.(\d+))?)?)?)?)?",
        r"(Z|[+-]\d{2}:\d{2})?$",
    ))
    .expect("valid date/time pattern")
});

/// Largest UTC offset in either direction, 14:00
const MAX_OFFSET_SECONDS: i32 = 14 * 3600;

/// Date and time with year to nanosecond precision and a UTC offset
#[derive(Debug, Clone)]
pub struct DateTimeValue {
    value: NaiveDateTime,
    offset: FixedOffset,
    precision: DateTimePrecision,
    source: Option<ForeignNode>,
}

impl_value_accessor!(DateTimeValue, DataType::DateTime);

/// Offset of the local zone at the given wall-clock time
pub(crate) fn local_offset(value: &NaiveDateTime) -> FixedOffset {
    Local
        .offset_from_local_datetime(value)
        .single()
        .unwrap_or_else(|| *Local::now().offset())
}

impl DateTimeValue {
    /// Create a date/time from a date and a time of day
    ///
    /// Fields below `precision` are reset; without an offset the local zone
    /// applies.
    pub fn new(
        date: NaiveDate,
        time: NaiveTime,
        precision: DateTimePrecision,
        offset: Option<FixedOffset>,
    ) -> Result<Self> {
        let year = date.year();
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(FhirPathError::invalid_component(format!("invalid year: {}", year)));
        }
        if let Some(seconds) = offset
            .map(|o| o.local_minus_utc())
            .filter(|s| s.abs() > MAX_OFFSET_SECONDS)
        {
            return Err(FhirPathError::invalid_offset(seconds));
        }
        let value = truncate(date.and_time(time), precision);
        Ok(match offset {
            Some(offset) => Self::from_parts(value, precision, offset),
            None => Self::from_naive_local(value, precision),
        })
    }

    /// Combine a date and a time value
    ///
    /// The precision is the time's when the date has day precision, otherwise
    /// the date's.
    pub fn from_date_and_time(date: &DateValue, time: &TimeValue, offset: Option<FixedOffset>) -> Result<Self> {
        let precision = if date.precision() == DateTimePrecision::Day {
            time.precision()
        } else {
            date.precision()
        };
        Self::new(date.to_naive_date(), time.to_naive_time(), precision, offset)
    }

    /// Parse a date, optionally followed by `T`, a time and an offset
    ///
    /// An offset (`Z` or `+HH:MM`) is only accepted with a time part.
    pub fn parse(input: &str) -> Result<Self> {
        let caps = DATE_TIME_LITERAL
            .captures(input)
            .ok_or_else(|| FhirPathError::invalid_date_time(input))?;
        let invalid = || FhirPathError::invalid_date_time(input);
        let text = |idx: usize| caps.get(idx).map(|m| m.as_str());
        let number = |idx: usize| text(idx).and_then(|s| s.parse::<u32>().ok());

        let year = number(1).ok_or_else(invalid)? as i32;
        let (month, day, date_precision) = match (number(2), number(3)) {
            (Some(month), Some(day)) => (month, day, DateTimePrecision::Day),
            (Some(month), None) => (month, 1, DateTimePrecision::Month),
            _ => (1, 1, DateTimePrecision::Year),
        };
        let date = DateValue::new(year, month, day, date_precision).map_err(|_| invalid())?;

        let (time, precision) = if text(4).is_some() {
            if date_precision != DateTimePrecision::Day {
                return Err(invalid());
            }
            parse_clock(text(4), text(5), text(6), text(7)).ok_or_else(invalid)?
        } else {
            (NaiveTime::MIN, date_precision)
        };

        let offset = match text(8) {
            None => None,
            Some(_) if !precision.has_time() => return Err(invalid()),
            Some("Z") => Some(FixedOffset::east_opt(0).ok_or_else(invalid)?),
            Some(offset) => Some(parse_offset(offset).ok_or_else(invalid)?),
        };

        Self::new(date.to_naive_date(), time, precision, offset).map_err(|_| invalid())
    }

    pub(crate) fn from_parts(value: NaiveDateTime, precision: DateTimePrecision, offset: FixedOffset) -> Self {
        Self {
            value,
            offset,
            precision,
            source: None,
        }
    }

    pub(crate) fn from_naive_local(value: NaiveDateTime, precision: DateTimePrecision) -> Self {
        Self::from_parts(value, precision, local_offset(&value))
    }

    pub(crate) fn with_naive(&self, value: NaiveDateTime) -> Self {
        Self {
            value,
            offset: self.offset,
            precision: self.precision,
            source: None,
        }
    }

    pub fn year(&self) -> i32 {
        self.value.year()
    }

    pub fn month(&self) -> u32 {
        self.value.month()
    }

    pub fn day(&self) -> u32 {
        self.value.day()
    }

    pub fn hour(&self) -> u32 {
        self.value.hour()
    }

    pub fn minute(&self) -> u32 {
        self.value.minute()
    }

    pub fn second(&self) -> u32 {
        self.value.second()
    }

    pub fn nanosecond(&self) -> u32 {
        self.value.nanosecond()
    }

    pub fn precision(&self) -> DateTimePrecision {
        self.precision
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn to_naive(&self) -> NaiveDateTime {
        self.value
    }

    /// Date part, at most day precision
    pub fn date(&self) -> DateValue {
        DateValue::from_naive(self.value.date(), self.precision)
    }

    /// Time part, at least hour precision
    pub fn time(&self) -> TimeValue {
        TimeValue::from_naive(self.value.time(), self.precision)
    }

    /// Wall-clock value of `other` expressed in this value's offset
    ///
    /// Offsets only matter when both values carry a clock part.
    fn aligned(&self, other: &DateTimeValue) -> NaiveDateTime {
        if self.precision.has_time() && other.precision.has_time() && self.offset != other.offset {
            let shift = i64::from(self.offset.local_minus_utc() - other.offset.local_minus_utc());
            other.value + chrono::Duration::seconds(shift)
        } else {
            other.value
        }
    }

    fn compare_date_time(&self, other: &DateTimeValue) -> Comparison {
        compare_components(
            &components(&self.value),
            self.precision,
            &components(&self.aligned(other)),
            other.precision,
            DateTimePrecision::Year,
        )
    }

    fn equivalent_date_time(&self, other: &DateTimeValue) -> bool {
        equivalent_components(
            &components(&self.value),
            &components(&self.aligned(other)),
            DateTimePrecision::Year,
        )
    }

    /// Lift a date into this value's offset
    fn lift(&self, date: &DateValue) -> DateTimeValue {
        date.to_date_time_with_offset(self.offset)
    }
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    let sign = if text.starts_with('-') { -1 } else { 1 };
    let hours: i32 = text.get(1..3)?.parse().ok()?;
    let minutes: i32 = text.get(4..6)?.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl Equality for DateTimeValue {
    fn equal(&self, other: &Value) -> bool {
        let comparison = match other {
            Value::DateTime(o) => self.compare_date_time(o),
            Value::Date(o) => self.compare_date_time(&self.lift(o)),
            _ => return false,
        };
        comparison == Comparison::Evaluated(Ordering::Equal)
    }

    fn equivalent(&self, other: &Value) -> bool {
        match other {
            Value::DateTime(o) => self.equivalent_date_time(o),
            Value::Date(o) => self.equivalent_date_time(&self.lift(o)),
            _ => false,
        }
    }
}

impl Ordered for DateTimeValue {
    fn compare(&self, other: &Value) -> Comparison {
        match other {
            Value::DateTime(o) => self.compare_date_time(o),
            Value::Date(o) => self.compare_date_time(&self.lift(o)),
            _ => Comparison::Inconvertible,
        }
    }
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T", self.date())?;
        if !self.precision.has_time() {
            return Ok(());
        }
        format_clock(f, &self.value.time(), self.precision)?;
        let seconds = self.offset.local_minus_utc();
        if seconds == 0 {
            write!(f, "Z")
        } else {
            let sign = if seconds < 0 { '-' } else { '+' };
            let seconds = seconds.abs();
            write!(f, "{}{:02}:{:02}", sign, seconds / 3600, (seconds % 3600) / 60)
        }
    }
}
