use super::{
    DateTimePrecision, compare_components, equivalent_components, format_fraction, parse_fraction,
    time_components,
};
use crate::equality::{Comparison, Equality, Ordered};
use crate::system_types::DataType;
use crate::value::{ForeignNode, Value, impl_value_accessor};
use chrono::{NaiveTime, Timelike};
use octofhir_fhirpath_diagnostics::{FhirPathError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

static TIME_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2})(?::(\d{2})(?::(\d{2})(?:\.(\d+))?)?)?$").expect("valid time pattern")
});

pub(crate) const NANOS_PER_DAY: i64 = 86_400_000_000_000;

/// Time of day with hour to nanosecond precision
#[derive(Debug, Clone)]
pub struct TimeValue {
    time: NaiveTime,
    precision: DateTimePrecision,
    source: Option<ForeignNode>,
}

impl_value_accessor!(TimeValue, DataType::Time);

impl TimeValue {
    /// Create a time; fields below `precision` are ignored
    pub fn new(
        hour: u32,
        minute: u32,
        second: u32,
        nanosecond: u32,
        precision: DateTimePrecision,
    ) -> Result<Self> {
        if precision < DateTimePrecision::Hour {
            return Err(FhirPathError::invalid_precision(format!(
                "a time cannot have {} precision",
                precision
            )));
        }
        let minute = if precision >= DateTimePrecision::Minute { minute } else { 0 };
        let second = if precision >= DateTimePrecision::Second { second } else { 0 };
        let nanosecond = if precision >= DateTimePrecision::Nanosecond { nanosecond } else { 0 };
        if second > 59 || nanosecond > 999_999_999 {
            return Err(FhirPathError::invalid_component(format!(
                "invalid time: {:02}:{:02}:{:02}.{:09}",
                hour, minute, second, nanosecond
            )));
        }
        let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanosecond).ok_or_else(|| {
            FhirPathError::invalid_component(format!("invalid time: {:02}:{:02}:{:02}", hour, minute, second))
        })?;
        Ok(Self {
            time,
            precision,
            source: None,
        })
    }

    /// Parse `HH`, `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fffffffff`
    ///
    /// Fractional digits beyond the ninth are truncated.
    pub fn parse(input: &str) -> Result<Self> {
        let caps = TIME_LITERAL
            .captures(input)
            .ok_or_else(|| FhirPathError::invalid_time(input))?;
        let (time, precision) = parse_clock(
            caps.get(1).map(|m| m.as_str()),
            caps.get(2).map(|m| m.as_str()),
            caps.get(3).map(|m| m.as_str()),
            caps.get(4).map(|m| m.as_str()),
        )
        .ok_or_else(|| FhirPathError::invalid_time(input))?;
        Ok(Self::from_naive(time, precision))
    }

    pub(crate) fn from_naive(time: NaiveTime, precision: DateTimePrecision) -> Self {
        Self {
            time,
            precision: precision.max(DateTimePrecision::Hour),
            source: None,
        }
    }

    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    pub fn minute(&self) -> u32 {
        self.time.minute()
    }

    pub fn second(&self) -> u32 {
        self.time.second()
    }

    pub fn nanosecond(&self) -> u32 {
        self.time.nanosecond()
    }

    pub fn precision(&self) -> DateTimePrecision {
        self.precision
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        self.time
    }

    /// Nanoseconds since midnight
    pub fn nanos_of_day(&self) -> i64 {
        i64::from(self.time.num_seconds_from_midnight()) * 1_000_000_000
            + i64::from(self.time.nanosecond())
    }

    fn compare_time(&self, other: &TimeValue) -> Comparison {
        compare_components(
            &time_components(&self.time),
            self.precision,
            &time_components(&other.time),
            other.precision,
            DateTimePrecision::Hour,
        )
    }
}

/// Build a clock time from literal captures, returning its precision
pub(crate) fn parse_clock(
    hour: Option<&str>,
    minute: Option<&str>,
    second: Option<&str>,
    fraction: Option<&str>,
) -> Option<(NaiveTime, DateTimePrecision)> {
    let number = |s: Option<&str>| s.map(|s| s.parse::<u32>().ok());
    let hour = number(hour)??;
    let (minute, second, nanos, precision) = match (number(minute), number(second), fraction) {
        (Some(minute), Some(second), Some(fraction)) => {
            (minute?, second?, parse_fraction(fraction), DateTimePrecision::Nanosecond)
        }
        (Some(minute), Some(second), None) => (minute?, second?, 0, DateTimePrecision::Second),
        (Some(minute), None, _) => (minute?, 0, 0, DateTimePrecision::Minute),
        _ => (0, 0, 0, DateTimePrecision::Hour),
    };
    if second > 59 {
        return None;
    }
    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos).map(|time| (time, precision))
}

/// Render a clock time at the given precision
pub(crate) fn format_clock(
    f: &mut fmt::Formatter<'_>,
    time: &NaiveTime,
    precision: DateTimePrecision,
) -> fmt::Result {
    write!(f, "{:02}", time.hour())?;
    if precision >= DateTimePrecision::Minute {
        write!(f, ":{:02}", time.minute())?;
    }
    if precision >= DateTimePrecision::Second {
        write!(f, ":{:02}", time.second())?;
    }
    if precision >= DateTimePrecision::Nanosecond {
        write!(f, ".{}", format_fraction(time.nanosecond()))?;
    }
    Ok(())
}

impl Equality for TimeValue {
    fn equal(&self, other: &Value) -> bool {
        matches!(other, Value::Time(o) if self.compare_time(o) == Comparison::Evaluated(Ordering::Equal))
    }

    fn equivalent(&self, other: &Value) -> bool {
        matches!(other, Value::Time(o) if equivalent_components(
            &time_components(&self.time),
            &time_components(&o.time),
            DateTimePrecision::Hour,
        ))
    }
}

impl Ordered for TimeValue {
    fn compare(&self, other: &Value) -> Comparison {
        match other {
            Value::Time(o) => self.compare_time(o),
            _ => Comparison::Inconvertible,
        }
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_clock(f, &self.time, self.precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::DateValue;
    use octofhir_fhirpath_diagnostics::ErrorKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn time(s: &str) -> Value {
        Value::Time(TimeValue::parse(s).unwrap())
    }

    #[rstest]
    #[case("13", DateTimePrecision::Hour, "13")]
    #[case("13:28", DateTimePrecision::Minute, "13:28")]
    #[case("13:28:17", DateTimePrecision::Second, "13:28:17")]
    #[case("13:28:17.5", DateTimePrecision::Nanosecond, "13:28:17.500")]
    #[case("13:28:17.1234567891", DateTimePrecision::Nanosecond, "13:28:17.123456789")]
    fn test_parse(#[case] input: &str, #[case] precision: DateTimePrecision, #[case] rendered: &str) {
        let value = TimeValue::parse(input).unwrap();
        assert_eq!(value.precision(), precision);
        assert_eq!(value.to_string(), rendered);
    }

    #[rstest]
    #[case("24")]
    #[case("12:60")]
    #[case("12:30:60")]
    #[case("1:30")]
    #[case("12:30:00.")]
    fn test_parse_rejects(#[case] input: &str) {
        assert_eq!(TimeValue::parse(input).unwrap_err().kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_second_nanosecond_boundary_collapses() {
        assert!(time("13:28:17").equal(&time("13:28:17.000")));
        assert!(time("13:28:17").equivalent(&time("13:28:17.000")));
        assert!(!time("13:28:00").equal(&time("13:28")));
        assert!(time("13:28:00").equivalent(&time("13:28")));
        assert_eq!(time("13:28:00").compare(&time("13:28")), Comparison::Empty);
    }

    #[test]
    fn test_ordering() {
        assert_eq!(
            time("13:28:17.250").compare(&time("13:28:17")),
            Comparison::Evaluated(Ordering::Greater)
        );
        assert_eq!(time("09").compare(&time("10:15")), Comparison::Evaluated(Ordering::Less));
    }

    #[test]
    fn test_time_is_not_a_date() {
        let date = Value::Date(DateValue::parse("2019-01-01").unwrap());
        assert!(!time("00:00").equivalent(&date));
        assert_eq!(time("00:00").compare(&date), Comparison::Inconvertible);
    }

    #[test]
    fn test_constructor() {
        let value = TimeValue::new(10, 30, 45, 5, DateTimePrecision::Minute).unwrap();
        assert_eq!(value.second(), 0);
        assert_eq!(value.nanosecond(), 0);
        assert_eq!(value.nanos_of_day(), 37_800_000_000_000);
        assert!(TimeValue::new(10, 0, 0, 0, DateTimePrecision::Day).is_err());
        assert!(TimeValue::new(25, 0, 0, 0, DateTimePrecision::Hour).is_err());
    }
}
