use super::{
    DateTimePrecision, MAX_YEAR, MIN_YEAR, compare_components, components, equivalent_components,
};
use crate::equality::{Comparison, Equality, Ordered};
use crate::system_types::DataType;
use crate::temporal::DateTimeValue;
use crate::value::{ForeignNode, Value, impl_value_accessor};
use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use octofhir_fhirpath_diagnostics::{FhirPathError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static DATE_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(?:-(\d{2})(?:-(\d{2}))?)?$").expect("valid date pattern"));

/// Date with year, month or day precision
#[derive(Debug, Clone)]
pub struct DateValue {
    date: NaiveDate,
    precision: DateTimePrecision,
    source: Option<ForeignNode>,
}

impl_value_accessor!(DateValue, DataType::Date);

impl DateValue {
    /// Create a date; fields below `precision` are ignored
    pub fn new(year: i32, month: u32, day: u32, precision: DateTimePrecision) -> Result<Self> {
        if precision > DateTimePrecision::Day {
            return Err(FhirPathError::invalid_precision(format!(
                "a date cannot have {} precision",
                precision
            )));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(FhirPathError::invalid_component(format!("invalid year: {}", year)));
        }
        let month = if precision >= DateTimePrecision::Month { month } else { 1 };
        let day = if precision >= DateTimePrecision::Day { day } else { 1 };
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            FhirPathError::invalid_component(format!("invalid date: {:04}-{:02}-{:02}", year, month, day))
        })?;
        Ok(Self {
            date,
            precision,
            source: None,
        })
    }

    /// Parse `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    pub fn parse(input: &str) -> Result<Self> {
        let caps = DATE_LITERAL
            .captures(input)
            .ok_or_else(|| FhirPathError::invalid_date(input))?;
        let field = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<u32>().ok());

        let year = field(1).ok_or_else(|| FhirPathError::invalid_date(input))? as i32;
        let (month, day, precision) = match (field(2), field(3)) {
            (Some(month), Some(day)) => (month, day, DateTimePrecision::Day),
            (Some(month), None) => (month, 1, DateTimePrecision::Month),
            _ => (1, 1, DateTimePrecision::Year),
        };
        Self::new(year, month, day, precision).map_err(|_| FhirPathError::invalid_date(input))
    }

    pub(crate) fn from_naive(date: NaiveDate, precision: DateTimePrecision) -> Self {
        Self {
            date,
            precision: precision.min(DateTimePrecision::Day),
            source: None,
        }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn precision(&self) -> DateTimePrecision {
        self.precision
    }

    pub fn to_naive_date(&self) -> NaiveDate {
        self.date
    }

    pub(crate) fn to_naive(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN)
    }

    /// Lift into a date/time in the local zone, keeping the precision
    pub fn to_date_time(&self) -> DateTimeValue {
        DateTimeValue::from_naive_local(self.to_naive(), self.precision)
    }

    /// Lift into a date/time with the given offset, keeping the precision
    pub fn to_date_time_with_offset(&self, offset: FixedOffset) -> DateTimeValue {
        DateTimeValue::from_parts(self.to_naive(), self.precision, offset)
    }

    fn compare_date(&self, other: &DateValue) -> Comparison {
        compare_components(
            &components(&self.to_naive()),
            self.precision,
            &components(&other.to_naive()),
            other.precision,
            DateTimePrecision::Year,
        )
    }
}

impl Equality for DateValue {
    fn equal(&self, other: &Value) -> bool {
        match other {
            Value::Date(o) => self.compare_date(o) == Comparison::Evaluated(std::cmp::Ordering::Equal),
            Value::DateTime(o) => o.equal(&Value::Date(self.clone())),
            _ => false,
        }
    }

    fn equivalent(&self, other: &Value) -> bool {
        match other {
            Value::Date(o) => equivalent_components(
                &components(&self.to_naive()),
                &components(&o.to_naive()),
                DateTimePrecision::Year,
            ),
            Value::DateTime(o) => o.equivalent(&Value::Date(self.clone())),
            _ => false,
        }
    }
}

impl Ordered for DateValue {
    fn compare(&self, other: &Value) -> Comparison {
        match other {
            Value::Date(o) => self.compare_date(o),
            Value::DateTime(o) => o.compare(&Value::Date(self.clone())).reverse(),
            _ => Comparison::Inconvertible,
        }
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year())?;
        if self.precision >= DateTimePrecision::Month {
            write!(f, "-{:02}", self.month())?;
        }
        if self.precision >= DateTimePrecision::Day {
            write!(f, "-{:02}", self.day())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_diagnostics::ErrorKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::cmp::Ordering;

    #[rstest]
    #[case("2019", DateTimePrecision::Year)]
    #[case("2019-03", DateTimePrecision::Month)]
    #[case("2019-03-14", DateTimePrecision::Day)]
    fn test_parse_precision(#[case] input: &str, #[case] precision: DateTimePrecision) {
        let date = DateValue::parse(input).unwrap();
        assert_eq!(date.precision(), precision);
        assert_eq!(date.to_string(), input);
    }

    #[rstest]
    #[case("19")]
    #[case("2019-13")]
    #[case("2019-02-30")]
    #[case("2019-1-1")]
    #[case("2019-01-01T")]
    fn test_parse_rejects(#[case] input: &str) {
        assert_eq!(DateValue::parse(input).unwrap_err().kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_constructor_zeroes_lower_fields() {
        let date = DateValue::new(2020, 7, 31, DateTimePrecision::Year).unwrap();
        assert_eq!((date.month(), date.day()), (1, 1));
        assert!(DateValue::new(2020, 1, 1, DateTimePrecision::Hour).is_err());
        assert!(DateValue::new(10000, 1, 1, DateTimePrecision::Year).is_err());
    }

    #[test]
    fn test_precision_aware_equality() {
        let year = Value::Date(DateValue::parse("2019").unwrap());
        let day = Value::Date(DateValue::parse("2019-01-01").unwrap());
        assert!(!year.equal(&day));
        assert!(year.equivalent(&day));
        assert_eq!(year.compare(&day), Comparison::Empty);
        assert!(day.equal(&Value::Date(DateValue::parse("2019-01-01").unwrap())));
    }

    #[test]
    fn test_ordering_short_circuits() {
        let a = Value::Date(DateValue::parse("2018").unwrap());
        let b = Value::Date(DateValue::parse("2019-06-01").unwrap());
        assert_eq!(a.compare(&b), Comparison::Evaluated(Ordering::Less));
        assert_eq!(b.compare(&a), Comparison::Evaluated(Ordering::Greater));
    }
}
