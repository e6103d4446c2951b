//! Adding calendar durations to temporal values

use super::time::NANOS_PER_DAY;
use super::{DateTimePrecision, DateTimeValue, DateValue, TimeValue, validate_year};
use crate::quantity::QuantityValue;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use octofhir_fhirpath_diagnostics::{FhirPathError, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Calendar and clock parts of a duration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Shift {
    months: i64,
    nanos: i64,
}

/// Nominal length of one unit of a precision tier
fn tier_nanos(precision: DateTimePrecision) -> i64 {
    const DAY: i64 = NANOS_PER_DAY;
    match precision {
        DateTimePrecision::Year => 365 * DAY,
        DateTimePrecision::Month => 30 * DAY,
        DateTimePrecision::Day => DAY,
        DateTimePrecision::Hour => 3_600 * NANOS_PER_SECOND,
        DateTimePrecision::Minute => 60 * NANOS_PER_SECOND,
        DateTimePrecision::Second => NANOS_PER_SECOND,
        DateTimePrecision::Nanosecond => 1,
    }
}

/// Precision tier of a calendar duration unit and its length in nanoseconds
fn unit_tier(quantity: &QuantityValue) -> Result<(DateTimePrecision, i64)> {
    let unit = quantity.unit();
    if !unit.is_calendar_duration_unit() {
        return Err(FhirPathError::not_calendar_unit(unit.code()));
    }
    let tier = match unit.definition().ucum() {
        "a" => (DateTimePrecision::Year, tier_nanos(DateTimePrecision::Year)),
        "mo" => (DateTimePrecision::Month, tier_nanos(DateTimePrecision::Month)),
        "wk" => (DateTimePrecision::Day, 7 * NANOS_PER_DAY),
        "d" => (DateTimePrecision::Day, NANOS_PER_DAY),
        "h" => (DateTimePrecision::Hour, tier_nanos(DateTimePrecision::Hour)),
        "min" => (DateTimePrecision::Minute, tier_nanos(DateTimePrecision::Minute)),
        "s" => (DateTimePrecision::Second, NANOS_PER_SECOND),
        "ms" => (DateTimePrecision::Nanosecond, 1_000_000),
        "us" => (DateTimePrecision::Nanosecond, 1_000),
        "ns" => (DateTimePrecision::Nanosecond, 1),
        code => return Err(FhirPathError::not_calendar_unit(code)),
    };
    Ok(tier)
}

/// Express `quantity` as a shift applicable to a value of `precision`
///
/// Whole years and months are calendar shifts. Everything else goes through
/// nanoseconds and is truncated to whole units of `precision`.
fn shift_for(quantity: &QuantityValue, precision: DateTimePrecision) -> Result<(DateTimePrecision, Shift)> {
    let (tier, unit_nanos) = unit_tier(quantity)?;
    let magnitude = quantity.magnitude();
    let overflow = || FhirPathError::overflow("temporal addition");

    if matches!(tier, DateTimePrecision::Year | DateTimePrecision::Month) && magnitude.fract().is_zero() {
        let per_unit = if tier == DateTimePrecision::Year { 12 } else { 1 };
        let months = magnitude
            .to_i64()
            .and_then(|m| m.checked_mul(per_unit))
            .ok_or_else(overflow)?;
        let months = if precision == DateTimePrecision::Year {
            months / 12 * 12
        } else {
            months
        };
        return Ok((tier, Shift { months, nanos: 0 }));
    }

    let total = magnitude
        .checked_mul(Decimal::from(unit_nanos))
        .ok_or_else(overflow)?;
    let per_unit = tier_nanos(precision);
    let units = total
        .checked_div(Decimal::from(per_unit))
        .ok_or_else(overflow)?
        .trunc()
        .to_i64()
        .ok_or_else(overflow)?;

    let shift = match precision {
        DateTimePrecision::Year => Shift {
            months: units.checked_mul(12).ok_or_else(overflow)?,
            nanos: 0,
        },
        DateTimePrecision::Month => Shift { months: units, nanos: 0 },
        _ => Shift {
            months: 0,
            nanos: units.checked_mul(per_unit).ok_or_else(overflow)?,
        },
    };
    Ok((tier, shift))
}

/// Apply a shift, clamping the day to the length of the target month
fn apply(value: NaiveDateTime, shift: Shift) -> Result<NaiveDateTime> {
    let mut value = value;
    if shift.months != 0 {
        let total = (i64::from(value.year()) * 12 + i64::from(value.month0()))
            .checked_add(shift.months)
            .ok_or_else(|| FhirPathError::overflow("temporal addition"))?;
        let year = total.div_euclid(12);
        validate_year(year)?;
        let month = total.rem_euclid(12) as u32 + 1;
        let date = (1..=value.day())
            .rev()
            .find_map(|day| NaiveDate::from_ymd_opt(year as i32, month, day))
            .ok_or_else(|| FhirPathError::year_out_of_range(year))?;
        value = date.and_time(value.time());
    }
    if shift.nanos != 0 {
        value = value
            .checked_add_signed(TimeDelta::nanoseconds(shift.nanos))
            .ok_or_else(|| FhirPathError::overflow("temporal addition"))?;
        validate_year(i64::from(value.year()))?;
    }
    Ok(value)
}

impl DateValue {
    /// Add a calendar duration
    pub fn add_quantity(&self, quantity: &QuantityValue) -> Result<DateValue> {
        let (_, shift) = shift_for(quantity, self.precision())?;
        let value = apply(self.to_naive(), shift)?;
        Ok(DateValue::from_naive(value.date(), self.precision()))
    }

    /// Subtract a calendar duration
    pub fn subtract_quantity(&self, quantity: &QuantityValue) -> Result<DateValue> {
        self.add_quantity(&quantity.negate())
    }
}

impl DateTimeValue {
    /// Add a calendar duration; the offset and precision are kept
    pub fn add_quantity(&self, quantity: &QuantityValue) -> Result<DateTimeValue> {
        let (_, shift) = shift_for(quantity, self.precision())?;
        Ok(self.with_naive(apply(self.to_naive(), shift)?))
    }

    /// Subtract a calendar duration
    pub fn subtract_quantity(&self, quantity: &QuantityValue) -> Result<DateTimeValue> {
        self.add_quantity(&quantity.negate())
    }
}

impl TimeValue {
    /// Add a clock duration
    ///
    /// Fails with an invalid result for day-or-larger units and when the
    /// result would leave the current day.
    pub fn add_quantity(&self, quantity: &QuantityValue) -> Result<TimeValue> {
        let (tier, shift) = shift_for(quantity, self.precision())?;
        if tier <= DateTimePrecision::Day {
            return Err(FhirPathError::day_boundary_crossed());
        }
        let nanos = self
            .nanos_of_day()
            .checked_add(shift.nanos)
            .filter(|n| (0..NANOS_PER_DAY).contains(n))
            .ok_or_else(FhirPathError::day_boundary_crossed)?;
        let time = NaiveTime::from_num_seconds_from_midnight_opt(
            (nanos / NANOS_PER_SECOND) as u32,
            (nanos % NANOS_PER_SECOND) as u32,
        )
        .ok_or_else(FhirPathError::day_boundary_crossed)?;
        Ok(TimeValue::from_naive(time, self.precision()))
    }

    /// Subtract a clock duration
    pub fn subtract_quantity(&self, quantity: &QuantityValue) -> Result<TimeValue> {
        self.add_quantity(&quantity.negate())
    }
}
