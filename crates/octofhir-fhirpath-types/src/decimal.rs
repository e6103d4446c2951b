//! Decimal numeric kernel
//!
//! Decimals keep their declared scale (`1.50` stays `1.50`). Operations whose
//! result is undefined (division by zero, logarithm of a non-positive number,
//! square root of a negative number) yield `Ok(None)`; results that do not fit
//! the 96-bit significand fail with an overflow error.

use crate::equality::{Comparison, Equality, Ordered};
use crate::system_types::DataType;
use crate::value::{ForeignNode, Value, impl_value_accessor};
use octofhir_fhirpath_diagnostics::{FhirPathError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

static DECIMAL_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(?:\.\d+)?$").expect("valid decimal pattern"));

/// Arithmetic operator recognized by [`Value::calc`](crate::Value::calc)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    /// `+`
    Addition,
    /// `-`
    Subtraction,
    /// `*`
    Multiplication,
    /// `/`
    Division,
    /// `div`
    Div,
    /// `mod`
    Mod,
}

impl ArithmeticOp {
    /// Parse an operator symbol
    pub fn from_symbol(symbol: &str) -> Result<Self> {
        match symbol {
            "+" => Ok(Self::Addition),
            "-" => Ok(Self::Subtraction),
            "*" => Ok(Self::Multiplication),
            "/" => Ok(Self::Division),
            "div" => Ok(Self::Div),
            "mod" => Ok(Self::Mod),
            other => Err(FhirPathError::unknown_operator(other)),
        }
    }

    /// Operator symbol
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Addition => "+",
            Self::Subtraction => "-",
            Self::Multiplication => "*",
            Self::Division => "/",
            Self::Div => "div",
            Self::Mod => "mod",
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Decimal value
#[derive(Debug, Clone)]
pub struct DecimalValue {
    value: Decimal,
    source: Option<ForeignNode>,
}

impl_value_accessor!(DecimalValue, DataType::Decimal);

impl DecimalValue {
    pub fn new(value: Decimal) -> Self {
        Self { value, source: None }
    }

    /// Parse a decimal literal (`[+-]digits[.digits]`)
    pub fn parse(input: &str) -> Result<Self> {
        if !DECIMAL_LITERAL.is_match(input) {
            return Err(FhirPathError::invalid_decimal(input));
        }
        Decimal::from_str(input)
            .map(Self::new)
            .map_err(|_| FhirPathError::invalid_decimal(input))
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Number of declared fractional digits
    pub fn precision(&self) -> u32 {
        self.value.scale()
    }

    pub fn is_one(&self) -> bool {
        self.value == Decimal::ONE
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Check for a non-zero fractional part
    pub fn has_fraction(&self) -> bool {
        !self.value.fract().is_zero()
    }

    /// Integer value, when there is no fractional part and it fits in 32 bits
    pub fn to_integer(&self) -> Option<i32> {
        if self.has_fraction() {
            return None;
        }
        self.value.to_i32()
    }

    pub fn add(&self, other: &DecimalValue) -> Result<DecimalValue> {
        checked(self.value.checked_add(other.value), "addition")
    }

    pub fn subtract(&self, other: &DecimalValue) -> Result<DecimalValue> {
        checked(self.value.checked_sub(other.value), "subtraction")
    }

    pub fn multiply(&self, other: &DecimalValue) -> Result<DecimalValue> {
        checked(self.value.checked_mul(other.value), "multiplication")
    }

    /// Division; `Ok(None)` when dividing by zero
    pub fn divide(&self, other: &DecimalValue) -> Result<Option<DecimalValue>> {
        if other.is_zero() {
            return Ok(None);
        }
        checked(self.value.checked_div(other.value), "division").map(Some)
    }

    /// Truncated division; `Ok(None)` when dividing by zero
    pub fn div(&self, other: &DecimalValue) -> Result<Option<DecimalValue>> {
        if other.is_zero() {
            return Ok(None);
        }
        let quotient = checked(self.value.checked_div(other.value), "div")?;
        Ok(Some(DecimalValue::new(quotient.value.trunc())))
    }

    /// Remainder of truncated division; `Ok(None)` when dividing by zero
    pub fn modulo(&self, other: &DecimalValue) -> Result<Option<DecimalValue>> {
        if other.is_zero() {
            return Ok(None);
        }
        checked(self.value.checked_rem(other.value), "mod").map(Some)
    }

    /// Apply an arithmetic operator
    pub fn calc(&self, other: &DecimalValue, op: ArithmeticOp) -> Result<Option<DecimalValue>> {
        match op {
            ArithmeticOp::Addition => self.add(other).map(Some),
            ArithmeticOp::Subtraction => self.subtract(other).map(Some),
            ArithmeticOp::Multiplication => self.multiply(other).map(Some),
            ArithmeticOp::Division => self.divide(other),
            ArithmeticOp::Div => self.div(other),
            ArithmeticOp::Mod => self.modulo(other),
        }
    }

    pub fn negate(&self) -> DecimalValue {
        DecimalValue::new(-self.value)
    }

    pub fn abs(&self) -> DecimalValue {
        DecimalValue::new(self.value.abs())
    }

    /// Round half away from zero to `precision` fractional digits
    pub fn round(&self, precision: i32) -> Result<DecimalValue> {
        let dp = fractional_digits(precision)?;
        Ok(DecimalValue::new(
            self.value
                .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        ))
    }

    /// Drop fractional digits beyond `precision`
    pub fn truncate(&self, precision: i32) -> Result<DecimalValue> {
        let dp = fractional_digits(precision)?;
        Ok(DecimalValue::new(
            self.value.round_dp_with_strategy(dp, RoundingStrategy::ToZero),
        ))
    }

    pub fn ceiling(&self) -> DecimalValue {
        DecimalValue::new(self.value.ceil())
    }

    pub fn floor(&self) -> DecimalValue {
        DecimalValue::new(self.value.floor())
    }

    /// e raised to this value
    pub fn exp(&self) -> Result<DecimalValue> {
        checked(self.value.checked_exp(), "exp")
    }

    /// Natural logarithm; `Ok(None)` for non-positive values
    pub fn ln(&self) -> Result<Option<DecimalValue>> {
        if self.value <= Decimal::ZERO {
            return Ok(None);
        }
        checked(self.value.checked_ln(), "ln").map(Some)
    }

    /// Logarithm to `base`; `Ok(None)` when either operand is non-positive or
    /// the base is one
    pub fn log(&self, base: &DecimalValue) -> Result<Option<DecimalValue>> {
        if base.is_one() {
            return Ok(None);
        }
        match (self.ln()?, base.ln()?) {
            (Some(value), Some(base)) => value.divide(&base),
            _ => Ok(None),
        }
    }

    /// Raise to `exponent`; `Ok(None)` when the result is not a real number
    pub fn power(&self, exponent: &DecimalValue) -> Result<Option<DecimalValue>> {
        if self.is_zero() {
            return Ok(match exponent.value.cmp(&Decimal::ZERO) {
                Ordering::Less => None,
                Ordering::Equal => Some(DecimalValue::new(Decimal::ONE)),
                Ordering::Greater => Some(DecimalValue::new(Decimal::ZERO)),
            });
        }
        if !exponent.has_fraction() {
            let exp = exponent
                .value
                .to_i64()
                .ok_or_else(|| FhirPathError::overflow("power"))?;
            return checked(self.value.checked_powi(exp), "power").map(Some);
        }
        if self.value.is_sign_negative() {
            return Ok(None);
        }
        checked(self.value.checked_powd(exponent.value), "power").map(Some)
    }

    /// Square root; `Ok(None)` for negative values
    pub fn sqrt(&self) -> Option<DecimalValue> {
        if self.value.is_sign_negative() && !self.is_zero() {
            return None;
        }
        self.value.sqrt().map(DecimalValue::new)
    }

    /// Numeric ordering
    pub fn compare_decimal(&self, other: &DecimalValue) -> Ordering {
        self.value.cmp(&other.value)
    }
}

fn checked(value: Option<Decimal>, operation: &str) -> Result<DecimalValue> {
    value
        .map(DecimalValue::new)
        .ok_or_else(|| FhirPathError::overflow(operation))
}

fn fractional_digits(precision: i32) -> Result<u32> {
    u32::try_from(precision).map_err(|_| FhirPathError::negative_precision(precision))
}

/// Compare two decimals rounded half away from zero to the smaller scale
pub(crate) fn equivalent_decimals(a: Decimal, b: Decimal) -> bool {
    let scale = a.scale().min(b.scale());
    a.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
        == b.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

impl Equality for DecimalValue {
    fn equal(&self, other: &Value) -> bool {
        match other {
            Value::Decimal(o) => o.value == self.value,
            Value::Integer(o) => Decimal::from(o.value()) == self.value,
            Value::Quantity(o) => o.equal(&Value::Decimal(self.clone())),
            _ => false,
        }
    }

    fn equivalent(&self, other: &Value) -> bool {
        match other {
            Value::Decimal(o) => equivalent_decimals(self.value, o.value),
            Value::Integer(o) => equivalent_decimals(self.value, Decimal::from(o.value())),
            Value::Quantity(o) => o.equivalent(&Value::Decimal(self.clone())),
            _ => false,
        }
    }
}

impl Ordered for DecimalValue {
    fn compare(&self, other: &Value) -> Comparison {
        match other {
            Value::Decimal(o) => Comparison::Evaluated(self.compare_decimal(o)),
            Value::Integer(o) => Comparison::Evaluated(self.value.cmp(&Decimal::from(o.value()))),
            Value::Quantity(o) => o.compare(&Value::Decimal(self.clone())).reverse(),
            _ => Comparison::Inconvertible,
        }
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<Decimal> for DecimalValue {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_diagnostics::ErrorKind;
    use rstest::rstest;

    fn d(s: &str) -> DecimalValue {
        DecimalValue::parse(s).unwrap()
    }

    #[rstest]
    #[case(ArithmeticOp::Division)]
    #[case(ArithmeticOp::Div)]
    #[case(ArithmeticOp::Mod)]
    fn test_zero_divisor_is_no_result(#[case] op: ArithmeticOp) {
        assert!(d("150.9").calc(&d("0"), op).unwrap().is_none());
        assert!(d("150.9").calc(&d("0.00"), op).unwrap().is_none());
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(d("1.5").add(&d("2.25")).unwrap().value(), Decimal::new(375, 2));
        assert_eq!(d("1.5").subtract(&d("2")).unwrap().value(), Decimal::new(-5, 1));
        assert_eq!(d("7").div(&d("2")).unwrap().unwrap().value(), Decimal::new(3, 0));
        assert_eq!(d("-7").div(&d("2")).unwrap().unwrap().value(), Decimal::new(-3, 0));
        assert_eq!(d("5.5").modulo(&d("0.7")).unwrap().unwrap().value(), Decimal::new(6, 1));
        assert_eq!(d("10").divide(&d("4")).unwrap().unwrap().value(), Decimal::new(25, 1));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let max = DecimalValue::new(Decimal::MAX);
        let err = max.add(&max).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[rstest]
    #[case("3.14159", 2, "3.14")]
    #[case("2.5", 0, "3")]
    #[case("-2.5", 0, "-3")]
    #[case("1.005", 2, "1.01")]
    fn test_round_half_away_from_zero(#[case] input: &str, #[case] dp: i32, #[case] expected: &str) {
        assert_eq!(d(input).round(dp).unwrap().to_string(), expected);
    }

    #[test]
    fn test_negative_precision_is_usage_error() {
        assert_eq!(d("1.5").round(-1).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(d("1.5").truncate(-2).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_truncate_ceiling_floor() {
        assert_eq!(d("-1.57").truncate(1).unwrap().to_string(), "-1.5");
        assert_eq!(d("1.1").ceiling().value(), Decimal::new(2, 0));
        assert_eq!(d("-1.1").floor().value(), Decimal::new(-2, 0));
    }

    #[test]
    fn test_domain_violations_are_no_result() {
        assert!(d("0").ln().unwrap().is_none());
        assert!(d("-1").ln().unwrap().is_none());
        assert!(d("-4").sqrt().is_none());
        assert!(d("8").log(&d("1")).unwrap().is_none());
        assert!(d("-8").power(&d("0.5")).unwrap().is_none());
        assert!(d("0").power(&d("-1")).unwrap().is_none());
    }

    #[test]
    fn test_math_functions() {
        assert_eq!(d("16").sqrt().unwrap().value(), Decimal::new(4, 0));
        assert_eq!(d("2").power(&d("10")).unwrap().unwrap().value(), Decimal::new(1024, 0));
        assert_eq!(d("-2").power(&d("3")).unwrap().unwrap().value(), Decimal::new(-8, 0));
        let log = d("100").log(&d("10")).unwrap().unwrap();
        assert_eq!(log.round(6).unwrap().value(), Decimal::new(2, 0));
        let e = d("1").exp().unwrap();
        assert_eq!(e.round(4).unwrap().value(), Decimal::new(27183, 4));
    }

    #[test]
    fn test_equality_tiers() {
        let one = Value::Decimal(d("1.0"));
        assert!(one.equal(&Value::Decimal(d("1.00"))));
        assert!(!one.equal(&Value::Decimal(d("1.01"))));
        assert!(one.equivalent(&Value::Decimal(d("1.04"))));
        assert!(!one.equivalent(&Value::Decimal(d("1.05"))));
        assert!(one.equal(&Value::integer(1)));
    }

    #[test]
    fn test_predicates() {
        assert!(d("1.000").is_one());
        assert_eq!(d("1.000").precision(), 3);
        assert!(d("1.5").has_fraction());
        assert_eq!(d("42.0").to_integer(), Some(42));
        assert_eq!(d("42.5").to_integer(), None);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(DecimalValue::parse("1.").is_err());
        assert!(DecimalValue::parse("abc").is_err());
        assert_eq!(d("-0.50").to_string(), "-0.50");
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(ArithmeticOp::from_symbol("div").unwrap(), ArithmeticOp::Div);
        assert_eq!(
            ArithmeticOp::from_symbol("%").unwrap_err().kind(),
            ErrorKind::UnsupportedOperator
        );
    }
}
