//! Quantity values and unit-aware arithmetic

mod unit;

pub use unit::{
    BaseRelation, CommonBase, DIMENSIONLESS, MAX_EXPONENT, QuantityUnit, SECOND, UnitDefinition,
    registered_unit,
};

use crate::decimal::equivalent_decimals;
use crate::equality::{Comparison, Equality, Ordered};
use crate::system_types::DataType;
use crate::value::{ForeignNode, Value, impl_value_accessor};
use octofhir_fhirpath_diagnostics::{FhirPathError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use unit::pow;

static QUANTITY_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?\d+(?:\.\d+)?)\s*(?:'([^']+)'|([A-Za-z]+))?$")
        .expect("valid quantity pattern")
});

/// Quantity: decimal magnitude with a unit
#[derive(Debug, Clone)]
pub struct QuantityValue {
    magnitude: Decimal,
    unit: QuantityUnit,
    source: Option<ForeignNode>,
}

impl_value_accessor!(QuantityValue, DataType::Quantity);

impl QuantityValue {
    pub fn new(magnitude: Decimal, unit: QuantityUnit) -> Self {
        Self {
            magnitude,
            unit,
            source: None,
        }
    }

    /// Create a quantity from a unit name (see [`QuantityUnit::parse`])
    pub fn with_unit_name(magnitude: Decimal, unit: &str) -> Self {
        Self::new(magnitude, QuantityUnit::parse(unit))
    }

    /// Quantity in the dimensionless default unit
    pub fn dimensionless(magnitude: Decimal) -> Self {
        Self::new(magnitude, QuantityUnit::dimensionless())
    }

    /// Parse `<number> '<unit>'`, `<number> <calendar word>` or `<number>`
    pub fn parse(input: &str) -> Result<Self> {
        let caps = QUANTITY_LITERAL
            .captures(input.trim())
            .ok_or_else(|| FhirPathError::invalid_quantity(input))?;
        let magnitude = caps
            .get(1)
            .and_then(|m| Decimal::from_str(m.as_str()).ok())
            .ok_or_else(|| FhirPathError::invalid_quantity(input))?;

        let unit = match (caps.get(2), caps.get(3)) {
            (Some(quoted), _) => QuantityUnit::parse(quoted.as_str()),
            (None, Some(word)) => {
                let unit = QuantityUnit::parse(word.as_str());
                let definition = unit.definition();
                let is_word = word.as_str().eq_ignore_ascii_case(definition.singular())
                    || word.as_str().eq_ignore_ascii_case(definition.plural());
                if !unit.is_calendar_duration_unit() || !is_word {
                    return Err(FhirPathError::invalid_unit(word.as_str()));
                }
                unit
            }
            (None, None) => QuantityUnit::dimensionless(),
        };
        Ok(Self::new(magnitude, unit))
    }

    pub fn magnitude(&self) -> Decimal {
        self.magnitude
    }

    pub fn unit(&self) -> &QuantityUnit {
        &self.unit
    }

    pub fn is_dimensionless(&self) -> bool {
        self.unit.is_dimensionless()
    }

    pub fn negate(&self) -> QuantityValue {
        QuantityValue::new(-self.magnitude, self.unit.clone())
    }

    pub fn abs(&self) -> QuantityValue {
        QuantityValue::new(self.magnitude.abs(), self.unit.clone())
    }

    fn scaled(&self, magnitude: Option<Decimal>, operation: &str) -> Result<QuantityValue> {
        magnitude
            .map(|m| QuantityValue::new(m, self.unit.clone()))
            .ok_or_else(|| FhirPathError::overflow(operation))
    }

    /// Multiply the magnitude by a number
    pub fn multiply_number(&self, factor: Decimal) -> Result<QuantityValue> {
        self.scaled(self.magnitude.checked_mul(factor), "multiplication")
    }

    /// Divide the magnitude by a number; `Ok(None)` when dividing by zero
    pub fn divide_number(&self, divisor: Decimal) -> Result<Option<QuantityValue>> {
        if divisor.is_zero() {
            return Ok(None);
        }
        self.scaled(self.magnitude.checked_div(divisor), "division").map(Some)
    }

    /// Sum in the more granular unit; `Ok(None)` when the units are unrelated
    pub fn add(&self, other: &QuantityValue) -> Result<Option<QuantityValue>> {
        let Some((left, right)) = convert_unit_to_most_granular(self, other) else {
            return Ok(None);
        };
        left.scaled(left.magnitude.checked_add(right.magnitude), "addition")
            .map(Some)
    }

    /// Difference in the more granular unit; `Ok(None)` when the units are
    /// unrelated
    pub fn subtract(&self, other: &QuantityValue) -> Result<Option<QuantityValue>> {
        self.add(&other.negate())
    }

    /// Product; exponents of related units add up
    ///
    /// `Ok(None)` when the units are unrelated or the exponent would exceed
    /// [`MAX_EXPONENT`].
    pub fn multiply(&self, other: &QuantityValue) -> Result<Option<QuantityValue>> {
        if other.is_dimensionless() {
            return self.multiply_number(other.magnitude).map(Some);
        }
        if self.is_dimensionless() {
            return other.multiply_number(self.magnitude).map(Some);
        }
        let Some((base, left, right)) = granular_operands(self, other) else {
            return Ok(None);
        };
        let exp = self.unit.exp() + other.unit.exp();
        if exp > MAX_EXPONENT {
            return Ok(None);
        }
        let magnitude = left
            .checked_mul(right)
            .ok_or_else(|| FhirPathError::overflow("multiplication"))?;
        Ok(Some(QuantityValue::new(magnitude, base.with_exp(exp))))
    }

    /// Quotient; exponents of related units subtract
    ///
    /// Equal exponents give a dimensionless result. `Ok(None)` when the units
    /// are unrelated, the exponent would be negative, or the divisor is zero.
    pub fn divide(&self, other: &QuantityValue) -> Result<Option<QuantityValue>> {
        if other.is_dimensionless() {
            return self.divide_number(other.magnitude);
        }
        if other.magnitude.is_zero() {
            return Ok(None);
        }
        let Some((base, left, right)) = granular_operands(self, other) else {
            return Ok(None);
        };
        let Some(exp) = self.unit.exp().checked_sub(other.unit.exp()) else {
            return Ok(None);
        };
        let magnitude = left
            .checked_div(right)
            .ok_or_else(|| FhirPathError::overflow("division"))?;
        let unit = if exp == 0 {
            QuantityUnit::dimensionless()
        } else {
            base.with_exp(exp)
        };
        Ok(Some(QuantityValue::new(magnitude, unit)))
    }

    fn compare_quantity(&self, other: &QuantityValue) -> Comparison {
        match convert_unit_to_base(self, other, true) {
            Some((left, right)) => Comparison::Evaluated(left.magnitude.cmp(&right.magnitude)),
            None => Comparison::Empty,
        }
    }
}

/// Rescale both quantities onto their common base unit
///
/// With `exact_only`, approximate calendar relations are not used; otherwise
/// UCUM canonical factors may relate units the registry does not know.
pub fn convert_unit_to_base(
    left: &QuantityValue,
    right: &QuantityValue,
    exact_only: bool,
) -> Option<(QuantityValue, QuantityValue)> {
    if left.unit.same_unit(&right.unit) {
        return Some((left.clone(), right.clone()));
    }
    let base = left.unit.convertible_base(&right.unit, exact_only)?;
    Some((
        QuantityValue::new(left.magnitude.checked_mul(base.left_factor)?, base.unit.clone()),
        QuantityValue::new(right.magnitude.checked_mul(base.right_factor)?, base.unit),
    ))
}

/// Express both quantities in whichever of the two units is finer
///
/// Only exact relations are used.
pub fn convert_unit_to_most_granular(
    left: &QuantityValue,
    right: &QuantityValue,
) -> Option<(QuantityValue, QuantityValue)> {
    if left.unit.same_unit(&right.unit) {
        return Some((left.clone(), right.clone()));
    }
    let base = left.unit.common_base(&right.unit, true)?;
    let (unit, left_magnitude, right_magnitude) = if base.left_factor <= base.right_factor {
        let ratio = base.right_factor.checked_div(base.left_factor)?;
        (left.unit.clone(), left.magnitude, right.magnitude.checked_mul(ratio)?)
    } else {
        let ratio = base.left_factor.checked_div(base.right_factor)?;
        (right.unit.clone(), left.magnitude.checked_mul(ratio)?, right.magnitude)
    };
    Some((
        QuantityValue::new(left_magnitude, unit.clone()),
        QuantityValue::new(right_magnitude, unit),
    ))
}

/// Magnitudes of both operands in the finer of their units, ignoring exponents
fn granular_operands(left: &QuantityValue, right: &QuantityValue) -> Option<(QuantityUnit, Decimal, Decimal)> {
    let (l, r) = (left.unit.with_exp(1), right.unit.with_exp(1));
    let base = l.common_base(&r, true)?;
    let (unit, left_ratio, right_ratio) = if base.left_factor <= base.right_factor {
        (l, Decimal::ONE, base.right_factor.checked_div(base.left_factor)?)
    } else {
        (r, base.left_factor.checked_div(base.right_factor)?, Decimal::ONE)
    };
    Some((
        unit,
        left.magnitude.checked_mul(pow(left_ratio, left.unit.exp())?)?,
        right.magnitude.checked_mul(pow(right_ratio, right.unit.exp())?)?,
    ))
}

impl Equality for QuantityValue {
    fn equal(&self, other: &Value) -> bool {
        match other {
            Value::Quantity(o) => matches!(
                convert_unit_to_base(self, o, true),
                Some((left, right)) if left.magnitude == right.magnitude
            ),
            Value::Integer(_) | Value::Decimal(_) => {
                self.is_dimensionless() && other.as_decimal() == Some(self.magnitude)
            }
            _ => false,
        }
    }

    fn equivalent(&self, other: &Value) -> bool {
        match other {
            Value::Quantity(o) => matches!(
                convert_unit_to_base(self, o, false),
                Some((left, right)) if equivalent_decimals(left.magnitude, right.magnitude)
            ),
            Value::Integer(_) | Value::Decimal(_) => {
                self.is_dimensionless()
                    && other
                        .as_decimal()
                        .is_some_and(|number| equivalent_decimals(self.magnitude, number))
            }
            _ => false,
        }
    }
}

impl Ordered for QuantityValue {
    fn compare(&self, other: &Value) -> Comparison {
        match other {
            Value::Quantity(o) => self.compare_quantity(o),
            Value::Integer(_) | Value::Decimal(_) if self.is_dimensionless() => other
                .as_decimal()
                .map_or(Comparison::Inconvertible, |number| {
                    Comparison::Evaluated(self.magnitude.cmp(&number))
                }),
            _ => Comparison::Inconvertible,
        }
    }
}

impl fmt::Display for QuantityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.magnitude, self.unit)
    }
}
