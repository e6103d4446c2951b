//! Arithmetic dispatch over value kinds
//!
//! Integer pairs stay integral except for `/`, mixed Integer/Decimal pairs are
//! promoted to Decimal, strings concatenate with `+`, quantities convert units,
//! and temporal values accept calendar durations on the right-hand side.

use crate::decimal::{ArithmeticOp, DecimalValue};
use crate::value::{IntegerValue, Value, ValueAccessor};
use octofhir_fhirpath_diagnostics::{FhirPathError, Result};
use rust_decimal::Decimal;

impl IntegerValue {
    /// Apply an arithmetic operator to two integers
    ///
    /// `/` always produces a Decimal. `div` and `mod` by zero yield
    /// `Ok(None)`; overflow fails.
    pub fn calc(&self, other: &IntegerValue, op: ArithmeticOp) -> Result<Option<Value>> {
        let (a, b) = (self.value(), other.value());
        let integer = |result: Option<i32>| {
            result
                .map(|v| Some(Value::integer(v)))
                .ok_or_else(|| FhirPathError::overflow(op.symbol()))
        };
        match op {
            ArithmeticOp::Addition => integer(a.checked_add(b)),
            ArithmeticOp::Subtraction => integer(a.checked_sub(b)),
            ArithmeticOp::Multiplication => integer(a.checked_mul(b)),
            ArithmeticOp::Division => Ok(self
                .to_decimal()
                .divide(&other.to_decimal())?
                .map(Value::Decimal)),
            ArithmeticOp::Div | ArithmeticOp::Mod if b == 0 => Ok(None),
            ArithmeticOp::Div => integer(a.checked_div(b)),
            ArithmeticOp::Mod => integer(a.checked_rem(b)),
        }
    }
}

fn unsupported(left: &Value, right: &Value, op: ArithmeticOp) -> FhirPathError {
    FhirPathError::unsupported_operator(
        op.symbol(),
        format!("{}, {}", left.data_type().name(), right.data_type().name()),
    )
}

fn numeric(value: &Value) -> Option<DecimalValue> {
    match value {
        Value::Integer(v) => Some(v.to_decimal()),
        Value::Decimal(v) => Some(v.clone()),
        _ => None,
    }
}

impl Value {
    /// Apply an arithmetic operator
    ///
    /// `Ok(None)` is the empty result (division by zero, unrelated units).
    /// Kind pairs without a definition for `op` fail with an unsupported
    /// operator error.
    pub fn calc(&self, other: &Value, op: ArithmeticOp) -> Result<Option<Value>> {
        use ArithmeticOp::{Addition, Div, Division, Mod, Multiplication, Subtraction};

        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.calc(b, op),
            (Value::Integer(_) | Value::Decimal(_), Value::Integer(_) | Value::Decimal(_)) => {
                match (numeric(self), numeric(other)) {
                    (Some(a), Some(b)) => Ok(a.calc(&b, op)?.map(Value::Decimal)),
                    _ => Err(unsupported(self, other, op)),
                }
            }
            (Value::String(a), Value::String(b)) if op == Addition => {
                Ok(Some(Value::string(format!("{}{}", a.value(), b.value()))))
            }
            (Value::Quantity(a), Value::Quantity(b)) => {
                let result = match op {
                    Addition => a.add(b)?,
                    Subtraction => a.subtract(b)?,
                    Multiplication => a.multiply(b)?,
                    Division => a.divide(b)?,
                    Div | Mod => return Err(unsupported(self, other, op)),
                };
                Ok(result.map(Value::Quantity))
            }
            (Value::Quantity(a), Value::Integer(_) | Value::Decimal(_)) => {
                let factor = other.as_decimal().unwrap_or(Decimal::ZERO);
                match op {
                    Multiplication => a.multiply_number(factor).map(|q| Some(Value::Quantity(q))),
                    Division => Ok(a.divide_number(factor)?.map(Value::Quantity)),
                    _ => Err(unsupported(self, other, op)),
                }
            }
            (Value::Integer(_) | Value::Decimal(_), Value::Quantity(b)) if op == Multiplication => {
                let factor = self.as_decimal().unwrap_or(Decimal::ZERO);
                b.multiply_number(factor).map(|q| Some(Value::Quantity(q)))
            }
            (Value::Date(d), Value::Quantity(q)) if matches!(op, Addition | Subtraction) => {
                let result = if op == Addition { d.add_quantity(q) } else { d.subtract_quantity(q) };
                result.map(|d| Some(Value::Date(d)))
            }
            (Value::DateTime(dt), Value::Quantity(q)) if matches!(op, Addition | Subtraction) => {
                let result = if op == Addition { dt.add_quantity(q) } else { dt.subtract_quantity(q) };
                result.map(|dt| Some(Value::DateTime(dt)))
            }
            (Value::Time(t), Value::Quantity(q)) if matches!(op, Addition | Subtraction) => {
                let result = if op == Addition { t.add_quantity(q) } else { t.subtract_quantity(q) };
                result.map(|t| Some(Value::Time(t)))
            }
            _ => Err(unsupported(self, other, op)),
        }
    }

    /// Apply an operator given by its symbol (`+ - * / div mod`)
    pub fn calc_symbol(&self, other: &Value, symbol: &str) -> Result<Option<Value>> {
        self.calc(other, ArithmeticOp::from_symbol(symbol)?)
    }

    /// Unary minus for numbers and quantities
    pub fn negate(&self) -> Result<Value> {
        match self {
            Value::Integer(v) => v
                .value()
                .checked_neg()
                .map(Value::integer)
                .ok_or_else(|| FhirPathError::overflow("negation")),
            Value::Decimal(v) => Ok(Value::Decimal(v.negate())),
            Value::Quantity(q) => Ok(Value::Quantity(q.negate())),
            other => Err(FhirPathError::unsupported_operator("-", other.data_type().name())),
        }
    }
}
