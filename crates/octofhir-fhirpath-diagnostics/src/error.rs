//! FHIRPath value model error types

use crate::{
    ErrorCode, FP0001, FP0002, FP0003, FP0004, FP0005, FP0006, FP0100, FP0101, FP0102, FP0103,
    FP0104, FP0105, FP0106, FP0200, FP0201, FP0202, FP0203, FP0204, FP0300, FP0400, FP0401,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse classification of a [`FhirPathError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed literal text
    Parse,
    /// Argument outside the accepted domain
    InvalidArgument,
    /// Result outside the representable range
    OutOfRange,
    /// Result that cannot exist (e.g. time crossing midnight)
    InvalidResult,
    /// Access to an element of an empty collection
    EmptyAccess,
    /// Operator not defined for the operand kinds
    UnsupportedOperator,
    /// Model adapter failure
    Model,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Parse => write!(f, "parse"),
            ErrorKind::InvalidArgument => write!(f, "invalid argument"),
            ErrorKind::OutOfRange => write!(f, "out of range"),
            ErrorKind::InvalidResult => write!(f, "invalid result"),
            ErrorKind::EmptyAccess => write!(f, "empty access"),
            ErrorKind::UnsupportedOperator => write!(f, "unsupported operator"),
            ErrorKind::Model => write!(f, "model"),
        }
    }
}

/// Main FHIRPath value model error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FhirPathError {
    /// Literal text could not be parsed
    #[error("{code}: {message} (input: '{input}')")]
    Parse {
        code: ErrorCode,
        message: String,
        input: String,
    },

    /// Argument outside its domain
    #[error("{code}: {message}")]
    InvalidArgument { code: ErrorCode, message: String },

    /// Arithmetic result outside the representable range
    #[error("{code}: {message}")]
    OutOfRange { code: ErrorCode, message: String },

    /// Arithmetic result that cannot be represented by the operand kind
    #[error("{code}: {message}")]
    InvalidResult { code: ErrorCode, message: String },

    /// Indexed access into an empty collection
    #[error("{code}: {message}")]
    EmptyAccess { code: ErrorCode, message: String },

    /// Operator not applicable to the operand kinds
    #[error("{code}: {message}")]
    UnsupportedOperator {
        code: ErrorCode,
        operator: String,
        message: String,
    },

    /// Model adapter failure
    #[error("{code}: {message}")]
    Model {
        code: ErrorCode,
        message: String,
        type_name: Option<String>,
    },
}

impl FhirPathError {
    /// Create a parse error
    pub fn parse(code: ErrorCode, message: impl Into<String>, input: impl Into<String>) -> Self {
        Self::Parse {
            code,
            message: message.into(),
            input: input.into(),
        }
    }

    /// Create an invalid date literal error
    pub fn invalid_date(input: impl Into<String>) -> Self {
        Self::parse(FP0001, "invalid date literal", input)
    }

    /// Create an invalid time literal error
    pub fn invalid_time(input: impl Into<String>) -> Self {
        Self::parse(FP0002, "invalid time literal", input)
    }

    /// Create an invalid date/time literal error
    pub fn invalid_date_time(input: impl Into<String>) -> Self {
        Self::parse(FP0003, "invalid date/time literal", input)
    }

    /// Create an invalid decimal literal error
    pub fn invalid_decimal(input: impl Into<String>) -> Self {
        Self::parse(FP0004, "invalid decimal literal", input)
    }

    /// Create an invalid quantity literal error
    pub fn invalid_quantity(input: impl Into<String>) -> Self {
        Self::parse(FP0005, "invalid quantity literal", input)
    }

    /// Create an invalid unit name error
    pub fn invalid_unit(input: impl Into<String>) -> Self {
        Self::parse(FP0006, "invalid unit name", input)
    }

    /// Create an invalid argument error
    pub fn invalid_argument(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            code,
            message: message.into(),
        }
    }

    /// Create an invalid precision error
    pub fn invalid_precision(message: impl Into<String>) -> Self {
        Self::invalid_argument(FP0100, message)
    }

    /// Create an invalid date/time component error
    pub fn invalid_component(message: impl Into<String>) -> Self {
        Self::invalid_argument(FP0101, message)
    }

    /// Create an invalid time zone offset error
    pub fn invalid_offset(seconds: i32) -> Self {
        Self::invalid_argument(FP0105, format!("invalid time zone offset: {} seconds", seconds))
    }

    /// Create a non-calendar duration unit error
    pub fn not_calendar_unit(unit: impl AsRef<str>) -> Self {
        Self::invalid_argument(
            FP0103,
            format!("'{}' is not a calendar duration unit", unit.as_ref()),
        )
    }

    /// Create an invalid argument count error
    pub fn invalid_argument_count(function: impl AsRef<str>, count: usize, min: usize, max: usize) -> Self {
        Self::invalid_argument(
            FP0104,
            format!(
                "function '{}' expects {} to {} arguments, got {}",
                function.as_ref(),
                min,
                max,
                count
            ),
        )
    }

    /// Create an unknown function error
    pub fn unknown_function(name: impl AsRef<str>) -> Self {
        Self::invalid_argument(FP0106, format!("unknown function '{}'", name.as_ref()))
    }

    /// Create a negative rounding precision error
    pub fn negative_precision(precision: i32) -> Self {
        Self::invalid_argument(FP0102, format!("precision must not be negative: {}", precision))
    }

    /// Create an out of range error
    pub fn out_of_range(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::OutOfRange {
            code,
            message: message.into(),
        }
    }

    /// Create a year out of range error
    pub fn year_out_of_range(year: i64) -> Self {
        Self::out_of_range(FP0200, format!("resulting year {} is outside 0-9999", year))
    }

    /// Create a numeric overflow error
    pub fn overflow(operation: impl AsRef<str>) -> Self {
        Self::out_of_range(FP0202, format!("numeric overflow in {}", operation.as_ref()))
    }

    /// Create an index out of range error
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::out_of_range(FP0401, format!("index {} is out of range for {} items", index, len))
    }

    /// Create an invalid result error
    pub fn invalid_result(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::InvalidResult {
            code,
            message: message.into(),
        }
    }

    /// Create a time crossing midnight error
    pub fn day_boundary_crossed() -> Self {
        Self::invalid_result(FP0201, "time arithmetic must stay within one day")
    }

    /// Create an empty access error
    pub fn empty_access(message: impl Into<String>) -> Self {
        Self::EmptyAccess {
            code: FP0400,
            message: message.into(),
        }
    }

    /// Create an unsupported operator error
    pub fn unsupported_operator(operator: impl Into<String>, types: impl AsRef<str>) -> Self {
        let operator = operator.into();
        Self::UnsupportedOperator {
            code: FP0203,
            message: format!("operator '{}' is not defined for {}", operator, types.as_ref()),
            operator,
        }
    }

    /// Create an unknown operator error
    pub fn unknown_operator(symbol: impl Into<String>) -> Self {
        let operator = symbol.into();
        Self::UnsupportedOperator {
            code: FP0204,
            message: format!("unknown arithmetic operator '{}'", operator),
            operator,
        }
    }

    /// Create a model error
    pub fn model(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Model {
            code,
            message: message.into(),
            type_name: None,
        }
    }

    /// Create a missing model adapter error
    pub fn missing_adapter() -> Self {
        Self::model(FP0300, "a model adapter is required to convert foreign nodes")
    }

    /// Attach the foreign type name to a model error
    pub fn with_type_name(self, name: impl Into<String>) -> Self {
        match self {
            Self::Model { code, message, .. } => Self::Model {
                code,
                message,
                type_name: Some(name.into()),
            },
            other => other,
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse { code, .. }
            | Self::InvalidArgument { code, .. }
            | Self::OutOfRange { code, .. }
            | Self::InvalidResult { code, .. }
            | Self::EmptyAccess { code, .. }
            | Self::UnsupportedOperator { code, .. }
            | Self::Model { code, .. } => *code,
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse { .. } => ErrorKind::Parse,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::InvalidResult { .. } => ErrorKind::InvalidResult,
            Self::EmptyAccess { .. } => ErrorKind::EmptyAccess,
            Self::UnsupportedOperator { .. } => ErrorKind::UnsupportedOperator,
            Self::Model { .. } => ErrorKind::Model,
        }
    }

    /// Get the human-readable message without the code prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Parse { message, .. }
            | Self::InvalidArgument { message, .. }
            | Self::OutOfRange { message, .. }
            | Self::InvalidResult { message, .. }
            | Self::EmptyAccess { message, .. }
            | Self::UnsupportedOperator { message, .. }
            | Self::Model { message, .. } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FP0301;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_error_display() {
        let err = FhirPathError::invalid_date("2019-13");
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.code(), FP0001);
        assert_eq!(err.to_string(), "FP0001: invalid date literal (input: '2019-13')");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(FhirPathError::negative_precision(-1).kind(), ErrorKind::InvalidArgument);
        assert_eq!(FhirPathError::year_out_of_range(-1).kind(), ErrorKind::OutOfRange);
        assert_eq!(FhirPathError::day_boundary_crossed().kind(), ErrorKind::InvalidResult);
        assert_eq!(FhirPathError::empty_access("x").kind(), ErrorKind::EmptyAccess);
        assert_eq!(FhirPathError::unknown_operator("%").code(), FP0204);
        assert_eq!(FhirPathError::overflow("addition").kind(), ErrorKind::OutOfRange);
        assert_eq!(FhirPathError::not_calendar_unit("mg").code(), FP0103);
        assert_eq!(FhirPathError::index_out_of_range(3, 1).code(), FP0401);
    }

    #[test]
    fn test_argument_count_message() {
        let err = FhirPathError::invalid_argument_count("substring", 3, 1, 2);
        assert_eq!(err.code(), FP0104);
        assert_eq!(err.message(), "function 'substring' expects 1 to 2 arguments, got 3");
    }

    #[test]
    fn test_model_type_name() {
        let err = FhirPathError::model(FP0301, "cannot convert").with_type_name("FHIR.Patient");
        match err {
            FhirPathError::Model { type_name, .. } => {
                assert_eq!(type_name.as_deref(), Some("FHIR.Patient"))
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
