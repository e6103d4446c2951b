//! FHIRPath value model error codes following a structured numbering system
//!
//! Error code ranges:
//! - FP0001-FP0099: Literal parsing errors
//! - FP0100-FP0199: Argument errors (invalid precision, component, unit)
//! - FP0200-FP0299: Arithmetic and range errors
//! - FP0300-FP0399: Model adapter errors
//! - FP0400-FP0499: Contract errors (collection access)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a literal parsing error (0001-0099)
    pub const fn is_parse_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is an argument error (0100-0199)
    pub const fn is_argument_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is an arithmetic or range error (0200-0299)
    pub const fn is_arithmetic_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a model adapter error (0300-0399)
    pub const fn is_model_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Check if this is a contract error (0400-0499)
    pub const fn is_contract_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FP{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Literal parsing errors (0001-0099)
    map.insert(1, ErrorInfo::new("Invalid date literal")
        .with_help("Dates are written as YYYY, YYYY-MM or YYYY-MM-DD"));
    map.insert(2, ErrorInfo::new("Invalid time literal")
        .with_help("Times are written as HH, HH:MM, HH:MM:SS or HH:MM:SS.fffffffff"));
    map.insert(3, ErrorInfo::new("Invalid date/time literal"));
    map.insert(4, ErrorInfo::new("Invalid decimal literal"));
    map.insert(5, ErrorInfo::new("Invalid quantity literal"));
    map.insert(6, ErrorInfo::new("Invalid unit name"));

    // Argument errors (0100-0199)
    map.insert(100, ErrorInfo::new("Invalid precision"));
    map.insert(101, ErrorInfo::new("Invalid date/time component"));
    map.insert(102, ErrorInfo::new("Negative rounding precision"));
    map.insert(103, ErrorInfo::new("Not a calendar duration unit")
        .with_help("Only year, month, week, day, hour, minute, second and sub-second units apply"));
    map.insert(104, ErrorInfo::new("Invalid argument count"));
    map.insert(105, ErrorInfo::new("Invalid time zone offset"));
    map.insert(106, ErrorInfo::new("Unknown function"));

    // Arithmetic and range errors (0200-0299)
    map.insert(200, ErrorInfo::new("Year out of range")
        .with_help("Valid years are 0 to 9999"));
    map.insert(201, ErrorInfo::new("Time arithmetic crosses a day boundary"));
    map.insert(202, ErrorInfo::new("Numeric overflow"));
    map.insert(203, ErrorInfo::new("Unsupported operator for operand types"));
    map.insert(204, ErrorInfo::new("Unknown arithmetic operator"));

    // Model adapter errors (0300-0399)
    map.insert(300, ErrorInfo::new("No model adapter available"));
    map.insert(301, ErrorInfo::new("Foreign node conversion failed"));
    map.insert(303, ErrorInfo::new("Unsupported foreign node"));

    // Contract errors (0400-0499)
    map.insert(400, ErrorInfo::new("Access to empty collection"));
    map.insert(401, ErrorInfo::new("Collection index out of range"));

    map
});

// Literal parsing errors
pub const FP0001: ErrorCode = ErrorCode::new(1);
pub const FP0002: ErrorCode = ErrorCode::new(2);
pub const FP0003: ErrorCode = ErrorCode::new(3);
pub const FP0004: ErrorCode = ErrorCode::new(4);
pub const FP0005: ErrorCode = ErrorCode::new(5);
pub const FP0006: ErrorCode = ErrorCode::new(6);

// Argument errors
pub const FP0100: ErrorCode = ErrorCode::new(100);
pub const FP0101: ErrorCode = ErrorCode::new(101);
pub const FP0102: ErrorCode = ErrorCode::new(102);
pub const FP0103: ErrorCode = ErrorCode::new(103);
pub const FP0104: ErrorCode = ErrorCode::new(104);
pub const FP0105: ErrorCode = ErrorCode::new(105);
pub const FP0106: ErrorCode = ErrorCode::new(106);

// Arithmetic and range errors
pub const FP0200: ErrorCode = ErrorCode::new(200);
pub const FP0201: ErrorCode = ErrorCode::new(201);
pub const FP0202: ErrorCode = ErrorCode::new(202);
pub const FP0203: ErrorCode = ErrorCode::new(203);
pub const FP0204: ErrorCode = ErrorCode::new(204);

// Model adapter errors
pub const FP0300: ErrorCode = ErrorCode::new(300);
pub const FP0301: ErrorCode = ErrorCode::new(301);
pub const FP0303: ErrorCode = ErrorCode::new(303);

// Contract errors
pub const FP0400: ErrorCode = ErrorCode::new(400);
pub const FP0401: ErrorCode = ErrorCode::new(401);
