//! FHIRPath value and type model
//!
//! This crate defines the runtime values an evaluator works with:
//! - Native value kinds (Boolean, Integer, Decimal, String, Date, Time,
//!   DateTime, Quantity) behind the [`Value`] enum
//! - The two-tier equality protocol and tri-state comparison
//! - The type specification graph and type reflection values
//! - Unit-aware quantity arithmetic
//! - Collections mixing native values and foreign model nodes
//! - The contracts an evaluator and a model adapter implement
//!
//! Operations that have no result in language terms (division by zero,
//! unrelated units, undecidable order) return `Ok(None)` or
//! [`Comparison::Empty`] rather than an error.

pub mod adapter;
pub mod arithmetic;
pub mod collection;
pub mod decimal;
pub mod equality;
pub mod function;
pub mod quantity;
pub mod system_types;
pub mod temporal;
pub mod type_info;
pub mod type_spec;
pub mod value;

pub use adapter::ModelAdapter;
pub use collection::{Collection, PartialAddError};
pub use decimal::{ArithmeticOp, DecimalValue};
pub use equality::{Comparison, Equality, Ordered, model_equal, model_equivalent};
pub use function::{Context, EvalContext, Function, FunctionRegistry, Loop};
pub use quantity::{QuantityUnit, QuantityValue, UnitDefinition};
pub use system_types::{DataType, SYSTEM_NAMESPACE, any_type_spec, system_type_spec};
pub use temporal::{DateTimePrecision, DateTimeValue, DateValue, TimeValue};
pub use type_info::{ClassInfo, ClassInfoElement, ListTypeInfo, SimpleTypeInfo, TupleTypeInfo, TypeInfo};
pub use type_spec::{FqTypeName, TypeSpec, TypeSpecRef, common_base_type};
pub use value::{BooleanValue, ForeignNode, IntegerValue, Item, StringValue, Value, ValueAccessor};

pub use octofhir_fhirpath_diagnostics::{ErrorKind, FhirPathError, Result};
