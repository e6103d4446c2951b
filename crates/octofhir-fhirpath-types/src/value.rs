//! FHIRPath value representation
//!
//! [`Value`] is the closed set of native value kinds. [`Item`] is what a
//! collection holds: either a native value or an opaque node owned by a
//! foreign data model, reached only through a [`ModelAdapter`](crate::ModelAdapter).

use crate::adapter::ModelAdapter;
use crate::collection::Collection;
use crate::decimal::DecimalValue;
use crate::equality::{Comparison, Equality, Ordered};
use crate::quantity::QuantityValue;
use crate::system_types::DataType;
use crate::temporal::{DateTimeValue, DateValue, TimeValue};
use crate::type_info::TypeInfo;
use crate::type_spec::{TypeSpec, TypeSpecRef};
use rust_decimal::Decimal;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque reference to a node of a foreign data model
#[derive(Clone)]
pub struct ForeignNode(Arc<dyn Any + Send + Sync>);

impl ForeignNode {
    /// Wrap a foreign node
    pub fn new<T: Any + Send + Sync>(node: T) -> Self {
        Self(Arc::new(node))
    }

    /// Wrap an already shared foreign node
    pub fn from_arc(node: Arc<dyn Any + Send + Sync>) -> Self {
        Self(node)
    }

    /// Borrow the node as its concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).downcast_ref::<T>()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ForeignNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ForeignNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ForeignNode").finish_non_exhaustive()
    }
}

/// Accessors shared by every native value kind
pub trait ValueAccessor {
    /// Data type tag
    fn data_type(&self) -> DataType;

    /// Type specification of the value
    fn type_spec(&self) -> TypeSpecRef {
        self.data_type().type_spec()
    }

    /// Foreign node this value was converted from (provenance only)
    fn source(&self) -> Option<&ForeignNode> {
        None
    }
}

/// Implements `with_source` and the provenance accessor for kinds that carry
/// a `source` field
macro_rules! impl_value_accessor {
    ($ty:ty, $data_type:expr) => {
        impl $ty {
            /// Record the foreign node this value was converted from
            pub fn with_source(mut self, source: $crate::value::ForeignNode) -> Self {
                self.source = Some(source);
                self
            }
        }

        impl $crate::value::ValueAccessor for $ty {
            fn data_type(&self) -> $crate::system_types::DataType {
                $data_type
            }

            fn source(&self) -> Option<&$crate::value::ForeignNode> {
                self.source.as_ref()
            }
        }
    };
}

pub(crate) use impl_value_accessor;

/// Boolean value
#[derive(Debug, Clone)]
pub struct BooleanValue {
    value: bool,
    source: Option<ForeignNode>,
}

impl BooleanValue {
    pub fn new(value: bool) -> Self {
        Self { value, source: None }
    }

    pub fn value(&self) -> bool {
        self.value
    }
}

impl_value_accessor!(BooleanValue, DataType::Boolean);

impl Equality for BooleanValue {
    fn equal(&self, other: &Value) -> bool {
        matches!(other, Value::Boolean(o) if o.value == self.value)
    }

    fn equivalent(&self, other: &Value) -> bool {
        self.equal(other)
    }
}

/// Integer value (32-bit signed)
#[derive(Debug, Clone)]
pub struct IntegerValue {
    value: i32,
    source: Option<ForeignNode>,
}

impl IntegerValue {
    pub fn new(value: i32) -> Self {
        Self { value, source: None }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Same value as a decimal with zero fractional digits
    pub fn to_decimal(&self) -> DecimalValue {
        DecimalValue::new(Decimal::from(self.value))
    }
}

impl_value_accessor!(IntegerValue, DataType::Integer);

impl Equality for IntegerValue {
    fn equal(&self, other: &Value) -> bool {
        match other {
            Value::Integer(o) => o.value == self.value,
            Value::Decimal(o) => o.value() == Decimal::from(self.value),
            Value::Quantity(o) => o.equal(&Value::Integer(self.clone())),
            _ => false,
        }
    }

    fn equivalent(&self, other: &Value) -> bool {
        match other {
            Value::Integer(o) => o.value == self.value,
            Value::Decimal(_) => self.to_decimal().equivalent(other),
            Value::Quantity(o) => o.equivalent(&Value::Integer(self.clone())),
            _ => false,
        }
    }
}

impl Ordered for IntegerValue {
    fn compare(&self, other: &Value) -> Comparison {
        match other {
            Value::Integer(o) => Comparison::Evaluated(self.value.cmp(&o.value)),
            Value::Decimal(o) => Comparison::Evaluated(Decimal::from(self.value).cmp(&o.value())),
            Value::Quantity(o) => o.compare(&Value::Integer(self.clone())).reverse(),
            _ => Comparison::Inconvertible,
        }
    }
}

/// String value
#[derive(Debug, Clone)]
pub struct StringValue {
    value: String,
    source: Option<ForeignNode>,
}

impl StringValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            source: None,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Lower-cased with whitespace runs collapsed to a single space
    fn normalized(&self) -> String {
        self.value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

impl_value_accessor!(StringValue, DataType::String);

impl Equality for StringValue {
    fn equal(&self, other: &Value) -> bool {
        matches!(other, Value::String(o) if o.value == self.value)
    }

    fn equivalent(&self, other: &Value) -> bool {
        matches!(other, Value::String(o) if o.normalized() == self.normalized())
    }
}

impl Ordered for StringValue {
    fn compare(&self, other: &Value) -> Comparison {
        match other {
            Value::String(o) => Comparison::Evaluated(self.value.cmp(&o.value)),
            _ => Comparison::Inconvertible,
        }
    }
}

/// Native FHIRPath value
#[derive(Debug, Clone)]
pub enum Value {
    Boolean(BooleanValue),
    Integer(IntegerValue),
    Decimal(DecimalValue),
    String(StringValue),
    Date(DateValue),
    Time(TimeValue),
    DateTime(DateTimeValue),
    Quantity(QuantityValue),
    Collection(Collection),
    TypeInfo(TypeInfo),
}

impl Value {
    /// Create a boolean value
    pub fn boolean(value: bool) -> Self {
        Self::Boolean(BooleanValue::new(value))
    }

    /// Create an integer value
    pub fn integer(value: i32) -> Self {
        Self::Integer(IntegerValue::new(value))
    }

    /// Create a decimal value
    pub fn decimal(value: Decimal) -> Self {
        Self::Decimal(DecimalValue::new(value))
    }

    /// Create a string value
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(StringValue::new(value))
    }

    /// Try to get as boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(v.value()),
            _ => None,
        }
    }

    /// Try to get as integer
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(v) => Some(v.value()),
            _ => None,
        }
    }

    /// Try to get as decimal (integers are widened)
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(v) => Some(Decimal::from(v.value())),
            Self::Decimal(v) => Some(v.value()),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v.value()),
            _ => None,
        }
    }

    /// Try to get as collection
    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(v) => Some(v),
            _ => None,
        }
    }

    /// Record the foreign node this value was converted from
    ///
    /// Collections and type descriptors carry no provenance and are returned
    /// unchanged.
    pub fn with_source(self, source: ForeignNode) -> Self {
        match self {
            Self::Boolean(v) => Self::Boolean(v.with_source(source)),
            Self::Integer(v) => Self::Integer(v.with_source(source)),
            Self::Decimal(v) => Self::Decimal(v.with_source(source)),
            Self::String(v) => Self::String(v.with_source(source)),
            Self::Date(v) => Self::Date(v.with_source(source)),
            Self::Time(v) => Self::Time(v.with_source(source)),
            Self::DateTime(v) => Self::DateTime(v.with_source(source)),
            Self::Quantity(v) => Self::Quantity(v.with_source(source)),
            other => other,
        }
    }

    fn accessor(&self) -> &dyn ValueAccessor {
        match self {
            Self::Boolean(v) => v,
            Self::Integer(v) => v,
            Self::Decimal(v) => v,
            Self::String(v) => v,
            Self::Date(v) => v,
            Self::Time(v) => v,
            Self::DateTime(v) => v,
            Self::Quantity(v) => v,
            Self::Collection(v) => v,
            Self::TypeInfo(v) => v,
        }
    }
}

impl ValueAccessor for Value {
    fn data_type(&self) -> DataType {
        self.accessor().data_type()
    }

    fn type_spec(&self) -> TypeSpecRef {
        self.accessor().type_spec()
    }

    fn source(&self) -> Option<&ForeignNode> {
        self.accessor().source()
    }
}

impl Equality for Value {
    fn equal(&self, other: &Value) -> bool {
        match self {
            Self::Boolean(v) => v.equal(other),
            Self::Integer(v) => v.equal(other),
            Self::Decimal(v) => v.equal(other),
            Self::String(v) => v.equal(other),
            Self::Date(v) => v.equal(other),
            Self::Time(v) => v.equal(other),
            Self::DateTime(v) => v.equal(other),
            Self::Quantity(v) => v.equal(other),
            Self::Collection(v) => matches!(other, Value::Collection(o) if v.equal(o)),
            Self::TypeInfo(v) => v.equal(other),
        }
    }

    fn equivalent(&self, other: &Value) -> bool {
        match self {
            Self::Boolean(v) => v.equivalent(other),
            Self::Integer(v) => v.equivalent(other),
            Self::Decimal(v) => v.equivalent(other),
            Self::String(v) => v.equivalent(other),
            Self::Date(v) => v.equivalent(other),
            Self::Time(v) => v.equivalent(other),
            Self::DateTime(v) => v.equivalent(other),
            Self::Quantity(v) => v.equivalent(other),
            Self::Collection(v) => matches!(other, Value::Collection(o) if v.equivalent(o)),
            Self::TypeInfo(v) => v.equivalent(other),
        }
    }
}

impl Ordered for Value {
    fn compare(&self, other: &Value) -> Comparison {
        match self {
            Self::Integer(v) => v.compare(other),
            Self::Decimal(v) => v.compare(other),
            Self::String(v) => v.compare(other),
            Self::Date(v) => v.compare(other),
            Self::Time(v) => v.compare(other),
            Self::DateTime(v) => v.compare(other),
            Self::Quantity(v) => v.compare(other),
            Self::Boolean(_) | Self::Collection(_) | Self::TypeInfo(_) => Comparison::Inconvertible,
        }
    }
}

impl Value {
    /// Order this value against another
    ///
    /// Integer/Decimal pairs are numerically promoted; temporal pairs may be
    /// [`Comparison::Empty`] when their precisions make the order undecidable.
    pub fn compare(&self, other: &Value) -> Comparison {
        Ordered::compare(self, other)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v.value()),
            Self::Integer(v) => write!(f, "{}", v.value()),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v.value()),
            Self::Date(v) => write!(f, "{}", v),
            Self::Time(v) => write!(f, "{}", v),
            Self::DateTime(v) => write!(f, "{}", v),
            Self::Quantity(v) => write!(f, "{}", v),
            Self::Collection(v) => write!(f, "{}", v),
            Self::TypeInfo(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::integer(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

/// Entry of a collection: a native value or a foreign model node
#[derive(Debug, Clone)]
pub enum Item {
    Native(Value),
    Foreign(ForeignNode),
}

impl Item {
    pub fn as_native(&self) -> Option<&Value> {
        match self {
            Self::Native(v) => Some(v),
            Self::Foreign(_) => None,
        }
    }

    pub fn as_foreign(&self) -> Option<&ForeignNode> {
        match self {
            Self::Native(_) => None,
            Self::Foreign(node) => Some(node),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }

    /// Type specification of the item
    ///
    /// Foreign nodes are typed by the adapter; without one they are anonymous.
    pub fn type_spec(&self, adapter: Option<&dyn ModelAdapter>) -> TypeSpecRef {
        match (self, adapter) {
            (Self::Native(v), _) => v.type_spec(),
            (Self::Foreign(node), Some(adapter)) => adapter.type_spec(node),
            (Self::Foreign(_), None) => TypeSpec::anonymous(),
        }
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Self::Native(value)
    }
}

impl From<ForeignNode> for Item {
    fn from(node: ForeignNode) -> Self {
        Self::Foreign(node)
    }
}
