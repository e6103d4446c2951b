//! FHIRPath System types

use crate::type_spec::{FqTypeName, TypeSpec, TypeSpecRef};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Namespace of all native value kinds
pub const SYSTEM_NAMESPACE: &str = "System";

/// Data type tag of a native value kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Any type (root of every chain)
    Any,
    /// Boolean type
    Boolean,
    /// Integer type (32-bit signed)
    Integer,
    /// Decimal type
    Decimal,
    /// String type
    String,
    /// Date type
    Date,
    /// Time type
    Time,
    /// DateTime type
    DateTime,
    /// Quantity type
    Quantity,
    /// Ordered collection
    Collection,
    /// Simple type descriptor
    SimpleTypeInfo,
    /// Class type descriptor
    ClassInfo,
    /// List type descriptor
    ListTypeInfo,
    /// Tuple type descriptor
    TupleTypeInfo,
}

impl DataType {
    pub const ALL: [DataType; 14] = [
        Self::Any,
        Self::Boolean,
        Self::Integer,
        Self::Decimal,
        Self::String,
        Self::Date,
        Self::Time,
        Self::DateTime,
        Self::Quantity,
        Self::Collection,
        Self::SimpleTypeInfo,
        Self::ClassInfo,
        Self::ListTypeInfo,
        Self::TupleTypeInfo,
    ];

    /// Get the full qualified name
    pub const fn qualified_name(&self) -> &'static str {
        match self {
            Self::Any => "System.Any",
            Self::Boolean => "System.Boolean",
            Self::Integer => "System.Integer",
            Self::Decimal => "System.Decimal",
            Self::String => "System.String",
            Self::Date => "System.Date",
            Self::Time => "System.Time",
            Self::DateTime => "System.DateTime",
            Self::Quantity => "System.Quantity",
            Self::Collection => "System.Collection",
            Self::SimpleTypeInfo => "System.SimpleTypeInfo",
            Self::ClassInfo => "System.ClassInfo",
            Self::ListTypeInfo => "System.ListTypeInfo",
            Self::TupleTypeInfo => "System.TupleTypeInfo",
        }
    }

    /// Get the simple name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Decimal => "Decimal",
            Self::String => "String",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::DateTime => "DateTime",
            Self::Quantity => "Quantity",
            Self::Collection => "Collection",
            Self::SimpleTypeInfo => "SimpleTypeInfo",
            Self::ClassInfo => "ClassInfo",
            Self::ListTypeInfo => "ListTypeInfo",
            Self::TupleTypeInfo => "TupleTypeInfo",
        }
    }

    /// Check if this type is numeric
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Decimal)
    }

    /// Check if this type is temporal
    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime | Self::Time)
    }

    /// Check if this type is ordered (supports comparison)
    pub const fn is_ordered(&self) -> bool {
        matches!(
            self,
            Self::Integer
                | Self::Decimal
                | Self::String
                | Self::Date
                | Self::DateTime
                | Self::Time
                | Self::Quantity
        )
    }

    /// Check if this type is a type descriptor
    pub const fn is_type_info(&self) -> bool {
        matches!(
            self,
            Self::SimpleTypeInfo | Self::ClassInfo | Self::ListTypeInfo | Self::TupleTypeInfo
        )
    }

    /// Shared type specification of this kind
    pub fn type_spec(&self) -> TypeSpecRef {
        SYSTEM_TYPE_SPECS
            .get(self.name())
            .cloned()
            .unwrap_or_else(|| ANY_TYPE_SPEC.clone())
    }

    /// Look up a kind by bare or `System.`-qualified name
    pub fn from_name(name: &str) -> Option<Self> {
        let bare = name
            .strip_prefix(SYSTEM_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name);
        Self::ALL.iter().copied().find(|t| t.name() == bare)
    }
}

static ANY_TYPE_SPEC: Lazy<TypeSpecRef> =
    Lazy::new(|| TypeSpec::new(FqTypeName::new(SYSTEM_NAMESPACE, "Any"), None));

static SYSTEM_TYPE_SPECS: Lazy<IndexMap<&'static str, TypeSpecRef>> = Lazy::new(|| {
    let any = ANY_TYPE_SPEC.clone();
    DataType::ALL
        .iter()
        .map(|data_type| {
            let spec = match data_type {
                DataType::Any => any.clone(),
                other => TypeSpec::new(
                    FqTypeName::new(SYSTEM_NAMESPACE, other.name()),
                    Some(any.clone()),
                ),
            };
            (data_type.name(), spec)
        })
        .collect()
});

/// Root type specification (`System.Any`)
pub fn any_type_spec() -> TypeSpecRef {
    ANY_TYPE_SPEC.clone()
}

/// Look up a system type specification by bare or qualified name
pub fn system_type_spec(name: &str) -> Option<TypeSpecRef> {
    DataType::from_name(name).map(|data_type| data_type.type_spec())
}
