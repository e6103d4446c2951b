//! Type reflection values

use crate::equality::Equality;
use crate::system_types::DataType;
use crate::type_spec::TypeSpec;
use crate::value::{Value, ValueAccessor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleTypeInfo {
    pub namespace: String,
    pub name: String,
    pub base_type: Option<String>,
}

/// Element of a class or tuple descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfoElement {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub is_one_based: bool,
}

impl ClassInfoElement {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_one_based: false,
        }
    }
}

/// Complex type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub namespace: String,
    pub name: String,
    pub base_type: Option<String>,
    pub elements: Vec<ClassInfoElement>,
}

/// List type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTypeInfo {
    pub element_type: String,
}

/// Anonymous tuple type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TupleTypeInfo {
    pub elements: Vec<ClassInfoElement>,
}

/// Type descriptor returned by type reflection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TypeInfo {
    Simple(SimpleTypeInfo),
    Class(ClassInfo),
    List(ListTypeInfo),
    Tuple(TupleTypeInfo),
}

impl TypeInfo {
    /// Simple descriptor naming `spec` and its base
    pub fn for_type_spec(spec: &TypeSpec) -> TypeInfo {
        let (namespace, name) = spec
            .fq_name()
            .map(|n| (n.namespace().to_string(), n.name().to_string()))
            .unwrap_or_default();
        TypeInfo::Simple(SimpleTypeInfo {
            namespace,
            name,
            base_type: spec.base().map(|b| b.qualified_name()),
        })
    }
}

impl ValueAccessor for TypeInfo {
    fn data_type(&self) -> DataType {
        match self {
            Self::Simple(_) => DataType::SimpleTypeInfo,
            Self::Class(_) => DataType::ClassInfo,
            Self::List(_) => DataType::ListTypeInfo,
            Self::Tuple(_) => DataType::TupleTypeInfo,
        }
    }
}

impl Equality for TypeInfo {
    fn equal(&self, other: &Value) -> bool {
        matches!(other, Value::TypeInfo(o) if o == self)
    }

    fn equivalent(&self, other: &Value) -> bool {
        self.equal(other)
    }
}

fn qualified(f: &mut fmt::Formatter<'_>, namespace: &str, name: &str) -> fmt::Result {
    if namespace.is_empty() {
        write!(f, "{}", name)
    } else {
        write!(f, "{}.{}", namespace, name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(info) => qualified(f, &info.namespace, &info.name),
            Self::Class(info) => qualified(f, &info.namespace, &info.name),
            Self::List(info) => write!(f, "List<{}>", info.element_type),
            Self::Tuple(info) => {
                write!(f, "Tuple {{ ")?;
                for (i, element) in info.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", element.name, element.type_name)?;
                }
                write!(f, " }}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system_types::system_type_spec;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_for_system_type() {
        let spec = system_type_spec("Integer").unwrap();
        let info = TypeInfo::for_type_spec(&spec);
        assert_eq!(
            info,
            TypeInfo::Simple(SimpleTypeInfo {
                namespace: "System".to_string(),
                name: "Integer".to_string(),
                base_type: Some("System.Any".to_string()),
            })
        );
        assert_eq!(info.to_string(), "System.Integer");
        assert_eq!(info.data_type(), DataType::SimpleTypeInfo);
    }

    #[test]
    fn test_structural_equality() {
        let tuple = |ty: &str| {
            Value::TypeInfo(TypeInfo::Tuple(TupleTypeInfo {
                elements: vec![ClassInfoElement::new("code", ty)],
            }))
        };
        assert!(tuple("System.String").equal(&tuple("System.String")));
        assert!(!tuple("System.String").equivalent(&tuple("System.Integer")));
        assert_eq!(tuple("System.String").to_string(), "Tuple { code: System.String }");
        assert_eq!(tuple("System.String").type_spec().qualified_name(), "System.TupleTypeInfo");
    }

    #[test]
    fn test_serialization_uses_reflection_names() {
        let info = TypeInfo::List(ListTypeInfo {
            element_type: "System.Integer".to_string(),
        });
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "List", "elementType": "System.Integer"}));
    }
}
