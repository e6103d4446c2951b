//! FHIR JSON documents as foreign nodes

use octofhir_fhirpath_diagnostics::{FP0301, FP0303, FhirPathError, Result};
use octofhir_fhirpath_types::{
    Collection, DataType, Equality, FqTypeName, ForeignNode, Item, ModelAdapter, TypeSpec,
    TypeSpecRef, Value, any_type_spec,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Namespace of FHIR model types
pub const FHIR_NAMESPACE: &str = "FHIR";

static RESOURCE_SPEC: Lazy<TypeSpecRef> =
    Lazy::new(|| TypeSpec::new(FqTypeName::new(FHIR_NAMESPACE, "Resource"), Some(any_type_spec())));

static ELEMENT_SPEC: Lazy<TypeSpecRef> =
    Lazy::new(|| TypeSpec::new(FqTypeName::new(FHIR_NAMESPACE, "Element"), Some(any_type_spec())));

/// Resource specs by `resourceType`, shared so repeated lookups return the
/// same spec
static RESOURCE_SPECS: Lazy<Mutex<HashMap<String, TypeSpecRef>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn resource_spec(resource_type: &str) -> TypeSpecRef {
    RESOURCE_SPECS
        .lock()
        .entry(resource_type.to_string())
        .or_insert_with(|| {
            TypeSpec::new(
                FqTypeName::new(FHIR_NAMESPACE, resource_type),
                Some(RESOURCE_SPEC.clone()),
            )
        })
        .clone()
}

/// Model adapter over `serde_json::Value` documents
///
/// Booleans, numbers and strings convert to native values; objects and arrays
/// stay foreign.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonModelAdapter;

impl JsonModelAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Wrap a JSON document as a foreign node
    pub fn node(value: JsonValue) -> ForeignNode {
        ForeignNode::new(value)
    }

    fn json<'a>(&self, node: &'a ForeignNode) -> Result<&'a JsonValue> {
        node.downcast_ref::<JsonValue>()
            .ok_or_else(|| FhirPathError::model(FP0303, "node is not a JSON value"))
    }

    fn collection(&self) -> Collection {
        Collection::with_adapter(Arc::new(*self))
    }

    /// Native counterpart of a primitive JSON value
    fn primitive(value: &JsonValue) -> Result<Option<Value>> {
        let native = match value {
            JsonValue::Bool(b) => Value::boolean(*b),
            JsonValue::String(s) => Value::string(s.as_str()),
            JsonValue::Number(n) => match n.as_i64().and_then(|i| i32::try_from(i).ok()) {
                Some(i) => Value::integer(i),
                None => {
                    let text = n.to_string();
                    let decimal = Decimal::from_str(&text)
                        .or_else(|_| Decimal::from_scientific(&text))
                        .map_err(|_| {
                            FhirPathError::model(
                                FP0301,
                                format!("number {} does not fit a decimal", text),
                            )
                            .with_type_name(DataType::Decimal.type_spec().qualified_name())
                        })?;
                    Value::decimal(decimal)
                }
            },
            _ => return Ok(None),
        };
        Ok(Some(native))
    }

    /// Append a JSON child, flattening arrays
    fn add_child(&self, collection: &mut Collection, child: &JsonValue) -> Result<()> {
        match child {
            JsonValue::Array(elements) => {
                for element in elements {
                    self.add_element(collection, element)?;
                }
                Ok(())
            }
            other => self.add_element(collection, other),
        }
    }

    fn add_element(&self, collection: &mut Collection, element: &JsonValue) -> Result<()> {
        if element.is_null() {
            collection.add_nil();
            return Ok(());
        }
        collection.add(Self::node(element.clone()))
    }

    fn equivalent_json(left: &JsonValue, right: &JsonValue) -> bool {
        match (left, right) {
            (JsonValue::Object(a), JsonValue::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.get(key).is_some_and(|other| Self::equivalent_json(value, other))
                    })
            }
            (JsonValue::Array(a), JsonValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Self::equivalent_json(x, y))
            }
            (JsonValue::Null, JsonValue::Null) => true,
            _ => match (Self::primitive(left), Self::primitive(right)) {
                (Ok(Some(a)), Ok(Some(b))) => a.equivalent(&b),
                _ => false,
            },
        }
    }
}

impl ModelAdapter for JsonModelAdapter {
    fn convert_to_native(&self, node: &ForeignNode) -> Result<Item> {
        let json = self.json(node)?;
        match Self::primitive(json)? {
            Some(value) => {
                log::debug!("converted JSON {} to {}", json, value);
                Ok(Item::Native(value.with_source(node.clone())))
            }
            None => Ok(Item::Foreign(node.clone())),
        }
    }

    fn type_spec(&self, node: &ForeignNode) -> TypeSpecRef {
        match node.downcast_ref::<JsonValue>() {
            Some(JsonValue::Object(object)) => {
                match object.get("resourceType").and_then(JsonValue::as_str) {
                    Some(resource_type) => resource_spec(resource_type),
                    None => ELEMENT_SPEC.clone(),
                }
            }
            Some(JsonValue::Array(_)) => DataType::Collection.type_spec(),
            Some(JsonValue::Bool(_)) => DataType::Boolean.type_spec(),
            Some(JsonValue::String(_)) => DataType::String.type_spec(),
            Some(JsonValue::Number(n)) => {
                if n.as_i64().is_some_and(|i| i32::try_from(i).is_ok()) {
                    DataType::Integer.type_spec()
                } else {
                    DataType::Decimal.type_spec()
                }
            }
            Some(JsonValue::Null) | None => TypeSpec::anonymous(),
        }
    }

    fn cast(&self, node: &ForeignNode, type_name: &FqTypeName) -> Result<Option<Item>> {
        if !self.type_spec(node).extends_name(type_name) {
            return Ok(None);
        }
        self.convert_to_native(node).map(Some)
    }

    fn equal(&self, left: &ForeignNode, right: &ForeignNode) -> bool {
        match (left.downcast_ref::<JsonValue>(), right.downcast_ref::<JsonValue>()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn equivalent(&self, left: &ForeignNode, right: &ForeignNode) -> bool {
        match (left.downcast_ref::<JsonValue>(), right.downcast_ref::<JsonValue>()) {
            (Some(a), Some(b)) => Self::equivalent_json(a, b),
            _ => false,
        }
    }

    fn navigate(&self, node: &ForeignNode, field: &str) -> Result<Option<Item>> {
        let Some(child) = self.json(node)?.get(field) else {
            return Ok(None);
        };
        match child {
            JsonValue::Null => Ok(None),
            JsonValue::Array(_) => {
                let mut collection = self.collection();
                self.add_child(&mut collection, child)?;
                Ok(Some(Item::Native(Value::Collection(collection))))
            }
            _ => self.convert_to_native(&Self::node(child.clone())).map(Some),
        }
    }

    fn children(&self, node: &ForeignNode) -> Result<Collection> {
        let mut collection = self.collection();
        match self.json(node)? {
            JsonValue::Object(object) => {
                for child in object.values() {
                    self.add_child(&mut collection, child)?;
                }
            }
            JsonValue::Array(_) => self.add_child(&mut collection, self.json(node)?)?,
            _ => {}
        }
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_fhirpath_types::ValueAccessor;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn node(value: JsonValue) -> ForeignNode {
        JsonModelAdapter::node(value)
    }

    #[rstest]
    #[case(json!(true), Value::boolean(true))]
    #[case(json!(42), Value::integer(42))]
    #[case(json!(3_000_000_000_i64), Value::decimal(Decimal::new(3_000_000_000, 0)))]
    #[case(json!(1.25), Value::decimal(Decimal::new(125, 2)))]
    #[case(json!("male"), Value::string("male"))]
    fn test_primitives_convert(#[case] json: JsonValue, #[case] expected: Value) {
        let item = JsonModelAdapter.convert_to_native(&node(json)).unwrap();
        let value = item.as_native().unwrap();
        assert_eq!(value, &expected);
        assert!(value.source().is_some());
    }

    #[test]
    fn test_out_of_range_number_names_decimal() {
        let err = JsonModelAdapter.convert_to_native(&node(json!(1e300))).unwrap_err();
        assert_eq!(err.code(), FP0301);
        match err {
            FhirPathError::Model { type_name, .. } => {
                assert_eq!(type_name.as_deref(), Some("System.Decimal"))
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_objects_stay_foreign() {
        let item = JsonModelAdapter.convert_to_native(&node(json!({"family": "Doe"}))).unwrap();
        assert!(item.as_foreign().is_some());
        assert!(JsonModelAdapter
            .convert_to_native(&ForeignNode::new(1_u8))
            .is_err());
    }

    #[test]
    fn test_type_specs() {
        let patient = node(json!({"resourceType": "Patient", "id": "1"}));
        let spec = JsonModelAdapter.type_spec(&patient);
        assert_eq!(spec.qualified_name(), "FHIR.Patient");
        assert!(spec.extends_name(&FqTypeName::new("FHIR", "Resource")));
        assert!(spec.extends_name(&FqTypeName::new("System", "Any")));
        assert!(Arc::ptr_eq(&spec, &JsonModelAdapter.type_spec(&patient)));

        let element = JsonModelAdapter.type_spec(&node(json!({"system": "x"})));
        assert_eq!(element.qualified_name(), "FHIR.Element");
        assert_eq!(JsonModelAdapter.type_spec(&node(json!(1))).qualified_name(), "System.Integer");
    }

    #[test]
    fn test_cast() {
        let patient = node(json!({"resourceType": "Patient"}));
        let adapter = JsonModelAdapter;
        assert!(adapter.cast(&patient, &FqTypeName::bare("Resource")).unwrap().is_some());
        assert!(adapter.cast(&patient, &FqTypeName::new("FHIR", "Observation")).unwrap().is_none());
        let cast = adapter.cast(&node(json!("x")), &FqTypeName::new("System", "String")).unwrap();
        assert_eq!(cast.unwrap().as_native(), Some(&Value::string("x")));
    }

    #[test]
    fn test_equality() {
        let adapter = JsonModelAdapter;
        let a = node(json!({"code": "ABC", "value": 1.0}));
        let b = node(json!({"code": "ABC", "value": 1.0}));
        let c = node(json!({"code": "abc", "value": 1}));
        assert!(adapter.equal(&a, &b));
        assert!(!adapter.equal(&a, &c));
        assert!(adapter.equivalent(&a, &c));
        assert!(!adapter.equivalent(&a, &node(json!({"code": "abc"}))));
    }
}
