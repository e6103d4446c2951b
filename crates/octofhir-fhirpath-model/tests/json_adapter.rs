//! JSON resources flowing through collections and equality

use octofhir_fhirpath_model::JsonModelAdapter;
use octofhir_fhirpath_types::{
    Collection, Context, EvalContext, FqTypeName, Item, ModelAdapter, Value, model_equal,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn patient() -> serde_json::Value {
    json!({
        "resourceType": "Patient",
        "id": "example",
        "active": true,
        "multipleBirthInteger": 2,
        "name": [
            {"use": "official", "family": "Chalmers", "given": ["Peter", "James"]},
            {"use": "usual", "given": ["Jim"]}
        ],
        "deceasedBoolean": null
    })
}

#[test]
fn test_navigate_primitive_fields() {
    let adapter = JsonModelAdapter;
    let root = JsonModelAdapter::node(patient());

    let id = adapter.navigate(&root, "id").unwrap().unwrap();
    assert_eq!(id.as_native(), Some(&Value::string("example")));
    let births = adapter.navigate(&root, "multipleBirthInteger").unwrap().unwrap();
    assert_eq!(births.as_native(), Some(&Value::integer(2)));

    assert!(adapter.navigate(&root, "deceasedBoolean").unwrap().is_none());
    assert!(adapter.navigate(&root, "gender").unwrap().is_none());
}

#[test]
fn test_navigate_arrays_yields_typed_collections() {
    let adapter = JsonModelAdapter;
    let root = JsonModelAdapter::node(patient());

    let names = adapter.navigate(&root, "name").unwrap().unwrap();
    let names = names.as_native().and_then(Value::as_collection).unwrap();
    assert_eq!(names.len(), 2);
    assert!(names.adapter().is_some());
    assert_eq!(names.item_type_spec().unwrap().qualified_name(), "FHIR.Element");

    let official = names.get(0).and_then(|item| item.as_foreign()).unwrap();
    let given = adapter.navigate(official, "given").unwrap().unwrap();
    let given = given.as_native().and_then(Value::as_collection).unwrap();
    let values: Vec<_> = given.values().filter_map(Value::as_str).collect();
    assert_eq!(values, vec!["Peter", "James"]);
    assert_eq!(given.item_type_spec().unwrap().qualified_name(), "System.String");
}

#[test]
fn test_children_flatten_arrays() {
    let adapter = JsonModelAdapter;
    let root = JsonModelAdapter::node(patient());
    let children = adapter.children(&root).unwrap();

    // resourceType, id, active, multipleBirthInteger, two names and the null
    assert_eq!(children.len(), 7);
    assert!(children.contains(&Value::boolean(true)));
    assert!(children.contains(&Value::string("Patient")));
    assert_eq!(children.iter().filter(Option::is_none).count(), 1);
}

#[test]
fn test_context_collections_accept_foreign_nodes() {
    let ctx = Context::with_adapter(Arc::new(JsonModelAdapter));
    let mut collection = ctx.new_collection();
    collection.add(JsonModelAdapter::node(json!("Jim"))).unwrap();
    collection.add(JsonModelAdapter::node(json!({"family": "Chalmers"}))).unwrap();
    assert!(!collection.add_unique(JsonModelAdapter::node(json!({"family": "Chalmers"}))).unwrap());
    assert!(collection.add_unique(JsonModelAdapter::node(json!({"family": "Windsor"}))).unwrap());

    assert_eq!(collection.len(), 3);
    assert!(collection.contains(&Value::string("Jim")));
    assert_eq!(collection.item_type_spec().unwrap().qualified_name(), "System.Any");
}

#[test]
fn test_foreign_nodes_without_adapter_are_rejected() {
    let mut collection = Collection::new();
    assert!(collection.add(JsonModelAdapter::node(json!({"family": "Chalmers"}))).is_err());
    assert!(collection.is_empty());
}

#[test]
fn test_model_equality_between_items() {
    let adapter = JsonModelAdapter;
    let a = JsonModelAdapter::node(json!({"system": "http://loinc.org", "code": "1234-5"}));
    let b = JsonModelAdapter::node(json!({"code": "1234-5", "system": "http://loinc.org"}));
    let (a, b) = (Item::from(a), Item::from(b));
    assert!(model_equal(Some(&a), Some(&b), Some(&adapter)));
    assert!(!model_equal(Some(&a), Some(&b), None));

    let resource = JsonModelAdapter::node(patient());
    let cast = adapter.cast(&resource, &FqTypeName::new("FHIR", "Patient")).unwrap();
    assert!(cast.unwrap().as_foreign().is_some());
}
