//! End-to-end behavior of the value model
//!
//! Covers the cross-module rules an evaluator relies on:
//! - precision-aware temporal equality
//! - empty results for division by zero and unrelated units
//! - calendar unit conversion and temporal range checks
//! - collection uniqueness and order sensitivity
//! - type hierarchy queries

use chrono::{FixedOffset, NaiveDate, NaiveTime};
use octofhir_fhirpath_types::*;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use std::cmp::Ordering;

fn date_time(h: u32, m: u32, s: u32, nanos: u32, precision: DateTimePrecision) -> Value {
    let date = NaiveDate::from_ymd_opt(2015, 2, 7).unwrap();
    let time = NaiveTime::from_hms_nano_opt(h, m, s, nanos).unwrap();
    let utc = FixedOffset::east_opt(0).unwrap();
    Value::DateTime(DateTimeValue::new(date, time, precision, Some(utc)).unwrap())
}

// === Temporal precision ===

#[test]
fn test_second_vs_minute_precision_asymmetry() {
    let seconds = date_time(13, 28, 0, 0, DateTimePrecision::Second);
    let minutes = date_time(13, 28, 0, 0, DateTimePrecision::Minute);
    assert!(!seconds.equal(&minutes));
    assert!(seconds.equivalent(&minutes));
    assert_eq!(seconds.compare(&minutes), Comparison::Empty);
}

#[test]
fn test_second_vs_nanosecond_boundary_collapses() {
    let seconds = date_time(13, 28, 17, 0, DateTimePrecision::Second);
    let nanos = date_time(13, 28, 17, 0, DateTimePrecision::Nanosecond);
    assert!(seconds.equal(&nanos));
    assert!(seconds.equivalent(&nanos));
    assert_eq!(seconds.compare(&nanos), Comparison::Evaluated(Ordering::Equal));
}

#[test]
fn test_date_and_time_are_different_shapes() {
    let date = Value::Date(DateValue::parse("2015-02-07").unwrap());
    let time = Value::Time(TimeValue::parse("00:00:00").unwrap());
    assert!(!date.equivalent(&time));
    assert_eq!(date.compare(&time), Comparison::Inconvertible);
}

// === Decimal kernel ===

#[test]
fn test_decimal_division_by_zero_is_empty() {
    let value = DecimalValue::new(Decimal::new(1509, 1));
    let zero = DecimalValue::new(Decimal::ZERO);
    for op in [ArithmeticOp::Division, ArithmeticOp::Div, ArithmeticOp::Mod] {
        assert!(value.calc(&zero, op).unwrap().is_none(), "{} by zero", op);
    }
}

#[test]
fn test_negative_rounding_precision_is_rejected() {
    let value = DecimalValue::new(Decimal::new(12345, 3));
    assert_eq!(value.round(-1).unwrap_err().kind(), ErrorKind::InvalidArgument);
    assert_eq!(value.round(2).unwrap().to_string(), "12.35");
}

// === Quantities ===

#[test]
fn test_week_and_day_share_a_base() {
    let weeks = QuantityValue::parse("2 'wk'").unwrap();
    let days = QuantityValue::parse("14 'd'").unwrap();
    let (left, right) = quantity::convert_unit_to_base(&weeks, &days, true).unwrap();
    assert_eq!(left.unit().code(), "s");
    assert_eq!(left.magnitude(), Decimal::new(1_209_600, 0));
    assert_eq!(right.magnitude(), Decimal::new(1_209_600, 0));
}

#[test]
fn test_unrelated_units_give_no_result() {
    let mass = Value::Quantity(QuantityValue::parse("1 'g'").unwrap());
    let length = Value::Quantity(QuantityValue::parse("1 'm'").unwrap());
    assert_eq!(mass.calc(&length, ArithmeticOp::Addition).unwrap(), None);
    assert_eq!(mass.compare(&length), Comparison::Empty);
    assert!(!mass.equivalent(&length));
}

#[test]
fn test_unknown_units_are_ad_hoc() {
    let a = QuantityValue::parse("3 '[foo]'").unwrap();
    let b = QuantityValue::parse("4 '[foo]'").unwrap();
    assert!(!a.unit().definition().is_registered());
    let sum = a.add(&b).unwrap().unwrap();
    assert_eq!(sum.to_string(), "7 '[foo]'");
}

// === Temporal arithmetic ===

#[test]
fn test_add_beyond_year_range_fails() {
    let value = DateTimeValue::parse("2019-03-01T12:00:00Z").unwrap();
    let error = value
        .add_quantity(&QuantityValue::parse("-2020 'a'").unwrap())
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::OutOfRange);
}

#[test]
fn test_time_arithmetic_stays_within_one_day() {
    let time = TimeValue::parse("22:30").unwrap();
    let error = time
        .add_quantity(&QuantityValue::parse("2 hours").unwrap())
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidResult);
}

// === Collections ===

#[test]
fn test_add_unique_reports_duplicates() {
    let mut collection = Collection::new();
    assert!(collection.add_unique(Value::string("test")).unwrap());
    assert!(!collection.add_unique(Value::string("test")).unwrap());
    assert_eq!(collection.len(), 1);
}

#[test]
fn test_reordering_never_restores_equality() {
    let forward: Collection = [1, 2, 3].into_iter().map(Value::integer).collect();
    let backward: Collection = [3, 2, 1].into_iter().map(Value::integer).collect();
    assert!(forward.equal(&forward.clone()));
    assert!(!forward.equal(&backward));
    assert!(!forward.equivalent(&backward));
    assert!(!Value::Collection(forward).equal(&Value::Collection(backward)));
}

#[test]
#[should_panic]
fn test_indexing_an_empty_collection_panics() {
    Collection::empty().get(0);
}

// === Type specifications ===

#[test]
fn test_type_extension_is_transitive() {
    let root = TypeSpec::new(FqTypeName::new("Model", "Root"), None);
    let mid = TypeSpec::new(FqTypeName::new("Model", "Mid"), Some(root.clone()));
    let leaf = TypeSpec::new(FqTypeName::new("Model", "Leaf"), Some(mid.clone()));
    let sibling = TypeSpec::new(FqTypeName::new("Model", "Sibling"), Some(root.clone()));
    let other_leaf = TypeSpec::new(FqTypeName::new("Model", "OtherLeaf"), Some(mid.clone()));

    assert!(leaf.extends_name(&FqTypeName::new("Model", "Root")));
    assert!(leaf.extends_name(&FqTypeName::bare("Mid")));
    assert!(!root.extends_name(&FqTypeName::new("Model", "Leaf")));

    let common = common_base_type(&leaf, &sibling).unwrap();
    assert_eq!(common.qualified_name(), "Model.Root");
    let common = common_base_type(&leaf, &other_leaf).unwrap();
    assert_eq!(common.qualified_name(), "Model.Mid");
}

#[test]
fn test_system_types_extend_any() {
    for data_type in DataType::ALL {
        let spec = data_type.type_spec();
        assert!(spec.extends_name(&FqTypeName::new(SYSTEM_NAMESPACE, "Any")), "{}", data_type.name());
    }
}
