//! Algebraic properties of the value model
//!
//! - Equal is reflexive for every native kind
//! - Collection equality is order-sensitive
//! - Rounding stays within half a unit of the last kept digit

use octofhir_fhirpath_types::*;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn arb_decimal() -> impl Strategy<Value = Decimal> {
    (any::<i64>(), 0u32..10).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

fn arb_date() -> impl Strategy<Value = DateValue> {
    (0i32..=9999, 1u32..=12, 1u32..=28, 0usize..3).prop_map(|(year, month, day, precision)| {
        DateValue::new(year, month, day, DateTimePrecision::ALL[precision]).unwrap()
    })
}

fn arb_time() -> impl Strategy<Value = TimeValue> {
    (0u32..24, 0u32..60, 0u32..60, 0u32..1_000_000_000, 3usize..7).prop_map(
        |(hour, minute, second, nanos, precision)| {
            TimeValue::new(hour, minute, second, nanos, DateTimePrecision::ALL[precision]).unwrap()
        },
    )
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::boolean),
        any::<i32>().prop_map(Value::integer),
        arb_decimal().prop_map(Value::decimal),
        "[a-zA-Z ]{0,12}".prop_map(Value::string),
        arb_date().prop_map(Value::Date),
        arb_time().prop_map(Value::Time),
        (arb_decimal(), prop_oneof![Just("mg"), Just("cm2"), Just("d"), Just("[foo]")])
            .prop_map(|(magnitude, unit)| {
                Value::Quantity(QuantityValue::with_unit_name(magnitude, unit))
            }),
    ]
}

proptest! {
    #[test]
    fn equal_is_reflexive(value in arb_value()) {
        prop_assert!(value.equal(&value));
        prop_assert!(value.equivalent(&value));
    }

    #[test]
    fn equal_is_symmetric_for_numbers(a in any::<i32>(), b in arb_decimal()) {
        let (a, b) = (Value::integer(a), Value::decimal(b));
        prop_assert_eq!(a.equal(&b), b.equal(&a));
    }

    #[test]
    fn collection_equality_is_order_sensitive(values in prop::collection::vec(any::<i32>(), 2..8)) {
        let forward: Collection = values.iter().copied().map(Value::integer).collect();
        let reversed: Collection = values.iter().rev().copied().map(Value::integer).collect();
        prop_assert!(forward.equal(&forward.clone()));

        let palindrome = values.iter().eq(values.iter().rev());
        prop_assert_eq!(forward.equal(&reversed), palindrome);
        prop_assert_eq!(forward.equivalent(&reversed), palindrome);
    }

    #[test]
    fn rounding_is_bounded(value in arb_decimal(), precision in 0i32..8) {
        let rounded = DecimalValue::new(value).round(precision).unwrap().value();
        let half_unit = Decimal::new(5, precision as u32 + 1);
        prop_assert!((rounded - value).abs() <= half_unit);
        prop_assert!(rounded.scale() <= precision as u32);
    }

    #[test]
    fn truncation_moves_toward_zero(value in arb_decimal(), precision in 0i32..8) {
        let truncated = DecimalValue::new(value).truncate(precision).unwrap().value();
        prop_assert!(truncated.abs() <= value.abs());
    }
}
