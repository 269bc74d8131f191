//! Tests for the tagged configuration value unions and the lambda carrier.

use alertflow::{Dimension, FieldValue, FillKind, Lambda};
use serde_json::json;

#[test]
fn test_field_value_serde_forms() {
    assert_eq!(serde_json::to_value(FieldValue::Bool(true)).unwrap(), json!(true));
    assert_eq!(serde_json::to_value(FieldValue::Int(-3)).unwrap(), json!(-3));
    assert_eq!(serde_json::to_value(FieldValue::Float(1.5)).unwrap(), json!(1.5));
    assert_eq!(
        serde_json::to_value(FieldValue::Str("x".to_string())).unwrap(),
        json!("x")
    );

    // Integers stay integers when decoding.
    let v: FieldValue = serde_json::from_value(json!(7)).unwrap();
    assert_eq!(v, FieldValue::Int(7));
    let v: FieldValue = serde_json::from_value(json!(7.5)).unwrap();
    assert_eq!(v, FieldValue::Float(7.5));
}

#[test]
fn test_dimension_star_marker() {
    assert_eq!(Dimension::from("*"), Dimension::Star);
    assert_eq!(Dimension::from("host"), Dimension::Tag("host".to_string()));

    assert_eq!(serde_json::to_value(Dimension::Star).unwrap(), json!("*"));
    let d: Dimension = serde_json::from_value(json!("dc")).unwrap();
    assert_eq!(d, Dimension::Tag("dc".to_string()));
}

#[test]
fn test_fill_kind_serde_forms() {
    assert_eq!(serde_json::to_value(FillKind::NoFill).unwrap(), json!("none"));
    assert_eq!(serde_json::to_value(FillKind::Null).unwrap(), json!("null"));
    assert_eq!(
        serde_json::to_value(FillKind::Previous).unwrap(),
        json!("previous")
    );
    assert_eq!(serde_json::to_value(FillKind::Value(0.0)).unwrap(), json!(0.0));

    let f: FillKind = serde_json::from_value(json!("previous")).unwrap();
    assert_eq!(f, FillKind::Previous);
    let f: FillKind = serde_json::from_value(json!(42)).unwrap();
    assert_eq!(f, FillKind::Value(42.0));
    assert!(serde_json::from_value::<FillKind>(json!("bogus")).is_err());
}

#[test]
fn test_lambda_wire_form() {
    let lambda = Lambda::new("\"cpu\" > 80");
    assert_eq!(
        serde_json::to_value(&lambda).unwrap(),
        json!({ "typeOf": "lambda", "expression": "\"cpu\" > 80" })
    );

    // typeOf may be missing in hand-written payloads.
    let back: Lambda = serde_json::from_value(json!({ "expression": "TRUE" })).unwrap();
    assert_eq!(back, Lambda::new("TRUE"));
}
