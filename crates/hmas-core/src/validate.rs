//! Action payload validation.
//!
//! Parameters are checked in declaration order and the first failure wins.
//! Per parameter: presence, then array shape and item kinds (arrays stop
//! there), then enum membership, then numeric coercion and bounds, then the
//! plain kind check for booleans and objects. Keys the schema does not name
//! are ignored.

use crate::error::DispatchError;
use crate::schema::{Constraint, SchemaKind};
use crate::value::{PropertyMap, PropertyValue};

pub use crate::schema::ParameterSpec;

/// Validate `payload` and return the declared parameters, numerics coerced
/// to their schema kind.
pub fn validate(params: &[ParameterSpec], payload: &PropertyMap) -> Result<PropertyMap, DispatchError> {
    let mut validated = PropertyMap::new();
    for spec in params {
        let Some(value) = payload.get(&spec.name) else {
            if spec.required {
                return Err(DispatchError::MissingParameter(spec.name.clone()));
            }
            continue;
        };
        let checked = check_value(&spec.name, &spec.constraint, value)?;
        validated.insert(spec.name.clone(), checked);
    }
    Ok(validated)
}

fn check_value(name: &str, constraint: &Constraint, value: &PropertyValue) -> Result<PropertyValue, DispatchError> {
    if constraint.kind == SchemaKind::Array {
        let Some(items) = value.as_array() else {
            return Err(invalid_type(name, value, "array"));
        };
        if let Some(item_schema) = &constraint.items {
            for (idx, item) in items.iter().enumerate() {
                if !matches_kind(item_schema.kind, item) {
                    return Err(DispatchError::InvalidType {
                        parameter: name.to_string(),
                        message: format!(
                            "Invalid item type at index {} in parameter '{}': '{}'. Expected {}",
                            idx,
                            name,
                            item.to_plain_string(),
                            item_schema.kind
                        ),
                    });
                }
            }
        }
        return Ok(value.clone());
    }

    if !constraint.enum_values.is_empty() {
        let plain = value.to_plain_string();
        if !constraint.enum_values.iter().any(|v| v == &plain) {
            return Err(DispatchError::InvalidEnumValue {
                parameter: name.to_string(),
                message: format!(
                    "Invalid value for parameter '{}': '{}'. Must be one of: {}",
                    name,
                    plain,
                    constraint.enum_values.join(", ")
                ),
            });
        }
    }

    match constraint.kind {
        SchemaKind::Integer | SchemaKind::Number => check_numeric(name, constraint, value),
        SchemaKind::Boolean if value.as_bool().is_none() => Err(invalid_type(name, value, "boolean")),
        SchemaKind::Object if value.as_object().is_none() => Err(invalid_type(name, value, "object")),
        _ => Ok(value.clone()),
    }
}

fn check_numeric(name: &str, constraint: &Constraint, value: &PropertyValue) -> Result<PropertyValue, DispatchError> {
    let coerced = match constraint.kind {
        SchemaKind::Integer => coerce_integer(value).map(PropertyValue::Integer),
        _ => coerce_number(value).map(PropertyValue::Number),
    };
    let Some(coerced) = coerced else {
        return Err(invalid_type(name, value, constraint.kind.as_str()));
    };
    let n = coerced.as_f64().unwrap_or_default();

    if let Some(min) = constraint.minimum {
        if n < min.as_f64() {
            return Err(DispatchError::InvalidRange {
                parameter: name.to_string(),
                message: format!(
                    "Invalid value for parameter '{}': {}. Must be >= {}",
                    name, value, min
                ),
            });
        }
    }
    if let Some(max) = constraint.maximum {
        if n > max.as_f64() {
            return Err(DispatchError::InvalidRange {
                parameter: name.to_string(),
                message: format!(
                    "Invalid value for parameter '{}': {}. Must be <= {}",
                    name, value, max
                ),
            });
        }
    }
    Ok(coerced)
}

/// 2^63; every whole float in `[-2^63, 2^63)` converts to `i64` exactly.
const I64_SPAN: f64 = 9_223_372_036_854_775_808.0;

fn coerce_integer(value: &PropertyValue) -> Option<i64> {
    match value {
        PropertyValue::Integer(i) => Some(*i),
        PropertyValue::Number(f) if f.fract() == 0.0 && (-I64_SPAN..I64_SPAN).contains(f) => Some(*f as i64),
        PropertyValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_number(value: &PropertyValue) -> Option<f64> {
    match value {
        PropertyValue::Integer(i) => Some(*i as f64),
        PropertyValue::Number(f) => Some(*f),
        PropertyValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn matches_kind(kind: SchemaKind, value: &PropertyValue) -> bool {
    match kind {
        SchemaKind::String => value.as_str().is_some(),
        SchemaKind::Integer => matches!(value, PropertyValue::Integer(_)),
        SchemaKind::Number => value.as_f64().is_some(),
        SchemaKind::Boolean => value.as_bool().is_some(),
        SchemaKind::Array => value.as_array().is_some(),
        SchemaKind::Object => value.as_object().is_some(),
    }
}

fn invalid_type(name: &str, value: &PropertyValue, expected: &str) -> DispatchError {
    DispatchError::InvalidType {
        parameter: name.to_string(),
        message: format!(
            "Invalid value for parameter '{}': '{}'. Expected {}",
            name,
            value.to_plain_string(),
            expected
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Bound;
    use crate::value::map_from_json;
    use serde_json::json;

    fn payload(v: serde_json::Value) -> PropertyMap {
        map_from_json(v).unwrap()
    }

    fn brightness() -> Vec<ParameterSpec> {
        vec![ParameterSpec::required(
            "brightness",
            Constraint::of_kind(SchemaKind::Integer)
                .with_range(Some(Bound::Int(0)), Some(Bound::Int(100))),
        )]
    }

    #[test]
    fn test_missing_parameter() {
        let err = validate(&brightness(), &payload(json!({}))).unwrap_err();
        assert!(matches!(err, DispatchError::MissingParameter(ref p) if p == "brightness"));
    }

    #[test]
    fn test_out_of_range() {
        let err = validate(&brightness(), &payload(json!({"brightness": 150}))).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidRange { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid value for parameter 'brightness': 150. Must be <= 100"
        );
        let err = validate(&brightness(), &payload(json!({"brightness": -1}))).unwrap_err();
        assert!(err.to_string().ends_with("Must be >= 0"));
    }

    #[test]
    fn test_bounds_are_inclusive_and_strings_coerce() {
        let out = validate(&brightness(), &payload(json!({"brightness": 100}))).unwrap();
        assert_eq!(out["brightness"], PropertyValue::Integer(100));
        let out = validate(&brightness(), &payload(json!({"brightness": "42"}))).unwrap();
        assert_eq!(out["brightness"], PropertyValue::Integer(42));
    }

    #[test]
    fn test_non_numeric_is_invalid_type() {
        let err = validate(&brightness(), &payload(json!({"brightness": "bright"}))).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidType { .. }));
        let err = validate(&brightness(), &payload(json!({"brightness": 4.5}))).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidType { .. }));
    }

    #[test]
    fn test_whole_float_outside_i64_is_invalid_type() {
        let params = vec![ParameterSpec::required("count", Constraint::of_kind(SchemaKind::Integer))];
        let out = validate(&params, &payload(json!({"count": 3.0}))).unwrap();
        assert_eq!(out["count"], PropertyValue::Integer(3));
        for huge in [json!(1e20), json!(-1e20), json!(9.223372036854775808e18)] {
            let err = validate(&params, &payload(json!({ "count": huge }))).unwrap_err();
            assert!(matches!(err, DispatchError::InvalidType { ref parameter, .. } if parameter == "count"));
        }
    }

    #[test]
    fn test_enum_is_case_sensitive() {
        let params = vec![ParameterSpec::required(
            "mode",
            Constraint::of_kind(SchemaKind::String).with_enum(["cool", "heat"]),
        )];
        assert!(validate(&params, &payload(json!({"mode": "cool"}))).is_ok());
        let err = validate(&params, &payload(json!({"mode": "Cool"}))).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidEnumValue { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid value for parameter 'mode': 'Cool'. Must be one of: cool, heat"
        );
    }

    #[test]
    fn test_enum_checked_before_range() {
        let params = vec![ParameterSpec::required(
            "level",
            Constraint::of_kind(SchemaKind::Integer)
                .with_enum(["1", "2", "3"])
                .with_range(Some(Bound::Int(2)), None),
        )];
        let err = validate(&params, &payload(json!({"level": 7}))).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidEnumValue { .. }));
        let err = validate(&params, &payload(json!({"level": 1}))).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidRange { .. }));
    }

    #[test]
    fn test_array_items() {
        let params = vec![ParameterSpec::required(
            "days",
            Constraint::of_kind(SchemaKind::Array).with_items(Constraint::of_kind(SchemaKind::Integer)),
        )];
        assert!(validate(&params, &payload(json!({"days": [1, 2, 3]}))).is_ok());
        let err = validate(&params, &payload(json!({"days": [1, "two"]}))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid item type at index 1 in parameter 'days': 'two'. Expected integer"
        );
        let err = validate(&params, &payload(json!({"days": 3}))).unwrap_err();
        assert!(err.to_string().ends_with("Expected array"));
    }

    #[test]
    fn test_boolean_requires_json_bool() {
        let params = vec![ParameterSpec::required("swing", Constraint::of_kind(SchemaKind::Boolean))];
        assert!(validate(&params, &payload(json!({"swing": true}))).is_ok());
        let err = validate(&params, &payload(json!({"swing": "true"}))).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidType { .. }));
    }

    #[test]
    fn test_extra_keys_ignored_and_optional_skipped() {
        let mut params = brightness();
        params.push(ParameterSpec {
            name: "fade".into(),
            constraint: Constraint::of_kind(SchemaKind::Integer),
            required: false,
        });
        let out = validate(&params, &payload(json!({"brightness": 10, "colour": "red"}))).unwrap();
        assert_eq!(out.len(), 1);
        assert!(!out.contains_key("colour"));
    }

    #[test]
    fn test_first_failure_wins() {
        let params = vec![
            ParameterSpec::required("a", Constraint::of_kind(SchemaKind::Integer)),
            ParameterSpec::required("b", Constraint::of_kind(SchemaKind::Integer)),
        ];
        let err = validate(&params, &payload(json!({"a": "x"}))).unwrap_err();
        assert_eq!(err.parameter(), Some("a"));
    }
}
