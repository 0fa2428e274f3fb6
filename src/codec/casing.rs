//! Symmetric lowerCamelCase ⇄ snake_case key conversion for wire payloads.
//!
//! The wire uses lowerCamelCase keys; handler-facing payloads use snake_case.
//! Conversion walks nested objects and arrays and rewrites object *keys*
//! only — values, including string values, are left untouched.

use serde_json::{Map, Value};

/// Convert every object key in `value` from snake_case to lowerCamelCase.
#[must_use]
pub fn to_camel_case(value: &Value) -> Value {
    transform_keys(value, snake_to_camel)
}

/// Convert every object key in `value` from lowerCamelCase to snake_case.
#[must_use]
pub fn to_snake_case(value: &Value) -> Value {
    transform_keys(value, camel_to_snake)
}

fn transform_keys(value: &Value, convert: fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, val) in map {
                out.insert(convert(key), transform_keys(val, convert));
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| transform_keys(v, convert)).collect())
        }
        other => other.clone(),
    }
}

fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upcoming_upper = false;
    for ch in key.chars() {
        if ch == '_' {
            upcoming_upper = true;
        } else if upcoming_upper {
            out.extend(ch.to_uppercase());
            upcoming_upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Strip object keys whose value is JSON `null`, recursively.
///
/// Applied on encode so that an optional field the handler left unset never
/// appears on the wire as an explicit `null`.
#[must_use]
pub fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, val) in map {
                if val.is_null() {
                    continue;
                }
                out.insert(key.clone(), strip_nulls(val));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(strip_nulls).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case("charging_station", "chargingStation")]
    #[case("id", "id")]
    #[case("vendor_name", "vendorName")]
    fn snake_to_camel_cases(#[case] snake: &str, #[case] camel: &str) {
        assert_eq!(snake_to_camel(snake), camel);
    }

    #[rstest]
    #[case("chargingStation", "charging_station")]
    #[case("id", "id")]
    #[case("vendorName", "vendor_name")]
    fn camel_to_snake_cases(#[case] camel: &str, #[case] snake: &str) {
        assert_eq!(camel_to_snake(camel), snake);
    }

    #[rstest]
    fn converts_nested_keys_only() {
        let camel = json!({
            "chargingStation": {"vendorName": "Acme", "model": "Z1"},
            "reason": "PowerUp",
        });
        let snake = to_snake_case(&camel);
        assert_eq!(
            snake,
            json!({
                "charging_station": {"vendor_name": "Acme", "model": "Z1"},
                "reason": "PowerUp",
            })
        );
        assert_eq!(to_camel_case(&snake), camel);
    }

    #[rstest]
    fn leaves_array_values_untouched_but_walks_objects_inside() {
        let camel = json!({"items": [{"itemId": 1}, {"itemId": 2}]});
        let snake = to_snake_case(&camel);
        assert_eq!(snake, json!({"items": [{"item_id": 1}, {"item_id": 2}]}));
    }

    #[rstest]
    fn strip_nulls_removes_only_null_valued_keys() {
        let value = json!({"interval": 10, "status": "Accepted", "pending": null});
        assert_eq!(
            strip_nulls(&value),
            json!({"interval": 10, "status": "Accepted"})
        );
    }
}
