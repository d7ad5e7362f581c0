//! Conversion between plain JSON values and Firestore's typed value encoding.
//!
//! Firestore REST wraps every value in a single-key object naming its type,
//! e.g. `{"stringValue": "joy"}` or `{"integerValue": "42"}` (64-bit integers
//! travel as strings).

use serde_json::{Map, Number, Value, json};

use crate::StoreError;

/// Encode a plain JSON value as a Firestore value.
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode every field of a document.
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), encode(v)))
        .collect()
}

/// Decode a Firestore value into plain JSON.
///
/// Timestamps, references and bytes decode to their string form.
pub fn decode(value: &Value) -> Result<Value, StoreError> {
    let obj = value
        .as_object()
        .filter(|o| o.len() == 1)
        .ok_or_else(|| StoreError::UnsupportedValue(value.to_string()))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| StoreError::UnsupportedValue(value.to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(Value::Bool(inner.as_bool().unwrap_or(false))),
        "integerValue" => decode_integer(inner),
        "doubleValue" => Ok(inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(items)) => items.iter().map(decode).collect::<Result<_, _>>()?,
                _ => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = match inner.get("fields") {
                Some(Value::Object(fields)) => decode_fields(fields)?,
                _ => Map::new(),
            };
            Ok(Value::Object(fields))
        }
        other => Err(StoreError::UnsupportedValue(other.to_string())),
    }
}

/// Decode every field of a document.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, StoreError> {
    fields
        .iter()
        .map(|(k, v)| Ok::<_, StoreError>((k.clone(), decode(v)?)))
        .collect()
}

fn decode_integer(inner: &Value) -> Result<Value, StoreError> {
    let parsed = match inner {
        Value::String(s) => s.parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    };
    parsed
        .map(|i| Value::Number(i.into()))
        .ok_or_else(|| StoreError::UnsupportedValue(format!("integerValue {inner}")))
}
