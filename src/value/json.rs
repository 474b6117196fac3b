//! JSON encoding of cell values
//!
//! Decimals and timestamps are written as strings so they survive a round trip
//! through JSON without losing precision.

use super::types::{is_null, null_of};
use crate::schema::ColumnType;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_query::Value;
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Encode a cell value as JSON
#[must_use]
pub fn to_json(value: &Value) -> JsonValue {
    if is_null(value) {
        return JsonValue::Null;
    }
    match value {
        Value::String(Some(s)) => JsonValue::String(s.to_string()),
        Value::BigInt(Some(n)) => JsonValue::from(*n),
        Value::Int(Some(n)) => JsonValue::from(*n),
        Value::Bool(Some(b)) => JsonValue::Bool(*b),
        Value::Decimal(Some(d)) => JsonValue::String(d.to_string()),
        Value::ChronoDateTimeUtc(Some(t)) => JsonValue::String(t.to_rfc3339()),
        other => JsonValue::String(format!("{other:?}")),
    }
}

/// Decode a JSON value for a column of the given type
///
/// # Errors
///
/// Returns a description of the mismatch when `json` cannot represent the type.
pub fn from_json(json: &JsonValue, column_type: ColumnType) -> Result<Value, String> {
    if json.is_null() {
        return Ok(null_of(column_type));
    }
    match column_type {
        ColumnType::String | ColumnType::Text => json
            .as_str()
            .map(|s| Value::from(s.to_string()))
            .ok_or_else(|| format!("expected a string, got {json}")),
        ColumnType::Integer | ColumnType::BigInteger => json
            .as_i64()
            .map(|n| Value::BigInt(Some(n)))
            .ok_or_else(|| format!("expected an integer, got {json}")),
        ColumnType::Decimal { .. } => {
            let parsed = match json {
                JsonValue::String(s) => Decimal::from_str(s).ok(),
                JsonValue::Number(n) => Decimal::from_str(&n.to_string()).ok(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| format!("expected a decimal, got {json}"))
        }
        ColumnType::DateTime => json
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| Value::from(t.with_timezone(&Utc)))
            .ok_or_else(|| format!("expected an RFC 3339 timestamp, got {json}")),
        ColumnType::Boolean => json
            .as_bool()
            .map(|b| Value::Bool(Some(b)))
            .ok_or_else(|| format!("expected a boolean, got {json}")),
    }
}
