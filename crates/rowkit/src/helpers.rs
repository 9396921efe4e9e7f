//! JSON column helpers.
//!
//! Mappers, entities, and [`crate::traits::FromRow`] implementations that
//! keep structured fields in JSON text columns translate through these on
//! the way in and out of the store.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// Serializes a value into a JSON text column value.
pub fn to_json_value<T: Serialize>(value: &T) -> Value {
    Value::Text(serde_json::to_string(value).unwrap_or_else(|_| "null".to_string()))
}

/// Deserializes a JSON text column value.
///
/// Null, malformed, and non-text values fall back to the default.
pub fn from_json_value<T: for<'de> Deserialize<'de> + Default>(value: &Value) -> T {
    match value {
        Value::Text(s) => serde_json::from_str(s).unwrap_or_default(),
        _ => T::default(),
    }
}
