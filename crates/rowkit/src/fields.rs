//! Field maps: the common currency between entities, mappers, and the store.
//!
//! Both entity-shaped field sets and store-native records are represented as
//! ordered name-to-value maps. The [`crate::traits::Mapper`] translates
//! between the two shapes; everything else passes these maps around.

use std::collections::BTreeMap;

use rusqlite::types::Value;

/// An ordered mapping of field (or column) names to SQLite values.
pub type FieldMap = BTreeMap<String, Value>;

/// Entity field name for the creation timestamp.
pub const CREATED_AT: &str = "created_at";

/// Entity field name for the last-update timestamp.
pub const UPDATED_AT: &str = "updated_at";

/// Returns whether a value counts as "filled".
///
/// `NULL`, zero, the empty string, and the empty blob are not filled. This
/// single predicate decides whether an entity is persisted (its primary key
/// is filled) and therefore whether a save inserts or updates.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Integer(n) => *n != 0,
        Value::Real(f) => *f != 0.0,
        Value::Text(s) => !s.is_empty(),
        Value::Blob(b) => !b.is_empty(),
    }
}
