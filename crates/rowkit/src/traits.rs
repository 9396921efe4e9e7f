//! Core traits that power the repository and the query builder.
//!
//! These traits define the contract for:
//! - Reading entity fields by name (`Entity`)
//! - Translating between entity and record shape (`Mapper`)
//! - Converting database rows into Rust types (`FromRow`)
//! - Building SQL expressions (`Expression`)

use rusqlite::{types::Value, Row};

use crate::{
    expr::ops::{BinaryOp, InOp, LikeOp, LogicalOp, NullOp},
    fields::FieldMap,
};

/// A domain entity whose fields are addressable by name.
///
/// The repository reads, merges, and diffs entity fields through this trait,
/// so it never needs to know the concrete entity type. Implementations back
/// it either with a plain field map or with typed struct fields matched by
/// name.
///
/// `get` distinguishes a field that is present but null (`Some(Value::Null)`)
/// from a field the entity does not carry at all (`None`). Partial updates
/// rely on that distinction: a named field that resolves to null is written
/// as an explicit SQL `NULL`, while unnamed fields never enter the payload.
pub trait Entity {
    /// Reads a single field by its entity-side name.
    fn get(&self, field: &str) -> Option<Value>;

    /// Writes a single field by its entity-side name.
    ///
    /// Unknown field names are ignored.
    fn set(&mut self, field: &str, value: Value);

    /// Snapshot of every top-level field, with unset fields as `Value::Null`.
    fn fields(&self) -> FieldMap;
}

/// Bidirectional translation between entity shape and store-native records,
/// plus the entity constructor.
///
/// Mappers are pure: they rename fields and convert values, nothing else.
/// They are supplied by callers per entity type and assumed correct.
pub trait Mapper {
    type Entity: Entity;

    /// Translates entity-shaped fields into store-native column values.
    ///
    /// Must carry `Value::Null` through unchanged; a null in the input is an
    /// explicit null in the output, never a dropped column.
    fn to_database(&self, fields: &FieldMap) -> FieldMap;

    /// Translates a store-native record into an entity. Must tolerate an
    /// absent record and return `None` for it.
    fn to_entity(&self, record: Option<&FieldMap>) -> Option<Self::Entity>;

    /// Constructs an entity from entity-shaped fields.
    ///
    /// `hydrated` marks entities that reflect persisted state, as opposed to
    /// caller-built values that were never round-tripped through the store.
    fn create_entity(&self, fields: FieldMap, hydrated: bool) -> Self::Entity;
}

/// A trait for types that can be converted into SQL expressions.
///
/// This enables ergonomic query construction using operators like `.eq()`, `.like()`, etc.
/// Implementors include:
/// - [`crate::expr::Col`]: a table column
/// - [`BinaryOp`], [`LikeOp`], etc.: compound expressions
/// - [`crate::expr::Criteria`]: an equality-criteria map
///
/// When `to_sql` is called, it appends bound parameters to the provided `params` vector
/// and returns the SQL fragment (with `?` placeholders).
pub trait Expression: Sized {
    /// Converts this expression into a SQL string fragment and appends bound parameters.
    ///
    /// # Parameters
    ///
    /// - `params`: A mutable vector to which bound values (e.g., strings, integers) are pushed.
    ///
    /// # Returns
    ///
    /// A SQL string fragment using `?` as placeholders for parameters.
    fn to_sql(&self, params: &mut Vec<Value>) -> String;

    /// Creates a SQL `=` condition.
    fn eq<T: Into<Value>>(self, value: T) -> BinaryOp<Self> {
        BinaryOp::new(self, "=", value.into())
    }

    /// Creates a SQL `!=` condition.
    fn ne<T: Into<Value>>(self, value: T) -> BinaryOp<Self> {
        BinaryOp::new(self, "!=", value.into())
    }

    /// Creates a SQL `>` condition.
    fn gt<T: Into<Value>>(self, value: T) -> BinaryOp<Self> {
        BinaryOp::new(self, ">", value.into())
    }

    /// Creates a SQL `<` condition.
    fn lt<T: Into<Value>>(self, value: T) -> BinaryOp<Self> {
        BinaryOp::new(self, "<", value.into())
    }

    /// Creates a SQL `>=` condition.
    fn gte<T: Into<Value>>(self, value: T) -> BinaryOp<Self> {
        BinaryOp::new(self, ">=", value.into())
    }

    /// Creates a SQL `<=` condition.
    fn lte<T: Into<Value>>(self, value: T) -> BinaryOp<Self> {
        BinaryOp::new(self, "<=", value.into())
    }

    /// Creates a SQL `LIKE` condition.
    fn like(self, pattern: impl Into<String>) -> LikeOp<Self> {
        LikeOp::new(self, pattern.into(), false)
    }

    /// Creates a SQL `ILIKE` condition.
    fn ilike(self, pattern: impl Into<String>) -> LikeOp<Self> {
        LikeOp::new(self, pattern.into(), true)
    }

    /// Creates a SQL `IN` condition.
    fn in_<T, I>(self, values: I) -> InOp<Self>
    where
        T: Into<Value> + Clone,
        I: IntoIterator<Item = T>,
    {
        let values = values.into_iter().map(|v| v.into()).collect();
        InOp::new(self, values, false)
    }

    /// Creates a SQL `NOT IN` condition.
    fn not_in<T, I>(self, values: I) -> InOp<Self>
    where
        T: Into<Value> + Clone,
        I: IntoIterator<Item = T>,
    {
        let values = values.into_iter().map(|v| v.into()).collect();
        InOp::new(self, values, true)
    }

    /// Creates a SQL `IS NULL` condition.
    fn null(self) -> NullOp<Self> {
        NullOp::new(self, true)
    }

    /// Creates a SQL `IS NOT NULL` condition.
    fn not_null(self) -> NullOp<Self> {
        NullOp::new(self, false)
    }

    /// Combines two expressions with `AND`.
    fn and<E: Expression>(self, other: E) -> LogicalOp<Self, E> {
        LogicalOp::new(self, other, "AND")
    }

    /// Combines two expressions with `OR`.
    fn or<E: Expression>(self, other: E) -> LogicalOp<Self, E> {
        LogicalOp::new(self, other, "OR")
    }
}

/// A trait for types that can be constructed from a SQLite row.
///
/// This is used by [`crate::query::SelectQuery::fetch`] and
/// [`crate::query::SelectQuery::fetch_one`] to map query results.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Generic record mapping: every column of the row, keyed by column name.
///
/// The persistence handle reads rows this way so the mapper can do the
/// entity-shape translation afterwards.
impl FromRow for FieldMap {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let names: Vec<String> = row
            .as_ref()
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut fields = FieldMap::new();
        for (idx, name) in names.into_iter().enumerate() {
            fields.insert(name, row.get::<_, Value>(idx)?);
        }
        Ok(fields)
    }
}
