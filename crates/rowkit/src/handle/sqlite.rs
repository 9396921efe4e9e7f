//! SQLite-backed persistence handle.

use chrono::Utc;
use rusqlite::types::Value;
use tracing::debug;

use crate::{
    connection::SharedConnection,
    error::Result,
    expr::{Col, Criteria},
    fields::{is_truthy, FieldMap},
    handle::{BuiltRow, DestroyOptions, PersistenceHandle, QueryOptions, TableSpec},
    query::{DeleteQuery, InsertQuery, SelectQuery, UpdateQuery},
    traits::Expression as _,
};

/// Persistence handle for one SQLite table.
///
/// Cheap to clone; the connection is shared. All reads and writes go through
/// the crate's query builders, and soft deletion is driven entirely by the
/// [`TableSpec`]: a declared `deleted_at` column makes destroys soft and
/// paranoid reads exclude marked rows.
#[derive(Clone)]
pub struct SqliteHandle {
    db: SharedConnection,
    spec: TableSpec,
}

impl SqliteHandle {
    pub fn new(db: SharedConnection, spec: TableSpec) -> Self {
        Self { db, spec }
    }

    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    fn select(&self, options: &QueryOptions) -> SelectQuery<FieldMap> {
        let mut query = SelectQuery::<FieldMap>::from(self.db.clone(), self.spec.table);

        if !options.criteria.is_empty() {
            query = query.filter(Criteria::new(options.criteria.clone()));
        }
        if options.paranoid {
            if let Some(deleted) = self.spec.deleted_at {
                query = query.filter(Col::<String>::new(deleted).null());
            }
        }
        for (column, desc) in &options.order {
            query = query.order_by_column(column.clone(), *desc);
        }
        if let Some(limit) = options.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = options.offset {
            query = query.offset(offset);
        }

        query
    }
}

impl PersistenceHandle for SqliteHandle {
    type Row = SqliteRow;

    fn primary_key(&self) -> Option<&'static str> {
        self.spec.primary_key
    }

    fn build(&self, record: FieldMap, is_new_record: bool) -> SqliteRow {
        SqliteRow {
            db: self.db.clone(),
            spec: self.spec,
            record,
            is_new_record,
        }
    }

    fn find_one(&self, options: &QueryOptions) -> Result<Option<FieldMap>> {
        Ok(self.select(options).fetch_one()?)
    }

    fn find_all(&self, options: &QueryOptions) -> Result<Vec<FieldMap>> {
        Ok(self.select(options).fetch()?)
    }

    fn count(&self, criteria: &FieldMap) -> Result<u64> {
        let options = QueryOptions::new().criteria(criteria.clone());
        Ok(self.select(&options).count()?)
    }

    fn update(&self, columns: &FieldMap, criteria: &FieldMap) -> Result<u64> {
        debug!(
            table = self.spec.table,
            columns = columns.len(),
            "updating rows"
        );

        let mut query = UpdateQuery::table(self.db.clone(), self.spec.table).values(columns);
        if !criteria.is_empty() {
            query = query.filter(Criteria::new(criteria.clone()));
        }
        Ok(query.execute()? as u64)
    }

    fn destroy_all(&self, criteria: &FieldMap, options: DestroyOptions) -> Result<u64> {
        debug!(
            table = self.spec.table,
            force = options.force,
            "destroying rows by criteria"
        );
        destroy_rows(&self.db, &self.spec, criteria, options)
    }

    fn upsert(
        &self,
        insert_values: &FieldMap,
        update_values: &FieldMap,
        criteria: &FieldMap,
    ) -> Result<u64> {
        debug!(table = self.spec.table, "upserting row");

        let conflict_cols: Vec<&str> = criteria.keys().map(String::as_str).collect();
        let affected = InsertQuery::into(self.db.clone(), self.spec.table)
            .values(insert_values)
            .on_conflict_set(&conflict_cols, update_values)
            .execute_count()?;
        Ok(affected as u64)
    }
}

/// A transient row bound to one record's fields.
pub struct SqliteRow {
    db: SharedConnection,
    spec: TableSpec,
    record: FieldMap,
    is_new_record: bool,
}

impl BuiltRow for SqliteRow {
    fn save(self) -> Result<FieldMap> {
        let Self {
            db,
            spec,
            mut record,
            is_new_record,
        } = self;
        let now = Utc::now().to_rfc3339();

        if is_new_record {
            debug!(table = spec.table, "inserting new row");

            stamp(&mut record, spec.created_at, &now);
            stamp(&mut record, spec.updated_at, &now);

            // An unfilled key is left to the store to assign.
            if let Some(pk) = spec.primary_key {
                if !record.get(pk).is_some_and(is_truthy) {
                    record.remove(pk);
                }
            }

            let rowid = InsertQuery::into(db.clone(), spec.table)
                .values(&record)
                .execute()?;

            let saved = SelectQuery::<FieldMap>::from(db, spec.table)
                .filter(Col::<i64>::new("rowid").eq(rowid))
                .fetch_one()?;
            Ok(saved.unwrap_or(record))
        } else {
            debug!(table = spec.table, "saving existing row");

            if let Some(col) = spec.updated_at {
                record.insert(col.to_string(), Value::Text(now));
            }

            let criteria = key_criteria(&spec, &record);
            let mut columns = record.clone();
            if let Some(pk) = spec.primary_key {
                columns.remove(pk);
            }

            let mut query = UpdateQuery::table(db.clone(), spec.table).values(&columns);
            if !criteria.is_empty() {
                query = query.filter(Criteria::new(criteria.clone()));
            }
            query.execute()?;

            if criteria.is_empty() {
                return Ok(record);
            }
            let saved = SelectQuery::<FieldMap>::from(db, spec.table)
                .filter(Criteria::new(criteria))
                .fetch_one()?;
            Ok(saved.unwrap_or(record))
        }
    }

    fn destroy(self, options: DestroyOptions) -> Result<u64> {
        debug!(
            table = self.spec.table,
            force = options.force,
            "destroying row"
        );

        let criteria = key_criteria(&self.spec, &self.record);
        destroy_rows(&self.db, &self.spec, &criteria, options)
    }
}

/// Match criteria for one record: its primary-key value, when declared.
///
/// With no declared key this is empty and the resulting statement matches
/// every row; key discipline is the caller's responsibility.
fn key_criteria(spec: &TableSpec, record: &FieldMap) -> FieldMap {
    let mut criteria = FieldMap::new();
    if let Some(pk) = spec.primary_key {
        criteria.insert(pk.to_string(), record.get(pk).cloned().unwrap_or(Value::Null));
    }
    criteria
}

fn destroy_rows(
    db: &SharedConnection,
    spec: &TableSpec,
    criteria: &FieldMap,
    options: DestroyOptions,
) -> Result<u64> {
    match spec.deleted_at {
        Some(deleted) if !options.force => {
            let mut query = UpdateQuery::table(db.clone(), spec.table)
                .value(deleted, Value::Text(Utc::now().to_rfc3339()))
                .filter(Col::<String>::new(deleted).null());
            if !criteria.is_empty() {
                query = query.filter(Criteria::new(criteria.clone()));
            }
            Ok(query.execute()? as u64)
        }
        _ => {
            let mut query = DeleteQuery::from(db.clone(), spec.table);
            if !criteria.is_empty() {
                query = query.filter(Criteria::new(criteria.clone()));
            }
            Ok(query.execute()? as u64)
        }
    }
}

/// Fills an auto-managed timestamp column unless the record already carries
/// a filled value for it.
fn stamp(record: &mut FieldMap, column: Option<&'static str>, now: &str) {
    if let Some(col) = column {
        if !record.get(col).is_some_and(is_truthy) {
            record.insert(col.to_string(), Value::Text(now.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection;

    fn setup() -> SqliteHandle {
        let db = connection::open_in_memory().unwrap();
        db.lock()
            .unwrap()
            .execute(
                "CREATE TABLE notes (
                    id INTEGER PRIMARY KEY,
                    body TEXT,
                    created_at TEXT,
                    updated_at TEXT,
                    deleted_at TEXT
                )",
                [],
            )
            .unwrap();

        let spec = TableSpec::new("notes")
            .primary_key("id")
            .created_at("created_at")
            .updated_at("updated_at")
            .deleted_at("deleted_at");
        SqliteHandle::new(db, spec)
    }

    #[test]
    fn test_save_new_row_assigns_key_and_timestamps() {
        let handle = setup();

        let record = crate::field_map! { "body" => "hello".to_string() };
        let saved = handle.build(record, true).save().unwrap();

        assert!(is_truthy(saved.get("id").unwrap()));
        assert!(is_truthy(saved.get("created_at").unwrap()));
        assert!(is_truthy(saved.get("updated_at").unwrap()));
        assert_eq!(saved.get("body"), Some(&Value::Text("hello".into())));
    }

    #[test]
    fn test_save_existing_row_updates_in_place() {
        let handle = setup();

        let saved = handle
            .build(crate::field_map! { "body" => "first".to_string() }, true)
            .save()
            .unwrap();

        let mut record = saved.clone();
        record.insert("body".to_string(), Value::Text("second".into()));
        let resaved = handle.build(record, false).save().unwrap();

        assert_eq!(resaved.get("id"), saved.get("id"));
        assert_eq!(resaved.get("body"), Some(&Value::Text("second".into())));
        assert_eq!(handle.count(&FieldMap::new()).unwrap(), 1);
    }

    #[test]
    fn test_destroy_soft_then_force() {
        let handle = setup();

        let saved = handle
            .build(crate::field_map! { "body" => "x".to_string() }, true)
            .save()
            .unwrap();

        let affected = handle
            .build(saved.clone(), false)
            .destroy(DestroyOptions::default())
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(handle.count(&FieldMap::new()).unwrap(), 0);

        // Still there for non-paranoid reads, gone after a forced destroy.
        let all = handle
            .find_all(&QueryOptions::new().paranoid(false))
            .unwrap();
        assert_eq!(all.len(), 1);

        handle
            .build(saved, false)
            .destroy(DestroyOptions::force())
            .unwrap();
        let all = handle
            .find_all(&QueryOptions::new().paranoid(false))
            .unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_upsert_inserts_then_updates() {
        let handle = setup();

        let insert = crate::field_map! { "id" => 1_i64, "body" => "v1".to_string() };
        let update = crate::field_map! { "body" => "v2".to_string() };
        let criteria = crate::field_map! { "id" => 1_i64 };

        handle.upsert(&insert, &update, &criteria).unwrap();
        handle.upsert(&insert, &update, &criteria).unwrap();

        let row = handle
            .find_one(&QueryOptions::new().criteria(criteria))
            .unwrap()
            .unwrap();
        assert_eq!(row.get("body"), Some(&Value::Text("v2".into())));
        assert_eq!(handle.count(&FieldMap::new()).unwrap(), 1);
    }
}
