//! The INSERT query builder.

use std::sync::{Arc, Mutex};

use rusqlite::{types::Value, Connection, ToSql};
use tracing::trace;

use crate::{expr::Col, fields::FieldMap};

pub struct InsertQuery {
    db: Arc<Mutex<Connection>>,
    table: &'static str,
    columns: Vec<String>,
    values: Vec<Value>,
    on_conflict: Option<ConflictClause>,
}

enum ConflictClause {
    DoNothing,
    /// `ON CONFLICT(..) DO UPDATE SET col = excluded.col, ..`
    UpdateFromExcluded {
        conflict_cols: Vec<String>,
        update_cols: Vec<String>,
    },
    /// `ON CONFLICT(..) DO UPDATE SET col = ?, ..` with bound values.
    UpdateSet {
        conflict_cols: Vec<String>,
        updates: Vec<(String, Value)>,
    },
}

impl InsertQuery {
    pub fn into(db: Arc<Mutex<Connection>>, table: &'static str) -> Self {
        Self {
            db,
            table,
            columns: vec![],
            values: vec![],
            on_conflict: None,
        }
    }

    pub fn set<T, V: Into<Value>>(self, col: Col<T>, value: V) -> Self {
        self.value(col.name, value)
    }

    /// Adds a column-value pair with a dynamically named column.
    pub fn value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.push(column.into());
        self.values.push(value.into());
        self
    }

    /// Adds every entry of a field map as a column-value pair.
    pub fn values(mut self, fields: &FieldMap) -> Self {
        for (column, value) in fields {
            self = self.value(column.clone(), value.clone());
        }
        self
    }

    pub fn on_conflict_do_nothing(mut self) -> Self {
        self.on_conflict = Some(ConflictClause::DoNothing);
        self
    }

    pub fn on_conflict_update(mut self, conflict_cols: &[&str], update_cols: &[&str]) -> Self {
        self.on_conflict = Some(ConflictClause::UpdateFromExcluded {
            conflict_cols: conflict_cols.iter().map(|c| c.to_string()).collect(),
            update_cols: update_cols.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// `ON CONFLICT(..) DO UPDATE SET` with explicit bound values, for upserts
    /// whose update payload differs from the inserted row.
    pub fn on_conflict_set(mut self, conflict_cols: &[&str], updates: &FieldMap) -> Self {
        self.on_conflict = Some(ConflictClause::UpdateSet {
            conflict_cols: conflict_cols.iter().map(|c| c.to_string()).collect(),
            updates: updates
                .iter()
                .map(|(column, value)| (column.clone(), value.clone()))
                .collect(),
        });
        self
    }

    pub fn execute(self) -> rusqlite::Result<i64> {
        let (sql, params) = self.build_sql();
        trace!(sql = %sql, "executing insert");
        let conn = self.db.lock().unwrap();

        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
        conn.execute(&sql, params_ref.as_slice())?;
        Ok(conn.last_insert_rowid())
    }

    /// Like [`execute`](Self::execute), but returns the affected row count
    /// instead of the inserted rowid. Upserts report through this.
    pub fn execute_count(self) -> rusqlite::Result<usize> {
        let (sql, params) = self.build_sql();
        trace!(sql = %sql, "executing insert");
        let conn = self.db.lock().unwrap();

        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
        conn.execute(&sql, params_ref.as_slice())
    }

    fn build_sql(&self) -> (String, Vec<Value>) {
        let columns = self.columns.join(", ");
        let placeholders = vec!["?"; self.values.len()].join(", ");
        let mut params = self.values.clone();

        let mut sql = if self.columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", self.table)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table, columns, placeholders
            )
        };

        match &self.on_conflict {
            Some(ConflictClause::DoNothing) => {
                sql.push_str(" ON CONFLICT DO NOTHING");
            }
            Some(ConflictClause::UpdateFromExcluded {
                conflict_cols,
                update_cols,
            }) => {
                let updates: Vec<String> = update_cols
                    .iter()
                    .map(|col| format!("{} = excluded.{}", col, col))
                    .collect();
                sql.push_str(&format!(
                    " ON CONFLICT({}) DO UPDATE SET {}",
                    conflict_cols.join(", "),
                    updates.join(", ")
                ));
            }
            Some(ConflictClause::UpdateSet {
                conflict_cols,
                updates,
            }) => {
                let sets: Vec<String> = updates
                    .iter()
                    .map(|(col, val)| {
                        params.push(val.clone());
                        format!("{} = ?", col)
                    })
                    .collect();
                sql.push_str(&format!(
                    " ON CONFLICT({}) DO UPDATE SET {}",
                    conflict_cols.join(", "),
                    sets.join(", ")
                ));
            }
            None => {}
        }

        (sql, params)
    }
}
