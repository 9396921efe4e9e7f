//! rowkit — a generic entity repository layer over SQLite.
//!
//! The crate decouples domain entities from the rows that persist them. A
//! [`Repository`] pairs a [`handle::PersistenceHandle`] (store primitives for
//! one table) with a [`Mapper`] (pure entity-to-record translation) and
//! provides saves with merge-back of store-generated fields, field-restricted
//! partial updates, diff-derived updates, soft-delete-aware queries, and raw
//! upserts. Below the handle sits a typed query-builder layer for SELECT,
//! INSERT, UPDATE, and DELETE statements.

pub mod connection;
pub mod error;
pub mod expr;
pub mod fields;
pub mod handle;
pub mod helpers;
pub mod macros;
pub mod query;
pub mod repository;
pub mod traits;

pub use error::{DbError, Result};
pub use expr::{Col, Criteria};
pub use fields::FieldMap;
pub use handle::{DestroyOptions, PersistenceHandle, QueryOptions, SqliteHandle, TableSpec};
pub use helpers::*;
pub use query::*;
pub use repository::{BaseRepository, Repository};
pub use traits::{Entity, FromRow, Mapper};

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::{types::Value, Connection, Row};

    use super::*;
    use crate::traits::Expression as _;

    #[derive(Debug, Clone)]
    struct Package {
        pub id: u64,
        pub name: String,
        pub version: String,
        pub downloads: u64,
        pub description: Option<String>,
        pub maintainers: Option<Vec<String>>,
    }

    impl FromRow for Package {
        fn from_row(row: &Row) -> rusqlite::Result<Self> {
            Ok(Self {
                id: row.get("id")?,
                name: row.get("name")?,
                version: row.get("version")?,
                downloads: row.get("downloads")?,
                description: row.get("description")?,
                maintainers: from_json_value(&row.get::<_, Value>("maintainers")?),
            })
        }
    }

    define_entity!(
        packages {
            table: "packages",
            columns: {
                ID: i64 => "id",
                NAME: String => "name",
                VERSION: String => "version",
                DOWNLOADS: u64 => "downloads",
                DESCRIPTION: Option<String> => "description",
                MAINTAINERS: Option<Vec<String>> => "maintainers"
            }
        }
    );

    fn setup_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();

        conn.execute(
            "CREATE TABLE packages (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                version TEXT NOT NULL,
                downloads INTEGER NOT NULL DEFAULT 0,
                maintainers JSONB,
                description TEXT
            )",
            [],
        )
        .unwrap();

        Arc::new(Mutex::new(conn))
    }

    #[test]
    fn test_insert() {
        let db = setup_db();

        let maintainers: Vec<String> = vec!["John Doe", "Jane Smith"]
            .into_iter()
            .map(|v| v.to_string())
            .collect();

        let id = InsertQuery::into(db.clone(), packages::TABLE)
            .set(packages::NAME, "rowkit".to_string())
            .set(packages::VERSION, "1.0.0".to_string())
            .set(packages::DOWNLOADS, 100_000_i64)
            .set(packages::DESCRIPTION, "Test description".to_string())
            .set(packages::MAINTAINERS, to_json_value(&maintainers))
            .execute()
            .unwrap();

        assert!(id > 0);

        let pkg = SelectQuery::<Package>::from(db, packages::TABLE)
            .filter(packages::ID.eq(id))
            .fetch_one()
            .unwrap()
            .unwrap();

        assert_eq!(pkg.name, "rowkit");
        assert_eq!(pkg.version, "1.0.0");
        assert_eq!(pkg.downloads, 100_000);
        assert_eq!(pkg.description, Some("Test description".into()));
        assert_eq!(pkg.maintainers, Some(maintainers));
    }

    #[test]
    fn test_select_with_like() {
        let db = setup_db();

        InsertQuery::into(db.clone(), packages::TABLE)
            .set(packages::NAME, "zls".to_string())
            .set(packages::VERSION, "0.15.1".to_string())
            .set(packages::DESCRIPTION, "Zig Language Server".to_string())
            .execute()
            .unwrap();

        InsertQuery::into(db.clone(), packages::TABLE)
            .set(packages::NAME, "rust-analyzer".to_string())
            .set(packages::VERSION, "1.92.0-nightly".to_string())
            .set(packages::DESCRIPTION, "Rusty Language Server".to_string())
            .execute()
            .unwrap();

        let pkgs = SelectQuery::<Package>::from(db, packages::TABLE)
            .filter(packages::NAME.like("rust"))
            .fetch()
            .unwrap();

        assert_eq!(pkgs.len(), 1);
        assert_eq!(pkgs[0].name, "rust-analyzer");
    }

    #[test]
    fn test_update_and_count() {
        let db = setup_db();

        for name in ["a", "b"] {
            InsertQuery::into(db.clone(), packages::TABLE)
                .set(packages::NAME, name.to_string())
                .set(packages::VERSION, "1.0.0".to_string())
                .execute()
                .unwrap();
        }

        let affected = UpdateQuery::table(db.clone(), packages::TABLE)
            .set(packages::VERSION, "2.0.0".to_string())
            .filter(packages::NAME.eq("a".to_string()))
            .execute()
            .unwrap();
        assert_eq!(affected, 1);

        let count = SelectQuery::<Package>::from(db, packages::TABLE)
            .filter(packages::VERSION.eq("2.0.0".to_string()))
            .count()
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_delete() {
        let db = setup_db();

        InsertQuery::into(db.clone(), packages::TABLE)
            .set(packages::NAME, "doomed".to_string())
            .set(packages::VERSION, "0.0.1".to_string())
            .execute()
            .unwrap();

        let affected = DeleteQuery::from(db.clone(), packages::TABLE)
            .filter(packages::NAME.eq("doomed".to_string()))
            .execute()
            .unwrap();
        assert_eq!(affected, 1);

        let count = SelectQuery::<Package>::from(db, packages::TABLE)
            .filter(packages::ID.gt(0))
            .count()
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_select_columns_and_pagination() {
        let db = setup_db();

        for name in ["a", "b", "c", "d"] {
            InsertQuery::into(db.clone(), packages::TABLE)
                .set(packages::NAME, name.to_string())
                .set(packages::VERSION, "1.0.0".to_string())
                .execute()
                .unwrap();
        }

        // Only the selected columns come back.
        let record = SelectQuery::<FieldMap>::from(db.clone(), packages::TABLE)
            .select(&[packages::NAME, packages::VERSION])
            .order_by(packages::ID, false)
            .fetch_one()
            .unwrap()
            .unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("name"), Some(&Value::Text("a".into())));

        // select_all resets a column restriction.
        let pkg = SelectQuery::<Package>::from(db.clone(), packages::TABLE)
            .select(&[packages::NAME])
            .select_all()
            .order_by(packages::ID, false)
            .fetch_one()
            .unwrap()
            .unwrap();
        assert_eq!(pkg.name, "a");

        let page2 = SelectQuery::<Package>::from(db.clone(), packages::TABLE)
            .order_by(packages::ID, false)
            .page(2, 2)
            .fetch()
            .unwrap();
        assert_eq!(page2.len(), 2);
        assert_eq!(page2[0].name, "c");

        // Page numbering is 1-based; page 0 falls back to the first page.
        let first = SelectQuery::<Package>::from(db, packages::TABLE)
            .order_by(packages::ID, false)
            .page(0, 2)
            .fetch()
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].name, "a");
    }

    #[test]
    fn test_join_filters_on_joined_table() {
        let db = setup_db();
        db.lock()
            .unwrap()
            .execute(
                "CREATE TABLE releases (package_id INTEGER, channel TEXT)",
                [],
            )
            .unwrap();

        let id = InsertQuery::into(db.clone(), packages::TABLE)
            .set(packages::NAME, "pkg".to_string())
            .set(packages::VERSION, "1.0.0".to_string())
            .execute()
            .unwrap();
        db.lock()
            .unwrap()
            .execute(
                "INSERT INTO releases (package_id, channel) VALUES (?1, 'stable')",
                [id],
            )
            .unwrap();

        let rows = SelectQuery::<FieldMap>::from(db, packages::TABLE)
            .select(&[packages::NAME])
            .join("JOIN releases ON releases.package_id = packages.id")
            .filter(Col::<String>::new("releases.channel").eq("stable".to_string()))
            .fetch()
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&Value::Text("pkg".into())));
    }

    #[test]
    fn test_expression_operators() {
        let db = setup_db();

        let rows = [
            ("alpha", 5_i64, None::<&str>),
            ("rust-analyzer", 10, Some("Rusty Language Server")),
            ("zls", 20, Some("Zig Language Server")),
        ];
        for (name, downloads, description) in rows {
            let mut query = InsertQuery::into(db.clone(), packages::TABLE)
                .set(packages::NAME, name.to_string())
                .set(packages::VERSION, "1.0.0".to_string())
                .set(packages::DOWNLOADS, downloads);
            if let Some(description) = description {
                query = query.set(packages::DESCRIPTION, description.to_string());
            }
            query.execute().unwrap();
        }

        let count = SelectQuery::<Package>::from(db.clone(), packages::TABLE)
            .filter(
                packages::DOWNLOADS
                    .gte(10_i64)
                    .and(packages::DOWNLOADS.lt(20_i64)),
            )
            .count()
            .unwrap();
        assert_eq!(count, 1);

        let count = SelectQuery::<Package>::from(db.clone(), packages::TABLE)
            .filter(
                packages::DOWNLOADS
                    .lte(5_i64)
                    .or(packages::NAME.ne("zls".to_string())),
            )
            .count()
            .unwrap();
        assert_eq!(count, 2);

        let names = ["alpha".to_string(), "zls".to_string()];
        let count = SelectQuery::<Package>::from(db.clone(), packages::TABLE)
            .filter(packages::NAME.in_(names.clone()))
            .count()
            .unwrap();
        assert_eq!(count, 2);

        let count = SelectQuery::<Package>::from(db.clone(), packages::TABLE)
            .filter(packages::NAME.not_in(names))
            .count()
            .unwrap();
        assert_eq!(count, 1);

        let count = SelectQuery::<Package>::from(db.clone(), packages::TABLE)
            .filter(packages::DESCRIPTION.not_null())
            .count()
            .unwrap();
        assert_eq!(count, 2);

        let pkgs = SelectQuery::<Package>::from(db, packages::TABLE)
            .filter(packages::DESCRIPTION.ilike("RUSTY"))
            .fetch()
            .unwrap();
        assert_eq!(pkgs.len(), 1);
        assert_eq!(pkgs[0].name, "rust-analyzer");
    }

    #[test]
    fn test_insert_on_conflict_do_nothing() {
        let db = setup_db();

        InsertQuery::into(db.clone(), packages::TABLE)
            .set(packages::ID, 1_i64)
            .set(packages::NAME, "pkg".to_string())
            .set(packages::VERSION, "1.0.0".to_string())
            .execute()
            .unwrap();

        InsertQuery::into(db.clone(), packages::TABLE)
            .set(packages::ID, 1_i64)
            .set(packages::NAME, "pkg".to_string())
            .set(packages::VERSION, "9.9.9".to_string())
            .on_conflict_do_nothing()
            .execute()
            .unwrap();

        let pkg = SelectQuery::<Package>::from(db, packages::TABLE)
            .filter(packages::ID.eq(1_i64))
            .fetch_one()
            .unwrap()
            .unwrap();
        assert_eq!(pkg.version, "1.0.0");
    }

    #[test]
    fn test_insert_on_conflict_update() {
        let db = setup_db();

        InsertQuery::into(db.clone(), packages::TABLE)
            .set(packages::ID, 1_i64)
            .set(packages::NAME, "pkg".to_string())
            .set(packages::VERSION, "1.0.0".to_string())
            .execute()
            .unwrap();

        InsertQuery::into(db.clone(), packages::TABLE)
            .set(packages::ID, 1_i64)
            .set(packages::NAME, "pkg".to_string())
            .set(packages::VERSION, "2.0.0".to_string())
            .on_conflict_update(&["id"], &["version"])
            .execute()
            .unwrap();

        let pkg = SelectQuery::<Package>::from(db, packages::TABLE)
            .filter(packages::ID.eq(1_i64))
            .fetch_one()
            .unwrap()
            .unwrap();
        assert_eq!(pkg.version, "2.0.0");
    }

    #[test]
    fn test_generic_record_rows() {
        let db = setup_db();

        InsertQuery::into(db.clone(), packages::TABLE)
            .set(packages::NAME, "pkg".to_string())
            .set(packages::VERSION, "1.0.0".to_string())
            .execute()
            .unwrap();

        let record = SelectQuery::<FieldMap>::from(db, packages::TABLE)
            .filter(packages::NAME.eq("pkg".to_string()))
            .fetch_one()
            .unwrap()
            .unwrap();

        assert_eq!(record.get("name"), Some(&Value::Text("pkg".into())));
        assert_eq!(record.get("description"), Some(&Value::Null));
    }
}
