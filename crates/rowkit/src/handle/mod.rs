//! Persistence handle contracts.
//!
//! A handle owns the store side of one table: it knows how to persist and
//! destroy rows, run criteria-restricted reads and writes, and it declares
//! the table's primary key statically. Repositories only ever talk to the
//! store through this boundary, so swapping the backing store means swapping
//! the handle implementation.

pub mod sqlite;

pub use sqlite::SqliteHandle;

use crate::{error::Result, fields::FieldMap};

/// Static shape declaration for one table.
///
/// The primary key and the auto-managed columns are declared here once, per
/// table, instead of being discovered from store metadata at runtime. A table
/// without `deleted_at` has no soft-delete behavior; destroys against it are
/// always hard deletes.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub table: &'static str,
    pub primary_key: Option<&'static str>,
    pub created_at: Option<&'static str>,
    pub updated_at: Option<&'static str>,
    pub deleted_at: Option<&'static str>,
}

impl TableSpec {
    pub const fn new(table: &'static str) -> Self {
        Self {
            table,
            primary_key: None,
            created_at: None,
            updated_at: None,
            deleted_at: None,
        }
    }

    pub const fn primary_key(mut self, column: &'static str) -> Self {
        self.primary_key = Some(column);
        self
    }

    pub const fn created_at(mut self, column: &'static str) -> Self {
        self.created_at = Some(column);
        self
    }

    pub const fn updated_at(mut self, column: &'static str) -> Self {
        self.updated_at = Some(column);
        self
    }

    pub const fn deleted_at(mut self, column: &'static str) -> Self {
        self.deleted_at = Some(column);
        self
    }
}

/// Read options passed through the repository's query operations.
///
/// `criteria` is a plain equality map over store-native column names;
/// anything richer belongs in application-level queries built directly on
/// [`crate::query::SelectQuery`]. `paranoid` defaults to true: soft-deleted
/// rows are excluded unless a caller opts in.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub criteria: FieldMap,
    pub paranoid: bool,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub order: Vec<(String, bool)>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            criteria: FieldMap::new(),
            paranoid: true,
            limit: None,
            offset: None,
            order: vec![],
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn criteria(mut self, criteria: FieldMap) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn paranoid(mut self, paranoid: bool) -> Self {
        self.paranoid = paranoid;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, desc: bool) -> Self {
        self.order.push((column.into(), desc));
        self
    }
}

/// Destroy options.
///
/// `force` turns a soft delete into a hard `DELETE` even when the table
/// declares a soft-delete column.
#[derive(Debug, Clone, Copy, Default)]
pub struct DestroyOptions {
    pub force: bool,
}

impl DestroyOptions {
    pub const fn force() -> Self {
        Self { force: true }
    }
}

/// A transient, store-backed row built from record fields.
///
/// `save` persists the row (insert for new records, full-row update
/// otherwise) and returns the authoritative post-save record, including
/// store-generated key and timestamps. `destroy` removes the row the same
/// way a destroy on the live store object would.
pub trait BuiltRow {
    fn save(self) -> Result<FieldMap>;
    fn destroy(self, options: DestroyOptions) -> Result<u64>;
}

/// Store primitives for one table.
///
/// All criteria and column maps are store-native: the repository runs its
/// mapper before crossing this boundary. Implementations do not interpret
/// the payload beyond compiling it into statements.
pub trait PersistenceHandle {
    type Row: BuiltRow;

    /// The statically declared primary-key column, if any.
    ///
    /// When this is `None`, key-based operations up the stack silently build
    /// empty criteria; the contract documents that as caller-owned risk
    /// rather than failing here.
    fn primary_key(&self) -> Option<&'static str>;

    /// Builds a transient row from record fields.
    fn build(&self, record: FieldMap, is_new_record: bool) -> Self::Row;

    /// Reads the first record matching the options.
    fn find_one(&self, options: &QueryOptions) -> Result<Option<FieldMap>>;

    /// Reads every record matching the options.
    fn find_all(&self, options: &QueryOptions) -> Result<Vec<FieldMap>>;

    /// Counts records matching the criteria, honoring soft deletion.
    fn count(&self, criteria: &FieldMap) -> Result<u64>;

    /// Writes exactly the given column set to rows matching the criteria.
    /// Returns the number of affected rows.
    fn update(&self, columns: &FieldMap, criteria: &FieldMap) -> Result<u64>;

    /// Destroys every row matching the criteria. Returns the affected count.
    fn destroy_all(&self, criteria: &FieldMap, options: DestroyOptions) -> Result<u64>;

    /// Native insert-or-update with separate insert and update payloads and
    /// a match condition. Returns the affected count.
    fn upsert(
        &self,
        insert_values: &FieldMap,
        update_values: &FieldMap,
        criteria: &FieldMap,
    ) -> Result<u64>;
}
