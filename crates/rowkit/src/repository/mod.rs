//! The generic entity repository.
//!
//! [`Repository`] is a trait whose default methods supply the whole
//! operation set: insert-or-update saves with merge-back of store-generated
//! fields, field-restricted partial updates, diff-derived updates, raw
//! upserts, soft-delete-aware destroys, and criteria queries. A concrete
//! repository type implements the trait by naming its handle and mapper;
//! it can override any named operation and add its own on top, which
//! replaces the original design's runtime method injection with ordinary
//! trait composition.
//!
//! [`BaseRepository`] is the stock implementation for callers that need no
//! specialization.

use rusqlite::types::Value;
use tracing::debug;

use crate::{
    error::Result,
    fields::{is_truthy, FieldMap, CREATED_AT, UPDATED_AT},
    handle::{BuiltRow, DestroyOptions, PersistenceHandle, QueryOptions},
    traits::{Entity, Mapper},
};

/// CRUD and query facade bound to one persistence-handle-and-mapper pair.
///
/// Implementations are constructed once per entity type and reused for the
/// process lifetime; no per-call state exists beyond the arguments, so one
/// instance is safe to share across callers. Isolation and atomicity of
/// concurrent writes are entirely the store's concern.
///
/// Operations that target rows by key assume the entity-side primary-key
/// field carries the same name as its column. When the handle declares no
/// primary key, key-based operations silently build empty or incorrect
/// criteria instead of failing fast; that risk is documented here rather
/// than remedied.
pub trait Repository {
    type Entity: Entity;
    type Handle: PersistenceHandle;
    type Mapper: Mapper<Entity = Self::Entity>;

    fn handle(&self) -> &Self::Handle;
    fn mapper(&self) -> &Self::Mapper;

    /// The statically declared primary-key name, if any.
    fn primary_key(&self) -> Option<&'static str> {
        self.handle().primary_key()
    }

    /// Whether the entity counts as persisted: its primary-key field is
    /// present and filled. This single predicate decides insert-vs-update
    /// everywhere.
    fn has_primary_key_filled(&self, entity: &Self::Entity) -> bool {
        self.primary_key()
            .and_then(|pk| entity.get(pk))
            .is_some_and(|value| is_truthy(&value))
    }

    /// Persists the entity: insert when its key is unfilled, full-row update
    /// otherwise.
    ///
    /// The returned entity always carries the authoritative primary key and
    /// timestamps from the store while preserving every other caller-supplied
    /// field untouched.
    fn save(&self, entity: &Self::Entity) -> Result<Self::Entity> {
        let record = self.mapper().to_database(&entity.fields());
        let is_new_record = !self.has_primary_key_filled(entity);

        let saved = self.handle().build(record, is_new_record).save()?;
        Ok(self.absorb_saved_record(entity, &saved))
    }

    /// Merges a post-save record back into entity shape.
    ///
    /// Precedence, lowest to highest: the record mapped to entity shape,
    /// then the caller-supplied entity fields, then — for the reserved
    /// fields (primary key, `created_at`, `updated_at`) only — whichever of
    /// those the record reports as filled.
    fn absorb_saved_record(&self, entity: &Self::Entity, saved: &FieldMap) -> Self::Entity {
        let mapped = self
            .mapper()
            .to_entity(Some(saved))
            .map(|e| e.fields())
            .unwrap_or_default();

        let mut merged = mapped.clone();
        merged.extend(entity.fields());

        let mut reserved = vec![CREATED_AT, UPDATED_AT];
        reserved.extend(self.primary_key());
        for field in reserved {
            if let Some(value) = mapped.get(field) {
                if is_truthy(value) {
                    merged.insert(field.to_string(), value.clone());
                }
            }
        }

        self.mapper().create_entity(merged, true)
    }

    /// Restricted partial update: writes exactly the named fields, never a
    /// full-row overwrite.
    ///
    /// A named field the entity resolves to null (or does not carry) is
    /// written as an explicit SQL `NULL`; fields outside `fields` never
    /// enter the payload, so null-versus-omitted stays unambiguous all the
    /// way to the store. `relationship_fields` are raw store-native columns
    /// merged in after translation, bypassing the mapper (foreign keys,
    /// typically). Match criteria are the entity's current primary-key value
    /// plus every field named in `where_fields`, taken verbatim from the
    /// entity.
    ///
    /// The entity is not re-read or re-merged after the write; a write that
    /// matched zero rows is indistinguishable from a no-op here.
    fn update(
        &self,
        entity: &Self::Entity,
        fields: &[&str],
        relationship_fields: &FieldMap,
        where_fields: &[&str],
    ) -> Result<()> {
        let mut entity_values = FieldMap::new();
        for field in fields {
            entity_values.insert(
                (*field).to_string(),
                entity.get(field).unwrap_or(Value::Null),
            );
        }

        let mut columns = self.mapper().to_database(&entity_values);
        columns.extend(
            relationship_fields
                .iter()
                .map(|(column, value)| (column.clone(), value.clone())),
        );

        let mut key_values = FieldMap::new();
        if let Some(pk) = self.primary_key() {
            key_values.insert(pk.to_string(), entity.get(pk).unwrap_or(Value::Null));
        }
        for field in where_fields {
            key_values.insert(
                (*field).to_string(),
                entity.get(field).unwrap_or(Value::Null),
            );
        }
        let criteria = self.mapper().to_database(&key_values);

        debug!(fields = fields.len(), "partial update");
        self.handle().update(&columns, &criteria)?;
        Ok(())
    }

    /// Merges `new_fields` into the entity in place, then updates exactly
    /// those fields. The mutation happens before the write; the caller's
    /// entity is the updated value afterwards.
    fn update_fields(
        &self,
        entity: &mut Self::Entity,
        new_fields: &FieldMap,
        relationship_fields: &FieldMap,
        where_fields: &[&str],
    ) -> Result<()> {
        for (field, value) in new_fields {
            entity.set(field, value.clone());
        }

        let fields: Vec<&str> = new_fields.keys().map(String::as_str).collect();
        self.update(entity, &fields, relationship_fields, where_fields)
    }

    /// Updates exactly the fields whose values differ between `original` and
    /// `updated`.
    ///
    /// The comparison is shallow and covers the top-level keys of
    /// `original`; a field the updated entity dropped counts as changed and
    /// is written as null. With no differing field this performs no write at
    /// all.
    fn update_by_diff(
        &self,
        original: &Self::Entity,
        updated: &Self::Entity,
        relationship_fields: &FieldMap,
    ) -> Result<()> {
        let changed: Vec<String> = original
            .fields()
            .into_iter()
            .filter(|(field, value)| updated.get(field).as_ref() != Some(value))
            .map(|(field, _)| field)
            .collect();

        if changed.is_empty() {
            return Ok(());
        }

        let fields: Vec<&str> = changed.iter().map(String::as_str).collect();
        self.update(updated, &fields, relationship_fields, &[])
    }

    /// Native insert-or-update passthrough with separate insert and update
    /// payloads and a match condition. No mapper translation: the caller
    /// supplies store-native column names. Returns the store's affected
    /// count.
    fn upsert(
        &self,
        insert_values: &FieldMap,
        update_values: &FieldMap,
        criteria: &FieldMap,
    ) -> Result<u64> {
        self.handle().upsert(insert_values, update_values, criteria)
    }

    /// Destroys the entity's row, building a transient store row with the
    /// same is-new-record logic as [`save`](Self::save). Soft by default on
    /// tables that support it; [`DestroyOptions::force`] hard-deletes.
    fn delete(&self, entity: &Self::Entity, options: DestroyOptions) -> Result<u64> {
        let record = self.mapper().to_database(&entity.fields());
        let is_new_record = !self.has_primary_key_filled(entity);

        self.handle().build(record, is_new_record).destroy(options)
    }

    /// Bulk destroy restricted by store-native criteria. Returns the
    /// affected count.
    fn delete_all_by_criterias(&self, criteria: &FieldMap, options: DestroyOptions) -> Result<u64> {
        self.handle().destroy_all(criteria, options)
    }

    /// Reads the first record matching the options and maps it into an
    /// entity.
    fn find_one_by(&self, options: &QueryOptions) -> Result<Option<Self::Entity>> {
        let record = self.handle().find_one(options)?;
        Ok(self.mapper().to_entity(record.as_ref()))
    }

    /// Looks up one entity by primary-key value.
    fn find_one_by_id(&self, id: Value) -> Result<Option<Self::Entity>> {
        let mut criteria = FieldMap::new();
        if let Some(pk) = self.primary_key() {
            criteria.insert(pk.to_string(), id);
        }
        self.find_one_by(&QueryOptions::new().criteria(criteria))
    }

    /// Looks up one entity by store-native equality criteria.
    fn find_one_by_criterias(&self, criteria: FieldMap) -> Result<Option<Self::Entity>> {
        self.find_one_by(&QueryOptions::new().criteria(criteria))
    }

    /// Reads every record matching the options and maps each into an entity.
    fn find_all_by(&self, options: &QueryOptions) -> Result<Vec<Self::Entity>> {
        let records = self.handle().find_all(options)?;
        Ok(records
            .iter()
            .filter_map(|record| self.mapper().to_entity(Some(record)))
            .collect())
    }

    /// Lists entities by store-native equality criteria. Soft-deleted rows
    /// are excluded unless the options opt out of paranoid mode.
    fn find_all_by_criterias(
        &self,
        criteria: FieldMap,
        options: QueryOptions,
    ) -> Result<Vec<Self::Entity>> {
        self.find_all_by(&options.criteria(criteria))
    }

    /// Counts rows matching the criteria.
    fn count_by_criterias(&self, criteria: &FieldMap) -> Result<u64> {
        self.handle().count(criteria)
    }
}

/// Stock repository: a handle-and-mapper pair with the default operation
/// set and nothing else.
pub struct BaseRepository<H, M> {
    handle: H,
    mapper: M,
}

impl<H, M> BaseRepository<H, M>
where
    H: PersistenceHandle,
    M: Mapper,
{
    pub fn new(handle: H, mapper: M) -> Self {
        Self { handle, mapper }
    }
}

impl<H, M> Repository for BaseRepository<H, M>
where
    H: PersistenceHandle,
    M: Mapper,
{
    type Entity = M::Entity;
    type Handle = H;
    type Mapper = M;

    fn handle(&self) -> &H {
        &self.handle
    }

    fn mapper(&self) -> &M {
        &self.mapper
    }
}
