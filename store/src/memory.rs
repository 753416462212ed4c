//! In-memory entity store.
//!
//! Rows are kept per type in key order. One-to-many links are stored as a
//! foreign-key field on the child; many-to-many links live in a join index,
//! mirrored onto the inverse association when one is declared. All
//! operations take the table lock once, so find-or-create is atomic and a
//! save observes every link committed before it.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tether_core::{
    Association, Cardinality, Fields, Record, RecordId, StoreError, StoreResult, Value,
};
use tether_registry::{AssociationDef, Registry, ResolvedRelation, TypeDef};
use tracing::{debug, trace};

use crate::index::{JoinIndex, JoinKey, KeyAllocator};
use crate::store::{EntityStore, FoundOrCreated};

#[derive(Debug, Default)]
struct Tables {
    /// type -> key -> fields
    rows: HashMap<String, BTreeMap<RecordId, Fields>>,
    /// Many-to-many join rows.
    joins: JoinIndex,
    /// Key allocation per type.
    keys: KeyAllocator,
}

impl Tables {
    fn exists(&self, type_name: &str, key: RecordId) -> bool {
        self.rows
            .get(type_name)
            .map(|rows| rows.contains_key(&key))
            .unwrap_or(false)
    }

    /// Current member keys of `parent_type#key.<assoc.alias>`.
    fn members(&self, parent_type: &str, assoc: &AssociationDef, key: RecordId) -> Vec<RecordId> {
        match assoc.cardinality {
            Cardinality::OneToMany => {
                let Some(field) = assoc.via.as_deref() else {
                    return Vec::new();
                };
                let owner = Value::Ref(key);
                self.rows
                    .get(&assoc.target)
                    .into_iter()
                    .flat_map(|rows| rows.iter())
                    .filter(|(_, fields)| {
                        fields.get(field).map(|v| v.matches(&owner)).unwrap_or(false)
                    })
                    .map(|(id, _)| *id)
                    .collect()
            }
            Cardinality::ManyToMany => self
                .joins
                .children(&JoinKey::new(parent_type, &assoc.alias), key)
                .collect(),
        }
    }

    /// Assemble a record with every declared association accessor.
    fn load(&self, registry: &Registry, type_name: &str, key: RecordId) -> Option<Record> {
        let fields = self.rows.get(type_name)?.get(&key)?.clone();
        let mut record = Record::new(key, type_name, fields);
        for assoc in registry.associations_of(type_name) {
            let members = self.members(type_name, assoc, key);
            record = record.with_association(
                assoc.alias.clone(),
                Association::new(assoc.target.clone(), assoc.cardinality).with_members(members),
            );
        }
        Some(record)
    }

    fn is_linked(&self, relation: &ResolvedRelation, parent: RecordId, child: RecordId) -> bool {
        match relation.cardinality {
            Cardinality::OneToMany => relation
                .via
                .as_deref()
                .and_then(|field| {
                    self.rows
                        .get(&relation.target_type)
                        .and_then(|rows| rows.get(&child))
                        .and_then(|fields| fields.get(field))
                })
                .map(|v| v.matches(&Value::Ref(parent)))
                .unwrap_or(false),
            Cardinality::ManyToMany => self.joins.contains(
                &JoinKey::new(&relation.parent_type, &relation.alias),
                parent,
                child,
            ),
        }
    }

    fn link(&mut self, relation: &ResolvedRelation, parent: RecordId, child: RecordId) {
        match relation.cardinality {
            Cardinality::OneToMany => {
                let (Some(field), Some(fields)) = (
                    relation.via.as_deref(),
                    self.rows
                        .get_mut(&relation.target_type)
                        .and_then(|rows| rows.get_mut(&child)),
                ) else {
                    return;
                };
                fields.insert(field.to_string(), Value::Ref(parent));
            }
            Cardinality::ManyToMany => {
                self.joins.insert(
                    &JoinKey::new(&relation.parent_type, &relation.alias),
                    parent,
                    child,
                );
                if let Some(inverse) = relation.via.as_deref() {
                    self.joins
                        .insert(&JoinKey::new(&relation.target_type, inverse), child, parent);
                }
            }
        }
    }

    /// First stored row of `type_name` satisfying every criterion.
    fn find_match(&self, pk: &str, type_name: &str, criteria: &Fields) -> Option<RecordId> {
        if criteria.is_empty() {
            return None;
        }
        self.rows.get(type_name)?.iter().find_map(|(id, fields)| {
            let matches = criteria.iter().all(|(name, wanted)| {
                if name == pk {
                    RecordId::from_value(wanted) == Some(*id)
                } else {
                    fields.get(name).map(|v| v.matches(wanted)).unwrap_or(false)
                }
            });
            matches.then_some(*id)
        })
    }

    fn create(&mut self, def: &TypeDef, payload: &Fields) -> StoreResult<RecordId> {
        let mut fields = payload.clone();
        let key = match fields.remove(&def.primary_key) {
            None | Some(Value::Null) => self.keys.alloc(&def.name),
            Some(value) => RecordId::from_value(&value).ok_or_else(|| {
                StoreError::invalid(format!(
                    "{} is not a valid key for {}",
                    value, def.name
                ))
            })?,
        };
        if self.exists(&def.name, key) {
            return Err(StoreError::insert_conflict(format!(
                "{}{} already exists",
                def.name, key
            )));
        }

        for attr in def.required_attrs() {
            if fields.get(&attr.name).map(Value::is_null).unwrap_or(true) {
                return Err(StoreError::invalid(format!(
                    "Missing required attribute: {} on type {}",
                    attr.name, def.name
                )));
            }
        }
        for attr in def.attributes.values() {
            if let Some(default) = &attr.default {
                fields
                    .entry(attr.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }

        self.keys.observe(&def.name, key);
        self.rows
            .entry(def.name.clone())
            .or_default()
            .insert(key, fields);
        Ok(key)
    }
}

/// Registry-aware in-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    registry: Arc<Registry>,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store for the given registry.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Get the registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Insert a record directly, bypassing find-or-create. A primary key
    /// in `fields` is honored; otherwise one is allocated.
    pub fn insert(&self, type_name: &str, fields: Fields) -> StoreResult<RecordId> {
        let def = self.type_def(type_name)?;
        let key = self.tables.write().create(def, &fields)?;
        trace!(type_name, %key, "inserted record");
        Ok(key)
    }

    /// Number of stored records of a type.
    pub fn count(&self, type_name: &str) -> usize {
        self.tables
            .read()
            .rows
            .get(type_name)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// Stored fields of a record, as persisted.
    pub fn stored_fields(&self, type_name: &str, key: RecordId) -> Option<Fields> {
        self.tables
            .read()
            .rows
            .get(type_name)
            .and_then(|rows| rows.get(&key))
            .cloned()
    }

    /// Delete a record and any join rows that mention it.
    pub fn remove(&self, type_name: &str, key: RecordId) -> bool {
        let mut tables = self.tables.write();
        let removed = tables
            .rows
            .get_mut(type_name)
            .and_then(|rows| rows.remove(&key))
            .is_some();
        if removed {
            tables.joins.forget_parent(type_name, key);
            for relation in self.registry.relations_targeting(type_name) {
                if relation.cardinality == Cardinality::ManyToMany {
                    tables
                        .joins
                        .remove_child(&JoinKey::new(&relation.parent_type, &relation.alias), key);
                }
            }
            debug!(type_name, %key, "removed record");
        }
        removed
    }

    fn type_def(&self, type_name: &str) -> StoreResult<&TypeDef> {
        self.registry
            .get_type(type_name)
            .ok_or_else(|| StoreError::not_found(format!("Unknown type: {}", type_name)))
    }

    fn find_one_sync(&self, type_name: &str, key: RecordId) -> StoreResult<Option<Record>> {
        self.type_def(type_name)?;
        Ok(self.tables.read().load(&self.registry, type_name, key))
    }

    fn find_or_create_sync(
        &self,
        type_name: &str,
        criteria: &Fields,
        payload: &Fields,
    ) -> StoreResult<FoundOrCreated> {
        let def = self.type_def(type_name)?;
        let pk = def.primary_key.as_str();

        // A null key means "unkeyed": match on what the caller described.
        let effective: Fields = match criteria.get(pk) {
            Some(Value::Null) => payload
                .iter()
                .filter(|(name, _)| name.as_str() != pk)
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            _ => criteria.clone(),
        };

        let mut tables = self.tables.write();
        if let Some(key) = tables.find_match(pk, type_name, &effective) {
            trace!(type_name, %key, "find_or_create matched existing record");
            let record = tables
                .load(&self.registry, type_name, key)
                .ok_or_else(|| StoreError::not_found(format!("{}{}", type_name, key)))?;
            return Ok(FoundOrCreated::found(record));
        }

        let key = tables.create(def, payload)?;
        debug!(type_name, %key, "find_or_create created record");
        let record = tables
            .load(&self.registry, type_name, key)
            .ok_or_else(|| StoreError::not_found(format!("{}{}", type_name, key)))?;
        Ok(FoundOrCreated::created(record))
    }

    fn save_sync(&self, record: &Record) -> StoreResult<()> {
        let type_name = record.type_name.as_str();
        self.type_def(type_name)?;

        let mut tables = self.tables.write();
        if !tables.exists(type_name, record.id) {
            return Err(StoreError::not_found(format!(
                "{}{} does not exist",
                type_name, record.id
            )));
        }

        // Classify every queued add before writing anything.
        let mut writes = Vec::new();
        let mut conflicts = Vec::new();
        for (alias, association) in record.associations() {
            if association.pending().is_empty() {
                continue;
            }
            let relation = self
                .registry
                .resolve_relation(type_name, alias)
                .map_err(|e| StoreError::not_found(e.to_string()))?;
            for &child in association.pending() {
                if !tables.exists(&relation.target_type, child) {
                    return Err(StoreError::not_found(format!(
                        "{}{} does not exist",
                        relation.target_type, child
                    )));
                }
                if tables.is_linked(relation, record.id, child) {
                    conflicts.push(StoreError::duplicate_link(type_name, record.id, alias, child));
                } else {
                    writes.push((relation, child));
                }
            }
        }

        if let Some(rows) = tables.rows.get_mut(type_name) {
            rows.insert(record.id, record.fields.clone());
        }
        for (relation, child) in writes {
            tables.link(relation, record.id, child);
            debug!(type_name, key = %record.id, relation = %relation.alias, %child, "linked");
        }

        // Only conflicts remain at this point, so the conflict is the cause.
        match conflicts.into_iter().next() {
            Some(conflict) => Err(conflict),
            None => Ok(()),
        }
    }

    fn populate_sync(&self, mut record: Record, relation: &str) -> StoreResult<Record> {
        let resolved = self
            .registry
            .resolve_relation(&record.type_name, relation)
            .map_err(|e| StoreError::not_found(e.to_string()))?;
        let assoc = self
            .registry
            .get_type(&record.type_name)
            .and_then(|t| t.get_association(relation))
            .ok_or_else(|| StoreError::not_found(format!("Unknown relation: {}", relation)))?;

        let tables = self.tables.read();
        let members: Vec<Record> = tables
            .members(&record.type_name, assoc, record.id)
            .into_iter()
            .filter_map(|key| tables.load(&self.registry, &resolved.target_type, key))
            .collect();
        drop(tables);

        let association = record.association_mut(relation).ok_or_else(|| {
            StoreError::not_found(format!("Record has no association {}", relation))
        })?;
        association.set_populated(members);
        Ok(record)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_one(&self, type_name: &str, key: RecordId) -> StoreResult<Option<Record>> {
        self.find_one_sync(type_name, key)
    }

    async fn find_or_create(
        &self,
        type_name: &str,
        criteria: &Fields,
        payload: &Fields,
    ) -> StoreResult<FoundOrCreated> {
        self.find_or_create_sync(type_name, criteria, payload)
    }

    async fn save(&self, record: &Record) -> StoreResult<()> {
        self.save_sync(record)
    }

    async fn populate(&self, record: Record, relation: &str) -> StoreResult<Record> {
        self.populate_sync(record, relation)
    }
}
