//! Record structures for Tether.
//!
//! A record is a typed bag of fields plus one accessor per declared
//! association. Accessors hold the persisted member keys, adds queued in
//! memory since the record was loaded, and (after population) the member
//! records themselves.

use crate::{Fields, RecordId, RecordRef, StoreError, StoreResult, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How many parents a child may be linked to through an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Each child belongs to at most one parent; the link lives on the
    /// child as a foreign key.
    OneToMany,
    /// Children may belong to many parents; the link lives in a join table.
    ManyToMany,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::OneToMany => write!(f, "one-to-many"),
            Cardinality::ManyToMany => write!(f, "many-to-many"),
        }
    }
}

/// In-memory view of one association on a loaded record.
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    /// Target (child) type name.
    pub target: String,
    /// Cardinality of the association.
    pub cardinality: Cardinality,
    /// Keys persisted at load time.
    members: Vec<RecordId>,
    /// Keys added in memory, not yet saved.
    pending: Vec<RecordId>,
    /// Member records, present only after population.
    populated: Option<Vec<Record>>,
}

impl Association {
    pub fn new(target: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            target: target.into(),
            cardinality,
            members: Vec::new(),
            pending: Vec::new(),
            populated: None,
        }
    }

    pub fn with_members(mut self, members: Vec<RecordId>) -> Self {
        self.members = members;
        self
    }

    /// Queue a new member.
    ///
    /// Fails with an insert conflict if the key is already a member or
    /// already queued.
    pub fn add(&mut self, key: RecordId) -> StoreResult<()> {
        if self.contains(key) {
            return Err(StoreError::insert_conflict(format!(
                "{} is already linked",
                key
            )));
        }
        self.pending.push(key);
        Ok(())
    }

    /// Check whether a key is persisted or queued.
    pub fn contains(&self, key: RecordId) -> bool {
        self.members.contains(&key) || self.pending.contains(&key)
    }

    /// Persisted member keys.
    pub fn members(&self) -> &[RecordId] {
        &self.members
    }

    /// Adds queued since load.
    pub fn pending(&self) -> &[RecordId] {
        &self.pending
    }

    /// Member records, if populated.
    pub fn populated(&self) -> Option<&[Record]> {
        self.populated.as_deref()
    }

    /// Materialize member records. Queued adds are discarded, so a
    /// populated association always reflects storage.
    pub fn set_populated(&mut self, records: Vec<Record>) {
        self.members = records.iter().map(|r| r.id).collect();
        self.pending.clear();
        self.populated = Some(records);
    }
}

/// A typed record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Primary key.
    pub id: RecordId,
    /// Name of the record type.
    pub type_name: String,
    /// Field values (the primary key is not duplicated here).
    pub fields: Fields,
    /// Association accessors by alias.
    associations: BTreeMap<String, Association>,
}

impl Record {
    /// Create a new record with the given properties.
    pub fn new(id: RecordId, type_name: impl Into<String>, fields: Fields) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            fields,
            associations: BTreeMap::new(),
        }
    }

    pub fn with_association(mut self, alias: impl Into<String>, association: Association) -> Self {
        self.associations.insert(alias.into(), association);
        self
    }

    /// Typed reference to this record.
    pub fn record_ref(&self) -> RecordRef {
        RecordRef::new(self.type_name.clone(), self.id)
    }

    /// Get a field value by name.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Check if this record exposes an association accessor.
    pub fn has_association(&self, alias: &str) -> bool {
        self.associations.contains_key(alias)
    }

    pub fn association(&self, alias: &str) -> Option<&Association> {
        self.associations.get(alias)
    }

    pub fn association_mut(&mut self, alias: &str) -> Option<&mut Association> {
        self.associations.get_mut(alias)
    }

    /// Iterate all association accessors.
    pub fn associations(&self) -> impl Iterator<Item = (&str, &Association)> {
        self.associations.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Queue `child` on the named association.
    pub fn add_to(&mut self, alias: &str, child: RecordId) -> StoreResult<()> {
        let (id, type_name) = (self.id, self.type_name.clone());
        let association = self.associations.get_mut(alias).ok_or_else(|| {
            StoreError::not_found(format!("{}{} has no association {}", type_name, id, alias))
        })?;
        association
            .add(child)
            .map_err(|_| StoreError::duplicate_link(&type_name, id, alias, child))
    }

    /// Check whether any association has queued adds.
    pub fn is_dirty(&self) -> bool {
        self.associations.values().any(|a| !a.pending.is_empty())
    }

    /// JSON projection: fields, the key under `pk_name`, and each association
    /// as member objects (if populated) or member keys.
    pub fn to_json(&self, pk_name: &str) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.fields {
            map.insert(name.clone(), serde_json::to_value(value).unwrap_or_default());
        }
        map.insert(pk_name.to_string(), serde_json::Value::from(self.id.raw()));
        for (alias, association) in &self.associations {
            let members = match association.populated() {
                Some(records) => records.iter().map(|r| r.to_json(pk_name)).collect(),
                None => association
                    .members()
                    .iter()
                    .map(|k| serde_json::Value::from(k.raw()))
                    .collect(),
            };
            map.insert(alias.clone(), serde_json::Value::Array(members));
        }
        serde_json::Value::Object(map)
    }
}
