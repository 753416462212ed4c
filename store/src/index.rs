//! Indexes for in-memory record lookups.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tether_core::RecordId;

/// Per-type key allocator.
#[derive(Debug, Default)]
pub struct KeyAllocator {
    next: HashMap<String, u64>,
}

impl KeyAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next free key for a type.
    pub fn alloc(&mut self, type_name: &str) -> RecordId {
        let next = self.next.entry(type_name.to_string()).or_insert(1);
        let id = RecordId::new(*next);
        *next += 1;
        id
    }

    /// Record that a caller-supplied key is in use, so allocation skips it.
    pub fn observe(&mut self, type_name: &str, id: RecordId) {
        let next = self.next.entry(type_name.to_string()).or_insert(1);
        if id.raw() >= *next {
            *next = id.raw() + 1;
        }
    }
}

/// Key for the join index: (owning type, association alias).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinKey {
    pub type_name: String,
    pub alias: String,
}

impl JoinKey {
    pub fn new(type_name: &str, alias: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            alias: alias.to_string(),
        }
    }
}

/// Join index: (type, alias) -> parent -> Set<child>
#[derive(Debug, Default)]
pub struct JoinIndex {
    index: HashMap<JoinKey, BTreeMap<RecordId, BTreeSet<RecordId>>>,
}

impl JoinIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a join row. Returns false if it already existed.
    pub fn insert(&mut self, key: &JoinKey, parent: RecordId, child: RecordId) -> bool {
        self.index
            .entry(key.clone())
            .or_default()
            .entry(parent)
            .or_default()
            .insert(child)
    }

    pub fn contains(&self, key: &JoinKey, parent: RecordId, child: RecordId) -> bool {
        self.index
            .get(key)
            .and_then(|parents| parents.get(&parent))
            .map(|children| children.contains(&child))
            .unwrap_or(false)
    }

    /// Drop every join row owned by `parent` under a type's associations.
    pub fn forget_parent(&mut self, type_name: &str, parent: RecordId) {
        for (key, parents) in self.index.iter_mut() {
            if key.type_name == type_name {
                parents.remove(&parent);
            }
        }
    }

    /// Drop `child` from every parent under one association.
    pub fn remove_child(&mut self, key: &JoinKey, child: RecordId) {
        if let Some(parents) = self.index.get_mut(key) {
            for children in parents.values_mut() {
                children.remove(&child);
            }
        }
    }

    pub fn children(&self, key: &JoinKey, parent: RecordId) -> impl Iterator<Item = RecordId> + '_ {
        self.index
            .get(key)
            .and_then(|parents| parents.get(&parent))
            .into_iter()
            .flat_map(|children| children.iter().copied())
    }
}
