//! The Registry - immutable type metadata lookup.

use crate::{AssociationDef, RegistryError, ResolvedRelation, TypeDef};
use std::collections::HashMap;

/// The Registry provides runtime lookup of type definitions and relations.
/// It is immutable after construction.
#[derive(Debug, Default)]
pub struct Registry {
    /// Type definitions by name.
    types: HashMap<String, TypeDef>,
    /// Precomputed relation table keyed by (parent type, alias).
    relations: HashMap<(String, String), ResolvedRelation>,
}

impl Registry {
    /// Create a registry (use RegistryBuilder for construction).
    pub(crate) fn new(
        types: HashMap<String, TypeDef>,
        relations: HashMap<(String, String), ResolvedRelation>,
    ) -> Self {
        Self { types, relations }
    }

    // ==================== Type Lookups ====================

    /// Get a type definition by name.
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Check if a type is declared.
    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Primary key attribute name of a type.
    pub fn primary_key(&self, name: &str) -> Option<&str> {
        self.types.get(name).map(|t| t.primary_key.as_str())
    }

    /// Get the number of types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    // ==================== Relation Lookups ====================

    /// Resolve a relation alias on a parent type to its target and cardinality.
    pub fn resolve_relation(
        &self,
        parent_type: &str,
        relation: &str,
    ) -> Result<&ResolvedRelation, RegistryError> {
        self.relations
            .get(&(parent_type.to_string(), relation.to_string()))
            .ok_or_else(|| RegistryError::relation_not_found(parent_type, relation))
    }

    /// All associations declared on a type.
    pub fn associations_of(&self, type_name: &str) -> impl Iterator<Item = &AssociationDef> {
        self.types
            .get(type_name)
            .into_iter()
            .flat_map(|t| t.associations.values())
    }

    /// Relations on other types whose inverse is `(type_name, via)`.
    ///
    /// Used to find the owning side when only the child side is known.
    pub fn relations_targeting(&self, type_name: &str) -> impl Iterator<Item = &ResolvedRelation> {
        let type_name = type_name.to_string();
        self.relations
            .values()
            .filter(move |r| r.target_type == type_name)
    }
}
