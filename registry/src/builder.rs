//! RegistryBuilder for constructing an immutable Registry.

use crate::{AssociationDef, AttrDef, Registry, ResolvedRelation, TypeDef};
use std::collections::HashMap;
use tether_core::Cardinality;
use thiserror::Error;

/// Errors that can occur during registry construction or lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate type name: {0}")]
    DuplicateTypeName(String),

    #[error("Duplicate relation {relation} on type {type_name}")]
    DuplicateRelation { type_name: String, relation: String },

    #[error("Relation {type_name}.{relation} targets unknown type {target}")]
    UnknownTargetType {
        type_name: String,
        relation: String,
        target: String,
    },

    #[error("Relation {type_name}.{relation} has an invalid inverse: {message}")]
    InvalidInverse {
        type_name: String,
        relation: String,
        message: String,
    },

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Relation not found: {relation} on type {type_name}")]
    RelationNotFound { type_name: String, relation: String },
}

impl RegistryError {
    pub fn relation_not_found(type_name: impl Into<String>, relation: impl Into<String>) -> Self {
        Self::RelationNotFound {
            type_name: type_name.into(),
            relation: relation.into(),
        }
    }

    fn invalid_inverse(def: &TypeDef, assoc: &AssociationDef, message: impl Into<String>) -> Self {
        Self::InvalidInverse {
            type_name: def.name.clone(),
            relation: assoc.alias.clone(),
            message: message.into(),
        }
    }
}

/// Builder for constructing an immutable Registry.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    /// Types being built, by name.
    types: HashMap<String, TypeDef>,
}

impl RegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type definition.
    pub fn add_type(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        TypeBuilder {
            builder: self,
            def: TypeDef::new(name),
            duplicate_relation: None,
        }
    }

    /// Build the immutable Registry.
    ///
    /// Every association target must be a declared type, and every declared
    /// inverse must exist on the target. The relation table is computed here
    /// so lookups never walk type metadata.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut relations = HashMap::new();

        for def in self.types.values() {
            for assoc in def.associations.values() {
                let target = self.types.get(&assoc.target).ok_or_else(|| {
                    RegistryError::UnknownTargetType {
                        type_name: def.name.clone(),
                        relation: assoc.alias.clone(),
                        target: assoc.target.clone(),
                    }
                })?;
                validate_inverse(def, assoc, target)?;

                relations.insert(
                    (def.name.clone(), assoc.alias.clone()),
                    ResolvedRelation {
                        parent_type: def.name.clone(),
                        alias: assoc.alias.clone(),
                        target_type: target.name.clone(),
                        target_primary_key: target.primary_key.clone(),
                        cardinality: assoc.cardinality,
                        via: assoc.via.clone(),
                    },
                );
            }
        }

        Ok(Registry::new(self.types, relations))
    }
}

fn validate_inverse(
    def: &TypeDef,
    assoc: &AssociationDef,
    target: &TypeDef,
) -> Result<(), RegistryError> {
    match (assoc.cardinality, &assoc.via) {
        (Cardinality::OneToMany, None) => Err(RegistryError::invalid_inverse(
            def,
            assoc,
            "one-to-many relations need a foreign-key field",
        )),
        (Cardinality::OneToMany, Some(field)) => {
            if target.associations.contains_key(field) {
                return Err(RegistryError::invalid_inverse(
                    def,
                    assoc,
                    format!("{} is a collection on {}, not a field", field, target.name),
                ));
            }
            Ok(())
        }
        (Cardinality::ManyToMany, None) => Ok(()),
        (Cardinality::ManyToMany, Some(alias)) => match target.associations.get(alias) {
            Some(inverse)
                if inverse.target == def.name
                    && inverse.cardinality == Cardinality::ManyToMany =>
            {
                Ok(())
            }
            Some(_) => Err(RegistryError::invalid_inverse(
                def,
                assoc,
                format!("{}.{} does not mirror this relation", target.name, alias),
            )),
            None => Err(RegistryError::invalid_inverse(
                def,
                assoc,
                format!("{} has no relation {}", target.name, alias),
            )),
        },
    }
}

/// Builder for a type definition.
pub struct TypeBuilder<'a> {
    builder: &'a mut RegistryBuilder,
    def: TypeDef,
    duplicate_relation: Option<String>,
}

impl<'a> TypeBuilder<'a> {
    /// Override the primary key attribute name (default `id`).
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.def.primary_key = name.into();
        self
    }

    /// Add an attribute.
    pub fn attr(mut self, attr: AttrDef) -> Self {
        self.def.attributes.insert(attr.name.clone(), attr);
        self
    }

    /// Declare a one-to-many association whose children carry the parent key
    /// in field `via`.
    pub fn has_many(
        self,
        alias: impl Into<String>,
        target: impl Into<String>,
        via: impl Into<String>,
    ) -> Self {
        self.association(alias, target, Cardinality::OneToMany, Some(via.into()))
    }

    /// Declare a many-to-many association, optionally mirrored by `via` on
    /// the target.
    pub fn many_to_many(
        self,
        alias: impl Into<String>,
        target: impl Into<String>,
        via: Option<&str>,
    ) -> Self {
        self.association(
            alias,
            target,
            Cardinality::ManyToMany,
            via.map(str::to_string),
        )
    }

    fn association(
        mut self,
        alias: impl Into<String>,
        target: impl Into<String>,
        cardinality: Cardinality,
        via: Option<String>,
    ) -> Self {
        let alias = alias.into();
        if self.def.associations.contains_key(&alias) {
            self.duplicate_relation.get_or_insert_with(|| alias.clone());
        }
        self.def.associations.insert(
            alias.clone(),
            AssociationDef {
                alias,
                target: target.into(),
                cardinality,
                via,
            },
        );
        self
    }

    /// Finish building this type.
    pub fn done(self) -> Result<(), RegistryError> {
        if self.builder.types.contains_key(&self.def.name) {
            return Err(RegistryError::DuplicateTypeName(self.def.name));
        }
        if let Some(relation) = self.duplicate_relation {
            return Err(RegistryError::DuplicateRelation {
                type_name: self.def.name,
                relation,
            });
        }

        self.builder.types.insert(self.def.name.clone(), self.def);
        Ok(())
    }
}
