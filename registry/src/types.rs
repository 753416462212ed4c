//! Type definition types.

use std::collections::{BTreeMap, HashMap};
use tether_core::{Cardinality, Value};

/// Default primary key attribute name.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Attribute definition within a type.
#[derive(Debug, Clone)]
pub struct AttrDef {
    /// Attribute name.
    pub name: String,
    /// Type name (String, Int, Float, Bool, Ref).
    pub type_name: String,
    /// Whether this attribute must be present on create.
    pub required: bool,
    /// Default value if not provided.
    pub default: Option<Value>,
}

impl AttrDef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            required: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// A declared association on a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationDef {
    /// Name the association is exposed under on the owning type.
    pub alias: String,
    /// Target (child) type name.
    pub target: String,
    /// Cardinality.
    pub cardinality: Cardinality,
    /// Inverse side on the target.
    ///
    /// For one-to-many this is the foreign-key field on the child; for
    /// many-to-many it is the alias of the mirroring association, if any.
    pub via: Option<String>,
}

/// Record type definition.
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Type name.
    pub name: String,
    /// Primary key attribute name.
    pub primary_key: String,
    /// Attribute definitions.
    pub attributes: HashMap<String, AttrDef>,
    /// Association definitions by alias.
    pub associations: BTreeMap<String, AssociationDef>,
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            attributes: HashMap::new(),
            associations: BTreeMap::new(),
        }
    }

    /// Get an association definition by alias.
    pub fn get_association(&self, alias: &str) -> Option<&AssociationDef> {
        self.associations.get(alias)
    }

    /// Required attributes without a default.
    pub fn required_attrs(&self) -> impl Iterator<Item = &AttrDef> {
        self.attributes
            .values()
            .filter(|a| a.required && a.default.is_none())
    }
}

/// Answer of a relation lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelation {
    /// Owning (parent) type.
    pub parent_type: String,
    /// Relation alias on the parent.
    pub alias: String,
    /// Target (child) type name.
    pub target_type: String,
    /// Primary key attribute of the target type.
    pub target_primary_key: String,
    /// Cardinality.
    pub cardinality: Cardinality,
    /// Inverse side on the target, see [`AssociationDef::via`].
    pub via: Option<String>,
}
