//! Child lookup-or-create.

use tether_core::{Fields, RecordRef, StoreError, StoreResult, Value};
use tether_registry::ResolvedRelation;
use tether_store::EntityStore;
use tracing::trace;

use crate::request::{strip_reserved, ChildDescriptor};

/// The child a link will target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChild {
    pub child: RecordRef,
    /// The store created the child while resolving it.
    pub created: bool,
}

/// Turns a child descriptor into a concrete stored record.
pub struct ChildResolver<'a> {
    store: &'a dyn EntityStore,
    reserved: &'a [String],
}

impl<'a> ChildResolver<'a> {
    pub fn new(store: &'a dyn EntityStore, reserved: &'a [String]) -> Self {
        Self { store, reserved }
    }

    /// Fields a value descriptor contributes to the child. Reserved
    /// parameters and the target's own primary key are dropped.
    pub fn value_payload(&self, relation: &ResolvedRelation, fields: &Fields) -> Fields {
        let mut payload = fields.clone();
        strip_reserved(&mut payload, self.reserved);
        payload.remove(&relation.target_primary_key);
        payload
    }

    /// Find or create the child in the relation's target type.
    ///
    /// By key, the key is both the match criterion and the creation payload,
    /// so an unknown key seeds a record with that key. By value, the primary
    /// key criterion is null and the store matches on the payload.
    pub async fn resolve(
        &self,
        relation: &ResolvedRelation,
        descriptor: &ChildDescriptor,
    ) -> StoreResult<ResolvedChild> {
        let pk = relation.target_primary_key.clone();
        let (criteria, payload) = match descriptor {
            ChildDescriptor::ByKey(key) => {
                let keyed: Fields = [(pk, Value::from(*key))].into_iter().collect();
                (keyed.clone(), keyed)
            }
            ChildDescriptor::ByValue(fields) => {
                let payload = self.value_payload(relation, fields);
                if payload.is_empty() {
                    return Err(StoreError::invalid(format!(
                        "Empty value payload for {}",
                        relation.target_type
                    )));
                }
                let unkeyed: Fields = [(pk, Value::Null)].into_iter().collect();
                (unkeyed, payload)
            }
        };

        let outcome = self
            .store
            .find_or_create(&relation.target_type, &criteria, &payload)
            .await?;
        trace!(
            child = %outcome.record.record_ref(),
            created = outcome.created,
            "resolved child"
        );
        Ok(ResolvedChild {
            child: outcome.record.record_ref(),
            created: outcome.created,
        })
    }
}
