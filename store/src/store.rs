//! The entity store contract.

use async_trait::async_trait;
use std::sync::Arc;
use tether_core::{Fields, Record, RecordId, StoreResult};

/// Result of a find-or-create call.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundOrCreated {
    /// The matched or created record.
    pub record: Record,
    /// True if the store created the record during this call.
    pub created: bool,
}

impl FoundOrCreated {
    pub fn found(record: Record) -> Self {
        Self {
            record,
            created: false,
        }
    }

    pub fn created(record: Record) -> Self {
        Self {
            record,
            created: true,
        }
    }
}

/// Typed record storage.
///
/// Implementations own bidirectional link semantics: a save that adds a
/// member to an association must make the link visible from the child side
/// too. A save that would insert an existing join reports an error whose
/// kind is `StoreErrorKind::InsertConflict`.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch a record by key, with association accessors attached.
    async fn find_one(&self, type_name: &str, key: RecordId) -> StoreResult<Option<Record>>;

    /// Return the first record matching `criteria`, or create one from
    /// `payload`.
    ///
    /// A null primary key in `criteria` means the caller has no key; the
    /// store then matches on the payload itself. Concurrent calls with the
    /// same arguments converge on one record.
    async fn find_or_create(
        &self,
        type_name: &str,
        criteria: &Fields,
        payload: &Fields,
    ) -> StoreResult<FoundOrCreated>;

    /// Persist a record's fields and queued association adds.
    async fn save(&self, record: &Record) -> StoreResult<()>;

    /// Materialize the members of one association.
    async fn populate(&self, record: Record, relation: &str) -> StoreResult<Record>;
}

#[async_trait]
impl<S: EntityStore + ?Sized> EntityStore for Arc<S> {
    async fn find_one(&self, type_name: &str, key: RecordId) -> StoreResult<Option<Record>> {
        (**self).find_one(type_name, key).await
    }

    async fn find_or_create(
        &self,
        type_name: &str,
        criteria: &Fields,
        payload: &Fields,
    ) -> StoreResult<FoundOrCreated> {
        (**self).find_or_create(type_name, criteria, payload).await
    }

    async fn save(&self, record: &Record) -> StoreResult<()> {
        (**self).save(record).await
    }

    async fn populate(&self, record: Record, relation: &str) -> StoreResult<Record> {
        (**self).populate(record, relation).await
    }
}
