//! Store wrappers for failure and race scenarios.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tether_core::{Fields, Record, RecordId, StoreError, StoreResult};
use tether_store::{EntityStore, FoundOrCreated, MemoryStore};
use tracing::debug;

/// A store operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    FindOne,
    FindOrCreate,
    Save,
    Populate,
}

/// Delegates to a memory store, failing chosen operations.
pub struct FaultyStore {
    inner: Arc<MemoryStore>,
    faults: Mutex<HashMap<Op, StoreError>>,
    vanish_after_save: AtomicBool,
}

impl FaultyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            faults: Mutex::new(HashMap::new()),
            vanish_after_save: AtomicBool::new(false),
        }
    }

    /// Fail every call of `op` with `error`.
    pub fn fail_on(self, op: Op, error: StoreError) -> Self {
        self.faults.lock().insert(op, error);
        self
    }

    /// Delete the saved record right after a successful save.
    pub fn vanish_after_save(self) -> Self {
        self.vanish_after_save.store(true, Ordering::SeqCst);
        self
    }

    fn fault(&self, op: Op) -> StoreResult<()> {
        match self.faults.lock().get(&op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EntityStore for FaultyStore {
    async fn find_one(&self, type_name: &str, key: RecordId) -> StoreResult<Option<Record>> {
        self.fault(Op::FindOne)?;
        self.inner.find_one(type_name, key).await
    }

    async fn find_or_create(
        &self,
        type_name: &str,
        criteria: &Fields,
        payload: &Fields,
    ) -> StoreResult<FoundOrCreated> {
        self.fault(Op::FindOrCreate)?;
        self.inner.find_or_create(type_name, criteria, payload).await
    }

    async fn save(&self, record: &Record) -> StoreResult<()> {
        self.fault(Op::Save)?;
        self.inner.save(record).await?;
        if self.vanish_after_save.load(Ordering::SeqCst) {
            self.inner.remove(&record.type_name, record.id);
        }
        Ok(())
    }

    async fn populate(&self, record: Record, relation: &str) -> StoreResult<Record> {
        self.fault(Op::Populate)?;
        self.inner.populate(record, relation).await
    }
}

/// Lets a competing writer commit the same link just before the next save.
///
/// The armed save first persists the record on the inner store, then
/// persists it again, so the second write hits the already-present join.
pub struct RacingStore {
    inner: Arc<MemoryStore>,
    armed: AtomicBool,
}

impl RacingStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(true),
        }
    }

    /// True until the race has been triggered.
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityStore for RacingStore {
    async fn find_one(&self, type_name: &str, key: RecordId) -> StoreResult<Option<Record>> {
        self.inner.find_one(type_name, key).await
    }

    async fn find_or_create(
        &self,
        type_name: &str,
        criteria: &Fields,
        payload: &Fields,
    ) -> StoreResult<FoundOrCreated> {
        self.inner.find_or_create(type_name, criteria, payload).await
    }

    async fn save(&self, record: &Record) -> StoreResult<()> {
        if self.armed.swap(false, Ordering::SeqCst) && record.is_dirty() {
            debug!(record = %record.record_ref(), "competing writer commits first");
            self.inner.save(record).await?;
        }
        self.inner.save(record).await
    }

    async fn populate(&self, record: Record, relation: &str) -> StoreResult<Record> {
        self.inner.populate(record, relation).await
    }
}
