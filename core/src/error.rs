//! Store error type shared by every entity store implementation.
//!
//! The insert-conflict condition is carried as a structural kind so callers
//! can tell a duplicate join apart from a real failure without inspecting
//! message text.

use crate::RecordId;
use thiserror::Error;

/// Classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The write would insert a row that already exists (duplicate join).
    InsertConflict,
    /// A referenced record or type does not exist.
    NotFound,
    /// The store rejected the data as invalid.
    Invalid,
    /// The store could not be reached or is shutting down.
    Unavailable,
    /// Anything else.
    Other,
}

impl StoreErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreErrorKind::InsertConflict => "insert",
            StoreErrorKind::NotFound => "not_found",
            StoreErrorKind::Invalid => "invalid",
            StoreErrorKind::Unavailable => "unavailable",
            StoreErrorKind::Other => "other",
        }
    }
}

/// Error raised by an entity store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{} error: {message}", .kind.as_str())]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn insert_conflict(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::InsertConflict, message)
    }

    /// Duplicate join between a record and a member of one of its relations.
    pub fn duplicate_link(type_name: &str, key: RecordId, relation: &str, child: RecordId) -> Self {
        Self::insert_conflict(format!(
            "{}{}.{} already contains {}",
            type_name, key, relation, child
        ))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Invalid, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Unavailable, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Other, message)
    }

    /// Returns true if this error marks an already-existing join.
    pub fn is_insert_conflict(&self) -> bool {
        self.kind == StoreErrorKind::InsertConflict
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
