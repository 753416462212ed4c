//! Link error types.

use tether_core::{RecordId, RecordRef, StoreError};
use thiserror::Error;

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Errors that can end a link operation.
///
/// A duplicate link is not an error; it resolves to a successful outcome.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Invalid link request: {message}")]
    RequestInvalid { message: String },

    #[error("Not found: {type_name}{key} (relation {relation})")]
    NotFoundParent {
        type_name: String,
        key: RecordId,
        relation: String,
    },

    #[error("Could not resolve child: {0}")]
    ChildResolutionFailed(#[source] StoreError),

    #[error("Could not persist link: {0}")]
    PersistenceFailed(#[source] StoreError),

    #[error("Could not reload {type_name}{key}: {reason}")]
    ReloadFailed {
        type_name: String,
        key: RecordId,
        reason: String,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl LinkError {
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::RequestInvalid {
            message: message.into(),
        }
    }

    pub fn not_found_parent(parent: &RecordRef, relation: impl Into<String>) -> Self {
        Self::NotFoundParent {
            type_name: parent.type_name.clone(),
            key: parent.key,
            relation: relation.into(),
        }
    }

    pub fn reload_failed(parent: &RecordRef, reason: impl Into<String>) -> Self {
        Self::ReloadFailed {
            type_name: parent.type_name.clone(),
            key: parent.key,
            reason: reason.into(),
        }
    }

    /// Conventional HTTP status class for this error.
    pub fn status(&self) -> u16 {
        match self {
            LinkError::RequestInvalid { .. } => 400,
            LinkError::NotFoundParent { .. } => 404,
            LinkError::ChildResolutionFailed(_)
            | LinkError::PersistenceFailed(_)
            | LinkError::ReloadFailed { .. }
            | LinkError::Store(_) => 500,
        }
    }
}
