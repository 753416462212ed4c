//! In-memory association add.

use tether_core::{Record, RecordRef, StoreResult};

use crate::error::{LinkError, LinkResult};

/// How an add request was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A new link was queued or written.
    Linked,
    /// The link already existed; nothing changed.
    DuplicateIgnored,
}

impl Applied {
    pub fn is_linked(self) -> bool {
        self == Applied::Linked
    }
}

/// Fold an insert conflict into `DuplicateIgnored`; keep every other error.
pub fn absorb_conflict(result: StoreResult<()>) -> StoreResult<Applied> {
    match result {
        Ok(()) => Ok(Applied::Linked),
        Err(e) if e.is_insert_conflict() => Ok(Applied::DuplicateIgnored),
        Err(e) => Err(e),
    }
}

/// Queue `child` on the parent's `relation` accessor.
pub fn apply(parent: &mut Record, relation: &str, child: &RecordRef) -> LinkResult<Applied> {
    if !parent.has_association(relation) {
        return Err(LinkError::not_found_parent(&parent.record_ref(), relation));
    }
    Ok(absorb_conflict(parent.add_to(relation, child.key))?)
}
