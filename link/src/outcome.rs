//! Result of a successful link.

use tether_core::{Record, RecordRef};

use crate::mutator::Applied;

/// The reloaded parent with the relation populated.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkOutcome {
    /// Parent as stored after the link, with `relation` materialized.
    pub record: Record,
    pub relation: String,
    pub child: RecordRef,
    /// The child was created while resolving it.
    pub child_created: bool,
    pub applied: Applied,
}

impl LinkOutcome {
    /// True if this call created the link.
    pub fn is_fresh(&self) -> bool {
        self.applied.is_linked()
    }

    /// Members of the populated relation.
    pub fn members(&self) -> &[Record] {
        self.record
            .association(&self.relation)
            .and_then(|a| a.populated())
            .unwrap_or(&[])
    }

    /// JSON body for the caller. Populated members are keyed by the child
    /// type's own primary key name.
    pub fn to_json(&self, parent_pk: &str, child_pk: &str) -> serde_json::Value {
        let mut body = self.record.to_json(parent_pk);
        if let serde_json::Value::Object(map) = &mut body {
            let members = self.members().iter().map(|r| r.to_json(child_pk)).collect();
            map.insert(self.relation.clone(), serde_json::Value::Array(members));
        }
        body
    }
}
