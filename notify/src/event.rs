//! Event and request-context types.

use serde::Serialize;
use serde_json::json;
use std::fmt;
use tether_core::RecordRef;

/// Identifier of a realtime channel (for example a socket connection).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a request came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Caller-assigned request id, for log correlation.
    pub request_id: Option<String>,
    /// Channel the request arrived on, if it is subscribable.
    pub channel: Option<ChannelId>,
    /// Deliver the event back to the originating channel too.
    pub mirror: bool,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A request that arrived over a subscribable channel.
    pub fn over_channel(channel: impl Into<String>) -> Self {
        Self {
            channel: Some(ChannelId::new(channel)),
            ..Self::default()
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_mirror(mut self) -> Self {
        self.mirror = true;
        self
    }

    /// Channel to exclude from delivery, if any.
    pub fn excluded_channel(&self) -> Option<&ChannelId> {
        if self.mirror {
            None
        } else {
            self.channel.as_ref()
        }
    }
}

/// A child was added to a parent's relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddEvent {
    /// The parent whose relation changed.
    pub parent: RecordRef,
    /// Primary key attribute name of the parent type.
    pub parent_primary_key: String,
    /// Relation alias on the parent.
    pub relation: String,
    /// The linked child.
    pub child: RecordRef,
    /// Primary key attribute name of the child type.
    pub child_primary_key: String,
    /// Inverse relation on the child, if the association declares one.
    pub inverse: Option<String>,
    /// Skip the mirrored event on the child side.
    pub no_reverse: bool,
}

impl AddEvent {
    /// Wire payload delivered to observers of the parent.
    pub fn to_json(&self) -> serde_json::Value {
        let mut child = serde_json::Map::new();
        child.insert(
            self.child_primary_key.clone(),
            serde_json::Value::from(self.child.key.raw()),
        );
        json!({
            "verb": "addedTo",
            "parentKey": self.parent.key.raw(),
            "relation": self.relation,
            "child": child,
        })
    }
}
