//! Link requests.
//!
//! A request names the parent by type and key, the relation alias, and the
//! child either by key or by a field payload. Route-style parameter maps are
//! parsed with [`LinkRequest::from_params`].

use tether_core::{Fields, RecordId, RecordRef, Value};
use tether_notify::RequestContext;

use crate::config::LinkConfig;
use crate::error::{LinkError, LinkResult};

const PARENT_PARAM: &str = "parentid";
const CHILD_KEY_PARAM: &str = "id";

/// How the caller identifies the child.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildDescriptor {
    /// An explicit primary key.
    ByKey(RecordId),
    /// Field values describing the child.
    ByValue(Fields),
}

impl ChildDescriptor {
    pub fn by_key(key: impl Into<RecordId>) -> Self {
        ChildDescriptor::ByKey(key.into())
    }

    pub fn by_value(fields: Fields) -> Self {
        ChildDescriptor::ByValue(fields)
    }
}

/// Remove reserved parameter names from a payload.
pub fn strip_reserved(fields: &mut Fields, reserved: &[String]) {
    fields.retain(|name, _| !reserved.iter().any(|r| r == name));
}

/// A request to link a child into a parent's relation.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRequest {
    pub parent: RecordRef,
    pub relation: String,
    pub child: ChildDescriptor,
    pub context: RequestContext,
}

impl LinkRequest {
    pub fn new(parent: RecordRef, relation: impl Into<String>, child: ChildDescriptor) -> Self {
        Self {
            parent,
            relation: relation.into(),
            child,
            context: RequestContext::default(),
        }
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// Build a request from route parameters.
    ///
    /// `parentid` is required. A present `id` selects the child by key;
    /// otherwise every non-reserved parameter becomes the child payload.
    pub fn from_params(
        parent_type: &str,
        relation: &str,
        params: serde_json::Value,
        context: RequestContext,
        config: &LinkConfig,
    ) -> LinkResult<Self> {
        if relation.is_empty() {
            return Err(LinkError::request_invalid("Missing relation name"));
        }
        let serde_json::Value::Object(params) = params else {
            return Err(LinkError::request_invalid("Parameters must be an object"));
        };
        let mut fields: Fields = params
            .into_iter()
            .map(|(name, value)| (name, Value::from(value)))
            .collect();

        let parent_key = match fields.remove(PARENT_PARAM) {
            Some(value) if !value.is_null() => key_param(PARENT_PARAM, &value)?,
            _ => return Err(LinkError::request_invalid("Missing parentid parameter")),
        };

        let child = match fields.remove(CHILD_KEY_PARAM) {
            Some(value) if !value.is_null() => {
                ChildDescriptor::ByKey(key_param(CHILD_KEY_PARAM, &value)?)
            }
            _ => {
                strip_reserved(&mut fields, &config.reserved_params);
                if fields.is_empty() {
                    return Err(LinkError::request_invalid(
                        "No child key or child values supplied",
                    ));
                }
                ChildDescriptor::ByValue(fields)
            }
        };

        Ok(Self {
            parent: RecordRef::new(parent_type, parent_key),
            relation: relation.to_string(),
            child,
            context,
        })
    }
}

fn key_param(name: &str, value: &Value) -> LinkResult<RecordId> {
    RecordId::from_value(value)
        .ok_or_else(|| LinkError::request_invalid(format!("{} is not a valid key: {}", name, value)))
}
