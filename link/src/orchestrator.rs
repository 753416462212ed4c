//! Link orchestration.
//!
//! `Linker::link` runs one request through six steps:
//!
//! 1. Look up the parent and check it exposes the relation
//! 2. Resolve the child (find or create)
//! 3. Queue the add on the parent, classifying duplicates
//! 4. Save the parent, absorbing an insert conflict as a duplicate
//! 5. Subscribe and publish, only for a fresh link
//! 6. Reload the parent with the relation populated

use std::sync::Arc;
use tether_core::{Record, RecordRef};
use tether_notify::{AddEvent, Notifier, RequestContext};
use tether_registry::{Registry, ResolvedRelation};
use tether_store::EntityStore;
use tracing::{debug, info, instrument, warn};

use crate::config::LinkConfig;
use crate::error::{LinkError, LinkResult};
use crate::mutator::{self, absorb_conflict, Applied};
use crate::outcome::LinkOutcome;
use crate::request::{ChildDescriptor, LinkRequest};
use crate::resolver::{ChildResolver, ResolvedChild};

/// Sequences idempotent link requests against a store.
pub struct Linker {
    registry: Arc<Registry>,
    store: Arc<dyn EntityStore>,
    notifier: Option<Arc<dyn Notifier>>,
    config: LinkConfig,
}

impl Linker {
    pub fn new(registry: Arc<Registry>, store: Arc<dyn EntityStore>) -> Self {
        Self {
            registry,
            store,
            notifier: None,
            config: LinkConfig::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_config(mut self, config: LinkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Parse route parameters and link.
    pub async fn link_params(
        &self,
        parent_type: &str,
        relation: &str,
        params: serde_json::Value,
        context: RequestContext,
    ) -> LinkResult<LinkOutcome> {
        let request =
            LinkRequest::from_params(parent_type, relation, params, context, &self.config)?;
        self.link(request).await
    }

    /// Link the request's child into the parent's relation.
    ///
    /// Repeating a request yields the same stored state and the same
    /// outcome shape; only the first call publishes an event.
    #[instrument(
        skip_all,
        fields(
            parent = %request.parent,
            relation = %request.relation,
            request_id = request.context.request_id.as_deref().unwrap_or("-"),
        )
    )]
    pub async fn link(&self, request: LinkRequest) -> LinkResult<LinkOutcome> {
        if request.relation.is_empty() {
            return Err(LinkError::request_invalid("Missing relation name"));
        }
        let relation = self
            .registry
            .resolve_relation(&request.parent.type_name, &request.relation)
            .map_err(|_| LinkError::not_found_parent(&request.parent, &request.relation))?;

        let resolver = ChildResolver::new(self.store.as_ref(), &self.config.reserved_params);
        if let ChildDescriptor::ByValue(fields) = &request.child {
            if resolver.value_payload(relation, fields).is_empty() {
                return Err(LinkError::request_invalid(
                    "No child key or child values supplied",
                ));
            }
        }

        let (resolved, applied) = {
            let mut parent = self.find_parent(&request.parent, &request.relation).await?;

            let resolved = resolver
                .resolve(relation, &request.child)
                .await
                .map_err(LinkError::ChildResolutionFailed)?;
            debug!(child = %resolved.child, created = resolved.created, "child resolved");

            let applied = mutator::apply(&mut parent, &request.relation, &resolved.child)?;
            if applied == Applied::DuplicateIgnored {
                debug!(child = %resolved.child, "already linked");
            }

            let saved = absorb_conflict(self.store.save(&parent).await)
                .map_err(LinkError::PersistenceFailed)?;
            if applied == Applied::Linked && saved == Applied::DuplicateIgnored {
                warn!(child = %resolved.child, "insert conflict on save, treating as already linked");
                (resolved, Applied::DuplicateIgnored)
            } else {
                (resolved, applied)
            }
        };

        if applied == Applied::Linked {
            info!(child = %resolved.child, "linked");
            self.publish(&request, relation, &resolved).await;
        }

        let record = self.reload(&request.parent, &request.relation).await?;
        Ok(LinkOutcome {
            record,
            relation: request.relation,
            child: resolved.child,
            child_created: resolved.created,
            applied,
        })
    }

    async fn find_parent(&self, parent: &RecordRef, relation: &str) -> LinkResult<Record> {
        let record = self
            .store
            .find_one(&parent.type_name, parent.key)
            .await?
            .ok_or_else(|| LinkError::not_found_parent(parent, relation))?;
        if !record.has_association(relation) {
            return Err(LinkError::not_found_parent(parent, relation));
        }
        Ok(record)
    }

    async fn publish(&self, request: &LinkRequest, relation: &ResolvedRelation, child: &ResolvedChild) {
        if !self.config.notify {
            return;
        }
        let Some(notifier) = &self.notifier else {
            return;
        };

        if self.config.subscribe_on_link {
            if let Some(channel) = &request.context.channel {
                notifier.subscribe(channel, &request.parent).await;
            }
        }

        let parent_primary_key = self
            .registry
            .primary_key(&request.parent.type_name)
            .unwrap_or(tether_registry::DEFAULT_PRIMARY_KEY)
            .to_string();
        let event = AddEvent {
            parent: request.parent.clone(),
            parent_primary_key,
            relation: request.relation.clone(),
            child: child.child.clone(),
            child_primary_key: relation.target_primary_key.clone(),
            inverse: relation.via.clone(),
            no_reverse: child.created,
        };
        notifier.notify_add(&event, &request.context).await;
    }

    async fn reload(&self, parent: &RecordRef, relation: &str) -> LinkResult<Record> {
        let record = self
            .store
            .find_one(&parent.type_name, parent.key)
            .await
            .map_err(|e| LinkError::reload_failed(parent, e.to_string()))?
            .ok_or_else(|| LinkError::reload_failed(parent, "record no longer exists"))?;
        self.store
            .populate(record, relation)
            .await
            .map_err(|e| LinkError::reload_failed(parent, e.to_string()))
    }
}
