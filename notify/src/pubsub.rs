//! In-process publish/subscribe hub.
//!
//! Each record is a room. Channels subscribe to rooms and collect delivered
//! messages in an inbox. An add event is delivered to the parent's room
//! and, unless suppressed, mirrored to the child's room under the inverse
//! relation.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use tether_core::RecordRef;
use tracing::{debug, trace};

use crate::event::{AddEvent, ChannelId, RequestContext};
use crate::notifier::Notifier;

/// A message delivered to a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Room the message was published to.
    pub room: RecordRef,
    /// Relation on the room's record that changed.
    pub relation: String,
    /// Record added to that relation.
    pub added: RecordRef,
    /// Wire payload.
    pub payload: serde_json::Value,
}

#[derive(Debug, Default)]
struct Inner {
    /// room -> subscribed channels
    rooms: HashMap<RecordRef, BTreeSet<ChannelId>>,
    /// channel -> delivered messages
    inboxes: HashMap<ChannelId, Vec<Message>>,
    /// Every event published, in order.
    log: Vec<AddEvent>,
}

impl Inner {
    fn deliver(&mut self, message: Message, excluded: Option<&ChannelId>) -> usize {
        let Some(channels) = self.rooms.get(&message.room) else {
            return 0;
        };
        let targets: Vec<ChannelId> = channels
            .iter()
            .filter(|c| Some(*c) != excluded)
            .cloned()
            .collect();
        for channel in &targets {
            self.inboxes
                .entry(channel.clone())
                .or_default()
                .push(message.clone());
        }
        targets.len()
    }
}

/// Room-based notifier.
#[derive(Debug, Default)]
pub struct PubSub {
    inner: Mutex<Inner>,
}

impl PubSub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channels subscribed to a record.
    pub fn subscribers(&self, room: &RecordRef) -> Vec<ChannelId> {
        self.inner
            .lock()
            .rooms
            .get(room)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Messages delivered to a channel so far.
    pub fn inbox(&self, channel: &ChannelId) -> Vec<Message> {
        self.inner
            .lock()
            .inboxes
            .get(channel)
            .cloned()
            .unwrap_or_default()
    }

    /// Every event published so far.
    pub fn events(&self) -> Vec<AddEvent> {
        self.inner.lock().log.clone()
    }

    fn subscribe_sync(&self, channel: &ChannelId, record: &RecordRef) {
        let inserted = self
            .inner
            .lock()
            .rooms
            .entry(record.clone())
            .or_default()
            .insert(channel.clone());
        if inserted {
            trace!(%channel, room = %record, "subscribed");
        }
    }

    fn publish_sync(&self, event: &AddEvent, ctx: &RequestContext) {
        let excluded = ctx.excluded_channel();
        let mut inner = self.inner.lock();
        inner.log.push(event.clone());

        let delivered = inner.deliver(
            Message {
                room: event.parent.clone(),
                relation: event.relation.clone(),
                added: event.child.clone(),
                payload: event.to_json(),
            },
            excluded,
        );
        debug!(room = %event.parent, relation = %event.relation, delivered, "published add");

        if event.no_reverse {
            return;
        }
        if let Some(inverse) = &event.inverse {
            let reverse = AddEvent {
                parent: event.child.clone(),
                parent_primary_key: event.child_primary_key.clone(),
                relation: inverse.clone(),
                child: event.parent.clone(),
                child_primary_key: event.parent_primary_key.clone(),
                inverse: Some(event.relation.clone()),
                no_reverse: true,
            };
            let payload = reverse.to_json();
            inner.deliver(
                Message {
                    room: reverse.parent,
                    relation: reverse.relation,
                    added: reverse.child,
                    payload,
                },
                excluded,
            );
        }
    }
}

#[async_trait]
impl Notifier for PubSub {
    async fn subscribe(&self, channel: &ChannelId, record: &RecordRef) {
        self.subscribe_sync(channel, record)
    }

    async fn notify_add(&self, event: &AddEvent, ctx: &RequestContext) {
        self.publish_sync(event, ctx)
    }
}
