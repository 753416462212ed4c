//! The notifier capability.

use async_trait::async_trait;
use std::sync::Arc;
use tether_core::RecordRef;

use crate::event::{AddEvent, ChannelId, RequestContext};

/// Broadcasts relation changes to interested observers.
///
/// Delivery is fire-and-forget from the caller's point of view: a notifier
/// never fails the operation that triggered it.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Subscribe a channel to changes of a record.
    async fn subscribe(&self, channel: &ChannelId, record: &RecordRef);

    /// Announce that a child was added to a parent's relation.
    async fn notify_add(&self, event: &AddEvent, ctx: &RequestContext);
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    async fn subscribe(&self, channel: &ChannelId, record: &RecordRef) {
        (**self).subscribe(channel, record).await
    }

    async fn notify_add(&self, event: &AddEvent, ctx: &RequestContext) {
        (**self).notify_add(event, ctx).await
    }
}
