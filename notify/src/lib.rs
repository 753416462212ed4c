//! Tether Notifications
//!
//! Relation-change events and their delivery:
//! - `Notifier`: the capability the link orchestrator calls after a fresh link
//! - `RequestContext`: where a request came from (channel, mirror preference)
//! - `PubSub`: room-based in-process hub that fans events out to channels

mod event;
mod notifier;
mod pubsub;

pub use event::{AddEvent, ChannelId, RequestContext};
pub use notifier::Notifier;
pub use pubsub::{Message, PubSub};
