//! Realtime bubble feed
//!
//! The feed is an external, push-based source of bubble rows. This module
//! bridges it into the engine's input contract:
//! - one ordered initial snapshot, filtered to the TTL window
//! - a channel of insert notifications, drained by the owner on its own schedule
//!
//! Nothing here mutates engine state.

pub mod adapter;
pub mod memory;
pub mod record;

pub use adapter::{BubbleFeed, FeedAdapter, InsertSink, SubscriptionId};
pub use memory::InMemoryFeed;
pub use record::{BubbleRecord, RawBubbleRecord, RawTimestamp};
