//! Feed collaborator trait and the adapter that owns a subscription

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use super::record::{BubbleRecord, RawBubbleRecord};
use crate::error::FeedError;

/// Handle identifying one insert subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Where a feed pushes insert notifications. `Send`, so the transport may
/// deliver from any thread.
pub type InsertSink = Sender<RawBubbleRecord>;

/// External realtime data source scoped to the "bubbles" collection
pub trait BubbleFeed {
    /// Rows created at or after `since_ms`, ideally ordered oldest first
    fn load_initial_snapshot(&mut self, since_ms: i64) -> Result<Vec<RawBubbleRecord>, FeedError>;

    /// Start delivering one notification per inserted row (at-least-once)
    fn subscribe_inserts(&mut self, sink: InsertSink) -> Result<SubscriptionId, FeedError>;

    /// Release a subscription
    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// Owns a feed and at most one live subscription
///
/// The subscription is released exactly once: by `unsubscribe`, or on drop.
pub struct FeedAdapter<F: BubbleFeed> {
    feed: F,
    subscription: Option<SubscriptionId>,
    inbox: Option<Receiver<RawBubbleRecord>>,
    ttl_ms: i64,
    dropped_malformed: u64,
}

impl<F: BubbleFeed> FeedAdapter<F> {
    pub fn new(feed: F, ttl_ms: i64) -> Self {
        Self {
            feed,
            subscription: None,
            inbox: None,
            ttl_ms,
            dropped_malformed: 0,
        }
    }

    /// Load the startup snapshot: malformed rows dropped, rows outside the
    /// TTL window filtered out, ordered by creation time (oldest first, ties
    /// by id) so index-based radius assignment is reproducible.
    pub fn load_initial_snapshot(&mut self, now_ms: i64) -> Result<Vec<BubbleRecord>, FeedError> {
        let rows = self
            .feed
            .load_initial_snapshot(now_ms.saturating_sub(self.ttl_ms))
            .inspect_err(|err| log::warn!("Bubble snapshot load failed: {}", err))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match row.normalize() {
                Ok(record) if record.is_live(now_ms, self.ttl_ms) => records.push(record),
                Ok(record) => log::debug!("Snapshot row {} is past TTL, skipped", record.id),
                Err(err) => {
                    self.dropped_malformed += 1;
                    log::warn!("Dropped malformed snapshot row: {}", err);
                }
            }
        }
        records.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms).then_with(|| a.id.cmp(&b.id)));

        log::info!("Loaded {} live bubbles ({} rows)", records.len(), rows.len());
        Ok(records)
    }

    /// Subscribe to inserts. A second call while subscribed is a no-op.
    pub fn subscribe_inserts(&mut self) -> Result<SubscriptionId, FeedError> {
        if let Some(id) = self.subscription {
            return Ok(id);
        }
        let (tx, rx) = mpsc::channel();
        let id = self
            .feed
            .subscribe_inserts(tx)
            .inspect_err(|err| log::warn!("Bubble subscription failed: {}", err))?;
        self.subscription = Some(id);
        self.inbox = Some(rx);
        log::info!("Subscribed to bubble inserts ({:?})", id);
        Ok(id)
    }

    /// Take every queued insert without blocking
    pub fn drain(&mut self) -> Vec<RawBubbleRecord> {
        let mut out = Vec::new();
        let Some(inbox) = &self.inbox else {
            return out;
        };
        loop {
            match inbox.try_recv() {
                Ok(row) => out.push(row),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::debug!("Bubble feed sender disconnected");
                    break;
                }
            }
        }
        out
    }

    /// Release the subscription. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.feed.unsubscribe(id);
            log::info!("Unsubscribed from bubble inserts ({:?})", id);
        }
        self.inbox = None;
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Snapshot rows dropped as malformed
    pub fn dropped_malformed(&self) -> u64 {
        self.dropped_malformed
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut F {
        &mut self.feed
    }
}

impl<F: BubbleFeed> Drop for FeedAdapter<F> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::BUBBLE_TTL_MS;
    use crate::feed::InMemoryFeed;
    use crate::feed::record::RawTimestamp;

    const NOW: i64 = 1_700_000_000_000;
    const HOUR: i64 = 60 * 60 * 1000;

    #[test]
    fn test_snapshot_filters_and_orders() {
        let feed = InMemoryFeed::with_rows(vec![
            RawBubbleRecord::new("late", "Late", 0, NOW - HOUR),
            RawBubbleRecord::new("old", "Old", 0, NOW - 25 * HOUR),
            RawBubbleRecord::new("early", "Early", 0, NOW - 5 * HOUR),
            RawBubbleRecord {
                created_at: Some(RawTimestamp::Text("garbage".into())),
                ..RawBubbleRecord::new("bad", "Bad", 0, 0)
            },
        ]);
        let mut adapter = FeedAdapter::new(feed, BUBBLE_TTL_MS);

        let records = adapter.load_initial_snapshot(NOW).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["early", "late"]);
        assert_eq!(adapter.dropped_malformed(), 1);
    }

    #[test]
    fn test_snapshot_failure_surfaces() {
        let mut feed = InMemoryFeed::new();
        feed.fail_next_load("offline");
        let mut adapter = FeedAdapter::new(feed, BUBBLE_TTL_MS);
        assert_eq!(
            adapter.load_initial_snapshot(NOW),
            Err(FeedError::Load("offline".into()))
        );
    }

    #[test]
    fn test_drain_delivers_published_rows() {
        let mut adapter = FeedAdapter::new(InMemoryFeed::new(), BUBBLE_TTL_MS);
        adapter.subscribe_inserts().unwrap();
        adapter.feed_mut().publish(RawBubbleRecord::new("a", "A", 0, NOW));
        adapter.feed_mut().publish(RawBubbleRecord::new("b", "B", 0, NOW));

        let rows = adapter.drain();
        assert_eq!(rows.len(), 2);
        assert!(adapter.drain().is_empty());
    }

    #[test]
    fn test_unsubscribe_exactly_once() {
        let feed = InMemoryFeed::new();
        let counter = feed.unsubscribe_counter();
        {
            let mut adapter = FeedAdapter::new(feed, BUBBLE_TTL_MS);
            let first = adapter.subscribe_inserts().unwrap();
            assert_eq!(adapter.subscribe_inserts().unwrap(), first);
            adapter.unsubscribe();
            adapter.unsubscribe();
            assert!(!adapter.is_subscribed());
        }
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let feed = InMemoryFeed::new();
        let counter = feed.unsubscribe_counter();
        {
            let mut adapter = FeedAdapter::new(feed, BUBBLE_TTL_MS);
            adapter.subscribe_inserts().unwrap();
        }
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_subscribe_failure_leaves_nothing_to_release() {
        let mut feed = InMemoryFeed::new();
        feed.fail_next_subscribe("socket closed");
        let counter = feed.unsubscribe_counter();
        {
            let mut adapter = FeedAdapter::new(feed, BUBBLE_TTL_MS);
            assert!(matches!(adapter.subscribe_inserts(), Err(FeedError::Subscribe(_))));
            assert!(!adapter.is_subscribed());
        }
        assert_eq!(counter.get(), 0);
    }
}
