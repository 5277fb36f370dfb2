//! In-process feed used by tests and the headless demo

use std::cell::Cell;
use std::rc::Rc;

use super::adapter::{BubbleFeed, InsertSink, SubscriptionId};
use super::record::RawBubbleRecord;
use crate::error::FeedError;

/// Feed backed by a vector of rows; `publish` simulates a remote insert
#[derive(Debug, Default)]
pub struct InMemoryFeed {
    rows: Vec<RawBubbleRecord>,
    subscribers: Vec<(SubscriptionId, InsertSink)>,
    next_id: u64,
    fail_load: Option<String>,
    fail_subscribe: Option<String>,
    unsubscribes: Rc<Cell<u32>>,
}

impl InMemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<RawBubbleRecord>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Make the next snapshot load fail with `reason`
    pub fn fail_next_load(&mut self, reason: impl Into<String>) {
        self.fail_load = Some(reason.into());
    }

    /// Make the next subscribe call fail with `reason`
    pub fn fail_next_subscribe(&mut self, reason: impl Into<String>) {
        self.fail_subscribe = Some(reason.into());
    }

    /// Shared count of `unsubscribe` calls
    pub fn unsubscribe_counter(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.unsubscribes)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Store a row and notify every subscriber
    pub fn publish(&mut self, row: RawBubbleRecord) {
        self.notify(&row);
        self.rows.push(row);
    }

    /// Notify subscribers again without storing (at-least-once redelivery)
    pub fn redeliver(&mut self, row: &RawBubbleRecord) {
        self.notify(row);
    }

    fn notify(&mut self, row: &RawBubbleRecord) {
        self.subscribers.retain(|(id, sink)| match sink.send(row.clone()) {
            Ok(()) => true,
            Err(_) => {
                log::debug!("Dropping disconnected subscriber {:?}", id);
                false
            }
        });
    }
}

impl BubbleFeed for InMemoryFeed {
    fn load_initial_snapshot(&mut self, since_ms: i64) -> Result<Vec<RawBubbleRecord>, FeedError> {
        if let Some(reason) = self.fail_load.take() {
            return Err(FeedError::Load(reason));
        }
        // Rows with unreadable timestamps are passed through for the caller to reject
        Ok(self
            .rows
            .iter()
            .filter(|row| match row.normalize() {
                Ok(record) => record.created_at_ms >= since_ms,
                Err(_) => true,
            })
            .cloned()
            .collect())
    }

    fn subscribe_inserts(&mut self, sink: InsertSink) -> Result<SubscriptionId, FeedError> {
        if let Some(reason) = self.fail_subscribe.take() {
            return Err(FeedError::Subscribe(reason));
        }
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, sink));
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.unsubscribes.set(self.unsubscribes.get() + 1);
        self.subscribers.retain(|(sub, _)| *sub != id);
    }
}
