//! Change feed for observing store writes.
//!
//! Every successful write to the [`crate::PostStore`] emits one event per
//! affected post. The UI binding, the CLI and tests all observe the store
//! through this feed instead of sharing memory with the engine.

use crate::post::{Post, PostId};
use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// Type of change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    /// No row existed for this id.
    Insert,
    /// A row was replaced.
    Update,
    /// A row was removed.
    Delete,
}

/// A single change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Store write sequence number, starting at 1.
    pub sequence: u64,
    /// Id of the affected post.
    pub post_id: PostId,
    /// Type of change.
    pub change_type: ChangeType,
    /// The row after the write. None for Delete.
    pub post: Option<Post>,
}

impl ChangeEvent {
    /// Creates an insert or update event.
    pub fn put(sequence: u64, post: Post, existed: bool) -> Self {
        Self {
            sequence,
            post_id: post.id,
            change_type: if existed {
                ChangeType::Update
            } else {
                ChangeType::Insert
            },
            post: Some(post),
        }
    }

    /// Creates a delete event.
    pub fn delete(sequence: u64, post_id: PostId) -> Self {
        Self {
            sequence,
            post_id,
            change_type: ChangeType::Delete,
            post: None,
        }
    }
}

/// Distributes store writes to subscribers.
///
/// Preserves write order, supports any number of subscribers, drops
/// subscribers whose receiver is gone.
pub struct ChangeFeed {
    subscribers: RwLock<Vec<Sender<ChangeEvent>>>,
}

impl ChangeFeed {
    /// Creates a change feed with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Returns a receiver for all future events.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Sends an event to every live subscriber.
    pub fn emit(&self, event: ChangeEvent) {
        self.subscribers
            .write()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn post(id: PostId) -> Post {
        Post::new(id, "a", "b")
    }

    #[test]
    fn emit_and_receive() {
        let feed = ChangeFeed::default();
        let rx = feed.subscribe();

        let event = ChangeEvent::put(1, post(3), false);
        feed.emit(event.clone());

        let received = rx.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(received, event);
        assert_eq!(received.change_type, ChangeType::Insert);
    }

    #[test]
    fn dropped_subscribers_are_removed() {
        let feed = ChangeFeed::default();
        let rx = feed.subscribe();
        let _kept = feed.subscribe();
        drop(rx);

        feed.emit(ChangeEvent::delete(1, 4));
        assert_eq!(feed.subscriber_count(), 1);
    }

    #[test]
    fn every_subscriber_sees_events_in_order() {
        let feed = ChangeFeed::new();
        let first = feed.subscribe();
        let second = feed.subscribe();
        for seq in 1..=3 {
            feed.emit(ChangeEvent::put(seq, post(seq as PostId), false));
        }

        for rx in [first, second] {
            let seqs: Vec<_> = rx.try_iter().map(|e| e.sequence).collect();
            assert_eq!(seqs, vec![1, 2, 3]);
        }
    }
}
