//! Holding area for posts whose submission failed.

use feedsync_core::Post;
use parking_lot::Mutex;

/// Posts whose `save` failed, waiting for resubmission.
///
/// Append-only from the engine's side. Nothing drains it automatically; a
/// consumer takes everything with [`UnsentQueue::drain`] and resubmits it
/// (see [`crate::PostRepository::resubmit_unsent`]).
#[derive(Debug, Default)]
pub struct UnsentQueue {
    posts: Mutex<Vec<Post>>,
}

impl UnsentQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a post.
    pub fn push(&self, post: Post) {
        self.posts.lock().push(post);
    }

    /// Returns the number of queued posts.
    pub fn len(&self) -> usize {
        self.posts.lock().len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.posts.lock().is_empty()
    }

    /// Returns a copy of the queued posts in submission order.
    pub fn snapshot(&self) -> Vec<Post> {
        self.posts.lock().clone()
    }

    /// Takes every queued post, oldest first, leaving the queue empty.
    pub fn drain(&self) -> impl Iterator<Item = Post> {
        std::mem::take(&mut *self.posts.lock()).into_iter()
    }
}
