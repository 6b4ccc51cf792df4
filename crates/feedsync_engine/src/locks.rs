//! Optional per-post mutation serialization.

use feedsync_core::PostId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per post id.
///
/// When disabled, [`PostLocks::acquire`] returns immediately and concurrent
/// mutations on the same post may interleave (the store's last write wins).
#[derive(Debug)]
pub struct PostLocks {
    enabled: bool,
    locks: Mutex<HashMap<PostId, Arc<AsyncMutex<()>>>>,
}

impl PostLocks {
    /// Creates the lock table.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if mutations are serialized.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Waits for exclusive access to `id`. Held until the guard drops.
    pub async fn acquire(&self, id: PostId) -> Option<OwnedMutexGuard<()>> {
        if !self.enabled {
            return None;
        }

        let lock = {
            let mut locks = self.locks.lock();
            // Forget ids nobody holds or waits on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(id).or_default())
        };
        Some(lock.lock_owned().await)
    }

    /// Returns the number of ids currently tracked.
    pub fn tracked(&self) -> usize {
        self.locks.lock().len()
    }
}
