//! The local post store.

use crate::change_feed::{ChangeEvent, ChangeFeed};
use crate::config::Config;
use crate::dir::StoreDir;
use crate::error::CoreResult;
use crate::log::{replay, LogRecord};
use crate::post::{Post, PostId};
use feedsync_storage::{FileBackend, InMemoryBackend, StorageBackend};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Rows plus the log they are persisted in.
///
/// Both live behind one lock so a write is atomic per row.
struct Table {
    rows: BTreeMap<PostId, Post>,
    backend: Box<dyn StorageBackend>,
    sequence: u64,
    sync_on_write: bool,
}

impl Table {
    fn snapshot(&self) -> Vec<Post> {
        self.rows.values().rev().cloned().collect()
    }

    fn persist(&mut self, bytes: &[u8]) -> CoreResult<()> {
        self.backend.append(bytes)?;
        self.backend.flush()?;
        if self.sync_on_write {
            self.backend.sync()?;
        }
        Ok(())
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

/// Size and activity counters of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    /// Number of live rows.
    pub rows: usize,
    /// Size of the post log in bytes.
    pub log_bytes: u64,
    /// Writes since the store was opened.
    pub sequence: u64,
}

/// Durable key-value table of posts, keyed by post id.
///
/// Rows are kept in memory and persisted to an append-only log on a
/// [`StorageBackend`]. Opening a store replays the log.
///
/// Writers can be observed three ways: raw [`ChangeEvent`]s, a blocking
/// [`LiveQuery`] or an async [`PostWatch`].
pub struct PostStore {
    table: Arc<RwLock<Table>>,
    feed: Arc<ChangeFeed>,
    versions: watch::Sender<u64>,
    _dir: Option<StoreDir>,
}

impl PostStore {
    /// Opens a store over `backend`, replaying whatever log it holds.
    ///
    /// A torn record at the end of the log is cut off.
    ///
    /// # Errors
    ///
    /// Returns `LogCorruption` if a complete record fails its checksum.
    pub fn open(config: Config, mut backend: Box<dyn StorageBackend>) -> CoreResult<Self> {
        let bytes = backend.read_all()?;
        let replayed = replay(&bytes)?;

        if replayed.valid_len < bytes.len() as u64 {
            warn!(
                valid = replayed.valid_len,
                size = bytes.len(),
                "truncating torn tail of post log"
            );
            backend.truncate(replayed.valid_len)?;
        }

        let mut rows = BTreeMap::new();
        for record in replayed.records {
            match record {
                LogRecord::Put(post) => {
                    rows.insert(post.id, post);
                }
                LogRecord::Delete(id) => {
                    rows.remove(&id);
                }
            }
        }
        debug!(rows = rows.len(), "post store opened");

        Ok(Self {
            table: Arc::new(RwLock::new(Table {
                rows,
                backend,
                sequence: 0,
                sync_on_write: config.sync_on_write,
            })),
            feed: Arc::new(ChangeFeed::new()),
            versions: watch::channel(0).0,
            _dir: None,
        })
    }

    /// Opens an empty, non-durable store.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open(Config::default(), Box::new(InMemoryBackend::new()))
    }

    /// Opens the store kept in the cache directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreLocked` if another process has the directory open.
    pub fn open_dir(path: &Path, config: Config) -> CoreResult<Self> {
        let dir = StoreDir::open(path, config.create_if_missing)?;
        let backend = FileBackend::open(&dir.log_path())?;
        let mut store = Self::open(config, Box::new(backend))?;
        store._dir = Some(dir);
        Ok(store)
    }

    /// Opens the cache at `path` for reading only.
    ///
    /// The log is replayed from a private copy, so a torn tail is skipped but
    /// never cut from the file. Every write on the returned store fails.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the directory is missing, `StoreLocked` if
    /// another process has it open, or `LogCorruption` for a damaged log.
    pub fn open_read_only(path: &Path) -> CoreResult<Self> {
        let dir = StoreDir::open(path, false)?;
        let bytes = match std::fs::read(dir.log_path()) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        let copy = InMemoryBackend::with_data(bytes);
        let mut store = Self::open(Config::default(), Box::new(copy.clone()))?;
        copy.set_fail_writes(true);
        store._dir = Some(dir);
        Ok(store)
    }

    /// Inserts `post`, replacing any row with the same id.
    pub fn insert_or_replace(&self, post: Post) -> CoreResult<()> {
        self.insert_or_replace_all(vec![post])
    }

    /// Inserts or replaces every post as one log append.
    ///
    /// Nothing is applied if the append fails. One event is emitted per post.
    pub fn insert_or_replace_all(&self, posts: Vec<Post>) -> CoreResult<()> {
        if posts.is_empty() {
            return Ok(());
        }

        let mut bytes = Vec::new();
        for post in &posts {
            bytes.extend(LogRecord::Put(post.clone()).encode()?);
        }

        let mut table = self.table.write();
        table.persist(&bytes)?;
        for post in posts {
            let existed = table.rows.insert(post.id, post.clone()).is_some();
            let sequence = table.next_sequence();
            self.feed.emit(ChangeEvent::put(sequence, post, existed));
        }
        self.versions.send_replace(table.sequence);
        Ok(())
    }

    /// Deletes the row for `id` and returns it.
    ///
    /// Deleting an absent id writes nothing and emits nothing.
    pub fn delete_by_id(&self, id: PostId) -> CoreResult<Option<Post>> {
        let mut table = self.table.write();
        if !table.rows.contains_key(&id) {
            return Ok(None);
        }

        table.persist(&LogRecord::Delete(id).encode()?)?;
        let removed = table.rows.remove(&id);
        let sequence = table.next_sequence();
        self.feed.emit(ChangeEvent::delete(sequence, id));
        self.versions.send_replace(sequence);
        Ok(removed)
    }

    /// Returns a copy of the row for `id`.
    pub fn get(&self, id: PostId) -> Option<Post> {
        self.table.read().rows.get(&id).cloned()
    }

    /// Returns every row, newest (highest id) first.
    pub fn all(&self) -> Vec<Post> {
        self.table.read().snapshot()
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    /// Returns true if the store has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a live view of the whole table.
    pub fn observe_all(&self) -> LiveQuery {
        // Subscribe under the lock so no write falls between snapshot and feed.
        let _guard = self.table.read();
        LiveQuery {
            table: Arc::clone(&self.table),
            events: self.feed.subscribe(),
        }
    }

    /// Returns an async view of the whole table.
    ///
    /// Unlike [`LiveQuery`] it never blocks a thread, so it can be awaited
    /// from inside a tokio runtime.
    pub fn watch_all(&self) -> PostWatch {
        let _guard = self.table.read();
        PostWatch {
            table: Arc::clone(&self.table),
            versions: self.versions.subscribe(),
        }
    }

    /// Subscribes to raw change events.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.feed.subscribe()
    }

    /// Returns the change feed.
    pub fn change_feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Rewrites the log with exactly one record per live row.
    ///
    /// The new log replaces the old one in a single backend swap. If the swap
    /// fails the old log stays in place and the error is returned.
    pub fn compact(&self) -> CoreResult<u64> {
        let mut table = self.table.write();
        let mut bytes = Vec::new();
        for post in table.rows.values() {
            bytes.extend(LogRecord::Put(post.clone()).encode()?);
        }

        let before = table.backend.size()?;
        table.backend.replace(&bytes)?;
        let after = table.backend.size()?;
        debug!(before, after, "post log compacted");
        Ok(before.saturating_sub(after))
    }

    /// Makes every write so far durable.
    pub fn flush(&self) -> CoreResult<()> {
        let mut table = self.table.write();
        table.backend.flush()?;
        table.backend.sync()?;
        Ok(())
    }

    /// Returns size and activity counters.
    pub fn stats(&self) -> CoreResult<StoreStats> {
        let table = self.table.read();
        Ok(StoreStats {
            rows: table.rows.len(),
            log_bytes: table.backend.size()?,
            sequence: table.sequence,
        })
    }
}

/// A live, observable read of the whole post table.
///
/// Created by [`PostStore::observe_all`]. Every successful store write wakes
/// the query; each wake-up yields a fresh newest-first snapshot.
pub struct LiveQuery {
    table: Arc<RwLock<Table>>,
    events: Receiver<ChangeEvent>,
}

impl LiveQuery {
    /// Returns the current snapshot.
    pub fn current(&self) -> Vec<Post> {
        self.table.read().snapshot()
    }

    /// Waits up to `timeout` for the next write and returns the new snapshot.
    ///
    /// Writes that landed meanwhile are folded into the same snapshot.
    pub fn next_change(&self, timeout: Duration) -> Option<Vec<Post>> {
        self.events.recv_timeout(timeout).ok()?;
        self.drain_pending();
        Some(self.current())
    }

    /// Returns a new snapshot if any write happened since the last call.
    pub fn try_next_change(&self) -> Option<Vec<Post>> {
        match self.events.try_recv() {
            Ok(_) => {
                self.drain_pending();
                Some(self.current())
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    fn drain_pending(&self) {
        while self.events.try_recv().is_ok() {}
    }
}

/// An async, observable read of the whole post table.
///
/// Created by [`PostStore::watch_all`]. Writes that land between two awaits
/// are folded into one wake-up.
#[derive(Clone)]
pub struct PostWatch {
    table: Arc<RwLock<Table>>,
    versions: watch::Receiver<u64>,
}

impl PostWatch {
    /// Returns the current snapshot.
    pub fn current(&self) -> Vec<Post> {
        self.table.read().snapshot()
    }

    /// Returns true if a write happened since the last snapshot was taken.
    pub fn has_changed(&self) -> bool {
        self.versions.has_changed().unwrap_or(false)
    }

    /// Waits for the next write and returns the new snapshot.
    ///
    /// Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Vec<Post>> {
        self.versions.changed().await.ok()?;
        self.versions.borrow_and_update();
        Some(self.current())
    }
}
