//! Test fixtures and store helpers.
//!
//! Provides sample posts and convenience constructors for stores and
//! repositories backed by memory or a temporary directory.

use feedsync_core::{Config, Post, PostId, PostStore};
use feedsync_engine::{EngineConfig, PostRepository, RemoteClient};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Returns a post with deterministic content for `id`.
pub fn sample_post(id: PostId) -> Post {
    Post {
        author_avatar: format!("avatar-{id}.jpg"),
        published: format!("{}", 1_700_000_000 + id),
        ..Post::new(id, format!("author-{}", id % 3), format!("post number {id}"))
    }
}

/// Returns a sample post with the given like state.
pub fn liked_post(id: PostId, likes: u32, liked_by_me: bool) -> Post {
    Post {
        likes,
        liked_by_me,
        ..sample_post(id)
    }
}

/// Returns posts with ids `1..=count`.
pub fn sample_feed(count: usize) -> Vec<Post> {
    (1..=count as PostId).map(sample_post).collect()
}

/// Opens an in-memory store holding `posts`.
pub fn memory_store(posts: Vec<Post>) -> Arc<PostStore> {
    let store = PostStore::open_in_memory().expect("Failed to open in-memory store");
    store
        .insert_or_replace_all(posts)
        .expect("Failed to seed store");
    Arc::new(store)
}

/// Creates a repository over an in-memory store holding `posts`.
pub fn repository_with<R: RemoteClient>(remote: R, posts: Vec<Post>) -> PostRepository<R> {
    repository_with_config(EngineConfig::default(), remote, posts)
}

/// Like [`repository_with`], with an explicit configuration.
pub fn repository_with_config<R: RemoteClient>(
    config: EngineConfig,
    remote: R,
    posts: Vec<Post>,
) -> PostRepository<R> {
    PostRepository::new(config, memory_store(posts), remote)
}

/// A directory-backed store with automatic cleanup.
pub struct TempStore {
    /// The store instance.
    pub store: Arc<PostStore>,
    temp_dir: TempDir,
}

impl TempStore {
    /// Opens an empty store in a fresh temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Self::open_at(temp_dir.path());
        Self { store, temp_dir }
    }

    /// Returns the store directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Closes and reopens the store, replaying its log.
    ///
    /// Panics if another handle to the store is still alive.
    pub fn reopen(&mut self) {
        let placeholder = memory_store(Vec::new());
        let old = std::mem::replace(&mut self.store, placeholder);
        drop(Arc::try_unwrap(old).unwrap_or_else(|_| panic!("store still shared")));
        self.store = Self::open_at(self.temp_dir.path());
    }

    fn open_at(path: &Path) -> Arc<PostStore> {
        Arc::new(PostStore::open_dir(path, Config::default()).expect("Failed to open store"))
    }
}

impl Default for TempStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TempStore {
    type Target = PostStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}
