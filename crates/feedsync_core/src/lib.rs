//! # feedsync core
//!
//! The post model and the durable local post store.
//!
//! The [`PostStore`] is the single source of truth the UI observes. Every
//! mutation, optimistic or confirmed, goes through it, and every successful
//! write is announced on its [`ChangeFeed`].
//!
//! ## Key Invariants
//!
//! - Exactly one row per post id (insert-or-replace)
//! - A write is atomic per row: log append and table update happen together
//! - Notifications are emitted only after the write succeeded
//! - Snapshots are ordered newest-first (id descending)
//!
//! ## Example
//!
//! ```rust
//! use feedsync_core::{Post, PostStore};
//!
//! let store = PostStore::open_in_memory().unwrap();
//! let live = store.observe_all();
//!
//! store.insert_or_replace(Post::new(1, "Alice", "hello")).unwrap();
//! assert_eq!(live.current().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change_feed;
mod config;
mod dir;
mod error;
mod log;
mod post;
mod store;

pub use change_feed::{ChangeEvent, ChangeFeed, ChangeType};
pub use config::Config;
pub use dir::StoreDir;
pub use error::{CoreError, CoreResult};
pub use log::{compute_crc32, LogRecord, LOG_MAGIC, LOG_VERSION, MAX_PAYLOAD_LEN};
pub use post::{Post, PostId, UNASSIGNED_ID};
pub use store::{LiveQuery, PostStore, PostWatch, StoreStats};
