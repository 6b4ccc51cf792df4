//! # feedsync storage
//!
//! Byte-store backends for the feedsync post cache.
//!
//! The post cache keeps its rows in an append-only log. This crate provides
//! the place that log lives. Backends are **opaque byte stores**: they do not
//! know about posts, records or checksums.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - Tests and ephemeral caches. Clones share bytes, so a
//!   test can "reopen" a cache, and appends can be made to fail on demand.
//! - [`FileBackend`] - Durable cache file using OS file APIs.
//!
//! ## Example
//!
//! ```rust
//! use feedsync_storage::{InMemoryBackend, StorageBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"post row").unwrap();
//! assert_eq!(backend.read_at(offset, 8).unwrap(), b"post row");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
