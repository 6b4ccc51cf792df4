//! # feedsync testkit
//!
//! Test utilities for feedsync.
//!
//! This crate provides:
//! - Sample posts and store/repository fixtures
//! - Property-based test generators using proptest
//! - An in-memory fake of the remote feed service, reachable directly or
//!   through the HTTP client seam
//!
//! ## Usage
//!
//! ```rust,ignore
//! use feedsync_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn likes_reach_the_server() {
//!     let server = FakeFeedServer::with_posts(sample_feed(3));
//!     let repo = repository_with(server.clone(), sample_feed(3));
//!     repo.like_by_id(1).await.unwrap();
//!     assert!(server.get(1).unwrap().liked_by_me);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod server;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::server::*;
}

pub use fixtures::*;
pub use generators::*;
pub use server::*;
