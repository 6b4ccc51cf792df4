//! # feedsync engine
//!
//! Optimistic reconciliation between the local post store and a remote
//! feed service.
//!
//! This crate provides:
//! - The remote client abstraction and a JSON-over-HTTP implementation
//! - The reconciliation engine ([`PostRepository`])
//! - The holding queue for failed submissions
//! - The feed state projection
//! - The UI entry points ([`FeedViewModel`])
//!
//! ## Architecture
//!
//! Every mutation is applied to the local store first, so the UI updates
//! at once, then sent to the server:
//! 1. Capture the current row
//! 2. Write the optimistic version
//! 3. Call the remote service
//! 4. On confirmation, overwrite with the server's version; on a transport
//!    failure, restore the captured row
//!
//! ## Key Invariants
//!
//! - The server is authoritative: a confirmed payload always overwrites
//! - Rollback restores exactly the row captured before the optimistic write
//! - A post absent before a mutation is never resurrected by its rollback
//! - Blank posts are never sent

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod http;
mod locks;
mod remote;
mod repository;
mod state;
mod unsent;
mod view_model;

pub use config::{DraftDefaults, EngineConfig, PayloadCheck};
pub use error::{FeedError, FeedResult, RemoteError, RemoteResult};
pub use http::{HttpClient, HttpClientError, HttpMethod, HttpRemote, HttpRequest, HttpResponse};
pub use locks::PostLocks;
pub use remote::{ApiResponse, MockRemote, RemoteCall, RemoteClient, RemoteOp};
pub use repository::{PostRepository, ResubmitReport};
pub use state::{FeedState, FeedStateProjection};
pub use unsent::UnsentQueue;
pub use view_model::FeedViewModel;
