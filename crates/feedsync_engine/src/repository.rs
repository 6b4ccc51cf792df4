//! The reconciliation engine.
//!
//! Every mutation runs in two phases: an optimistic write to the local store,
//! then the remote call whose outcome either confirms the write (the server's
//! version overwrites the row) or rolls it back.
//!
//! | Operation | Optimistic step | Transport failure | Other failure |
//! |---|---|---|---|
//! | `fetch_all` | none | `Network`, no change | `Api`/`Unknown`, no change |
//! | `save` | none | queue post, `Network` | queue post, `Api`/`Unknown` |
//! | `remove_by_id` | delete row | restore captured row, `Network` | `Api`/`Unknown`, no restore |
//! | `like_by_id` | likes+1, liked | restore captured row, `Network` | `Api`/`Unknown`, no restore |
//! | `dislike_by_id` | likes-1, not liked | restore captured row, `Network` | `Api`/`Unknown`, no restore |

use crate::config::{EngineConfig, PayloadCheck};
use crate::error::{FeedError, FeedResult, RemoteError, RemoteResult};
use crate::locks::PostLocks;
use crate::remote::{ApiResponse, RemoteClient};
use crate::unsent::UnsentQueue;
use feedsync_core::{LiveQuery, Post, PostId, PostStore, PostWatch};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LikeAction {
    Like,
    Dislike,
}

impl LikeAction {
    fn apply(self, post: &Post) -> Post {
        match self {
            LikeAction::Like => post.with_like(),
            LikeAction::Dislike => post.with_dislike(),
        }
    }
}

/// Outcome of [`PostRepository::resubmit_unsent`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResubmitReport {
    /// Server versions of the posts that went through.
    pub confirmed: Vec<Post>,
    /// Number of posts that failed again and were re-queued.
    pub failed: usize,
    /// Error of the last failure.
    pub last_error: Option<FeedError>,
}

/// Reconciles the local post store with the remote feed service.
pub struct PostRepository<R: RemoteClient> {
    config: EngineConfig,
    store: Arc<PostStore>,
    remote: R,
    unsent: UnsentQueue,
    locks: PostLocks,
}

impl<R: RemoteClient> PostRepository<R> {
    /// Creates a repository over `store` and `remote`.
    pub fn new(config: EngineConfig, store: Arc<PostStore>, remote: R) -> Self {
        let locks = PostLocks::new(config.serialize_mutations);
        Self {
            config,
            store,
            remote,
            unsent: UnsentQueue::new(),
            locks,
        }
    }

    /// Live view of the local store, the list the UI renders.
    pub fn data(&self) -> LiveQuery {
        self.store.observe_all()
    }

    /// Async live view of the local store.
    pub fn watch(&self) -> PostWatch {
        self.store.watch_all()
    }

    /// Returns the local store.
    pub fn store(&self) -> &Arc<PostStore> {
        &self.store
    }

    /// Returns the remote client.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Returns the posts whose submission failed.
    pub fn unsent(&self) -> &UnsentQueue {
        &self.unsent
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn call<T, F>(&self, request: F) -> RemoteResult<ApiResponse<T>>
    where
        F: Future<Output = RemoteResult<ApiResponse<T>>>,
    {
        tokio::time::timeout(self.config.request_timeout, request)
            .await
            .unwrap_or_else(|_| Err(RemoteError::Transport("request timed out".into())))
    }

    /// Loads every remote post into the store.
    ///
    /// Rows absent from the response are kept; the store only grows here.
    pub async fn fetch_all(&self) -> FeedResult<()> {
        let posts = self.call(self.remote.list_all()).await?.into_confirmed()?;
        debug!(count = posts.len(), "fetched remote posts");
        self.store.insert_or_replace_all(posts)?;
        Ok(())
    }

    /// Submits `post` and stores the server's version.
    ///
    /// Blank content is rejected before any remote call. Any failure after
    /// that queues the post in [`Self::unsent`].
    pub async fn save(&self, post: Post) -> FeedResult<Post> {
        if !post.has_content() {
            return Err(FeedError::EmptyContent);
        }

        match self.submit(&post).await {
            Ok(saved) => {
                debug!(id = saved.id, "post saved");
                Ok(saved)
            }
            Err(err) => {
                warn!(error = %err, "save failed, post queued for resubmission");
                self.unsent.push(post);
                Err(err)
            }
        }
    }

    async fn submit(&self, post: &Post) -> FeedResult<Post> {
        let saved = self.call(self.remote.create(post)).await?.into_confirmed()?;
        self.store.insert_or_replace(saved.clone())?;
        Ok(saved)
    }

    /// Deletes the post locally, then remotely.
    ///
    /// The row is restored only if the remote call could not complete and a
    /// row existed before the call.
    pub async fn remove_by_id(&self, id: PostId) -> FeedResult<()> {
        let _guard = self.locks.acquire(id).await;

        let previous = self.store.get(id);
        self.store.delete_by_id(id)?;

        match self.call(self.remote.delete_by_id(id)).await {
            Ok(response) if response.is_successful() => Ok(()),
            Ok(response) => Err(response.rejection()),
            Err(RemoteError::Transport(reason)) => {
                warn!(id, %reason, "delete not delivered, restoring post");
                self.restore(previous);
                Err(FeedError::Network)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Likes a post: optimistic +1, then the server's version.
    pub async fn like_by_id(&self, id: PostId) -> FeedResult<Post> {
        self.reconcile_like(id, LikeAction::Like).await
    }

    /// Takes a like back: optimistic -1 (never below zero), then the server's version.
    pub async fn dislike_by_id(&self, id: PostId) -> FeedResult<Post> {
        self.reconcile_like(id, LikeAction::Dislike).await
    }

    async fn reconcile_like(&self, id: PostId, action: LikeAction) -> FeedResult<Post> {
        let _guard = self.locks.acquire(id).await;

        // A post deleted meanwhile skips the optimistic step; the call still goes out.
        let previous = self.store.get(id);
        if let Some(post) = &previous {
            self.store.insert_or_replace(action.apply(post))?;
        }

        let outcome = match action {
            LikeAction::Like => self.call(self.remote.like_by_id(id)).await,
            LikeAction::Dislike => self.call(self.remote.dislike_by_id(id)).await,
        };

        match outcome {
            Ok(response) => self.confirm_like(response),
            Err(RemoteError::Transport(reason)) => {
                warn!(id, ?action, %reason, "like not delivered, restoring post");
                self.restore(previous);
                Err(FeedError::Network)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn confirm_like(&self, response: ApiResponse<Post>) -> FeedResult<Post> {
        match self.config.payload_check {
            PayloadCheck::BodyFirst => {
                let Some(post) = response.body.clone() else {
                    return Err(response.rejection());
                };
                self.store.insert_or_replace(post.clone())?;
                if !response.is_successful() {
                    return Err(response.rejection());
                }
                Ok(post)
            }
            PayloadCheck::StatusFirst => {
                let post = response.into_confirmed()?;
                self.store.insert_or_replace(post.clone())?;
                Ok(post)
            }
        }
    }

    fn restore(&self, previous: Option<Post>) {
        if let Some(post) = previous {
            if let Err(err) = self.store.insert_or_replace(post) {
                warn!(error = %err, "rollback write failed");
            }
        }
    }

    /// Resubmits every queued post once.
    ///
    /// Only runs when called. Posts that fail again go back into the queue
    /// through `save`'s own failure path.
    pub async fn resubmit_unsent(&self) -> ResubmitReport {
        let pending: Vec<Post> = self.unsent.drain().collect();
        let mut report = ResubmitReport::default();

        for post in pending {
            match self.save(post).await {
                Ok(saved) => report.confirmed.push(saved),
                Err(err) => {
                    report.failed += 1;
                    report.last_error = Some(err);
                }
            }
        }

        debug!(
            confirmed = report.confirmed.len(),
            failed = report.failed,
            "resubmitted unsent posts"
        );
        report
    }
}
