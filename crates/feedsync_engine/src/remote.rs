//! Remote client abstraction.

use crate::error::{FeedError, RemoteError, RemoteResult};
use feedsync_core::{Post, PostId};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::time::Duration;

/// A response from the remote feed service.
///
/// Together with [`RemoteError`] this covers every outcome of a call:
/// success with payload, success without payload, non-success status,
/// transport failure and any other failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse<T> {
    /// Status code.
    pub status: u16,
    /// Status message.
    pub message: String,
    /// Decoded payload, if any.
    pub body: Option<T>,
}

impl<T> ApiResponse<T> {
    /// A 200 response carrying `body`.
    pub fn ok(body: T) -> Self {
        Self {
            status: 200,
            message: "OK".into(),
            body: Some(body),
        }
    }

    /// A 200 response without a payload.
    pub fn ok_empty() -> Self {
        Self {
            status: 200,
            message: "OK".into(),
            body: None,
        }
    }

    /// A response with the given status and no payload.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            body: None,
        }
    }

    /// Attaches a payload.
    pub fn with_body(mut self, body: T) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns true for 2xx statuses.
    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The error describing this response as rejected.
    pub fn rejection(&self) -> FeedError {
        FeedError::api(self.status, self.message.clone())
    }

    /// Checks status, then payload, and returns the payload.
    pub fn into_confirmed(self) -> Result<T, FeedError> {
        if !self.is_successful() {
            return Err(self.rejection());
        }
        let rejection = self.rejection();
        self.body.ok_or(rejection)
    }
}

/// The remote feed service.
///
/// Implementations perform the call and report what came back; they do not
/// classify outcomes. That is the engine's job.
pub trait RemoteClient: Send + Sync {
    /// Lists all posts.
    fn list_all(&self) -> impl Future<Output = RemoteResult<ApiResponse<Vec<Post>>>> + Send;

    /// Creates (or updates) a post and returns the stored version.
    fn create(&self, post: &Post) -> impl Future<Output = RemoteResult<ApiResponse<Post>>> + Send;

    /// Deletes a post.
    fn delete_by_id(&self, id: PostId) -> impl Future<Output = RemoteResult<ApiResponse<()>>> + Send;

    /// Likes a post and returns the authoritative version.
    fn like_by_id(&self, id: PostId) -> impl Future<Output = RemoteResult<ApiResponse<Post>>> + Send;

    /// Takes a like back and returns the authoritative version.
    fn dislike_by_id(
        &self,
        id: PostId,
    ) -> impl Future<Output = RemoteResult<ApiResponse<Post>>> + Send;
}

/// Remote operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    /// `list_all`
    ListAll,
    /// `create`
    Create,
    /// `delete_by_id`
    Delete,
    /// `like_by_id`
    Like,
    /// `dislike_by_id`
    Dislike,
}

/// A call observed by [`MockRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// `list_all()`
    ListAll,
    /// `create(post)`
    Create(Post),
    /// `delete_by_id(id)`
    Delete(PostId),
    /// `like_by_id(id)`
    Like(PostId),
    /// `dislike_by_id(id)`
    Dislike(PostId),
}

impl RemoteCall {
    /// Returns the operation kind.
    pub fn op(&self) -> RemoteOp {
        match self {
            RemoteCall::ListAll => RemoteOp::ListAll,
            RemoteCall::Create(_) => RemoteOp::Create,
            RemoteCall::Delete(_) => RemoteOp::Delete,
            RemoteCall::Like(_) => RemoteOp::Like,
            RemoteCall::Dislike(_) => RemoteOp::Dislike,
        }
    }
}

type Reply<T> = RemoteResult<ApiResponse<T>>;

/// Scripted replies for one operation: queued ones first, then the fallback.
#[derive(Debug)]
struct Script<T> {
    queued: VecDeque<Reply<T>>,
    fallback: Option<Reply<T>>,
}

impl<T: Clone> Script<T> {
    fn next(&mut self, op: RemoteOp) -> Reply<T> {
        if let Some(reply) = self.queued.pop_front() {
            return reply;
        }
        self.fallback
            .clone()
            .unwrap_or_else(|| Err(RemoteError::Other(format!("no mock reply set for {op:?}"))))
    }
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queued: VecDeque::new(),
            fallback: None,
        }
    }
}

/// A scripted remote client for testing.
///
/// Each operation answers from a queue of one-shot replies, then from a
/// sticky fallback. Every call is recorded. A per-operation delay keeps a
/// call in flight so tests can interleave operations.
#[derive(Debug, Default)]
pub struct MockRemote {
    list: Mutex<Script<Vec<Post>>>,
    create: Mutex<Script<Post>>,
    delete: Mutex<Script<()>>,
    like: Mutex<Script<Post>>,
    dislike: Mutex<Script<Post>>,
    calls: Mutex<Vec<RemoteCall>>,
    delays: Mutex<HashMap<RemoteOp, Duration>>,
}

impl MockRemote {
    /// Creates a mock with no replies set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sticky `list_all` reply.
    pub fn set_list_reply(&self, reply: Reply<Vec<Post>>) {
        self.list.lock().fallback = Some(reply);
    }

    /// Sets the sticky `create` reply.
    pub fn set_create_reply(&self, reply: Reply<Post>) {
        self.create.lock().fallback = Some(reply);
    }

    /// Sets the sticky `delete_by_id` reply.
    pub fn set_delete_reply(&self, reply: Reply<()>) {
        self.delete.lock().fallback = Some(reply);
    }

    /// Sets the sticky `like_by_id` reply.
    pub fn set_like_reply(&self, reply: Reply<Post>) {
        self.like.lock().fallback = Some(reply);
    }

    /// Sets the sticky `dislike_by_id` reply.
    pub fn set_dislike_reply(&self, reply: Reply<Post>) {
        self.dislike.lock().fallback = Some(reply);
    }

    /// Queues a one-shot `create` reply.
    pub fn push_create_reply(&self, reply: Reply<Post>) {
        self.create.lock().queued.push_back(reply);
    }

    /// Queues a one-shot `like_by_id` reply.
    pub fn push_like_reply(&self, reply: Reply<Post>) {
        self.like.lock().queued.push_back(reply);
    }

    /// Queues a one-shot `dislike_by_id` reply.
    pub fn push_dislike_reply(&self, reply: Reply<Post>) {
        self.dislike.lock().queued.push_back(reply);
    }

    /// Makes every call of `op` wait `delay` before answering.
    pub fn set_delay(&self, op: RemoteOp, delay: Duration) {
        self.delays.lock().insert(op, delay);
    }

    /// Returns all calls so far.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    /// Returns how many calls of `op` were made.
    pub fn call_count(&self, op: RemoteOp) -> usize {
        self.calls.lock().iter().filter(|c| c.op() == op).count()
    }

    fn record(&self, call: RemoteCall) -> Option<Duration> {
        let delay = self.delays.lock().get(&call.op()).copied();
        self.calls.lock().push(call);
        delay
    }

    async fn pause(delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl RemoteClient for MockRemote {
    async fn list_all(&self) -> RemoteResult<ApiResponse<Vec<Post>>> {
        let delay = self.record(RemoteCall::ListAll);
        let reply = self.list.lock().next(RemoteOp::ListAll);
        Self::pause(delay).await;
        reply
    }

    async fn create(&self, post: &Post) -> RemoteResult<ApiResponse<Post>> {
        let delay = self.record(RemoteCall::Create(post.clone()));
        let reply = self.create.lock().next(RemoteOp::Create);
        Self::pause(delay).await;
        reply
    }

    async fn delete_by_id(&self, id: PostId) -> RemoteResult<ApiResponse<()>> {
        let delay = self.record(RemoteCall::Delete(id));
        let reply = self.delete.lock().next(RemoteOp::Delete);
        Self::pause(delay).await;
        reply
    }

    async fn like_by_id(&self, id: PostId) -> RemoteResult<ApiResponse<Post>> {
        let delay = self.record(RemoteCall::Like(id));
        let reply = self.like.lock().next(RemoteOp::Like);
        Self::pause(delay).await;
        reply
    }

    async fn dislike_by_id(&self, id: PostId) -> RemoteResult<ApiResponse<Post>> {
        let delay = self.record(RemoteCall::Dislike(id));
        let reply = self.dislike.lock().next(RemoteOp::Dislike);
        Self::pause(delay).await;
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_classification() {
        let ok = ApiResponse::ok(3);
        assert!(ok.is_successful());
        assert_eq!(ok.into_confirmed(), Ok(3));

        let empty: ApiResponse<i32> = ApiResponse::ok_empty();
        assert_eq!(empty.into_confirmed(), Err(FeedError::api(200, "OK")));

        let failed = ApiResponse::status(503, "Service Unavailable").with_body(1);
        assert!(!failed.is_successful());
        assert_eq!(
            failed.into_confirmed(),
            Err(FeedError::api(503, "Service Unavailable"))
        );
    }

    #[tokio::test]
    async fn mock_queued_then_fallback() {
        let remote = MockRemote::new();
        let post = Post::new(1, "a", "b");
        remote.push_like_reply(Err(RemoteError::Transport("offline".into())));
        remote.set_like_reply(Ok(ApiResponse::ok(post.clone())));

        assert!(remote.like_by_id(1).await.is_err());
        assert_eq!(remote.like_by_id(1).await.unwrap().body, Some(post.clone()));
        assert_eq!(remote.like_by_id(1).await.unwrap().body, Some(post));
        assert_eq!(remote.call_count(RemoteOp::Like), 3);
    }

    #[tokio::test]
    async fn mock_without_reply_is_other_error() {
        let remote = MockRemote::new();
        assert!(matches!(
            remote.list_all().await,
            Err(RemoteError::Other(_))
        ));
        assert_eq!(remote.calls(), vec![RemoteCall::ListAll]);
    }
}
