//! In-memory fake of the remote feed service.
//!
//! [`FakeFeedServer`] is authoritative like the real service: it assigns
//! ids, owns like counters and answers every request from its own state.
//! Use it directly as a [`RemoteClient`], or through [`LoopbackClient`] to
//! exercise the HTTP layer as well.

use feedsync_core::{Post, PostId};
use feedsync_engine::{
    ApiResponse, HttpClient, HttpClientError, HttpMethod, HttpRequest, HttpResponse, RemoteClient,
    RemoteError, RemoteResult,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug)]
struct ServerState {
    posts: BTreeMap<PostId, Post>,
    next_id: PostId,
    offline: bool,
    failure: Option<(u16, String)>,
    requests: usize,
}

impl Default for ServerState {
    fn default() -> Self {
        Self {
            posts: BTreeMap::new(),
            next_id: 1,
            offline: false,
            failure: None,
            requests: 0,
        }
    }
}

/// Outcome of routing one request through the fake.
enum Outcome<T> {
    Offline,
    Status(u16, String),
    Ok(T),
}

impl<T> Outcome<T> {
    fn into_reply(self) -> RemoteResult<ApiResponse<T>> {
        match self {
            Outcome::Offline => Err(RemoteError::Transport("server unreachable".into())),
            Outcome::Status(status, message) => Ok(ApiResponse::status(status, message)),
            Outcome::Ok(body) => Ok(ApiResponse::ok(body)),
        }
    }
}

fn not_found() -> (u16, String) {
    (404, "Not Found".into())
}

/// An authoritative in-memory feed service.
///
/// Clones share state, so a test can keep one handle for inspection and
/// hand another to the repository.
#[derive(Debug, Clone, Default)]
pub struct FakeFeedServer {
    state: Arc<Mutex<ServerState>>,
}

impl FakeFeedServer {
    /// Creates an empty server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a server holding `posts`. New ids continue after the largest.
    pub fn with_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        let server = Self::new();
        {
            let mut state = server.state.lock();
            for post in posts {
                state.next_id = state.next_id.max(post.id + 1);
                state.posts.insert(post.id, post);
            }
        }
        server
    }

    /// Makes every request fail at the transport level.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Makes every request answer `status` without a body.
    pub fn fail_with(&self, status: u16, message: impl Into<String>) {
        self.state.lock().failure = Some((status, message.into()));
    }

    /// Stops failing requests.
    pub fn clear_failure(&self) {
        self.state.lock().failure = None;
    }

    /// Returns the stored version of `id`.
    pub fn get(&self, id: PostId) -> Option<Post> {
        self.state.lock().posts.get(&id).cloned()
    }

    /// Returns all posts, newest first.
    pub fn posts(&self) -> Vec<Post> {
        self.state.lock().posts.values().rev().cloned().collect()
    }

    /// Returns the number of requests received, failed ones included.
    pub fn request_count(&self) -> usize {
        self.state.lock().requests
    }

    fn serve<T>(&self, handler: impl FnOnce(&mut ServerState) -> Result<T, (u16, String)>) -> Outcome<T> {
        let mut state = self.state.lock();
        state.requests += 1;
        if state.offline {
            return Outcome::Offline;
        }
        if let Some((status, message)) = state.failure.clone() {
            return Outcome::Status(status, message);
        }
        match handler(&mut *state) {
            Ok(body) => Outcome::Ok(body),
            Err((status, message)) => Outcome::Status(status, message),
        }
    }

    fn list(&self) -> Outcome<Vec<Post>> {
        self.serve(|state| Ok(state.posts.values().rev().cloned().collect()))
    }

    fn store(&self, post: &Post) -> Outcome<Post> {
        let post = post.clone();
        self.serve(move |state| {
            let mut stored = post;
            if stored.is_local() {
                stored.id = state.next_id;
                state.next_id += 1;
                stored.likes = 0;
                stored.liked_by_me = false;
            } else if let Some(existing) = state.posts.get(&stored.id) {
                // Edits never touch the like state.
                stored.likes = existing.likes;
                stored.liked_by_me = existing.liked_by_me;
            } else {
                return Err(not_found());
            }
            state.posts.insert(stored.id, stored.clone());
            Ok(stored)
        })
    }

    fn delete(&self, id: PostId) -> Outcome<()> {
        self.serve(|state| state.posts.remove(&id).map(|_| ()).ok_or_else(not_found))
    }

    fn set_liked(&self, id: PostId, liked: bool) -> Outcome<Post> {
        self.serve(|state| {
            let post = state.posts.get_mut(&id).ok_or_else(not_found)?;
            if post.liked_by_me != liked {
                *post = if liked { post.with_like() } else { post.with_dislike() };
            }
            Ok(post.clone())
        })
    }

    /// Routes a raw HTTP request.
    ///
    /// `Err` means no response was produced (the server is offline).
    pub fn handle(&self, request: &HttpRequest) -> Result<HttpResponse, HttpClientError> {
        let Some(start) = request.url.find("/api/posts") else {
            return Ok(HttpResponse::empty(404, "Not Found"));
        };
        let segments: Vec<&str> = request.url[start + "/api/posts".len()..]
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match (request.method, segments.as_slice()) {
            (HttpMethod::Get, []) => respond(self.list()),
            (HttpMethod::Post, []) => {
                let body = request.body.as_deref().unwrap_or_default();
                match serde_json::from_slice::<Post>(body) {
                    Ok(post) => respond(self.store(&post)),
                    Err(_) => Ok(HttpResponse::empty(400, "Bad Request")),
                }
            }
            (method, [id]) if method == HttpMethod::Delete => match id.parse() {
                Ok(id) => respond(self.delete(id)),
                Err(_) => Ok(HttpResponse::empty(400, "Bad Request")),
            },
            (method, [id, "likes"]) if method != HttpMethod::Get => match id.parse() {
                Ok(id) => respond(self.set_liked(id, method == HttpMethod::Post)),
                Err(_) => Ok(HttpResponse::empty(400, "Bad Request")),
            },
            _ => Ok(HttpResponse::empty(405, "Method Not Allowed")),
        }
    }
}

fn respond<T: Serialize>(
    outcome: Outcome<T>,
) -> Result<HttpResponse, HttpClientError> {
    match outcome {
        Outcome::Offline => Err(HttpClientError::Connect("connection refused".into())),
        Outcome::Status(status, message) => Ok(HttpResponse::empty(status, message)),
        Outcome::Ok(body) => serde_json::to_vec(&body)
            .map(|bytes| HttpResponse::json(200, "OK", bytes))
            .map_err(|e| HttpClientError::Other(e.to_string())),
    }
}

impl RemoteClient for FakeFeedServer {
    async fn list_all(&self) -> RemoteResult<ApiResponse<Vec<Post>>> {
        self.list().into_reply()
    }

    async fn create(&self, post: &Post) -> RemoteResult<ApiResponse<Post>> {
        self.store(post).into_reply()
    }

    async fn delete_by_id(&self, id: PostId) -> RemoteResult<ApiResponse<()>> {
        self.delete(id).into_reply()
    }

    async fn like_by_id(&self, id: PostId) -> RemoteResult<ApiResponse<Post>> {
        self.set_liked(id, true).into_reply()
    }

    async fn dislike_by_id(&self, id: PostId) -> RemoteResult<ApiResponse<Post>> {
        self.set_liked(id, false).into_reply()
    }
}

/// An [`HttpClient`] that delivers requests straight to a [`FakeFeedServer`].
#[derive(Debug, Clone)]
pub struct LoopbackClient {
    server: FakeFeedServer,
}

impl LoopbackClient {
    /// Creates a client connected to `server`.
    pub fn new(server: FakeFeedServer) -> Self {
        Self { server }
    }

    /// Returns the server.
    pub fn server(&self) -> &FakeFeedServer {
        &self.server
    }
}

impl HttpClient for LoopbackClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpClientError> {
        self.server.handle(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{liked_post, sample_feed};

    fn request(method: HttpMethod, path: &str, body: Option<Vec<u8>>) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("http://fake{path}"),
            body,
        }
    }

    #[test]
    fn create_assigns_ids_after_seeded_posts() {
        let server = FakeFeedServer::with_posts(sample_feed(3));
        let created = match server.store(&Post::new(0, "Student", "hi")) {
            Outcome::Ok(post) => post,
            _ => panic!("create failed"),
        };
        assert_eq!(created.id, 4);
        assert_eq!(server.posts().len(), 4);
    }

    #[test]
    fn like_is_idempotent() {
        let server = FakeFeedServer::with_posts(vec![liked_post(1, 3, false)]);
        server.set_liked(1, true);
        server.set_liked(1, true);
        assert_eq!(server.get(1), Some(liked_post(1, 4, true)));
    }

    #[test]
    fn http_routes() {
        let server = FakeFeedServer::with_posts(sample_feed(2));

        let list = server.handle(&request(HttpMethod::Get, "/api/posts", None)).unwrap();
        let posts: Vec<Post> = serde_json::from_slice(&list.body).unwrap();
        assert_eq!(posts.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 1]);

        let liked = server
            .handle(&request(HttpMethod::Post, "/api/posts/1/likes", None))
            .unwrap();
        assert_eq!(liked.status, 200);
        assert!(server.get(1).unwrap().liked_by_me);

        let missing = server
            .handle(&request(HttpMethod::Delete, "/api/posts/9", None))
            .unwrap();
        assert_eq!(missing.status, 404);

        let bad = server
            .handle(&request(HttpMethod::Post, "/api/posts", Some(b"nope".to_vec())))
            .unwrap();
        assert_eq!(bad.status, 400);
    }

    #[test]
    fn offline_and_failing() {
        let server = FakeFeedServer::with_posts(sample_feed(1));
        server.set_offline(true);
        assert!(server
            .handle(&request(HttpMethod::Get, "/api/posts", None))
            .is_err());

        server.set_offline(false);
        server.fail_with(503, "Service Unavailable");
        let response = server
            .handle(&request(HttpMethod::Get, "/api/posts", None))
            .unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(server.request_count(), 2);
    }
}
