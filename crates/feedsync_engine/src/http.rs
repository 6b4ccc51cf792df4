//! JSON-over-HTTP remote client.
//!
//! The socket layer stays outside the engine: plug any HTTP library in by
//! implementing [`HttpClient`]. [`HttpRemote`] owns the endpoint layout and
//! the JSON encoding.

use crate::error::{RemoteError, RemoteResult};
use crate::remote::{ApiResponse, RemoteClient};
use feedsync_core::{Post, PostId};
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// DELETE
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        })
    }
}

/// An outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// JSON body, if any.
    pub body: Option<Vec<u8>>,
}

/// A received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Reason phrase.
    pub reason: String,
    /// Raw body, empty if none.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with a JSON body.
    pub fn json(status: u16, reason: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body,
        }
    }

    /// Creates a response without a body.
    pub fn empty(status: u16, reason: impl Into<String>) -> Self {
        Self::json(status, reason, Vec::new())
    }
}

/// Errors raised by an [`HttpClient`] when no response was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpClientError {
    /// The connection could not be made or was lost.
    #[error("connection failed: {0}")]
    Connect(String),
    /// Any other client-side failure.
    #[error("http client error: {0}")]
    Other(String),
}

/// HTTP client abstraction.
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, HttpClientError>> + Send;
}

/// Remote feed service reached over HTTP with JSON bodies.
///
/// | Operation | Request |
/// |---|---|
/// | list | `GET /api/posts` |
/// | create | `POST /api/posts` |
/// | delete | `DELETE /api/posts/{id}` |
/// | like | `POST /api/posts/{id}/likes` |
/// | unlike | `DELETE /api/posts/{id}/likes` |
pub struct HttpRemote<C: HttpClient> {
    base_url: String,
    client: C,
}

impl<C: HttpClient> HttpRemote<C> {
    /// Creates a remote for the service at `base_url`.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    fn request(&self, method: HttpMethod, path: &str, body: Option<Vec<u8>>) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{}", self.base_url, path),
            body,
        }
    }

    async fn send(&self, request: HttpRequest) -> RemoteResult<HttpResponse> {
        self.client.send(request).await.map_err(|e| match e {
            HttpClientError::Connect(message) => RemoteError::Transport(message),
            HttpClientError::Other(message) => RemoteError::Other(message),
        })
    }

    async fn exchange<T: DeserializeOwned>(&self, request: HttpRequest) -> RemoteResult<ApiResponse<T>> {
        let response = self.send(request).await?;
        let successful = (200..300).contains(&response.status);

        let body = if response.body.is_empty() {
            None
        } else if successful {
            Some(
                serde_json::from_slice(&response.body)
                    .map_err(|e| RemoteError::Decode(e.to_string()))?,
            )
        } else {
            // Error pages rarely carry a post; keep one only if it decodes.
            serde_json::from_slice(&response.body).ok()
        };

        Ok(ApiResponse {
            status: response.status,
            message: response.reason,
            body,
        })
    }
}

fn encode(post: &Post) -> RemoteResult<Vec<u8>> {
    serde_json::to_vec(post).map_err(|e| RemoteError::Other(e.to_string()))
}

impl<C: HttpClient> RemoteClient for HttpRemote<C> {
    async fn list_all(&self) -> RemoteResult<ApiResponse<Vec<Post>>> {
        self.exchange(self.request(HttpMethod::Get, "/api/posts", None))
            .await
    }

    async fn create(&self, post: &Post) -> RemoteResult<ApiResponse<Post>> {
        let body = encode(post)?;
        self.exchange(self.request(HttpMethod::Post, "/api/posts", Some(body)))
            .await
    }

    async fn delete_by_id(&self, id: PostId) -> RemoteResult<ApiResponse<()>> {
        let response = self
            .send(self.request(HttpMethod::Delete, &format!("/api/posts/{id}"), None))
            .await?;
        let successful = (200..300).contains(&response.status);
        Ok(ApiResponse {
            status: response.status,
            message: response.reason,
            body: successful.then_some(()),
        })
    }

    async fn like_by_id(&self, id: PostId) -> RemoteResult<ApiResponse<Post>> {
        self.exchange(self.request(HttpMethod::Post, &format!("/api/posts/{id}/likes"), None))
            .await
    }

    async fn dislike_by_id(&self, id: PostId) -> RemoteResult<ApiResponse<Post>> {
        self.exchange(self.request(
            HttpMethod::Delete,
            &format!("/api/posts/{id}/likes"),
            None,
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct TestClient {
        response: Mutex<Result<HttpResponse, HttpClientError>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl TestClient {
        fn new(response: Result<HttpResponse, HttpClientError>) -> Self {
            Self {
                response: Mutex::new(response),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for TestClient {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpClientError> {
            self.seen.lock().push(request);
            self.response.lock().clone()
        }
    }

    fn post_json(post: &Post) -> Vec<u8> {
        serde_json::to_vec(post).unwrap()
    }

    #[tokio::test]
    async fn like_builds_request_and_decodes() {
        let post = Post::new(5, "Alice", "hi").with_like();
        let client = TestClient::new(Ok(HttpResponse::json(200, "OK", post_json(&post))));
        let remote = HttpRemote::new("https://feed.example.com/", client);

        let response = remote.like_by_id(5).await.unwrap();
        assert_eq!(response.body, Some(post));

        let seen = remote.client().seen.lock().clone();
        assert_eq!(seen[0].method, HttpMethod::Post);
        assert_eq!(seen[0].url, "https://feed.example.com/api/posts/5/likes");
    }

    #[tokio::test]
    async fn connect_failure_is_transport() {
        let client = TestClient::new(Err(HttpClientError::Connect("refused".into())));
        let remote = HttpRemote::new("http://localhost", client);

        assert_eq!(
            remote.list_all().await,
            Err(RemoteError::Transport("refused".into()))
        );
    }

    #[tokio::test]
    async fn garbage_success_body_is_decode_error() {
        let client = TestClient::new(Ok(HttpResponse::json(200, "OK", b"{not json".to_vec())));
        let remote = HttpRemote::new("http://localhost", client);

        assert!(matches!(
            remote.create(&Post::new(0, "a", "b")).await,
            Err(RemoteError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn error_status_keeps_status_and_drops_garbage() {
        let client = TestClient::new(Ok(HttpResponse::json(
            500,
            "Internal Server Error",
            b"oops".to_vec(),
        )));
        let remote = HttpRemote::new("http://localhost", client);

        let response = remote.dislike_by_id(1).await.unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(response.body, None);
    }

    #[tokio::test]
    async fn empty_success_body_is_absent_payload() {
        let client = TestClient::new(Ok(HttpResponse::empty(200, "OK")));
        let remote = HttpRemote::new("http://localhost", client);

        let response = remote.like_by_id(1).await.unwrap();
        assert!(response.is_successful());
        assert_eq!(response.body, None);

        let deleted = remote.delete_by_id(1).await.unwrap();
        assert_eq!(deleted.body, Some(()));
    }
}
