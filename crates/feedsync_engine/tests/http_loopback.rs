//! End-to-end tests through the HTTP client seam.

use feedsync_core::Post;
use feedsync_engine::{EngineConfig, FeedError, HttpRemote, PostRepository};
use feedsync_testkit::prelude::*;

fn http_repository(server: &FakeFeedServer) -> PostRepository<HttpRemote<LoopbackClient>> {
    let remote = HttpRemote::new("http://feed.test/", LoopbackClient::new(server.clone()));
    PostRepository::new(EngineConfig::new("http://feed.test"), memory_store(Vec::new()), remote)
}

#[tokio::test]
async fn full_cycle_over_http() {
    let server = FakeFeedServer::with_posts(sample_feed(3));
    let repo = http_repository(&server);

    repo.fetch_all().await.unwrap();
    assert_eq!(repo.store().all(), server.posts());

    let saved = repo.save(Post::new(0, "Student", "over the wire")).await.unwrap();
    assert_eq!(saved.id, 4);

    let liked = repo.like_by_id(2).await.unwrap();
    assert_eq!(liked.likes, 1);
    assert!(liked.liked_by_me);

    let unliked = repo.dislike_by_id(2).await.unwrap();
    assert_eq!(unliked, sample_post(2));

    repo.remove_by_id(1).await.unwrap();
    assert_eq!(repo.store().all(), server.posts());
}

#[tokio::test]
async fn connection_refused_is_network_error() {
    let server = FakeFeedServer::with_posts(sample_feed(2));
    let repo = http_repository(&server);
    repo.fetch_all().await.unwrap();

    server.set_offline(true);
    assert_eq!(repo.like_by_id(1).await, Err(FeedError::Network));
    assert_eq!(repo.remove_by_id(2).await, Err(FeedError::Network));
    assert_eq!(repo.store().all(), sample_feed(2).into_iter().rev().collect::<Vec<_>>());
}

#[tokio::test]
async fn missing_post_over_http_is_api_error() {
    let server = FakeFeedServer::new();
    let repo = http_repository(&server);

    assert_eq!(
        repo.like_by_id(8).await,
        Err(FeedError::api(404, "Not Found"))
    );
    assert!(repo.store().is_empty());
}
