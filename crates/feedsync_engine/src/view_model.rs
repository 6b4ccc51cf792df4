//! UI entry points.
//!
//! [`FeedViewModel`] is what a screen talks to. Each entry point spawns the
//! matching repository operation on the current tokio runtime and returns at
//! once; the screen observes results through [`FeedViewModel::posts`] (or
//! [`FeedViewModel::watch_posts`] from async code) and [`FeedViewModel::state`].

use crate::error::FeedResult;
use crate::remote::RemoteClient;
use crate::repository::PostRepository;
use crate::state::{FeedState, FeedStateProjection};
use feedsync_core::{LiveQuery, Post, PostId, PostWatch};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

/// Feed screen façade over a [`PostRepository`].
///
/// Must be used from within a tokio runtime. Dropping the view model, or
/// calling [`FeedViewModel::shutdown`], cancels operations still in flight;
/// a cancelled operation may leave its optimistic write in the store.
pub struct FeedViewModel<R: RemoteClient + 'static> {
    repository: Arc<PostRepository<R>>,
    state: Arc<FeedStateProjection>,
    draft: Mutex<Post>,
    post_created: watch::Sender<u64>,
    tasks: Mutex<Vec<AbortHandle>>,
}

impl<R: RemoteClient + 'static> FeedViewModel<R> {
    /// Creates a view model with an empty draft and an `Idle` state.
    pub fn new(repository: PostRepository<R>) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    /// Creates a view model over a repository shared with other owners.
    pub fn from_shared(repository: Arc<PostRepository<R>>) -> Self {
        let (post_created, _rx) = watch::channel(0);
        Self {
            repository,
            state: Arc::new(FeedStateProjection::new()),
            draft: Mutex::new(Post::draft()),
            post_created,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Returns the repository.
    pub fn repository(&self) -> &Arc<PostRepository<R>> {
        &self.repository
    }

    /// Live post list for rendering.
    pub fn posts(&self) -> LiveQuery {
        self.repository.data()
    }

    /// Async live post list, for screens driven from tokio tasks.
    pub fn watch_posts(&self) -> PostWatch {
        self.repository.watch()
    }

    /// Receiver of feed state changes.
    pub fn state(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Returns the latest feed state.
    pub fn current_state(&self) -> FeedState {
        self.state.current()
    }

    /// Receiver bumped each time a save is dispatched.
    ///
    /// The screen uses it to close the editor.
    pub fn post_created(&self) -> watch::Receiver<u64> {
        self.post_created.subscribe()
    }

    /// Returns a copy of the draft being edited.
    pub fn draft(&self) -> Post {
        self.draft.lock().clone()
    }

    fn spawn<T, F>(&self, start: Option<FeedState>, operation: F) -> JoinHandle<FeedResult<T>>
    where
        T: Send + 'static,
        F: Future<Output = FeedResult<T>> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move { state.track(start, operation).await });

        let mut tasks = self.tasks.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle.abort_handle());
        handle
    }

    /// Initial load: `Loading`, then `Idle` or `Error`.
    pub fn load_all(&self) -> JoinHandle<FeedResult<()>> {
        let repository = Arc::clone(&self.repository);
        self.spawn(Some(FeedState::Loading), async move {
            repository.fetch_all().await
        })
    }

    /// Pull-to-refresh: `Refreshing`, then `Idle` or `Error`.
    pub fn refresh(&self) -> JoinHandle<FeedResult<()>> {
        let repository = Arc::clone(&self.repository);
        self.spawn(Some(FeedState::Refreshing), async move {
            repository.fetch_all().await
        })
    }

    /// Submits the draft and starts a new one.
    ///
    /// A blank draft is discarded without a remote call and `None` is
    /// returned.
    pub fn save(&self) -> Option<JoinHandle<FeedResult<Post>>> {
        let post = std::mem::replace(&mut *self.draft.lock(), Post::draft());
        if !post.has_content() {
            debug!("blank draft discarded");
            return None;
        }

        let repository = Arc::clone(&self.repository);
        let handle = self.spawn(None, async move { repository.save(post).await });
        self.post_created.send_modify(|count| *count += 1);
        Some(handle)
    }

    /// Toggles the local user's like on `id`.
    ///
    /// Dispatches an unlike if the stored post is liked, a like otherwise.
    /// Returns `None` if the post is not in the store, after settling the
    /// feed state to `Idle`.
    pub fn like_or_dislike(&self, id: PostId) -> Option<JoinHandle<FeedResult<Post>>> {
        let Some(post) = self.repository.store().get(id) else {
            debug!(id, "like toggle on unknown post");
            self.state.set(FeedState::Idle);
            return None;
        };
        let liked = post.liked_by_me;
        let repository = Arc::clone(&self.repository);
        Some(self.spawn(None, async move {
            if liked {
                repository.dislike_by_id(id).await
            } else {
                repository.like_by_id(id).await
            }
        }))
    }

    /// Removes `id`.
    pub fn remove(&self, id: PostId) -> JoinHandle<FeedResult<()>> {
        let repository = Arc::clone(&self.repository);
        self.spawn(None, async move { repository.remove_by_id(id).await })
    }

    /// Makes `post` the draft, for editing an existing post.
    pub fn begin_edit(&self, post: Post) {
        *self.draft.lock() = post;
    }

    /// Replaces the draft's content with `text`, trimmed.
    ///
    /// Also stamps the draft with the configured local author. Unchanged
    /// content leaves the draft alone.
    pub fn update_draft_content(&self, text: &str) {
        let content = text.trim();
        let mut draft = self.draft.lock();
        if draft.content == content {
            return;
        }

        let defaults = &self.repository.config().draft;
        draft.content = content.to_string();
        draft.author = defaults.author.clone();
        draft.author_avatar = defaults.author_avatar.clone();
        draft.published = defaults.published.clone();
    }

    /// Cancels every operation still in flight.
    pub fn shutdown(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        debug!(count = tasks.len(), "cancelling feed operations");
        for task in tasks {
            task.abort();
        }
    }
}

impl<R: RemoteClient + 'static> Drop for FeedViewModel<R> {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::{FeedError, RemoteError};
    use crate::remote::{ApiResponse, MockRemote, RemoteCall, RemoteOp};
    use feedsync_core::PostStore;
    use std::time::Duration;

    fn view_model(posts: Vec<Post>) -> FeedViewModel<MockRemote> {
        let store = Arc::new(PostStore::open_in_memory().unwrap());
        store.insert_or_replace_all(posts).unwrap();
        FeedViewModel::new(PostRepository::new(
            EngineConfig::default(),
            store,
            MockRemote::new(),
        ))
    }

    fn remote(vm: &FeedViewModel<MockRemote>) -> &MockRemote {
        vm.repository().remote()
    }

    #[tokio::test]
    async fn load_all_failure_ends_in_error() {
        let vm = view_model(vec![Post::new(1, "a", "kept")]);
        remote(&vm).set_delay(RemoteOp::ListAll, Duration::from_millis(30));
        remote(&vm).set_list_reply(Err(RemoteError::Transport("offline".into())));

        let task = vm.load_all();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(vm.current_state(), FeedState::Loading);

        assert_eq!(task.await.unwrap(), Err(FeedError::Network));
        assert_eq!(vm.current_state(), FeedState::Error);
        assert_eq!(vm.posts().current(), vec![Post::new(1, "a", "kept")]);
    }

    #[tokio::test]
    async fn refresh_success_returns_to_idle() {
        let vm = view_model(vec![]);
        remote(&vm).set_list_reply(Ok(ApiResponse::ok(vec![Post::new(3, "b", "new")])));

        vm.refresh().await.unwrap().unwrap();
        assert_eq!(vm.current_state(), FeedState::Idle);
        assert_eq!(vm.posts().current().len(), 1);
    }

    #[tokio::test]
    async fn edit_then_save() {
        let vm = view_model(vec![]);
        let mut created = vm.post_created();
        remote(&vm).set_create_reply(Ok(ApiResponse::ok(Post::new(42, "Student", "hello"))));

        vm.update_draft_content("  hello \n");
        let draft = vm.draft();
        assert_eq!(draft.content, "hello");
        assert_eq!(draft.author, "Student");
        assert_eq!(draft.author_avatar, "netology.jpg");
        assert_eq!(draft.published, "12345");

        let saved = vm.save().unwrap().await.unwrap().unwrap();
        assert_eq!(saved.id, 42);
        assert!(created.has_changed().unwrap());
        assert_eq!(*created.borrow_and_update(), 1);
        assert_eq!(vm.draft(), Post::draft());
        assert_eq!(
            remote(&vm).calls(),
            vec![RemoteCall::Create(draft)]
        );
    }

    #[tokio::test]
    async fn blank_draft_is_not_sent() {
        let vm = view_model(vec![]);
        vm.update_draft_content("   ");

        assert!(vm.save().is_none());
        assert!(remote(&vm).calls().is_empty());
        assert_eq!(*vm.post_created().borrow(), 0);
    }

    #[tokio::test]
    async fn unchanged_content_leaves_draft_alone() {
        let vm = view_model(vec![]);
        let existing = Post::new(9, "Alice", "same");
        vm.begin_edit(existing.clone());

        vm.update_draft_content(" same ");
        assert_eq!(vm.draft(), existing);

        vm.update_draft_content("changed");
        assert_eq!(vm.draft().id, 9);
        assert_eq!(vm.draft().author, "Student");
    }

    #[tokio::test]
    async fn like_or_dislike_dispatches_on_liked_flag() {
        let liked = Post {
            likes: 1,
            liked_by_me: true,
            ..Post::new(1, "a", "liked")
        };
        let vm = view_model(vec![liked, Post::new(2, "a", "not liked")]);
        remote(&vm).set_like_reply(Ok(ApiResponse::ok(Post::new(2, "a", "not liked").with_like())));
        remote(&vm).set_dislike_reply(Ok(ApiResponse::ok(Post::new(1, "a", "liked"))));

        vm.like_or_dislike(1).unwrap().await.unwrap().unwrap();
        vm.like_or_dislike(2).unwrap().await.unwrap().unwrap();
        assert!(vm.like_or_dislike(77).is_none());

        assert_eq!(
            remote(&vm).calls(),
            vec![RemoteCall::Dislike(1), RemoteCall::Like(2)]
        );
    }

    #[tokio::test]
    async fn like_toggle_on_unknown_post_settles_idle() {
        let vm = view_model(vec![Post::new(1, "a", "x")]);
        vm.state.set(FeedState::Error);

        assert!(vm.like_or_dislike(404).is_none());
        assert_eq!(vm.current_state(), FeedState::Idle);
        assert!(remote(&vm).calls().is_empty());
    }

    #[tokio::test]
    async fn watch_posts_follows_confirmed_like() {
        let vm = view_model(vec![Post::new(6, "a", "x")]);
        let mut posts = vm.watch_posts();
        remote(&vm).set_like_reply(Ok(ApiResponse::ok(Post::new(6, "a", "x").with_like())));

        vm.like_or_dislike(6).unwrap().await.unwrap().unwrap();

        assert!(posts.has_changed());
        let snapshot = posts.changed().await.unwrap();
        assert_eq!(snapshot, vec![Post::new(6, "a", "x").with_like()]);
    }

    #[tokio::test]
    async fn remove_failure_sets_error_state() {
        let vm = view_model(vec![Post::new(4, "a", "x")]);
        remote(&vm).set_delete_reply(Err(RemoteError::Transport("offline".into())));

        assert_eq!(vm.remove(4).await.unwrap(), Err(FeedError::Network));
        assert_eq!(vm.current_state(), FeedState::Error);
        assert_eq!(vm.posts().current().len(), 1);
    }

    #[tokio::test]
    async fn shutdown_cancels_in_flight_work() {
        let vm = view_model(vec![Post::new(5, "a", "x")]);
        remote(&vm).set_delay(RemoteOp::Like, Duration::from_secs(5));
        remote(&vm).set_like_reply(Err(RemoteError::Transport("offline".into())));

        let task = vm.like_or_dislike(5).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        vm.shutdown();

        assert!(task.await.unwrap_err().is_cancelled());
        // The optimistic write stays; the rollback never ran.
        assert_eq!(vm.posts().current()[0].likes, 1);
    }
}
