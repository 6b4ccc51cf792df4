//! Feed state projection.

use crate::error::FeedResult;
use std::future::Future;
use tokio::sync::watch;

/// Presentation status of the feed. Carries no post data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedState {
    /// Nothing in progress, last operation succeeded.
    #[default]
    Idle,
    /// Initial load in progress.
    Loading,
    /// Refresh in progress.
    Refreshing,
    /// The last operation failed.
    Error,
}

impl FeedState {
    /// Returns true while a fetch is running.
    pub fn is_busy(&self) -> bool {
        matches!(self, FeedState::Loading | FeedState::Refreshing)
    }
}

/// Turns operation lifecycles into an observable [`FeedState`].
///
/// Each operation writes its own transitions; the latest write wins.
#[derive(Debug)]
pub struct FeedStateProjection {
    tx: watch::Sender<FeedState>,
}

impl FeedStateProjection {
    /// Creates a projection starting at `Idle`.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(FeedState::Idle);
        Self { tx }
    }

    /// Publishes `state`.
    pub fn set(&self, state: FeedState) {
        self.tx.send_replace(state);
    }

    /// Returns the latest state.
    pub fn current(&self) -> FeedState {
        *self.tx.borrow()
    }

    /// Returns a receiver that sees every later state.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.tx.subscribe()
    }

    /// Runs `operation`, publishing `start` first (if any), then `Idle` on
    /// success or `Error` on failure. The result is passed through.
    pub async fn track<T, F>(&self, start: Option<FeedState>, operation: F) -> FeedResult<T>
    where
        F: Future<Output = FeedResult<T>>,
    {
        if let Some(state) = start {
            self.set(state);
        }
        let result = operation.await;
        self.set(if result.is_ok() {
            FeedState::Idle
        } else {
            FeedState::Error
        });
        result
    }
}

impl Default for FeedStateProjection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;

    #[tokio::test]
    async fn track_success_and_failure() {
        let projection = FeedStateProjection::new();
        let mut rx = projection.subscribe();

        let ok = projection
            .track(Some(FeedState::Loading), async { Ok::<_, FeedError>(1) })
            .await;
        assert_eq!(ok, Ok(1));
        assert_eq!(projection.current(), FeedState::Idle);

        let err = projection
            .track(Some(FeedState::Refreshing), async {
                Err::<(), _>(FeedError::Network)
            })
            .await;
        assert_eq!(err, Err(FeedError::Network));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), FeedState::Error);
    }

    #[tokio::test]
    async fn start_state_visible_while_running() {
        let projection = FeedStateProjection::new();
        let rx = projection.subscribe();

        projection
            .track(Some(FeedState::Loading), async {
                assert_eq!(*rx.borrow(), FeedState::Loading);
                Ok::<_, FeedError>(())
            })
            .await
            .unwrap();
    }

    #[test]
    fn busy_states() {
        assert!(FeedState::Loading.is_busy());
        assert!(FeedState::Refreshing.is_busy());
        assert!(!FeedState::Error.is_busy());
        assert_eq!(FeedState::default(), FeedState::Idle);
    }
}
