//! Property-based test generators using proptest.

use feedsync_core::{Post, PostId};
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy for server-assigned post ids.
pub fn post_id_strategy() -> impl Strategy<Value = PostId> {
    1..=64i64
}

/// Strategy for post content, blank strings included.
pub fn content_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => prop::string::string_regex("[ \t\n]{0,4}").expect("Invalid regex"),
        4 => prop::string::string_regex("[a-zA-Z0-9 ,.!?]{1,80}").expect("Invalid regex"),
    ]
}

/// Strategy for a confirmed post.
pub fn post_strategy() -> impl Strategy<Value = Post> {
    (
        post_id_strategy(),
        prop::string::string_regex("[A-Z][a-z]{2,10}").expect("Invalid regex"),
        prop::string::string_regex("[a-z]{1,8}\\.jpg").expect("Invalid regex"),
        prop::string::string_regex("[a-zA-Z0-9][a-zA-Z0-9 ]{0,79}").expect("Invalid regex"),
        any::<u32>().prop_map(|n| n % 10_000),
        any::<bool>(),
    )
        .prop_map(|(id, author, author_avatar, content, likes, liked_by_me)| Post {
            id,
            author,
            author_avatar,
            content,
            published: (1_700_000_000 + id).to_string(),
            liked_by_me,
            likes,
        })
}

/// Strategy for a feed with unique ids, newest first.
pub fn feed_strategy(max_len: usize) -> impl Strategy<Value = Vec<Post>> {
    prop::collection::vec(post_strategy(), 0..=max_len).prop_map(|posts| {
        let unique: BTreeMap<PostId, Post> = posts.into_iter().map(|p| (p.id, p)).collect();
        unique.into_values().rev().collect()
    })
}

/// A user-level mutation on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOp {
    /// Like the post.
    Like(PostId),
    /// Take the like back.
    Dislike(PostId),
    /// Delete the post.
    Remove(PostId),
}

impl FeedOp {
    /// Returns the target post id.
    pub fn id(&self) -> PostId {
        match self {
            FeedOp::Like(id) | FeedOp::Dislike(id) | FeedOp::Remove(id) => *id,
        }
    }
}

/// Strategy for a single mutation.
pub fn feed_op_strategy() -> impl Strategy<Value = FeedOp> {
    prop_oneof![
        3 => post_id_strategy().prop_map(FeedOp::Like),
        2 => post_id_strategy().prop_map(FeedOp::Dislike),
        1 => post_id_strategy().prop_map(FeedOp::Remove),
    ]
}

/// Strategy for a sequence of mutations.
pub fn feed_ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<FeedOp>> {
    prop::collection::vec(feed_op_strategy(), 1..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn feeds_are_unique_and_ordered(feed in feed_strategy(20)) {
            let ids: Vec<_> = feed.iter().map(|p| p.id).collect();
            let mut sorted = ids.clone();
            sorted.sort_unstable_by(|a, b| b.cmp(a));
            sorted.dedup();
            prop_assert_eq!(ids, sorted);
        }

        #[test]
        fn generated_posts_have_content(post in post_strategy()) {
            prop_assert!(post.has_content());
            prop_assert!(!post.is_local());
        }
    }
}
