//! The post entity.

use serde::{Deserialize, Serialize};

/// Server-assigned post identifier.
pub type PostId = i64;

/// Id carried by a post authored locally and not yet confirmed by the server.
pub const UNASSIGNED_ID: PostId = 0;

/// A post in the feed.
///
/// The JSON form uses camelCase field names (`authorAvatar`, `likedByMe`),
/// matching the remote feed service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Post id, [`UNASSIGNED_ID`] until the server assigns one.
    pub id: PostId,
    /// Author display name.
    pub author: String,
    /// Author avatar reference.
    pub author_avatar: String,
    /// Text body.
    pub content: String,
    /// Server timestamp, a placeholder before confirmation.
    pub published: String,
    /// Whether the local user likes this post.
    pub liked_by_me: bool,
    /// Like counter.
    #[serde(default)]
    pub likes: u32,
}

impl Post {
    /// Creates a post with no likes and an empty timestamp.
    pub fn new(id: PostId, author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            author: author.into(),
            author_avatar: String::new(),
            content: content.into(),
            published: String::new(),
            liked_by_me: false,
            likes: 0,
        }
    }

    /// The empty draft a new edit session starts from.
    #[must_use]
    pub fn draft() -> Self {
        Self::new(UNASSIGNED_ID, "", "")
    }

    /// Returns true if the server has not assigned an id yet.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.id == UNASSIGNED_ID
    }

    /// Returns true if the content is non-empty after trimming.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// The optimistic state after the local user likes this post.
    #[must_use]
    pub fn with_like(&self) -> Self {
        Self {
            likes: self.likes.saturating_add(1),
            liked_by_me: true,
            ..self.clone()
        }
    }

    /// The optimistic state after the local user takes a like back.
    ///
    /// The counter never goes below zero.
    #[must_use]
    pub fn with_dislike(&self) -> Self {
        Self {
            likes: self.likes.saturating_sub(1),
            liked_by_me: false,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_and_dislike() {
        let post = Post {
            likes: 3,
            ..Post::new(5, "Alice", "hi")
        };

        let liked = post.with_like();
        assert_eq!(liked.likes, 4);
        assert!(liked.liked_by_me);

        let back = liked.with_dislike();
        assert_eq!(back.likes, 3);
        assert!(!back.liked_by_me);
    }

    #[test]
    fn dislike_saturates_at_zero() {
        let post = Post::new(1, "Bob", "x");
        assert_eq!(post.with_dislike().likes, 0);
    }

    #[test]
    fn content_check_trims() {
        assert!(!Post::new(0, "a", "   \n\t").has_content());
        assert!(Post::new(0, "a", "  hi ").has_content());
        assert!(Post::draft().is_local());
    }

    #[test]
    fn json_field_names() {
        let post = Post {
            author_avatar: "a.jpg".into(),
            liked_by_me: true,
            likes: 2,
            ..Post::new(7, "Carol", "text")
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["authorAvatar"], "a.jpg");
        assert_eq!(json["likedByMe"], true);

        let decoded: Post = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, post);
    }

    #[test]
    fn missing_likes_defaults_to_zero() {
        let post: Post = serde_json::from_str(
            r#"{"id":1,"author":"a","authorAvatar":"","content":"c","published":"0","likedByMe":false}"#,
        )
        .unwrap();
        assert_eq!(post.likes, 0);
    }
}
