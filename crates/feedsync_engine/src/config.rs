//! Configuration for the reconciliation engine.

use std::time::Duration;

/// Order in which a like/unlike response is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadCheck {
    /// Check the body first: a missing body fails before the status is
    /// looked at, and a present body is written to the store even when the
    /// status turns out to be a failure.
    #[default]
    BodyFirst,
    /// Check the status first, then the body. Nothing is written for a
    /// failed status.
    StatusFirst,
}

/// Identity stamped onto a draft when its content is edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftDefaults {
    /// Author name of locally written posts.
    pub author: String,
    /// Author avatar of locally written posts.
    pub author_avatar: String,
    /// Placeholder timestamp until the server assigns one.
    pub published: String,
}

impl Default for DraftDefaults {
    fn default() -> Self {
        Self {
            author: "Student".into(),
            author_avatar: "netology.jpg".into(),
            published: "12345".into(),
        }
    }
}

/// Configuration for a [`crate::PostRepository`] and its view model.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the remote feed service.
    pub base_url: String,
    /// Upper bound for a single remote call. Elapsing counts as a network error.
    pub request_timeout: Duration,
    /// Like/unlike response validation order.
    pub payload_check: PayloadCheck,
    /// Serialize mutations on the same post id.
    pub serialize_mutations: bool,
    /// Draft identity.
    pub draft: DraftDefaults,
}

impl EngineConfig {
    /// Creates a configuration for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(30),
            payload_check: PayloadCheck::default(),
            serialize_mutations: false,
            draft: DraftDefaults::default(),
        }
    }

    /// Sets the per-call timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the like/unlike validation order.
    pub fn with_payload_check(mut self, check: PayloadCheck) -> Self {
        self.payload_check = check;
        self
    }

    /// Enables or disables per-post mutation serialization.
    pub fn serialize_mutations(mut self, enabled: bool) -> Self {
        self.serialize_mutations = enabled;
        self
    }

    /// Sets the draft identity.
    pub fn with_draft_defaults(mut self, draft: DraftDefaults) -> Self {
        self.draft = draft;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new("http://localhost:9999")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.payload_check, PayloadCheck::BodyFirst);
        assert!(!config.serialize_mutations);
        assert_eq!(config.draft.author, "Student");
    }

    #[test]
    fn builder() {
        let config = EngineConfig::new("https://feed.example.com")
            .with_request_timeout(Duration::from_secs(5))
            .with_payload_check(PayloadCheck::StatusFirst)
            .serialize_mutations(true);

        assert_eq!(config.base_url, "https://feed.example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.payload_check, PayloadCheck::StatusFirst);
        assert!(config.serialize_mutations);
    }
}
