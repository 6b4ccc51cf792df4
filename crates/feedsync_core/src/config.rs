//! Post store configuration.

/// Configuration for opening a [`crate::PostStore`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the cache directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to fsync the log after every write (safer but slower).
    pub sync_on_write: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_write: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the cache directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to fsync after every write.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }
}
