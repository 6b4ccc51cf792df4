//! CLI command implementations.

pub mod compact;
pub mod export;
pub mod inspect;

use feedsync_core::{Config, LogRecord, PostStore};
use feedsync_storage::{FileBackend, StorageBackend};
use serde::Serialize;
use std::path::Path;

/// Record counts of a post log, read without replaying it.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct LogSummary {
    /// Size of the log file in bytes.
    pub bytes: u64,
    /// Number of `Put` records.
    pub puts: usize,
    /// Number of `Delete` records.
    pub deletes: usize,
    /// Bytes after the last complete record.
    pub torn_bytes: u64,
}

impl LogSummary {
    /// Total number of records.
    pub fn records(&self) -> usize {
        self.puts + self.deletes
    }
}

/// Scans the post log of the cache at `path` without changing it.
pub fn scan_log(path: &Path) -> Result<LogSummary, Box<dyn std::error::Error>> {
    let log_path = path.join("posts.log");
    if !log_path.exists() {
        return Err(format!("No post cache found at {:?}", path).into());
    }

    let bytes = FileBackend::open(&log_path)?.read_all()?;
    let mut summary = LogSummary {
        bytes: bytes.len() as u64,
        ..LogSummary::default()
    };
    let mut offset = 0;

    while let Some((record, next)) = LogRecord::decode_at(&bytes, offset)? {
        match record {
            LogRecord::Put(_) => summary.puts += 1,
            LogRecord::Delete(_) => summary.deletes += 1,
        }
        offset = next;
    }
    summary.torn_bytes = (bytes.len() - offset) as u64;

    Ok(summary)
}

/// Opens the existing cache at `path` for writing. Fails if another process
/// holds it.
pub fn open_store(path: &Path) -> Result<PostStore, Box<dyn std::error::Error>> {
    Ok(PostStore::open_dir(path, Config::new().create_if_missing(false))?)
}

/// Opens the existing cache at `path` without touching the files on disk.
pub fn open_store_read_only(path: &Path) -> Result<PostStore, Box<dyn std::error::Error>> {
    Ok(PostStore::open_read_only(path)?)
}

#[cfg(test)]
pub(crate) mod test_support {
    use feedsync_core::{Config, Post, PostStore};
    use std::path::Path;

    /// Creates a cache with three posts, one of them replaced and one deleted.
    pub fn seed(path: &Path) {
        let store = PostStore::open_dir(path, Config::default()).unwrap();
        for id in 1..=3 {
            store
                .insert_or_replace(Post::new(id, "Alice", format!("post {id}")))
                .unwrap();
        }
        store.insert_or_replace(Post::new(2, "Alice", "edited")).unwrap();
        store.delete_by_id(3).unwrap();
        store.flush().unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn scan_counts_records_and_torn_tail() {
        let dir = TempDir::new().unwrap();
        test_support::seed(dir.path());

        let mut log = std::fs::OpenOptions::new()
            .append(true)
            .open(dir.path().join("posts.log"))
            .unwrap();
        log.write_all(b"FPST").unwrap();
        drop(log);

        let summary = scan_log(dir.path()).unwrap();
        assert_eq!(
            summary,
            LogSummary {
                bytes: std::fs::metadata(dir.path().join("posts.log")).unwrap().len(),
                puts: 4,
                deletes: 1,
                torn_bytes: 4,
            }
        );
        assert_eq!(summary.records(), 5);
    }

    #[test]
    fn missing_cache_is_reported() {
        let dir = TempDir::new().unwrap();
        assert!(scan_log(&dir.path().join("nope")).is_err());
    }
}
