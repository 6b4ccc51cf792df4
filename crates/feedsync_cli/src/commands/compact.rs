//! Compact command implementation.

use super::{open_store, open_store_read_only, scan_log};
use std::path::Path;
use tracing::debug;

/// Compaction statistics.
#[derive(Debug, PartialEq, Eq)]
pub struct CompactStats {
    /// Records in the log before compaction.
    pub input_records: usize,
    /// Records after compaction, one per cached post.
    pub output_records: usize,
    /// Log size before compaction.
    pub bytes_before: u64,
    /// Bytes reclaimed (0 on a dry run).
    pub bytes_reclaimed: u64,
}

/// Runs the compact command.
pub fn run(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("Compacting post log at {:?}", path);
    if dry_run {
        println!("(dry run - no changes will be made)");
    }
    println!();

    let stats = compact(path, dry_run)?;

    println!("Compaction Analysis:");
    println!("  Input records:  {}", stats.input_records);
    println!("  Output records: {}", stats.output_records);
    println!("  Size before:    {} bytes", stats.bytes_before);

    if dry_run {
        return Ok(());
    }
    if stats.output_records < stats.input_records || stats.bytes_reclaimed > 0 {
        println!("  Space saved:    {} bytes", stats.bytes_reclaimed);
        println!();
        println!("✓ Compaction complete");
    } else {
        println!();
        println!("No compaction needed - log is already minimal");
    }

    Ok(())
}

fn compact(path: &Path, dry_run: bool) -> Result<CompactStats, Box<dyn std::error::Error>> {
    let summary = scan_log(path)?;
    debug!(?summary, "scanned post log");
    let store = if dry_run {
        open_store_read_only(path)?
    } else {
        open_store(path)?
    };

    let mut stats = CompactStats {
        input_records: summary.records(),
        output_records: store.len(),
        bytes_before: summary.bytes,
        bytes_reclaimed: 0,
    };

    if !dry_run && stats.output_records < stats.input_records {
        stats.bytes_reclaimed = store.compact()?;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::seed;
    use tempfile::TempDir;

    #[test]
    fn dry_run_changes_nothing() {
        let dir = TempDir::new().unwrap();
        seed(dir.path());
        let size = std::fs::metadata(dir.path().join("posts.log")).unwrap().len();

        let stats = compact(dir.path(), true).unwrap();
        assert_eq!(stats.input_records, 5);
        assert_eq!(stats.output_records, 2);
        assert_eq!(stats.bytes_reclaimed, 0);
        assert_eq!(
            std::fs::metadata(dir.path().join("posts.log")).unwrap().len(),
            size
        );
    }

    #[test]
    fn dry_run_keeps_torn_tail() {
        let dir = TempDir::new().unwrap();
        seed(dir.path());
        let log_path = dir.path().join("posts.log");
        let mut bytes = std::fs::read(&log_path).unwrap();
        bytes.extend_from_slice(b"FPST");
        std::fs::write(&log_path, &bytes).unwrap();

        let stats = compact(dir.path(), true).unwrap();
        assert_eq!(stats.bytes_before, bytes.len() as u64);
        assert_eq!(std::fs::read(&log_path).unwrap(), bytes);
    }

    #[test]
    fn compaction_shrinks_log_and_keeps_posts() {
        let dir = TempDir::new().unwrap();
        seed(dir.path());

        let stats = compact(dir.path(), false).unwrap();
        assert!(stats.bytes_reclaimed > 0);

        assert_eq!(scan_log(dir.path()).unwrap().records(), 2);
        let store = open_store(dir.path()).unwrap();
        assert_eq!(store.get(2).unwrap().content, "edited");
        assert_eq!(store.get(3), None);
    }
}
