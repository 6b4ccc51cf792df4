//! Storage backend trait definition.

use crate::error::StorageResult;

/// A byte store that holds the post cache log.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_at` returns exactly the bytes previously written at that offset
/// - after `sync` returns, everything appended so far survives a crash
/// - `truncate` only ever shrinks the store
/// - `replace` swaps the whole contents atomically: after an error the old
///   bytes are still in place
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::ReadPastEnd`] if the range is not fully
    /// inside the store, or an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the store and returns its offset.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs. A failed append must not
    /// change the store size.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes to the OS.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size in bytes (the offset of the next append).
    fn size(&self) -> StorageResult<u64>;

    /// Makes all appended data and file metadata durable.
    fn sync(&mut self) -> StorageResult<()>;

    /// Shrinks the store to `new_size` bytes.
    ///
    /// Used to cut a torn tail after a crash.
    ///
    /// # Errors
    ///
    /// Returns an error if `new_size` is larger than the current size.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Replaces the whole store with `data` and makes the result durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the new contents cannot be written. The previous
    /// contents are left untouched in that case.
    fn replace(&mut self, data: &[u8]) -> StorageResult<()>;

    /// Reads the whole store.
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        let size = self.size()?;
        self.read_at(0, size as usize)
    }
}
