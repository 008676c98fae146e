//! Bit vectors addressed by absolute index.
//!
//! Two backends implement the same [`BitVector`] contract:
//!
//! - **MemoryBitVector**: an owned byte buffer, used below the disk threshold
//! - **DiskBitVector**: a byte store read and written through a page cache
//!
//! Sequential access goes through a [`BitIter`], which on disk holds at most
//! one cached page at a time.

pub mod copy;
mod cursor;
pub mod disk;
pub mod foreach;
pub mod memory;
pub mod options;

use crate::storage::{StorageError, StorageResult};
use std::any::Any;

pub use disk::{DiskBitIter, DiskBitVector};
pub use foreach::{for_each, reverse_for_each};
pub use memory::{MemoryBitIter, MemoryBitVector};
pub use options::{BitVectorOptions, StorageConfig};

/// Which representation backs a vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Disk,
}

/// A cursor for fast sequential access to a [`BitVector`].
///
/// Iterators start before their first element:
///
/// ```ignore
/// let mut iter = vec.iterate(i, j);
/// while iter.next() {
///     // index(), bit() and set_bit() are valid here
/// }
/// iter.close()?;
/// ```
///
/// `close()` must be checked even after `next()` returned false, since
/// trailing write-back errors only surface there.
pub trait BitIter {
    /// Advances to the next bit. Returns false at the end of the range or
    /// after an error.
    fn next(&mut self) -> bool;

    /// Equivalent to calling `next()` n times, but faster.
    fn skip(&mut self, n: u64) -> bool;

    /// Index of the current bit.
    ///
    /// # Panics
    /// Before the first `next()` or after iteration has ended.
    fn index(&self) -> u64;

    /// Value of the current bit.
    ///
    /// # Panics
    /// Before the first `next()` or after iteration has ended.
    fn bit(&self) -> bool;

    /// Replaces the current bit.
    ///
    /// # Panics
    /// On a frozen vector, before the first `next()` or after iteration has ended.
    fn set_bit(&mut self, bit: bool);

    /// The error which made `next()` return false, if any.
    fn err(&self) -> Option<&StorageError>;

    /// Pushes pending writes to the backing store.
    fn flush(&mut self) -> StorageResult<()>;

    /// Flushes and releases the iterator's resources.
    ///
    /// A second call returns [`StorageError::ClosedIterator`].
    fn close(&mut self) -> StorageResult<()>;
}

/// A vector of bits which does not necessarily fit in memory.
///
/// Accesses are not synchronized; a vector and its iterators must be used
/// from one thread at a time.
pub trait BitVector: Send {
    fn backend(&self) -> Backend;

    /// True if the vector is read-only.
    fn is_frozen(&self) -> bool;

    /// Number of bits.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bit at `index`.
    ///
    /// Random access on disk is slow; prefer an iterator for sequential work.
    fn bit_at(&self, index: u64) -> StorageResult<bool>;

    /// Replaces the bit at `index`.
    ///
    /// # Panics
    /// If the vector is frozen.
    fn set_bit_at(&self, index: u64, bit: bool) -> StorageResult<()>;

    /// Iterates from index `i` up to index `j - 1`.
    ///
    /// # Panics
    /// If `i > j` or `j > len()`.
    fn iterate(&self, i: u64, j: u64) -> Box<dyn BitIter + '_>;

    /// Iterates from index `j - 1` down to index `i`.
    ///
    /// # Panics
    /// If `i > j` or `j > len()`.
    fn reverse_iterate(&self, i: u64, j: u64) -> Box<dyn BitIter + '_>;

    /// Replaces this vector's bits with those of `src`.
    ///
    /// # Panics
    /// If this vector is frozen or the lengths differ.
    fn copy_from(&self, src: &dyn BitVector) -> StorageResult<()>;

    /// Shortens the vector to `len` bits.
    ///
    /// # Panics
    /// If the vector is frozen, `len` exceeds the current length, or pages
    /// are still held by iterators.
    fn truncate(&mut self, len: u64) -> StorageResult<()>;

    /// Makes the vector read-only and flushes it.
    fn freeze(&self) -> StorageResult<()>;

    /// Ensures that all pending writes have reached the OS.
    fn flush(&self) -> StorageResult<()>;

    /// Flushes, then forces the data down to stable storage.
    fn sync(&self) -> StorageResult<()>;

    /// Flushes and frees the resources used by the vector.
    fn close(self: Box<Self>) -> StorageResult<()>;

    /// `[0110...]`: one character per bit in index order.
    fn debug_string(&self) -> String {
        foreach::debug_string(self)
    }

    fn as_any(&self) -> &dyn Any;
}

/// Constructs a vector, choosing the backend from the options.
pub fn new(options: BitVectorOptions) -> StorageResult<Box<dyn BitVector>> {
    options.build()
}

pub(crate) fn check_end(j: u64, len: u64) {
    assert!(j <= len, "iteration range end {} exceeds length {}", j, len);
}
