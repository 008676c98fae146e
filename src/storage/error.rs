//! Storage layer error types.

use thiserror::Error;

/// Recoverable errors reported by bit vectors, iterators and byte stores.
///
/// Contract violations (mutating a frozen vector, reading an unprimed
/// iterator, closing a vector with live pages, ...) are not represented here;
/// they panic.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Index out of range: {index} (len: {len})")]
    OutOfRange { index: u64, len: u64 },

    #[error("iterator is already closed")]
    ClosedIterator,

    #[error("Operation not implemented by the backing store: {op}")]
    NotImplemented { op: &'static str },

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Returns true for the end-of-data condition raised by out-of-range access.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, StorageError::OutOfRange { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
