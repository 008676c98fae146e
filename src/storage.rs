//! Storage layer for disk-backed bit vectors.
//!
//! Key components:
//!
//! - **ByteStore**: an addressable, truncatable byte range (file, memory buffer
//!   or read-only reader) with positioned reads and writes
//! - **BufferPool**: optional recycler of page-sized buffers, shareable across vectors
//! - **PageCache**: reference-counted cache of page-aligned windows over a store,
//!   with dirty tracking and write-back
//!
//! Nothing here synchronizes access to a single cache; callers serialize.

pub mod buffer;
pub mod error;
pub mod page;
pub mod store;

pub use buffer::pool::{BufferPool, VecBufferPool};
pub use buffer::PageCache;
pub use error::{StorageError, StorageResult};
pub use page::{CachePage, PageHandle};
pub use store::{ByteStore, FileStore, MemoryStore, ReadOnlyStore};
