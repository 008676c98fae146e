//! Bit vectors that may be larger than memory.
//!
//! Small vectors live in an owned buffer; large ones, or ones given an
//! explicit [`ByteStore`], are paged in from the store on demand.
//!
//! ```ignore
//! use bigbitvec::{BitVector, BitVectorOptions};
//!
//! let vec = BitVectorOptions::new(1 << 30).build()?;
//! vec.set_bit_at(42, true)?;
//!
//! let mut iter = vec.iterate(0, vec.len());
//! while iter.next() {
//!     // ...
//! }
//! iter.close()?;
//! vec.close()?;
//! ```

pub mod bitvec;
pub mod storage;

pub use bitvec::copy::copy_bits;
pub use bitvec::options::{DEFAULT_DISK_THRESHOLD, DEFAULT_PAGE_SIZE};
pub use bitvec::{
    for_each, new, reverse_for_each, Backend, BitIter, BitVector, BitVectorOptions,
    DiskBitVector, MemoryBitVector, StorageConfig,
};
pub use storage::{
    BufferPool, ByteStore, FileStore, MemoryStore, ReadOnlyStore, StorageError, StorageResult,
    VecBufferPool,
};
