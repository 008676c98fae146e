use super::{BitVector, DiskBitVector, MemoryBitVector};
use crate::storage::buffer::pool::BufferPool;
use crate::storage::page::bytes_for_bits;
use crate::storage::{ByteStore, FileStore, StorageError, StorageResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Vectors needing at least this many bytes go to disk.
pub const DEFAULT_DISK_THRESHOLD: u64 = 256 * 1024 * 1024;

/// Size of a cached page when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 16 * 1024;

/// Tunables shared by all vectors built from the same configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Byte size from which a vector is kept on disk rather than in memory.
    pub disk_threshold_bytes: u64,
    /// Size of a cached page for disk-backed vectors. 0 means the default.
    pub page_size_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            disk_threshold_bytes: DEFAULT_DISK_THRESHOLD,
            page_size_bytes: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Builder for a [`BitVector`].
///
/// ```ignore
/// let vec = BitVectorOptions::new(1 << 20)
///     .page_size(4096)
///     .with_pool(pool)
///     .build()?;
/// ```
pub struct BitVectorOptions {
    bits: u64,
    config: StorageConfig,
    store: Option<Box<dyn ByteStore>>,
    store_read_only: bool,
    pool: Option<Arc<dyn BufferPool>>,
    read_only: bool,
}

impl BitVectorOptions {
    pub fn new(bits: u64) -> Self {
        Self {
            bits,
            config: StorageConfig::default(),
            store: None,
            store_read_only: false,
            pool: None,
            read_only: false,
        }
    }

    pub fn config(mut self, config: StorageConfig) -> Self {
        self.config = config;
        self
    }

    pub fn disk_threshold(mut self, bytes: u64) -> Self {
        self.config.disk_threshold_bytes = bytes;
        self
    }

    pub fn page_size(mut self, bytes: usize) -> Self {
        self.config.page_size_bytes = bytes;
        self
    }

    /// Stores the bits in `store`, which forces the disk backend.
    pub fn with_store(mut self, store: Box<dyn ByteStore>) -> Self {
        self.store = Some(store);
        self.store_read_only = false;
        self
    }

    /// Like [`with_store`](Self::with_store), but the vector is read-only
    /// and the store is never written or resized.
    pub fn with_read_only_store(mut self, store: Box<dyn ByteStore>) -> Self {
        self.store = Some(store);
        self.store_read_only = true;
        self
    }

    pub fn with_pool(mut self, pool: Arc<dyn BufferPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    fn effective_page_size(&self) -> StorageResult<usize> {
        match self.config.page_size_bytes {
            0 => Ok(DEFAULT_PAGE_SIZE),
            size if size % 8 != 0 => Err(StorageError::InvalidOptions(format!(
                "page size must be a multiple of 8, got {}",
                size
            ))),
            size => Ok(size),
        }
    }

    pub fn build(self) -> StorageResult<Box<dyn BitVector>> {
        let page_size = self.effective_page_size()?;
        let needed = bytes_for_bits(self.bits);
        let read_only = self.read_only || self.store_read_only;

        let store = match self.store {
            Some(mut store) => {
                if !self.store_read_only && store.len()? < needed {
                    store.truncate(needed)?;
                }
                store
            }
            None if needed < self.config.disk_threshold_bytes => {
                debug!("Creating in-memory bit vector: {} bits", self.bits);
                return Ok(Box::new(MemoryBitVector::new(self.bits, read_only)));
            }
            None => {
                let mut store = FileStore::temporary()?;
                store.truncate(needed)?;
                debug!(
                    "Created temporary store for {} bits at {:?}",
                    self.bits,
                    store.temp_path()
                );
                Box::new(store)
            }
        };

        debug!(
            "Creating disk bit vector: {} bits, page size {}, pool: {}",
            self.bits,
            page_size,
            self.pool.is_some()
        );
        Ok(Box::new(DiskBitVector::new(
            store, self.bits, page_size, self.pool, read_only,
        )))
    }
}

impl fmt::Debug for BitVectorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitVectorOptions")
            .field("bits", &self.bits)
            .field("disk_threshold_bytes", &self.config.disk_threshold_bytes)
            .field("page_size_bytes", &self.config.page_size_bytes)
            .field("has_store", &self.store.is_some())
            .field("has_pool", &self.pool.is_some())
            .field("read_only", &(self.read_only || self.store_read_only))
            .finish()
    }
}
