pub mod pool;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{byte_and_mask, CachePage, PageHandle};
use crate::storage::store::ByteStore;
use log::{trace, warn};
use pool::BufferPool;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

/// Reference-counted cache of page-aligned windows over a byte store.
///
/// At most one page exists per offset; acquiring a cached offset again only
/// bumps its reference count. A page leaves the cache as soon as its last
/// reference is disposed, and must be clean by then.
pub struct PageCache {
    store: Box<dyn ByteStore>,
    pool: Option<Arc<dyn BufferPool>>,
    pages: HashMap<u64, CachePage>,
    page_size: usize,
}

impl PageCache {
    pub fn new(store: Box<dyn ByteStore>, page_size: usize, pool: Option<Arc<dyn BufferPool>>) -> Self {
        assert!(page_size > 0, "page size must be positive");
        Self {
            store,
            pool,
            pages: HashMap::new(),
            page_size,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages currently cached.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page(&self, offset: u64) -> Option<&CachePage> {
        self.pages.get(&offset)
    }

    pub fn store_mut(&mut self) -> &mut dyn ByteStore {
        self.store.as_mut()
    }

    /// Gives up the cache and returns the store.
    ///
    /// # Panics
    /// If any page is still cached.
    pub fn into_store(self) -> Box<dyn ByteStore> {
        assert!(
            self.pages.is_empty(),
            "page cache released with {} outstanding pages",
            self.pages.len()
        );
        self.store
    }

    /// Takes a reference on the page starting at `offset`, reading it from the
    /// store if it is not cached yet.
    ///
    /// Short reads at the end of the store produce a page with a shorter
    /// window; any other read failure is returned.
    pub fn acquire(&mut self, offset: u64) -> StorageResult<PageHandle> {
        assert!(
            offset % self.page_size as u64 == 0,
            "page offset {} is not aligned to page size {}",
            offset,
            self.page_size
        );

        if let Some(page) = self.pages.get_mut(&offset) {
            page.ref_count += 1;
            trace!("page {} reused (refs: {})", offset, page.ref_count);
            return Ok(PageHandle::new(offset));
        }

        let mut buf = self.take_buffer();
        let n = match self.store.read_at(&mut buf, offset) {
            Ok(n) => n,
            Err(e) => {
                self.recycle(buf);
                return Err(e.into());
            }
        };
        buf.truncate(n);

        trace!("page {} loaded ({} bytes)", offset, n);
        self.pages.insert(offset, CachePage::new(buf, offset));
        Ok(PageHandle::new(offset))
    }

    /// Releases one reference. The last release evicts the page and returns
    /// its buffer to the pool.
    ///
    /// # Panics
    /// If the last reference is released while the page is dirty.
    pub fn dispose(&mut self, handle: PageHandle) {
        let page = self.cached_mut(&handle);
        if page.ref_count == 1 && page.dirty {
            panic!("cannot dispose of a dirty page (offset {})", page.offset);
        }
        page.ref_count -= 1;
        if page.ref_count == 0 {
            self.evict(handle.offset());
        }
    }

    /// Like `dispose`, but drops unflushed writes instead of panicking.
    ///
    /// Used after a flush of the page has already failed and been reported.
    pub fn abandon(&mut self, handle: PageHandle) {
        let page = self.cached_mut(&handle);
        page.ref_count -= 1;
        if page.ref_count == 0 {
            if page.dirty {
                warn!("discarding unflushed page at offset {}", page.offset);
            }
            self.evict(handle.offset());
        }
    }

    /// Writes the page back to the store if it is dirty.
    pub fn flush_page(&mut self, handle: &PageHandle) -> StorageResult<()> {
        let page = self
            .pages
            .get_mut(&handle.offset())
            .unwrap_or_else(|| panic!("page at offset {} is not cached", handle.offset()));
        write_back(self.store.as_mut(), page)
    }

    /// Writes back every dirty page, then flushes the store.
    ///
    /// All pages are attempted; the first error encountered is returned.
    pub fn flush_all(&mut self) -> StorageResult<()> {
        let mut first_error = None;
        for page in self.pages.values_mut() {
            if let Err(e) = write_back(self.store.as_mut(), page) {
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = self.store.flush() {
            first_error.get_or_insert(e.into());
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Syncs the store to stable storage.
    pub fn sync_store(&mut self) -> StorageResult<()> {
        self.store.sync().map_err(|e| match e.kind() {
            io::ErrorKind::Unsupported => StorageError::NotImplemented { op: "sync" },
            _ => StorageError::Io(e),
        })
    }

    /// Reads bit `index` from a held page.
    pub fn bit(&self, handle: &PageHandle, index: u64) -> StorageResult<bool> {
        let (byte, mask) = byte_and_mask(index);
        let page = self.cached(handle);
        let rel = page.relative(byte).ok_or_else(|| past_end(index))?;
        Ok(page.data[rel] & mask != 0)
    }

    /// Sets bit `index` in a held page and marks it dirty. Nothing reaches the
    /// store until the page is flushed.
    pub fn set_bit(&mut self, handle: &PageHandle, index: u64, bit: bool) -> StorageResult<()> {
        let (byte, mask) = byte_and_mask(index);
        let page = self.cached_mut(handle);
        let rel = page.relative(byte).ok_or_else(|| past_end(index))?;
        if bit {
            page.data[rel] |= mask;
        } else {
            page.data[rel] &= !mask;
        }
        page.dirty = true;
        Ok(())
    }

    /// Reads a single byte without acquiring a page.
    ///
    /// A cached page covering the byte holds the freshest copy and is read
    /// instead of the store.
    pub fn read_byte(&mut self, byte: u64) -> StorageResult<u8> {
        if let Some(value) = self
            .pages
            .values()
            .find_map(|page| page.relative(byte).map(|rel| page.data[rel]))
        {
            return Ok(value);
        }

        let mut tmp = [0u8; 1];
        if self.store.read_at(&mut tmp, byte)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("byte {} lies past the end of the store", byte),
            )
            .into());
        }
        Ok(tmp[0])
    }

    /// Writes a single byte through to the store, then patches every cached
    /// page whose window covers it so cache and store agree.
    ///
    /// Offsets are unique, so at most one page can match; all are checked.
    pub fn write_byte(&mut self, byte: u64, value: u8) -> StorageResult<()> {
        self.store.write_at(&[value], byte)?;
        for page in self.pages.values_mut() {
            if let Some(rel) = page.relative(byte) {
                page.data[rel] = value;
            }
        }
        Ok(())
    }

    fn cached(&self, handle: &PageHandle) -> &CachePage {
        self.pages
            .get(&handle.offset())
            .unwrap_or_else(|| panic!("page at offset {} is not cached", handle.offset()))
    }

    fn cached_mut(&mut self, handle: &PageHandle) -> &mut CachePage {
        self.pages
            .get_mut(&handle.offset())
            .unwrap_or_else(|| panic!("page at offset {} is not cached", handle.offset()))
    }

    fn evict(&mut self, offset: u64) {
        if let Some(page) = self.pages.remove(&offset) {
            trace!("page {} evicted", offset);
            self.recycle(page.data);
        }
    }

    fn take_buffer(&self) -> Vec<u8> {
        let mut buf = match self.pool.as_ref().and_then(|pool| pool.get()) {
            Some(buf) if buf.capacity() >= self.page_size => buf,
            _ => Vec::with_capacity(self.page_size),
        };
        buf.clear();
        buf.resize(self.page_size, 0);
        buf
    }

    fn recycle(&self, buf: Vec<u8>) {
        if let Some(pool) = &self.pool {
            pool.put(buf);
        }
    }
}

fn write_back(store: &mut dyn ByteStore, page: &mut CachePage) -> StorageResult<()> {
    if page.dirty {
        store.write_at(&page.data, page.offset)?;
        page.dirty = false;
        trace!("page {} flushed", page.offset);
    }
    Ok(())
}

fn past_end(index: u64) -> StorageError {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("bit {} lies past the end of the store", index),
    )
    .into()
}
