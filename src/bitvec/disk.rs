use super::copy::copy_bits;
use super::cursor::{Cursor, Direction};
use super::{check_end, Backend, BitIter, BitVector};
use crate::storage::buffer::pool::BufferPool;
use crate::storage::page::{byte_and_mask, bytes_for_bits, page_offset, PageHandle};
use crate::storage::{ByteStore, PageCache, StorageError, StorageResult};
use log::{debug, warn};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::sync::Arc;

/// A bit vector stored in a byte store and accessed through a page cache.
///
/// Iterators borrow the vector and each hold at most one cached page.
/// Single-bit access bypasses page acquisition: reads come from a cached
/// page if one covers the byte, otherwise straight from the store, and
/// writes go to the store and to any cached copy.
pub struct DiskBitVector {
    cache: RefCell<PageCache>,
    bits: u64,
    page_size: usize,
    read_only: Cell<bool>,
}

impl DiskBitVector {
    pub fn new(
        store: Box<dyn ByteStore>,
        bits: u64,
        page_size: usize,
        pool: Option<Arc<dyn BufferPool>>,
        read_only: bool,
    ) -> Self {
        Self {
            cache: RefCell::new(PageCache::new(store, page_size, pool)),
            bits,
            page_size,
            read_only: Cell::new(read_only),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages currently held by live iterators.
    pub fn cached_pages(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Reference count of the cached page starting at `offset`.
    pub fn page_ref_count(&self, offset: u64) -> Option<u32> {
        self.cache.borrow().page(offset).map(|page| page.ref_count())
    }

    fn assert_writable(&self) {
        assert!(!self.read_only.get(), "bit vector is read-only");
    }

    fn check_index(&self, index: u64) -> StorageResult<()> {
        if index >= self.bits {
            return Err(StorageError::OutOfRange {
                index,
                len: self.bits,
            });
        }
        Ok(())
    }

    fn iter(&self, i: u64, j: u64, direction: Direction) -> DiskBitIter<'_> {
        let cursor = Cursor::new(i, j, direction);
        check_end(j, self.bits);
        DiskBitIter {
            vec: self,
            cursor,
            page: None,
            val: false,
            err: None,
            closed: false,
        }
    }
}

impl BitVector for DiskBitVector {
    fn backend(&self) -> Backend {
        Backend::Disk
    }

    fn is_frozen(&self) -> bool {
        self.read_only.get()
    }

    fn len(&self) -> u64 {
        self.bits
    }

    fn bit_at(&self, index: u64) -> StorageResult<bool> {
        self.check_index(index)?;
        let (byte, mask) = byte_and_mask(index);
        let value = self.cache.borrow_mut().read_byte(byte)?;
        Ok(value & mask != 0)
    }

    fn set_bit_at(&self, index: u64, bit: bool) -> StorageResult<()> {
        self.assert_writable();
        self.check_index(index)?;

        let (byte, mask) = byte_and_mask(index);
        let mut cache = self.cache.borrow_mut();
        let old = cache.read_byte(byte)?;
        let new = if bit { old | mask } else { old & !mask };
        cache.write_byte(byte, new)
    }

    fn iterate(&self, i: u64, j: u64) -> Box<dyn BitIter + '_> {
        Box::new(self.iter(i, j, Direction::Forward))
    }

    fn reverse_iterate(&self, i: u64, j: u64) -> Box<dyn BitIter + '_> {
        Box::new(self.iter(i, j, Direction::Reverse))
    }

    fn copy_from(&self, src: &dyn BitVector) -> StorageResult<()> {
        self.assert_writable();
        assert_eq!(src.len(), self.bits, "bit vectors are not equal in size");
        copy_bits(self, src)
    }

    fn truncate(&mut self, len: u64) -> StorageResult<()> {
        self.assert_writable();
        assert!(len <= self.bits, "cannot grow a bit vector");

        let cache = self.cache.get_mut();
        assert!(
            cache.is_empty(),
            "cannot truncate while {} pages are held by live iterators",
            cache.len()
        );
        cache.store_mut().truncate(bytes_for_bits(len))?;
        debug!("disk bit vector truncated from {} to {} bits", self.bits, len);
        self.bits = len;
        Ok(())
    }

    fn freeze(&self) -> StorageResult<()> {
        self.read_only.set(true);
        self.flush()
    }

    fn flush(&self) -> StorageResult<()> {
        self.cache.borrow_mut().flush_all()
    }

    fn sync(&self) -> StorageResult<()> {
        self.flush()?;
        self.cache.borrow_mut().sync_store()
    }

    fn close(self: Box<Self>) -> StorageResult<()> {
        let DiskBitVector { cache, bits, .. } = *self;
        let cache = cache.into_inner();
        assert!(
            cache.is_empty(),
            "bit vector closed with {} outstanding pages",
            cache.len()
        );

        debug!("closing disk bit vector of {} bits", bits);
        let mut store = cache.into_store();
        let flushed = store.flush();
        let closed = store.close();
        flushed?;
        closed?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Iterator over a [`DiskBitVector`].
///
/// Holds at most one page. Moving onto a different page writes the held
/// page back and releases it first. Reaching the end of the range releases
/// the page too; a write-back error at that point is reported by `err()`
/// and `close()`.
pub struct DiskBitIter<'a> {
    vec: &'a DiskBitVector,
    cursor: Cursor,
    page: Option<PageHandle>,
    val: bool,
    err: Option<StorageError>,
    closed: bool,
}

impl DiskBitIter<'_> {
    /// Makes sure the page holding `index` is held and reads the bit.
    fn load(&mut self, index: u64) -> StorageResult<bool> {
        let (byte, _) = byte_and_mask(index);
        let offset = page_offset(byte, self.vec.page_size);
        let mut cache = self.vec.cache.borrow_mut();

        let handle = match self.page.take() {
            Some(handle) if handle.offset() == offset => handle,
            Some(handle) => {
                if let Err(e) = cache.flush_page(&handle) {
                    self.page = Some(handle);
                    return Err(e);
                }
                cache.dispose(handle);
                cache.acquire(offset)?
            }
            None => cache.acquire(offset)?,
        };

        let bit = cache.bit(&handle, index);
        self.page = Some(handle);
        bit
    }

    /// Writes back and releases the held page. On a failed write-back the
    /// page stays held so a later flush or close can retry.
    fn release_page(&mut self) -> StorageResult<()> {
        if let Some(handle) = self.page.take() {
            let mut cache = self.vec.cache.borrow_mut();
            if let Err(e) = cache.flush_page(&handle) {
                self.page = Some(handle);
                return Err(e);
            }
            cache.dispose(handle);
        }
        Ok(())
    }

    fn fail(&mut self, err: StorageError) {
        self.err = Some(err);
        self.val = false;
        self.cursor.exhaust();
    }
}

impl BitIter for DiskBitIter<'_> {
    fn next(&mut self) -> bool {
        self.skip(1)
    }

    fn skip(&mut self, n: u64) -> bool {
        if self.err.is_some() {
            return false;
        }

        let Some(index) = self.cursor.advance(n) else {
            self.val = false;
            if let Err(e) = self.release_page() {
                self.fail(e);
            }
            return false;
        };

        match self.load(index) {
            Ok(bit) => {
                self.val = bit;
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    fn index(&self) -> u64 {
        self.cursor.index()
    }

    fn bit(&self) -> bool {
        self.cursor.check_active("bit");
        self.val
    }

    fn set_bit(&mut self, bit: bool) {
        self.vec.assert_writable();
        self.cursor.check_active("set_bit");
        if self.err.is_some() {
            return;
        }

        let index = self.cursor.index();
        let vec = self.vec;
        let result = match &self.page {
            Some(handle) => vec.cache.borrow_mut().set_bit(handle, index, bit),
            None => panic!("active iterator at index {} holds no page", index),
        };
        match result {
            Ok(()) => self.val = bit,
            Err(e) => self.fail(e),
        }
    }

    fn err(&self) -> Option<&StorageError> {
        self.err.as_ref()
    }

    fn flush(&mut self) -> StorageResult<()> {
        match &self.page {
            Some(handle) => self.vec.cache.borrow_mut().flush_page(handle),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> StorageResult<()> {
        if self.closed {
            return Err(StorageError::ClosedIterator);
        }
        self.closed = true;
        self.cursor.exhaust();
        self.val = false;

        let mut result = match self.err.replace(StorageError::ClosedIterator) {
            Some(e) => Err(e),
            None => Ok(()),
        };
        if let Some(handle) = self.page.take() {
            let mut cache = self.vec.cache.borrow_mut();
            match cache.flush_page(&handle) {
                Ok(()) => cache.dispose(handle),
                Err(e) => {
                    if result.is_ok() {
                        result = Err(e);
                    }
                    cache.abandon(handle);
                }
            }
        }
        result
    }
}

impl Drop for DiskBitIter<'_> {
    fn drop(&mut self) {
        if self.closed || std::thread::panicking() {
            return;
        }
        if let Err(e) = self.close() {
            warn!("bit iterator dropped without close(): {}", e);
        }
    }
}
