use super::copy::copy_bits;
use super::cursor::{Cursor, Direction};
use super::{check_end, Backend, BitIter, BitVector};
use crate::storage::page::{byte_and_mask, bytes_for_bits};
use crate::storage::{StorageError, StorageResult};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::ptr;

/// A bit vector held entirely in an owned byte buffer.
pub struct MemoryBitVector {
    data: RefCell<Vec<u8>>,
    bits: u64,
    read_only: Cell<bool>,
}

impl MemoryBitVector {
    pub fn new(bits: u64, read_only: bool) -> Self {
        Self {
            data: RefCell::new(vec![0u8; bytes_for_bits(bits) as usize]),
            bits,
            read_only: Cell::new(read_only),
        }
    }

    /// Wraps existing bytes, least significant bit first.
    ///
    /// # Panics
    /// If `data` is too short to hold `bits` bits.
    pub fn from_bytes(mut data: Vec<u8>, bits: u64) -> Self {
        let needed = bytes_for_bits(bits) as usize;
        assert!(
            data.len() >= needed,
            "{} bytes cannot hold {} bits",
            data.len(),
            bits
        );
        data.truncate(needed);
        Self {
            data: RefCell::new(data),
            bits,
            read_only: Cell::new(false),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.borrow().clone()
    }

    fn assert_writable(&self) {
        assert!(!self.read_only.get(), "bit vector is read-only");
    }

    fn get(&self, index: u64) -> bool {
        let (byte, mask) = byte_and_mask(index);
        self.data.borrow()[byte as usize] & mask != 0
    }

    fn put(&self, index: u64, bit: bool) {
        let (byte, mask) = byte_and_mask(index);
        let mut data = self.data.borrow_mut();
        if bit {
            data[byte as usize] |= mask;
        } else {
            data[byte as usize] &= !mask;
        }
    }

    fn iter(&self, i: u64, j: u64, direction: Direction) -> MemoryBitIter<'_> {
        let cursor = Cursor::new(i, j, direction);
        check_end(j, self.bits);
        MemoryBitIter {
            vec: self,
            cursor,
            val: false,
            err: None,
            closed: false,
        }
    }
}

impl BitVector for MemoryBitVector {
    fn backend(&self) -> Backend {
        Backend::Memory
    }

    fn is_frozen(&self) -> bool {
        self.read_only.get()
    }

    fn len(&self) -> u64 {
        self.bits
    }

    fn bit_at(&self, index: u64) -> StorageResult<bool> {
        if index >= self.bits {
            return Err(StorageError::OutOfRange {
                index,
                len: self.bits,
            });
        }
        Ok(self.get(index))
    }

    fn set_bit_at(&self, index: u64, bit: bool) -> StorageResult<()> {
        self.assert_writable();
        if index >= self.bits {
            return Err(StorageError::OutOfRange {
                index,
                len: self.bits,
            });
        }
        self.put(index, bit);
        Ok(())
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

        if let Some(other) = src.as_any().downcast_ref::<MemoryBitVector>() {
            if !ptr::eq(self, other) {
                self.data
                    .borrow_mut()
                    .copy_from_slice(&other.data.borrow());
            }
            return Ok(());
        }
        copy_bits(self, src)
    }

    fn truncate(&mut self, len: u64) -> StorageResult<()> {
        self.assert_writable();
        assert!(len <= self.bits, "cannot grow a bit vector");
        self.data.get_mut().truncate(bytes_for_bits(len) as usize);
        self.bits = len;
        Ok(())
    }

    fn freeze(&self) -> StorageResult<()> {
        self.read_only.set(true);
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }

    fn sync(&self) -> StorageResult<()> {
        Ok(())
    }

    fn close(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Iterator over a [`MemoryBitVector`], indexing the buffer directly.
pub struct MemoryBitIter<'a> {
    vec: &'a MemoryBitVector,
    cursor: Cursor,
    val: bool,
    err: Option<StorageError>,
    closed: bool,
}

impl BitIter for MemoryBitIter<'_> {
    fn next(&mut self) -> bool {
        self.skip(1)
    }

    fn skip(&mut self, n: u64) -> bool {
        if self.err.is_some() {
            return false;
        }
        match self.cursor.advance(n) {
            Some(index) => {
                self.val = self.vec.get(index);
                true
            }
            None => {
                self.val = false;
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
        self.cursor.check_active("set_bit");
        if self.err.is_some() {
            return;
        }
        self.vec.assert_writable();
        self.val = bit;
        self.vec.put(self.cursor.index(), bit);
    }

    fn err(&self) -> Option<&StorageError> {
        self.err.as_ref()
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn close(&mut self) -> StorageResult<()> {
        if self.closed {
            return Err(StorageError::ClosedIterator);
        }
        self.closed = true;
        self.cursor.exhaust();
        self.val = false;
        match self.err.replace(StorageError::ClosedIterator) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let vec = MemoryBitVector::new(20, false);
        assert_eq!(vec.len(), 20);
        assert_eq!(vec.to_bytes().len(), 3);

        vec.set_bit_at(9, true).unwrap();
        assert!(vec.bit_at(9).unwrap());
        assert!(!vec.bit_at(8).unwrap());
        assert_eq!(vec.to_bytes(), vec![0, 0b10, 0]);

        vec.set_bit_at(9, false).unwrap();
        assert!(!vec.bit_at(9).unwrap());
    }

    #[test]
    fn test_out_of_range() {
        let vec = MemoryBitVector::new(20, false);
        assert!(vec.bit_at(20).unwrap_err().is_out_of_range());
        assert!(vec.set_bit_at(64, true).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_iterator_writes_are_visible() {
        let vec = MemoryBitVector::new(16, false);

        let mut iter = vec.iterate(4, 12);
        while iter.next() {
            let even = iter.index() % 2 == 0;
            iter.set_bit(even);
            assert_eq!(iter.bit(), even);
        }
        iter.close().unwrap();

        assert_eq!(vec.debug_string(), "[0000101010100000]");
    }

    #[test]
    fn test_reverse_iteration() {
        let vec = MemoryBitVector::from_bytes(vec![0b0000_0101], 4);

        let mut iter = vec.reverse_iterate(0, 4);
        let mut seen = Vec::new();
        while iter.next() {
            seen.push((iter.index(), iter.bit()));
        }
        iter.close().unwrap();

        assert_eq!(seen, vec![(3, false), (2, true), (1, false), (0, true)]);
    }

    #[test]
    fn test_double_close() {
        let vec = MemoryBitVector::new(8, false);
        let mut iter = vec.iterate(0, 8);
        assert!(iter.next());
        assert!(iter.close().is_ok());
        assert!(matches!(iter.close(), Err(StorageError::ClosedIterator)));

        // A closed iterator yields nothing
        assert!(!iter.next());
        assert!(matches!(iter.err(), Some(StorageError::ClosedIterator)));
    }

    #[test]
    fn test_copy_from_memory_and_self() {
        let src = MemoryBitVector::from_bytes(vec![0xa5, 0x01], 9);
        let dst = MemoryBitVector::new(9, false);

        dst.copy_from(&src).unwrap();
        assert_eq!(dst.to_bytes(), vec![0xa5, 0x01]);

        // Copying onto itself leaves the bits untouched
        dst.copy_from(&dst).unwrap();
        assert_eq!(dst.to_bytes(), vec![0xa5, 0x01]);
    }

    #[test]
    fn test_truncate() {
        let mut vec = MemoryBitVector::from_bytes(vec![0xff, 0xff], 16);
        vec.truncate(5).unwrap();
        assert_eq!(vec.len(), 5);
        assert!(vec.bit_at(4).unwrap());
        assert!(vec.bit_at(5).is_err());
    }

    #[test]
    #[should_panic(expected = "cannot grow a bit vector")]
    fn test_truncate_cannot_grow() {
        let mut vec = MemoryBitVector::new(8, false);
        let _ = vec.truncate(9);
    }

    #[test]
    #[should_panic(expected = "read-only")]
    fn test_frozen_rejects_iterator_write() {
        let vec = MemoryBitVector::new(8, false);
        vec.freeze().unwrap();
        let mut iter = vec.iterate(0, 8);
        iter.next();
        iter.set_bit(true);
    }

    #[test]
    #[should_panic(expected = "must call next() before bit()")]
    fn test_bit_before_next_panics() {
        let vec = MemoryBitVector::new(8, false);
        let iter = vec.iterate(0, 8);
        iter.bit();
    }

    #[test]
    #[should_panic(expected = "exceeds length")]
    fn test_iterate_past_end_panics() {
        let vec = MemoryBitVector::new(8, false);
        let _ = vec.iterate(0, 9);
    }
}
