//! Cached pages of a byte store and bit addressing within them.

/// Splits a bit index into its byte index and the mask selecting the bit
/// within that byte (least significant bit first).
pub fn byte_and_mask(index: u64) -> (u64, u8) {
    (index / 8, 1u8 << (index % 8))
}

/// Number of bytes needed to hold `bits` bits.
pub fn bytes_for_bits(bits: u64) -> u64 {
    bits.div_ceil(8)
}

/// Rounds a byte offset down to the start of its page.
pub fn page_offset(byte: u64, page_size: usize) -> u64 {
    let page_size = page_size as u64;
    (byte / page_size) * page_size
}

/// A page-aligned window `[offset, offset + data.len())` of the byte store
/// held in memory.
///
/// `data` may be shorter than the page size at the tail of the store.
#[derive(Debug)]
pub struct CachePage {
    pub(crate) data: Vec<u8>,
    pub(crate) offset: u64,
    pub(crate) ref_count: u32,
    pub(crate) dirty: bool,
}

impl CachePage {
    pub(crate) fn new(data: Vec<u8>, offset: u64) -> Self {
        Self {
            data,
            offset,
            ref_count: 1,
            dirty: false,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns true if the absolute byte `byte` falls inside this page's window.
    pub fn contains(&self, byte: u64) -> bool {
        byte >= self.offset && byte < self.offset + self.data.len() as u64
    }

    /// Position of absolute byte `byte` within `data`, if it is in the window.
    pub(crate) fn relative(&self, byte: u64) -> Option<usize> {
        self.contains(byte).then(|| (byte - self.offset) as usize)
    }
}

/// Proof of one reference on a cached page.
///
/// Handed out by `PageCache::acquire` and consumed by `PageCache::dispose`,
/// so each acquisition can be released only once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an acquired page must be disposed"]
pub struct PageHandle {
    offset: u64,
}

impl PageHandle {
    pub(crate) fn new(offset: u64) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_and_mask() {
        assert_eq!(byte_and_mask(0), (0, 0b0000_0001));
        assert_eq!(byte_and_mask(7), (0, 0b1000_0000));
        assert_eq!(byte_and_mask(42), (5, 0b0000_0100));
    }

    #[test]
    fn test_bytes_for_bits() {
        assert_eq!(bytes_for_bits(0), 0);
        assert_eq!(bytes_for_bits(1), 1);
        assert_eq!(bytes_for_bits(8), 1);
        assert_eq!(bytes_for_bits(1025), 129);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(0, 32), 0);
        assert_eq!(page_offset(31, 32), 0);
        assert_eq!(page_offset(32, 32), 32);
        assert_eq!(page_offset(100, 32), 96);
    }

    #[test]
    fn test_window_of_short_tail_page() {
        let page = CachePage::new(vec![0u8; 5], 32);
        assert!(!page.contains(31));
        assert!(page.contains(32));
        assert!(page.contains(36));
        assert!(!page.contains(37));
        assert_eq!(page.relative(34), Some(2));
        assert_eq!(page.relative(40), None);
    }
}
