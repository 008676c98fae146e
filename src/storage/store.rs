//! Byte stores: the addressable, truncatable byte ranges behind disk-backed
//! bit vectors.

pub mod file;
pub mod memory;
pub mod read_only;

use std::io;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use read_only::ReadOnlyStore;

/// A byte range supporting positioned reads and writes.
///
/// Every call is a single synchronous attempt; failures are returned to the
/// caller and never retried.
pub trait ByteStore: Send {
    /// Current length of the store in bytes.
    fn len(&mut self) -> io::Result<u64>;

    /// Reads into `buf` starting at `offset`.
    ///
    /// Returns the number of bytes read. A short count is only returned when
    /// the end of the store is reached; reading entirely past the end
    /// returns `Ok(0)`.
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Writes all of `buf` at `offset`, growing the store if needed.
    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<()>;

    /// Sets the length of the store, discarding or zero-filling the tail.
    fn truncate(&mut self, len: u64) -> io::Result<()>;

    /// Pushes buffered writes to the OS.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Forces written data down to stable storage.
    fn sync(&mut self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "sync is not supported by this store",
        ))
    }

    /// Releases the store. Temporary stores remove their backing file here.
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Fills `buf` from `reader`, stopping early only at end of input.
pub(crate) fn read_full<R: io::Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
