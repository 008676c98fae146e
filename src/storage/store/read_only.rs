use super::{read_full, ByteStore};
use std::io::{self, Read, Seek, SeekFrom};

/// Adapts any seekable reader into a byte store that rejects writes.
pub struct ReadOnlyStore<R> {
    reader: R,
}

impl<R: Read + Seek + Send> ReadOnlyStore<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

fn read_only_error() -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, "store is read-only")
}

impl<R: Read + Seek + Send> ByteStore for ReadOnlyStore<R> {
    fn len(&mut self) -> io::Result<u64> {
        self.reader.seek(SeekFrom::End(0))
    }

    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.reader.seek(SeekFrom::Start(offset))?;
        read_full(&mut self.reader, buf)
    }

    fn write_at(&mut self, _buf: &[u8], _offset: u64) -> io::Result<()> {
        Err(read_only_error())
    }

    fn truncate(&mut self, _len: u64) -> io::Result<()> {
        Err(read_only_error())
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_from_inner_reader() {
        let mut store = ReadOnlyStore::new(Cursor::new(vec![5u8, 6, 7]));
        assert_eq!(store.len().unwrap(), 3);

        let mut buf = [0u8; 2];
        assert_eq!(store.read_at(&mut buf, 1).unwrap(), 2);
        assert_eq!(buf, [6, 7]);
    }

    #[test]
    fn test_rejects_mutation() {
        let mut store = ReadOnlyStore::new(Cursor::new(vec![0u8; 4]));
        let err = store.write_at(&[1], 0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(store.truncate(0).is_err());
        assert_eq!(store.into_inner().into_inner(), vec![0u8; 4]);
    }
}
