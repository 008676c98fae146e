use super::ByteStore;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

/// A byte store over a shared in-memory buffer.
///
/// Clones share the same buffer, so a caller can keep a handle and inspect
/// the bytes after the owning vector has been closed.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_len(len: usize) -> Self {
        Self::from_bytes(vec![0u8; len])
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<u8> {
        self.data.lock().clone()
    }
}

impl ByteStore for MemoryStore {
    fn len(&mut self) -> io::Result<u64> {
        Ok(self.data.lock().len() as u64)
    }

    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let data = self.data.lock();
        if offset >= data.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<()> {
        let mut data = self.data.lock();
        let start = offset as usize;
        let end = start + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        Ok(())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.data.lock().resize(len as usize, 0);
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_extends_buffer() {
        let mut store = MemoryStore::new();
        store.write_at(&[7, 8], 4).unwrap();
        assert_eq!(store.snapshot(), vec![0, 0, 0, 0, 7, 8]);
    }

    #[test]
    fn test_short_read() {
        let mut store = MemoryStore::from_bytes(vec![1, 2, 3]);
        let mut buf = [0u8; 8];
        assert_eq!(store.read_at(&mut buf, 1).unwrap(), 2);
        assert_eq!(&buf[..2], &[2, 3]);
        assert_eq!(store.read_at(&mut buf, 3).unwrap(), 0);
    }

    #[test]
    fn test_clones_share_contents() {
        let store = MemoryStore::with_len(2);
        let mut writer = store.clone();
        writer.write_at(&[0xff], 1).unwrap();
        writer.truncate(4).unwrap();
        assert_eq!(store.snapshot(), vec![0, 0xff, 0, 0]);
    }
}
