use super::{read_full, ByteStore};
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::{NamedTempFile, TempPath};

/// A byte store backed by an OS file.
///
/// Temporary stores own the path of their file and remove it when closed or
/// dropped.
pub struct FileStore {
    file: File,
    temp_path: Option<TempPath>,
}

impl FileStore {
    /// Creates (or truncates) a file at `path` for reading and writing.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self::from_file(file))
    }

    /// Opens an existing file for reading and writing.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self::from_file(file))
    }

    /// Opens an existing file without write access.
    pub fn open_read_only(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        Ok(Self::from_file(file))
    }

    /// Creates an anonymous temporary file, removed again on close.
    pub fn temporary() -> io::Result<Self> {
        let (file, temp_path) = NamedTempFile::new()?.into_parts();
        Ok(Self {
            file,
            temp_path: Some(temp_path),
        })
    }

    pub fn from_file(file: File) -> Self {
        Self {
            file,
            temp_path: None,
        }
    }

    /// Path of the temporary file, if this store owns one.
    pub fn temp_path(&self) -> Option<&Path> {
        self.temp_path.as_deref()
    }

    pub fn is_temporary(&self) -> bool {
        self.temp_path.is_some()
    }
}

impl ByteStore for FileStore {
    fn len(&mut self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.file.seek(SeekFrom::Start(offset))?;
        read_full(&mut self.file, buf)
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.file.set_len(len)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        let FileStore { file, temp_path } = *self;
        drop(file);
        match temp_path {
            Some(path) => path.close(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_create_write_and_read() -> Result<()> {
        let dir = tempdir()?;
        let mut store = FileStore::create(&dir.path().join("bits.dat"))?;

        store.write_at(&[1, 2, 3, 4], 0)?;
        store.write_at(&[9], 2)?;

        let mut buf = [0u8; 4];
        assert_eq!(store.read_at(&mut buf, 0)?, 4);
        assert_eq!(buf, [1, 2, 9, 4]);
        assert_eq!(store.len()?, 4);

        Ok(())
    }

    #[test]
    fn test_short_read_at_end() -> Result<()> {
        let dir = tempdir()?;
        let mut store = FileStore::create(&dir.path().join("bits.dat"))?;
        store.truncate(10)?;

        // Only two bytes remain past offset 8
        let mut buf = [0xffu8; 4];
        assert_eq!(store.read_at(&mut buf, 8)?, 2);
        assert_eq!(&buf[..2], &[0, 0]);

        // Entirely past the end
        assert_eq!(store.read_at(&mut buf, 64)?, 0);

        Ok(())
    }

    #[test]
    fn test_truncate_shrinks_and_grows() -> Result<()> {
        let dir = tempdir()?;
        let mut store = FileStore::create(&dir.path().join("bits.dat"))?;

        store.write_at(&[0xaa; 16], 0)?;
        store.truncate(4)?;
        assert_eq!(store.len()?, 4);

        store.truncate(8)?;
        let mut buf = [0u8; 8];
        store.read_at(&mut buf, 0)?;
        assert_eq!(buf, [0xaa, 0xaa, 0xaa, 0xaa, 0, 0, 0, 0]);

        Ok(())
    }

    #[test]
    fn test_persistence_across_reopen() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bits.dat");

        {
            let mut store = FileStore::create(&path)?;
            store.write_at(&[42], 3)?;
            Box::new(store).close()?;
        }

        {
            let mut store = FileStore::open_read_only(&path)?;
            let mut buf = [0u8; 1];
            store.read_at(&mut buf, 3)?;
            assert_eq!(buf[0], 42);
            assert!(store.write_at(&[1], 0).is_err());
        }

        Ok(())
    }

    #[test]
    fn test_temporary_removed_on_close() -> Result<()> {
        let store = FileStore::temporary()?;
        assert!(store.is_temporary());
        let path = store.temp_path().map(Path::to_path_buf).unwrap();
        assert!(path.exists());

        Box::new(store).close()?;
        assert!(!path.exists());

        Ok(())
    }

    #[test]
    fn test_open_nonexistent_file() -> Result<()> {
        let dir = tempdir()?;
        assert!(FileStore::open(&dir.path().join("missing.dat")).is_err());
        Ok(())
    }
}
