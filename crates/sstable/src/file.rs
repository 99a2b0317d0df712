//! File-access boundary: the reader/writer code below this module never
//! touches `std::fs` directly, so a caller embedding this crate in a larger
//! table format can swap in object storage, a virtual file system, or a
//! test double without changing block/footer logic.

use crate::error::SstResult;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

/// A positioned, read-only handle into an already-open SST file. Reads are
/// `&self` so a single handle can be shared across concurrent lookups, the
/// same way [`crate::cache::BlockCache`] is shared.
pub trait SstFileHandle: Send + Sync {
    fn read_at(&self, offset: u64, len: usize) -> SstResult<Vec<u8>>;

    fn len(&self) -> SstResult<u64>;
}

/// A write handle for a file being built up sequentially, matching how
/// [`crate::writer::SstFileWriter`] only ever appends.
pub trait SstFileWriteHandle: Send {
    fn write_all(&mut self, bytes: &[u8]) -> SstResult<()>;

    /// Current write position, i.e. the absolute offset the next
    /// `write_all` call will start at.
    fn position(&self) -> u64;

    /// Flushes and fsyncs so the file is durable before the writer reports
    /// success to its caller.
    fn sync(&mut self) -> SstResult<()>;
}

/// Opens and creates the read/write handles above. The sole entry point an
/// embedder needs to implement to back this crate with a different storage
/// layer.
pub trait SstFileSystem: Send + Sync {
    type ReadHandle: SstFileHandle;
    type WriteHandle: SstFileWriteHandle;

    fn open_read(&self, path: &Path) -> SstResult<Self::ReadHandle>;

    fn create_write(&self, path: &Path) -> SstResult<Self::WriteHandle>;
}

/// `std::fs`-backed [`SstFileSystem`]. The only implementation this crate
/// ships; everything above exists so it isn't the only one that's possible.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl SstFileSystem for StdFileSystem {
    type ReadHandle = StdReadHandle;
    type WriteHandle = StdWriteHandle;

    fn open_read(&self, path: &Path) -> SstResult<Self::ReadHandle> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(StdReadHandle {
            file: Mutex::new(file),
            len,
        })
    }

    fn create_write(&self, path: &Path) -> SstResult<Self::WriteHandle> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(StdWriteHandle { file, position: 0 })
    }
}

/// Guards the one [`File`] with a mutex so `read_at` can take `&self`:
/// seeking and reading are not atomic on a shared descriptor otherwise.
pub struct StdReadHandle {
    file: Mutex<File>,
    len: u64,
}

impl SstFileHandle for StdReadHandle {
    fn read_at(&self, offset: u64, len: usize) -> SstResult<Vec<u8>> {
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn len(&self) -> SstResult<u64> {
        Ok(self.len)
    }
}

pub struct StdWriteHandle {
    file: File,
    position: u64,
}

impl SstFileWriteHandle for StdWriteHandle {
    fn write_all(&mut self, bytes: &[u8]) -> SstResult<()> {
        self.file.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn sync(&mut self) -> SstResult<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.sst");
        let fs = StdFileSystem;
        {
            let mut w = fs.create_write(&path).unwrap();
            w.write_all(b"hello world").unwrap();
            assert_eq!(w.position(), 11);
            w.sync().unwrap();
        }
        let r = fs.open_read(&path).unwrap();
        assert_eq!(r.len().unwrap(), 11);
        assert_eq!(r.read_at(6, 5).unwrap(), b"world");
    }

    #[test]
    fn read_past_end_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.sst");
        let fs = StdFileSystem;
        {
            let mut w = fs.create_write(&path).unwrap();
            w.write_all(b"ab").unwrap();
            w.sync().unwrap();
        }
        let r = fs.open_read(&path).unwrap();
        assert!(r.read_at(0, 10).is_err());
    }
}
