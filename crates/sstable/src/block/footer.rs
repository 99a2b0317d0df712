//! Fixed-size record at the tail of every SST file.

use super::handle::{BlockHandle, BloomFilterHandle};
use crate::byte_order::ByteOrder;
use crate::error::{SstError, SstResult};
use crate::memory::pool::MemoryPool;
use crate::memory::{MemorySlice, SliceInput, SliceOutput};

/// Terminates every SST file; a footer whose last 8 bytes don't match this
/// is treated as corrupt rather than merely malformed, since a truncated
/// or partially-written file can produce bytes that parse as a footer
/// shape without this check.
pub const MAGIC: u64 = 0x5353_5441_4245_4C31; // "SSTABLE1" in ASCII bytes

/// `(index_block_handle, bloom_filter_handle, magic)`. Fixed
/// [`Footer::ENCODED_LENGTH`] bytes at the end of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub index_block_handle: BlockHandle,
    pub bloom_filter_handle: BloomFilterHandle,
}

impl Footer {
    pub const ENCODED_LENGTH: usize =
        BlockHandle::ENCODED_LENGTH + BloomFilterHandle::ENCODED_LENGTH + 8;

    #[must_use]
    pub fn new(index_block_handle: BlockHandle, bloom_filter_handle: BloomFilterHandle) -> Self {
        Self {
            index_block_handle,
            bloom_filter_handle,
        }
    }

    pub fn write(&self, pool: &dyn MemoryPool, byte_order: ByteOrder) -> SstResult<MemorySlice> {
        let mut out = SliceOutput::new(Self::ENCODED_LENGTH, pool).with_order(byte_order);
        out.write_value(self.index_block_handle.offset)?;
        out.write_value(self.index_block_handle.size)?;
        out.write_value(self.bloom_filter_handle.offset)?;
        out.write_value(self.bloom_filter_handle.size)?;
        out.write_value(self.bloom_filter_handle.expected_entries)?;
        out.write_value(MAGIC)?;
        Ok(out.to_slice())
    }

    /// Parses a footer, rejecting anything whose trailing magic doesn't
    /// match with [`SstError::CorruptFile`].
    pub fn read(input: &mut SliceInput) -> SstResult<Self> {
        let index_block_handle = BlockHandle::read(input)?;
        let bloom_filter_handle = BloomFilterHandle::read(input)?;
        let magic = input.read_u64()?;
        if magic != MAGIC {
            log::error!("footer magic mismatch: expected {MAGIC:#x}, found {magic:#x}");
            return Err(SstError::CorruptFile(format!(
                "footer magic mismatch: expected {MAGIC:#x}, found {magic:#x}"
            )));
        }
        Ok(Self {
            index_block_handle,
            bloom_filter_handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::pool::HeapPool;
    use crate::memory::MemorySegment;

    #[test]
    fn footer_roundtrip() {
        let pool = HeapPool;
        let footer = Footer::new(
            BlockHandle::new(0, 100),
            BloomFilterHandle::new(100, 50, 1000),
        );
        let slice = footer.write(&pool, ByteOrder::Little).unwrap();
        assert_eq!(slice.len(), Footer::ENCODED_LENGTH);
        let mut input = slice.to_input();
        assert_eq!(Footer::read(&mut input).unwrap(), footer);
    }

    #[test]
    fn bad_magic_is_corrupt_file() {
        let bytes = vec![0u8; Footer::ENCODED_LENGTH];
        let slice = MemorySlice::wrap(MemorySegment::wrap(bytes));
        let mut input = slice.to_input();
        assert!(matches!(Footer::read(&mut input), Err(SstError::CorruptFile(_))));
    }
}
