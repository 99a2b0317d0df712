//! Fixed-layout locators that stitch blocks together into a file.

use crate::byte_order::ByteOrder;
use crate::error::SstResult;
use crate::memory::pool::MemoryPool;
use crate::memory::{MemorySlice, SliceInput, SliceOutput};

/// `(offset, size)` locator into the file. Always 12 bytes on the wire:
/// `offset:u64 | size:u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockHandle {
    pub offset: u64,
    pub size: u32,
}

impl BlockHandle {
    pub const ENCODED_LENGTH: usize = 12;

    #[must_use]
    pub fn new(offset: u64, size: u32) -> Self {
        Self { offset, size }
    }

    pub fn write(&self, pool: &dyn MemoryPool, byte_order: ByteOrder) -> SstResult<MemorySlice> {
        let mut out = SliceOutput::new(Self::ENCODED_LENGTH, pool).with_order(byte_order);
        out.write_value(self.offset)?;
        out.write_value(self.size)?;
        Ok(out.to_slice())
    }

    pub fn read(input: &mut SliceInput) -> SstResult<Self> {
        let offset = input.read_u64()?;
        let size = input.read_u32()?;
        Ok(Self { offset, size })
    }
}

/// `(offset, size, expected_entries)` locator for the bloom filter bitset.
/// Always 16 bytes: `offset:u64 | size:u32 | expected_entries:u32`.
///
/// "No bloom filter was written" is represented by every field being zero,
/// matching the source's "any field non-zero" presence test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BloomFilterHandle {
    pub offset: u64,
    pub size: u32,
    pub expected_entries: u32,
}

impl BloomFilterHandle {
    pub const ENCODED_LENGTH: usize = 16;

    #[must_use]
    pub fn new(offset: u64, size: u32, expected_entries: u32) -> Self {
        Self {
            offset,
            size,
            expected_entries,
        }
    }

    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.offset != 0 || self.size != 0 || self.expected_entries != 0
    }

    pub fn write(&self, pool: &dyn MemoryPool, byte_order: ByteOrder) -> SstResult<MemorySlice> {
        let mut out = SliceOutput::new(Self::ENCODED_LENGTH, pool).with_order(byte_order);
        out.write_value(self.offset)?;
        out.write_value(self.size)?;
        out.write_value(self.expected_entries)?;
        Ok(out.to_slice())
    }

    pub fn read(input: &mut SliceInput) -> SstResult<Self> {
        let offset = input.read_u64()?;
        let size = input.read_u32()?;
        let expected_entries = input.read_u32()?;
        Ok(Self {
            offset,
            size,
            expected_entries,
        })
    }
}
