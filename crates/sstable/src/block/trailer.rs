//! Per-block trailer: compression kind and a CRC32 over the block payload.

use crate::byte_order::ByteOrder;
use crate::error::SstResult;
use crate::memory::pool::MemoryPool;
use crate::memory::{MemorySlice, SliceInput, SliceOutput};

/// No compression. The only kind this crate writes; compression codecs are
/// an external hook point, so the tag exists to leave room for one.
pub const COMPRESSION_NONE: u8 = 0;

/// `(compression_kind: u8, crc32: u32)`, 5 bytes, written immediately after
/// each block's payload. CRC covers only the payload, never the trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTrailer {
    pub compression_kind: u8,
    pub crc32: u32,
}

impl BlockTrailer {
    pub const ENCODED_LENGTH: usize = 5;

    #[must_use]
    pub fn new(compression_kind: u8, crc32: u32) -> Self {
        Self {
            compression_kind,
            crc32,
        }
    }

    #[must_use]
    pub fn for_payload(payload: &[u8]) -> Self {
        Self::new(COMPRESSION_NONE, crc32fast::hash(payload))
    }

    pub fn write(&self, pool: &dyn MemoryPool, byte_order: ByteOrder) -> SstResult<MemorySlice> {
        let mut out = SliceOutput::new(Self::ENCODED_LENGTH, pool).with_order(byte_order);
        out.write_value(self.compression_kind)?;
        out.write_value(self.crc32)?;
        Ok(out.to_slice())
    }

    pub fn read(input: &mut SliceInput) -> SstResult<Self> {
        let compression_kind = input.read_unsigned_byte()? as u8;
        let crc32 = input.read_u32()?;
        Ok(Self {
            compression_kind,
            crc32,
        })
    }

    #[must_use]
    pub fn matches(&self, payload: &[u8]) -> bool {
        self.crc32 == crc32fast::hash(payload)
    }
}
