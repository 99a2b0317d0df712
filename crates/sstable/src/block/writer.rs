//! Buffers ordered `(key, value)` entries into a single block and seals it.

use crate::byte_order::ByteOrder;
use crate::error::SstResult;
use crate::memory::pool::MemoryPool;
use crate::memory::{MemorySlice, SliceOutput};

/// Tag byte occupying the final position of every sealed block, telling the
/// reader which trailer layout to expect.
pub const ALIGNED: u8 = 1;
pub const UNALIGNED: u8 = 0;

/// Accumulates entries for one block. Becomes unusable after [`finish`]
/// until [`reset`] is called, matching the source's single-shot writer.
///
/// [`finish`]: BlockWriter::finish
/// [`reset`]: BlockWriter::reset
pub struct BlockWriter<'p> {
    out: SliceOutput<'p>,
    positions: Vec<u32>,
    aligned: bool,
    aligned_size: u32,
    pool: &'p dyn MemoryPool,
    byte_order: ByteOrder,
    finished: bool,
}

impl<'p> BlockWriter<'p> {
    #[must_use]
    pub fn new(initial_capacity: usize, pool: &'p dyn MemoryPool, byte_order: ByteOrder) -> Self {
        Self {
            out: SliceOutput::new(initial_capacity, pool).with_order(byte_order),
            positions: Vec::new(),
            aligned: true,
            aligned_size: 0,
            pool,
            byte_order,
            finished: false,
        }
    }

    /// Appends one entry. Ordering and uniqueness of `key` across calls are
    /// the caller's contract — this never rejects duplicate or
    /// out-of-order keys.
    pub fn write(&mut self, key: &[u8], value: &[u8]) -> SstResult<()> {
        let start = self.out.size() as u32;
        self.out.write_varint32(key.len() as u32)?;
        self.out.write_bytes(key)?;
        self.out.write_varint32(value.len() as u32)?;
        self.out.write_bytes(value)?;
        let end = self.out.size() as u32;
        self.positions.push(start);

        let current_size = end - start;
        if self.aligned {
            if self.positions.len() == 1 {
                self.aligned_size = current_size;
            } else if self.aligned_size != current_size {
                self.aligned = false;
            }
        }
        Ok(())
    }

    /// Buffered byte count so far; callers use this to decide when to cut
    /// a new block.
    #[must_use]
    pub fn memory(&self) -> usize {
        self.out.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Seals the block: writes the positions trailer and the one-byte
    /// alignment tag, then returns the finished slice.
    pub fn finish(&mut self) -> SstResult<MemorySlice> {
        // A block with zero entries can't recover its entry count from an
        // aligned trailer, so it is always emitted unaligned.
        let aligned = self.aligned && !self.positions.is_empty();

        if aligned {
            self.out.write_value(self.aligned_size)?;
        } else {
            for &position in &self.positions {
                self.out.write_value(position)?;
            }
            self.out.write_value(self.positions.len() as u32)?;
        }
        self.out.write_value(if aligned { ALIGNED } else { UNALIGNED })?;
        self.finished = true;
        Ok(self.out.to_slice())
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Clears all buffered state so the writer can start a fresh block.
    pub fn reset(&mut self) {
        self.out = SliceOutput::new(1, self.pool).with_order(self.byte_order);
        self.positions.clear();
        self.aligned = true;
        self.aligned_size = 0;
        self.finished = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::pool::HeapPool;

    #[test]
    fn uniform_length_entries_stay_aligned() {
        let pool = HeapPool;
        let mut w = BlockWriter::new(64, &pool, ByteOrder::Little);
        w.write(b"aa", b"11").unwrap();
        w.write(b"bb", b"22").unwrap();
        w.write(b"cc", b"33").unwrap();
        let slice = w.finish().unwrap();
        assert_eq!(*slice.as_bytes().last().unwrap(), ALIGNED);
    }

    #[test]
    fn varying_length_entries_are_unaligned() {
        let pool = HeapPool;
        let mut w = BlockWriter::new(64, &pool, ByteOrder::Little);
        w.write(b"a", b"1").unwrap();
        w.write(b"b", b"22").unwrap();
        let slice = w.finish().unwrap();
        assert_eq!(*slice.as_bytes().last().unwrap(), UNALIGNED);
    }

    #[test]
    fn zero_entries_is_unaligned() {
        let pool = HeapPool;
        let mut w = BlockWriter::new(8, &pool, ByteOrder::Little);
        let slice = w.finish().unwrap();
        assert_eq!(*slice.as_bytes().last().unwrap(), UNALIGNED);
    }

    #[test]
    fn reset_allows_reuse() {
        let pool = HeapPool;
        let mut w = BlockWriter::new(8, &pool, ByteOrder::Little);
        w.write(b"a", b"1").unwrap();
        w.finish().unwrap();
        assert!(w.is_finished());
        w.reset();
        assert!(!w.is_finished());
        assert_eq!(w.memory(), 0);
        w.write(b"b", b"2").unwrap();
        assert!(w.memory() > 0);
    }

    #[test]
    fn aligned_block_length_matches_formula() {
        let pool = HeapPool;
        let mut w = BlockWriter::new(64, &pool, ByteOrder::Little);
        w.write(b"aa", b"11").unwrap();
        w.write(b"bb", b"22").unwrap();
        let slice = w.finish().unwrap();
        // Each entry: varint(2) + 2 bytes + varint(2) + 2 bytes = 6 bytes.
        let entry_len = 6;
        assert_eq!(slice.len(), 2 * entry_len + 5);
    }
}
