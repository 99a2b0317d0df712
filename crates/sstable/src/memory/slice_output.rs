//! Growable write cursor that materializes into a [`MemorySlice`].

use super::pool::MemoryPool;
use super::segment::MemorySegment;
use super::slice::MemorySlice;
use crate::byte_order::{ByteOrder, WireInt};
use crate::error::{SstError, SstResult};
use std::mem::size_of;

/// Writes bytes at a growing `size` offset into a [`MemorySegment`],
/// doubling capacity (at minimum) whenever a write would overflow it.
///
/// Grounded in the same grow-on-demand discipline the C++ writer uses:
/// never reallocate more often than necessary, but never make the caller
/// pre-size the buffer either.
pub struct SliceOutput<'p> {
    segment: MemorySegment,
    size: usize,
    byte_order: ByteOrder,
    pool: &'p dyn MemoryPool,
}

impl<'p> SliceOutput<'p> {
    #[must_use]
    pub fn new(initial_capacity: usize, pool: &'p dyn MemoryPool) -> Self {
        let capacity = initial_capacity.max(1);
        Self {
            segment: pool.allocate(capacity),
            size: 0,
            byte_order: ByteOrder::native(),
            pool,
        }
    }

    #[must_use]
    pub fn with_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    pub fn set_order(&mut self, order: ByteOrder) {
        self.byte_order = order;
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Resets the logical length to zero without releasing the backing
    /// buffer, so the same allocation can be reused for the next record.
    pub fn reset(&mut self) {
        self.size = 0;
    }

    fn ensure_size(&mut self, needed: usize) {
        if needed <= self.segment.size() {
            return;
        }
        let mut new_capacity = self.segment.size().max(1);
        while new_capacity < needed {
            new_capacity *= 2;
        }
        self.segment = self.pool.grow(&self.segment, new_capacity);
    }

    pub fn write_value<T: WireInt>(&mut self, value: T) -> SstResult<()> {
        let len = size_of::<T>();
        self.ensure_size(self.size + len);
        self.segment.put_value(self.size, value, self.byte_order);
        self.size += len;
        Ok(())
    }

    /// Appends `bytes` verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> SstResult<()> {
        self.ensure_size(self.size + bytes.len());
        self.segment.put_bytes(self.size, bytes, 0, bytes.len());
        self.size += bytes.len();
        Ok(())
    }

    /// Writes `value` as a 32-bit varint.
    ///
    /// # Errors
    ///
    /// This method cannot fail for any `u32`; the `Result` return matches
    /// the rest of the cursor API so callers can use `?` uniformly.
    pub fn write_varint32(&mut self, mut value: u32) -> SstResult<()> {
        loop {
            let mut b = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                b |= 0x80;
            }
            self.write_bytes(&[b])?;
            if value == 0 {
                return Ok(());
            }
        }
    }

    pub fn write_varint64(&mut self, mut value: u64) -> SstResult<()> {
        loop {
            let mut b = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                b |= 0x80;
            }
            self.write_bytes(&[b])?;
            if value == 0 {
                return Ok(());
            }
        }
    }

    /// Writes a signed varint, rejecting negative values: the wire format
    /// has no zig-zag encoding, so a negative input would silently encode
    /// as an enormous unsigned value on decode.
    ///
    /// # Errors
    ///
    /// Returns [`SstError::Invalid`] if `value` is negative.
    pub fn write_signed_varint32(&mut self, value: i32) -> SstResult<()> {
        if value < 0 {
            return Err(SstError::Invalid(format!(
                "varint32 cannot encode negative value {value}"
            )));
        }
        self.write_varint32(value as u32)
    }

    pub fn write_signed_varint64(&mut self, value: i64) -> SstResult<()> {
        if value < 0 {
            return Err(SstError::Invalid(format!(
                "varint64 cannot encode negative value {value}"
            )));
        }
        self.write_varint64(value as u64)
    }

    /// Materializes the bytes written so far as an immutable, shareable
    /// slice. Does not consume `self`: callers may keep writing afterward.
    #[must_use]
    pub fn to_slice(&self) -> MemorySlice {
        let mut out = MemorySegment::allocate(self.size);
        self.segment.copy_to(0, &mut out, 0, self.size);
        MemorySlice::wrap(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::pool::HeapPool;

    #[test]
    fn write_grows_past_initial_capacity() {
        let pool = HeapPool;
        let mut out = SliceOutput::new(1, &pool);
        for i in 0..100u32 {
            out.write_value(i).unwrap();
        }
        assert_eq!(out.size(), 400);
        let slice = out.to_slice();
        let mut input = slice.to_input();
        for i in 0..100u32 {
            assert_eq!(input.read_u32().unwrap(), i);
        }
    }

    #[test]
    fn reset_reuses_buffer() {
        let pool = HeapPool;
        let mut out = SliceOutput::new(16, &pool);
        out.write_bytes(b"hello").unwrap();
        out.reset();
        assert_eq!(out.size(), 0);
        out.write_bytes(b"hi").unwrap();
        assert_eq!(out.to_slice().as_bytes(), b"hi");
    }

    #[test]
    fn negative_varint_is_rejected() {
        let pool = HeapPool;
        let mut out = SliceOutput::new(8, &pool);
        assert!(matches!(
            out.write_signed_varint32(-1),
            Err(SstError::Invalid(_))
        ));
    }

    #[test]
    fn varint_encodes_minimal_bytes() {
        let pool = HeapPool;
        let mut out = SliceOutput::new(8, &pool);
        out.write_varint32(1).unwrap();
        assert_eq!(out.size(), 1);
        out.reset();
        out.write_varint32(128).unwrap();
        assert_eq!(out.size(), 2);
    }

    #[test]
    fn to_slice_does_not_consume_writer() {
        let pool = HeapPool;
        let mut out = SliceOutput::new(8, &pool);
        out.write_bytes(b"ab").unwrap();
        let first = out.to_slice();
        out.write_bytes(b"cd").unwrap();
        let second = out.to_slice();
        assert_eq!(first.as_bytes(), b"ab");
        assert_eq!(second.as_bytes(), b"abcd");
    }
}
