//! Positional read cursor over a [`MemorySlice`].

use super::slice::MemorySlice;
use crate::byte_order::{ByteOrder, WireInt};
use crate::error::{SstError, SstResult};
use std::mem::size_of;

/// A read cursor with a current `position` and a `byte_order` tag.
///
/// Invariant: `0 <= position <= slice.len()` at all times.
#[derive(Debug, Clone)]
pub struct SliceInput {
    slice: MemorySlice,
    position: usize,
    byte_order: ByteOrder,
}

impl SliceInput {
    #[must_use]
    pub fn new(slice: MemorySlice) -> Self {
        Self {
            slice,
            position: 0,
            byte_order: ByteOrder::native(),
        }
    }

    pub fn with_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    pub fn set_order(&mut self, order: ByteOrder) {
        self.byte_order = order;
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Moves the cursor to `position`.
    ///
    /// # Errors
    ///
    /// Returns [`SstError::IndexError`] if `position > slice.len()`.
    pub fn set_position(&mut self, position: usize) -> SstResult<()> {
        if position > self.slice.len() {
            return Err(SstError::IndexError(format!(
                "position {position} out of bounds for slice of length {}",
                self.slice.len()
            )));
        }
        self.position = position;
        Ok(())
    }

    #[must_use]
    pub fn available(&self) -> usize {
        self.slice.len() - self.position
    }

    fn require(&self, n: usize) -> SstResult<()> {
        if self.available() < n {
            return Err(SstError::OutOfRange(format!(
                "need {n} bytes but only {} available at position {}",
                self.available(),
                self.position
            )));
        }
        Ok(())
    }

    /// Reads one byte as a signed value, advancing the cursor.
    pub fn read_byte(&mut self) -> SstResult<i8> {
        self.require(1)?;
        let b = self.slice.get_byte(self.position)?;
        self.position += 1;
        Ok(b as i8)
    }

    /// Reads one byte zero-extended into a wider integer, avoiding the
    /// sign-extension ambiguity a plain `u8 as i8` round-trip would carry.
    pub fn read_unsigned_byte(&mut self) -> SstResult<u16> {
        self.require(1)?;
        let b = self.slice.get_byte(self.position)?;
        self.position += 1;
        Ok(b as u16)
    }

    fn read_value<T: WireInt>(&mut self) -> SstResult<T> {
        let len = size_of::<T>();
        self.require(len)?;
        let bytes = self.slice.as_bytes();
        let value = T::read_at(&bytes[self.position..self.position + len], self.byte_order);
        self.position += len;
        Ok(value)
    }

    pub fn read_i16(&mut self) -> SstResult<i16> {
        self.read_value()
    }

    pub fn read_i32(&mut self) -> SstResult<i32> {
        self.read_value()
    }

    pub fn read_i64(&mut self) -> SstResult<i64> {
        self.read_value()
    }

    pub fn read_u16(&mut self) -> SstResult<u16> {
        self.read_value()
    }

    pub fn read_u32(&mut self) -> SstResult<u32> {
        self.read_value()
    }

    pub fn read_u64(&mut self) -> SstResult<u64> {
        self.read_value()
    }

    /// Reads a 32-bit varint: 1-5 bytes, seven payload bits per byte,
    /// little-endian, top bit set on all but the last.
    ///
    /// # Errors
    ///
    /// Returns [`SstError::Invalid`] if the continuation chain exceeds 5
    /// bytes, or if the final byte carries bits that would overflow 32 bits.
    pub fn read_varint32(&mut self) -> SstResult<u32> {
        let mut result: u32 = 0;
        for i in 0..5 {
            let b = self.read_unsigned_byte()? as u8;
            let shift = i * 7;
            if i == 4 && (b & 0xF0) != 0 {
                return Err(SstError::Invalid(
                    "malformed varint32: final byte overflows 32 bits".to_string(),
                ));
            }
            result |= ((b & 0x7F) as u32) << shift;
            if (b & 0x80) == 0 {
                return Ok(result);
            }
        }
        Err(SstError::Invalid(
            "malformed varint32: continuation chain exceeds 5 bytes".to_string(),
        ))
    }

    /// Reads a 64-bit varint: 1-10 bytes, same encoding as
    /// [`read_varint32`](Self::read_varint32).
    ///
    /// # Errors
    ///
    /// Returns [`SstError::Invalid`] if the continuation chain exceeds 10
    /// bytes, or if the final byte carries bits that would overflow 64 bits.
    pub fn read_varint64(&mut self) -> SstResult<u64> {
        let mut result: u64 = 0;
        for i in 0..10 {
            let b = self.read_unsigned_byte()? as u8;
            let shift = i * 7;
            if i == 9 && (b & 0xFE) != 0 {
                return Err(SstError::Invalid(
                    "malformed varint64: final byte overflows 64 bits".to_string(),
                ));
            }
            result |= ((b & 0x7F) as u64) << shift;
            if (b & 0x80) == 0 {
                return Ok(result);
            }
        }
        Err(SstError::Invalid(
            "malformed varint64: continuation chain exceeds 10 bytes".to_string(),
        ))
    }

    /// Produces a sub-slice of `length` bytes starting at the current
    /// position, advancing the cursor past it.
    pub fn read_slice(&mut self, length: usize) -> SstResult<MemorySlice> {
        self.require(length)?;
        let sub = self.slice.sub_slice(self.position, length)?;
        self.position += length;
        Ok(sub)
    }

    /// Borrows the underlying slice this cursor reads from.
    #[must_use]
    pub fn slice(&self) -> &MemorySlice {
        &self.slice
    }
}
