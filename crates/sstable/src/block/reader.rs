//! Decodes both block layouts and exposes ordered iteration plus
//! binary-search `seek_to`.

use super::writer::{ALIGNED, UNALIGNED};
use crate::compare::KeyComparator;
use crate::error::{SstError, SstResult};
use crate::memory::MemorySlice;
use std::cmp::Ordering;
use std::sync::Arc;

/// A decoded block: the raw slice plus the absolute start offset of every
/// entry, computed once at creation time from whichever trailer layout the
/// final tag byte indicates.
#[derive(Clone)]
pub struct BlockReader {
    slice: MemorySlice,
    positions: Vec<u32>,
    comparator: Arc<dyn KeyComparator>,
}

impl BlockReader {
    pub fn create(slice: MemorySlice, comparator: Arc<dyn KeyComparator>) -> SstResult<Self> {
        let positions = decode_positions(&slice)?;
        Ok(Self {
            slice,
            positions,
            comparator,
        })
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn iterator(&self) -> BlockIterator {
        BlockIterator {
            reader: self.clone(),
            index: 0,
        }
    }

    fn decode_key(&self, index: usize) -> SstResult<MemorySlice> {
        let mut input = self.slice.to_input();
        input.set_position(self.positions[index] as usize)?;
        let key_len = input.read_varint32()? as usize;
        input.read_slice(key_len)
    }

    fn decode_entry(&self, index: usize) -> SstResult<(MemorySlice, MemorySlice)> {
        let mut input = self.slice.to_input();
        input.set_position(self.positions[index] as usize)?;
        let key_len = input.read_varint32()? as usize;
        let key = input.read_slice(key_len)?;
        let value_len = input.read_varint32()? as usize;
        let value = input.read_slice(value_len)?;
        Ok((key, value))
    }
}

fn decode_positions(slice: &MemorySlice) -> SstResult<Vec<u32>> {
    if slice.is_empty() {
        return Err(SstError::CorruptFile(
            "block is empty, missing alignment tag".to_string(),
        ));
    }
    let tag = slice.get_byte(slice.len() - 1)?;
    match tag {
        ALIGNED => {
            if slice.len() < 5 {
                return Err(SstError::CorruptFile(
                    "aligned block shorter than its trailer".to_string(),
                ));
            }
            let mut input = slice.to_input();
            input.set_position(slice.len() - 5)?;
            let aligned_size = input.read_u32()?;
            let payload_len = slice.len() - 5;
            if aligned_size == 0 || payload_len % aligned_size as usize != 0 {
                return Err(SstError::CorruptFile(format!(
                    "aligned block payload of {payload_len} bytes does not divide evenly by entry size {aligned_size}"
                )));
            }
            let count = payload_len / aligned_size as usize;
            Ok((0..count).map(|i| (i * aligned_size as usize) as u32).collect())
        }
        UNALIGNED => {
            if slice.len() < 5 {
                return Err(SstError::CorruptFile(
                    "unaligned block shorter than its trailer".to_string(),
                ));
            }
            let mut input = slice.to_input();
            input.set_position(slice.len() - 5)?;
            let count = input.read_u32()? as usize;
            let positions_bytes = count * 4;
            if positions_bytes + 5 > slice.len() {
                return Err(SstError::CorruptFile(format!(
                    "unaligned block claims {count} entries, too many for its length"
                )));
            }
            input.set_position(slice.len() - 5 - positions_bytes)?;
            let mut positions = Vec::with_capacity(count);
            for _ in 0..count {
                positions.push(input.read_u32()?);
            }
            Ok(positions)
        }
        other => Err(SstError::CorruptFile(format!(
            "unknown block alignment tag {other}"
        ))),
    }
}

/// Sequential + binary-search cursor over a [`BlockReader`]'s entries.
pub struct BlockIterator {
    reader: BlockReader,
    index: usize,
}

impl BlockIterator {
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.index < self.reader.entry_count()
    }

    /// Returns the entry at the cursor and advances past it.
    pub fn next(&mut self) -> SstResult<(MemorySlice, MemorySlice, usize)> {
        if !self.has_next() {
            return Err(SstError::OutOfRange(
                "next() called with no remaining entries".to_string(),
            ));
        }
        let (key, value) = self.reader.decode_entry(self.index)?;
        let absolute_index = self.index;
        self.index += 1;
        Ok((key, value, absolute_index))
    }

    /// Binary-searches entry starts for `target`, decoding only keys to
    /// compare. Positions the cursor at the smallest entry whose key is
    /// `>= target`; leaves it exhausted if no such entry exists.
    pub fn seek_to(&mut self, target: &[u8]) -> SstResult<()> {
        let mut lo = 0usize;
        let mut hi = self.reader.entry_count();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let key = self.reader.decode_key(mid)?;
            match self.reader.comparator.compare(key.as_bytes(), target) {
                Ordering::Less => lo = mid + 1,
                _ => hi = mid,
            }
        }
        self.index = lo;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::writer::BlockWriter;
    use crate::byte_order::ByteOrder;
    use crate::compare::LexicographicComparator;
    use crate::memory::pool::HeapPool;

    fn build_block(entries: &[(&[u8], &[u8])]) -> MemorySlice {
        let pool = HeapPool;
        let mut w = BlockWriter::new(64, &pool, ByteOrder::Little);
        for (k, v) in entries {
            w.write(k, v).unwrap();
        }
        w.finish().unwrap()
    }

    #[test]
    fn round_trip_sorted_entries() {
        let entries: &[(&[u8], &[u8])] = &[(b"a", b"1"), (b"b", b"22"), (b"c", b"333")];
        let slice = build_block(entries);
        let reader = BlockReader::create(slice, Arc::new(LexicographicComparator)).unwrap();
        let mut it = reader.iterator();
        for (k, v) in entries {
            assert!(it.has_next());
            let (key, value, _) = it.next().unwrap();
            assert_eq!(key.as_bytes(), *k);
            assert_eq!(value.as_bytes(), *v);
        }
        assert!(!it.has_next());
    }

    #[test]
    fn seek_to_exact_hit() {
        let entries: &[(&[u8], &[u8])] = &[(b"a", b"1"), (b"b", b"22"), (b"c", b"333")];
        let slice = build_block(entries);
        let reader = BlockReader::create(slice, Arc::new(LexicographicComparator)).unwrap();
        let mut it = reader.iterator();
        it.seek_to(b"b").unwrap();
        let (key, value, idx) = it.next().unwrap();
        assert_eq!(key.as_bytes(), b"b");
        assert_eq!(value.as_bytes(), b"22");
        assert_eq!(idx, 1);
    }

    #[test]
    fn seek_to_miss_lands_on_next_greater() {
        let entries: &[(&[u8], &[u8])] = &[(b"a", b"1"), (b"c", b"3")];
        let slice = build_block(entries);
        let reader = BlockReader::create(slice, Arc::new(LexicographicComparator)).unwrap();
        let mut it = reader.iterator();
        it.seek_to(b"b").unwrap();
        let (key, _, _) = it.next().unwrap();
        assert_eq!(key.as_bytes(), b"c");
    }

    #[test]
    fn seek_past_end_is_exhausted() {
        let entries: &[(&[u8], &[u8])] = &[(b"a", b"1")];
        let slice = build_block(entries);
        let reader = BlockReader::create(slice, Arc::new(LexicographicComparator)).unwrap();
        let mut it = reader.iterator();
        it.seek_to(b"z").unwrap();
        assert!(!it.has_next());
    }

    #[test]
    fn next_past_end_errors() {
        let entries: &[(&[u8], &[u8])] = &[(b"a", b"1")];
        let slice = build_block(entries);
        let reader = BlockReader::create(slice, Arc::new(LexicographicComparator)).unwrap();
        let mut it = reader.iterator();
        it.next().unwrap();
        assert!(matches!(it.next(), Err(SstError::OutOfRange(_))));
    }

    #[test]
    fn aligned_block_round_trips() {
        let entries: &[(&[u8], &[u8])] = &[(b"aa", b"11"), (b"bb", b"22"), (b"cc", b"33")];
        let slice = build_block(entries);
        assert_eq!(*slice.as_bytes().last().unwrap(), ALIGNED);
        let reader = BlockReader::create(slice, Arc::new(LexicographicComparator)).unwrap();
        assert_eq!(reader.entry_count(), 3);
        let mut it = reader.iterator();
        it.seek_to(b"bb").unwrap();
        let (key, value, _) = it.next().unwrap();
        assert_eq!(key.as_bytes(), b"bb");
        assert_eq!(value.as_bytes(), b"22");
    }

    #[test]
    fn unknown_tag_is_corrupt() {
        let mut bytes = build_block(&[(b"a", b"1")]).as_bytes().to_vec();
        let last = bytes.len() - 1;
        bytes[last] = 0xFF;
        let slice = MemorySlice::wrap(crate::memory::MemorySegment::wrap(bytes));
        assert!(matches!(
            BlockReader::create(slice, Arc::new(LexicographicComparator)),
            Err(SstError::CorruptFile(_))
        ));
    }
}
