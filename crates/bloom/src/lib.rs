//! # Bloom Filter
//!
//! A space-efficient probabilistic set over 64-bit hashes.
//!
//! Unlike a classic bloom filter, this one never hashes a key itself — it
//! only ever sees the 64-bit hash the caller already computed (murmur-family,
//! by convention of the SST layer that embeds it). [`BloomFilter::add_hash`]
//! sets bits derived from that hash; [`BloomFilter::test_hash`] returns
//! `false` only when the hash is definitely absent (no false negatives; a
//! `true` result is advisory and must still be confirmed by the caller).
//!
//! ## Example
//!
//! ```rust
//! use bloom::BloomFilter;
//!
//! let mut bf = BloomFilter::for_entries(1000, 10.0);
//! bf.add_hash(0x1234_5678_9abc_def0);
//! assert!(bf.test_hash(0x1234_5678_9abc_def0));
//! ```
use std::io::{self, Read, Write};

/// A bloom filter backed by a bit vector with `k` independent hash functions.
///
/// Uses Kirsch-Mitzenmacher double hashing: `h(i) = h1 + i * h2`, where `h1`
/// and `h2` are both derived from the single 64-bit hash the caller supplies.
pub struct BloomFilter {
    bits: Vec<u8>,
    num_bits: u64,
    num_hashes: u32,
    expected_entries: u32,
}

impl BloomFilter {
    /// Creates a filter with an explicit bitset size in bytes.
    ///
    /// `expected_entries` and `size_bytes` together define the bitset
    /// geometry: the number of hash functions is derived from the resulting
    /// bits-per-entry ratio via the standard `k = (m/n) * ln(2)` formula.
    ///
    /// # Panics
    ///
    /// Panics if `expected_entries` is 0 or `size_bytes` is 0.
    #[must_use]
    pub fn new(expected_entries: u32, size_bytes: u32) -> Self {
        assert!(expected_entries > 0, "expected_entries must be > 0");
        assert!(size_bytes > 0, "size_bytes must be > 0");

        let num_bits = (size_bytes as u64) * 8;
        let k = ((num_bits as f64 / expected_entries as f64) * std::f64::consts::LN_2).ceil() as u32;
        let num_hashes = k.max(1);

        Self {
            bits: vec![0u8; size_bytes as usize],
            num_bits,
            num_hashes,
            expected_entries,
        }
    }

    /// Creates a filter sized for `expected_entries` at a target
    /// `bits_per_entry` ratio (the `bloom_bits_per_entry` configuration
    /// option of the SST layer).
    ///
    /// # Panics
    ///
    /// Panics if `expected_entries` is 0 or `bits_per_entry` is not positive.
    #[must_use]
    pub fn for_entries(expected_entries: u32, bits_per_entry: f32) -> Self {
        assert!(expected_entries > 0, "expected_entries must be > 0");
        assert!(bits_per_entry > 0.0, "bits_per_entry must be > 0");

        let total_bits = (expected_entries as f64) * (bits_per_entry as f64);
        let size_bytes = ((total_bits / 8.0).ceil() as u32).max(1);
        Self::new(expected_entries, size_bytes)
    }

    /// Creates a filter from raw parts (used during deserialization).
    fn from_raw(bits: Vec<u8>, num_bits: u64, num_hashes: u32, expected_entries: u32) -> Self {
        Self {
            bits,
            num_bits,
            num_hashes,
            expected_entries,
        }
    }

    /// Sets the bits derived from `hash`.
    pub fn add_hash(&mut self, hash: u64) {
        let (h1, h2) = Self::hash_pair(hash);
        for i in 0..self.num_hashes {
            let bit_idx = self.bit_index(h1, h2, i);
            self.set_bit(bit_idx);
        }
    }

    /// Returns `false` only when `hash` is definitely absent; `true` is
    /// advisory and never implies a hit.
    #[must_use]
    pub fn test_hash(&self, hash: u64) -> bool {
        let (h1, h2) = Self::hash_pair(hash);
        for i in 0..self.num_hashes {
            let bit_idx = self.bit_index(h1, h2, i);
            if !self.get_bit(bit_idx) {
                return false;
            }
        }
        true
    }

    /// Number of bits in the filter.
    #[must_use]
    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    /// Number of hash functions (k).
    #[must_use]
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// The `expected_entries` this filter was sized for.
    #[must_use]
    pub fn expected_entries(&self) -> u32 {
        self.expected_entries
    }

    /// Size of the raw bitset in bytes (what [`write_to`](Self::write_to)
    /// emits).
    #[must_use]
    pub fn size_bytes(&self) -> u32 {
        self.bits.len() as u32
    }

    /// Serializes the raw bitset bytes — no length prefix, no header. The
    /// caller (the SST writer) already knows the size via the
    /// `BloomFilterHandle` it writes into the footer.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.bits)
    }

    /// Deserializes a filter from a reader, binding to a pre-sized bitset.
    /// `expected_entries` and `size_bytes` must come from the
    /// `BloomFilterHandle` that located this filter on disk.
    pub fn read_from<R: Read>(r: &mut R, expected_entries: u32, size_bytes: u32) -> io::Result<Self> {
        let mut bits = vec![0u8; size_bytes as usize];
        r.read_exact(&mut bits)?;
        let num_bits = (size_bytes as u64) * 8;
        let k = ((num_bits as f64 / expected_entries.max(1) as f64) * std::f64::consts::LN_2).ceil() as u32;
        Ok(Self::from_raw(bits, num_bits, k.max(1), expected_entries))
    }

    // ---- Internal helpers ----

    /// Splits one 64-bit hash into two independent values for double hashing.
    fn hash_pair(hash: u64) -> (u64, u64) {
        let h1 = hash;
        let h2 = (hash.rotate_left(32) ^ 0x9e3779b97f4a7c15) | 1;
        (h1, h2)
    }

    fn bit_index(&self, h1: u64, h2: u64, i: u32) -> u64 {
        h1.wrapping_add((i as u64).wrapping_mul(h2)) % self.num_bits
    }

    fn set_bit(&mut self, idx: u64) {
        let byte_idx = (idx / 8) as usize;
        let bit_offset = (idx % 8) as u8;
        self.bits[byte_idx] |= 1 << bit_offset;
    }

    fn get_bit(&self, idx: u64) -> bool {
        let byte_idx = (idx / 8) as usize;
        let bit_offset = (idx % 8) as u8;
        (self.bits[byte_idx] >> bit_offset) & 1 == 1
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("num_bits", &self.num_bits)
            .field("num_hashes", &self.num_hashes)
            .field("expected_entries", &self.expected_entries)
            .field("bytes", &self.bits.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
