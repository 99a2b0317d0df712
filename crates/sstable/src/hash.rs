//! Key-hashing boundary: the bloom filter consumes a 64-bit hash, but never
//! computes it itself. This module provides the `KeyHasher` collaborator
//! contract plus one concrete, Murmur-based implementation.

use murmur3::murmur3_x64_128;
use std::io::Cursor;

/// Produces the 64-bit hash a [`crate::block::writer::BlockWriter`] feeds
/// into a bloom filter and a reader re-derives at lookup time. Kept as a
/// trait so callers with their own hash family (or one shared with an
/// upstream key-encoding layer) can swap it in without touching the SST
/// format code.
pub trait KeyHasher: Send + Sync {
    fn hash(&self, key: &[u8]) -> u64;
}

/// Murmur3 x64 128-bit hash, folded down to 64 bits by taking the low half.
#[derive(Debug, Default, Clone, Copy)]
pub struct Murmur64Hasher;

impl KeyHasher for Murmur64Hasher {
    fn hash(&self, key: &[u8]) -> u64 {
        let mut cursor = Cursor::new(key);
        // murmur3_x64_128 only fails if reading from `cursor` fails, which
        // cannot happen for an in-memory byte slice.
        let hash128 = murmur3_x64_128(&mut cursor, 0).expect("in-memory read cannot fail");
        hash128 as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_hashes_the_same() {
        let hasher = Murmur64Hasher;
        assert_eq!(hasher.hash(b"hello"), hasher.hash(b"hello"));
    }

    #[test]
    fn different_keys_usually_hash_differently() {
        let hasher = Murmur64Hasher;
        assert_ne!(hasher.hash(b"hello"), hasher.hash(b"world"));
    }

    #[test]
    fn empty_key_hashes_deterministically() {
        let hasher = Murmur64Hasher;
        assert_eq!(hasher.hash(b""), hasher.hash(b""));
    }
}
