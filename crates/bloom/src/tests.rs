use super::*;
use std::io::Cursor;

/// Deterministic stand-in for a murmur-family hash, used only so tests can
/// turn a `&[u8]` key into the 64-bit hash this crate actually consumes.
fn test_hash_of(key: &[u8]) -> u64 {
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for &b in key {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

// -------------------- Construction --------------------

#[test]
fn new_creates_valid_filter() {
    let bf = BloomFilter::new(100, 128);
    assert!(bf.num_bits() > 0);
    assert!(bf.num_hashes() > 0);
    assert!(!bf.bits.is_empty());
}

#[test]
#[should_panic(expected = "expected_entries must be > 0")]
fn new_panics_on_zero_entries() {
    BloomFilter::new(0, 128);
}

#[test]
#[should_panic(expected = "size_bytes must be > 0")]
fn new_panics_on_zero_size() {
    BloomFilter::new(100, 0);
}

#[test]
#[should_panic(expected = "bits_per_entry must be > 0")]
fn for_entries_panics_on_zero_bits_per_entry() {
    BloomFilter::for_entries(100, 0.0);
}

// -------------------- add_hash / test_hash --------------------

#[test]
fn inserted_hash_is_found() {
    let mut bf = BloomFilter::for_entries(100, 10.0);
    bf.add_hash(test_hash_of(b"hello"));
    assert!(bf.test_hash(test_hash_of(b"hello")));
}

#[test]
fn missing_hash_is_not_found() {
    let bf = BloomFilter::for_entries(100, 10.0);
    assert!(!bf.test_hash(test_hash_of(b"hello")));
}

#[test]
fn many_hashes_all_found() {
    let mut bf = BloomFilter::for_entries(1000, 10.0);
    for i in 0..1000u64 {
        bf.add_hash(test_hash_of(&i.to_le_bytes()));
    }
    for i in 0..1000u64 {
        assert!(
            bf.test_hash(test_hash_of(&i.to_le_bytes())),
            "key {} should be found",
            i
        );
    }
}

#[test]
fn false_positive_rate_is_reasonable() {
    let n: u32 = 10_000;
    let bits_per_entry = 10.0;
    let mut bf = BloomFilter::for_entries(n, bits_per_entry);

    for i in 0..n as u64 {
        bf.add_hash(test_hash_of(&i.to_le_bytes()));
    }

    let mut false_positives = 0;
    let test_count = 10_000u64;
    for i in (n as u64)..(n as u64 + test_count) {
        if bf.test_hash(test_hash_of(&i.to_le_bytes())) {
            false_positives += 1;
        }
    }

    // At 10 bits/entry the theoretical FPR is ~1%; allow generous headroom.
    let actual_fpr = false_positives as f64 / test_count as f64;
    assert!(
        actual_fpr < 0.05,
        "FPR too high: {:.4}",
        actual_fpr
    );
}

#[test]
fn zero_hash_is_handled() {
    let mut bf = BloomFilter::for_entries(10, 10.0);
    bf.add_hash(0);
    assert!(bf.test_hash(0));
}

// -------------------- Serialization --------------------

#[test]
fn roundtrip_serialize_deserialize() {
    let mut bf = BloomFilter::for_entries(500, 10.0);
    for i in 0..500u64 {
        bf.add_hash(test_hash_of(&i.to_le_bytes()));
    }

    let mut buf = Vec::new();
    bf.write_to(&mut buf).unwrap();
    assert_eq!(buf.len() as u32, bf.size_bytes());

    let mut cursor = Cursor::new(&buf);
    let bf2 = BloomFilter::read_from(&mut cursor, bf.expected_entries(), bf.size_bytes()).unwrap();

    assert_eq!(bf2.num_bits(), bf.num_bits());
    assert_eq!(bf2.num_hashes(), bf.num_hashes());
    assert_eq!(bf2.bits, bf.bits);

    for i in 0..500u64 {
        assert!(
            bf2.test_hash(test_hash_of(&i.to_le_bytes())),
            "key {} missing after roundtrip",
            i
        );
    }
}

#[test]
fn write_to_emits_only_raw_bitset() {
    let bf = BloomFilter::new(100, 37);
    let mut buf = Vec::new();
    bf.write_to(&mut buf).unwrap();
    assert_eq!(buf.len(), 37);
}

#[test]
fn read_from_rejects_truncated_input() {
    let buf = vec![0u8; 4];
    let mut cursor = Cursor::new(&buf);
    let result = BloomFilter::read_from(&mut cursor, 100, 37);
    assert!(result.is_err());
}

// -------------------- Debug --------------------

#[test]
fn debug_impl_works() {
    let bf = BloomFilter::new(100, 128);
    let debug = format!("{:?}", bf);
    assert!(debug.contains("BloomFilter"));
    assert!(debug.contains("num_bits"));
    assert!(debug.contains("num_hashes"));
}

// -------------------- Edge cases --------------------

#[test]
fn single_entry_filter() {
    let mut bf = BloomFilter::for_entries(1, 10.0);
    bf.add_hash(test_hash_of(b"only"));
    assert!(bf.test_hash(test_hash_of(b"only")));
}

#[test]
fn high_bits_per_entry_grows_hash_count() {
    let low = BloomFilter::for_entries(100, 2.0);
    let high = BloomFilter::for_entries(100, 20.0);
    assert!(high.num_bits() > low.num_bits());
    assert!(high.num_hashes() >= low.num_hashes());
}
