use thiserror::Error;

/// Errors produced by the SST core.
///
/// Every fallible operation in this crate returns one of these five kinds.
/// `lookup` never surfaces a "not found" result as an error — only actual
/// corruption, out-of-range access, or I/O failure does.
#[derive(Debug, Error)]
pub enum SstError {
    /// A cursor's `set_position` (or equivalent) was given a position
    /// outside `[0, length]`.
    #[error("index out of bounds: {0}")]
    IndexError(String),

    /// A read walked past the end of the slice it was reading from.
    #[error("read past end of slice: {0}")]
    OutOfRange(String),

    /// Malformed input that is not a storage-corruption signal: a negative
    /// value passed to a varint writer, a missing bloom filter at
    /// serialization time, a handle that does not make sense.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// The on-disk file itself is inconsistent: footer magic mismatch, CRC
    /// mismatch, an unrecognized block alignment tag.
    #[error("corrupt file: {0}")]
    CorruptFile(String),

    /// Propagated from the underlying file system.
    #[error("I/O error: {0}")]
    IOError(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type SstResult<T> = std::result::Result<T, SstError>;
