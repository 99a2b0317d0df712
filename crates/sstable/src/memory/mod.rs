//! Byte-buffer primitives the rest of the crate builds block/file I/O on:
//! an owned [`segment::MemorySegment`], an immutable shared
//! [`slice::MemorySlice`] cut from one, and positional
//! [`slice_input::SliceInput`] / [`slice_output::SliceOutput`] cursors over
//! them.

pub mod pool;
pub mod segment;
pub mod slice;
pub mod slice_input;
pub mod slice_output;

pub use pool::{HeapPool, MemoryPool};
pub use segment::MemorySegment;
pub use slice::MemorySlice;
pub use slice_input::SliceInput;
pub use slice_output::SliceOutput;
