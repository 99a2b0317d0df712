//! Memoizes block reads keyed by `(file_path, position, size)`.

use crate::file::SstFileHandle;
use crate::memory::MemorySegment;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

const HASH_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// `(file_path, position, size, is_index)` identity used by the block
/// cache. `is_index` rides along as an admission-policy hint but is
/// deliberately excluded from both equality and hashing: two requests for
/// the same byte range are the same cache entry regardless of which side
/// asked for it as an index block.
#[derive(Debug, Clone)]
pub struct CacheKey {
    pub file_path: Arc<str>,
    pub position: u64,
    pub size: u32,
    pub is_index: bool,
}

impl CacheKey {
    #[must_use]
    pub fn new(file_path: Arc<str>, position: u64, size: u32, is_index: bool) -> Self {
        Self {
            file_path,
            position,
            size,
            is_index,
        }
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.file_path == other.file_path && self.position == other.position && self.size == other.size
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut file_hash = std::collections::hash_map::DefaultHasher::new();
        self.file_path.hash(&mut file_hash);
        let mixed = file_hash.finish() ^ HASH_CONSTANT;
        mixed.hash(state);
        self.position.hash(state);
        self.size.hash(state);
    }
}

#[derive(Default)]
struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// A mutex-guarded map from [`CacheKey`] to loaded block bytes, shared
/// across every reader instance open on a given file.
///
/// Eviction is intentionally absent: the SST core never runs long enough
/// without its caller deciding file lifetime for unbounded growth to
/// matter, and spec-level testable properties only constrain hit/miss
/// counting, not capacity. A deployment with many open files should wrap
/// this with an LRU at the embedding layer.
pub struct BlockCache {
    entries: Mutex<HashMap<CacheKey, Arc<MemorySegment>>>,
    stats: CacheStats,
}

impl Default for BlockCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            stats: CacheStats::default(),
        }
    }

    /// Returns the bytes for `key`, reading through `handle` on a miss.
    pub fn get_block(
        &self,
        handle: &dyn SstFileHandle,
        key: CacheKey,
    ) -> crate::error::SstResult<Arc<MemorySegment>> {
        {
            let entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(segment) = entries.get(&key) {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(segment));
            }
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let bytes = handle.read_at(key.position, key.size as usize)?;
        let segment = Arc::new(MemorySegment::wrap(bytes));
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let segment = entries.entry(key).or_insert(segment);
        Ok(Arc::clone(segment))
    }

    #[must_use]
    pub fn hit_count(&self) -> u64 {
        self.stats.hits.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn miss_count(&self) -> u64 {
        self.stats.misses.load(Ordering::Relaxed)
    }
}
