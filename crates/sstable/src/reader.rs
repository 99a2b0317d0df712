//! Loads the footer, index block, and optional bloom filter from an SST
//! file; supports point `lookup` and ordered iteration.

use crate::block::{BlockHandle, BlockIterator, BlockReader, BlockTrailer, Footer};
use crate::byte_order::ByteOrder;
use crate::cache::{BlockCache, CacheKey};
use crate::compare::KeyComparator;
use crate::error::{SstError, SstResult};
use crate::file::{SstFileHandle, SstFileSystem};
use crate::hash::KeyHasher;
use crate::memory::MemorySlice;
use bloom::BloomFilter;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// Opens a sealed SST file and serves point lookups and ordered scans over
/// it. Creation eagerly loads the footer, the index block, and (if
/// present) the bloom filter bitset; data blocks are loaded lazily and
/// memoized through the shared [`BlockCache`].
pub struct SstFileReader<R: SstFileHandle> {
    handle: Arc<R>,
    cache: Arc<BlockCache>,
    index_block_reader: BlockReader,
    bloom_filter: Option<BloomFilter>,
    key_hasher: Arc<dyn KeyHasher>,
    comparator: Arc<dyn KeyComparator>,
    file_path: Arc<str>,
    byte_order: ByteOrder,
}

impl<R: SstFileHandle> SstFileReader<R> {
    pub fn open<FS: SstFileSystem<ReadHandle = R>>(
        fs: &FS,
        path: &Path,
        cache: Arc<BlockCache>,
        key_hasher: Arc<dyn KeyHasher>,
        comparator: Arc<dyn KeyComparator>,
        byte_order: ByteOrder,
    ) -> SstResult<Self> {
        let handle = Arc::new(fs.open_read(path)?);
        let file_len = handle.len()?;
        let file_path: Arc<str> = Arc::from(path.to_string_lossy().as_ref());

        if file_len < Footer::ENCODED_LENGTH as u64 {
            return Err(SstError::CorruptFile(format!(
                "file of {file_len} bytes is too short to hold a footer"
            )));
        }

        let footer_offset = file_len - Footer::ENCODED_LENGTH as u64;
        let footer_key = CacheKey::new(
            Arc::clone(&file_path),
            footer_offset,
            Footer::ENCODED_LENGTH as u32,
            true,
        );
        let footer_segment = cache.get_block(handle.as_ref(), footer_key)?;
        let footer_slice = MemorySlice::new(Arc::clone(&footer_segment), 0, footer_segment.size())?;
        let footer = Footer::read(&mut footer_slice.to_input().with_order(byte_order))?;

        let bloom_filter = if footer.bloom_filter_handle.is_present() {
            let key = CacheKey::new(
                Arc::clone(&file_path),
                footer.bloom_filter_handle.offset,
                footer.bloom_filter_handle.size,
                true,
            );
            let segment = cache.get_block(handle.as_ref(), key)?;
            let mut cursor = Cursor::new(segment.as_slice());
            Some(
                BloomFilter::read_from(
                    &mut cursor,
                    footer.bloom_filter_handle.expected_entries,
                    footer.bloom_filter_handle.size,
                )
                .map_err(SstError::IOError)?,
            )
        } else {
            None
        };

        let index_block_reader = Self::read_block(
            &cache,
            handle.as_ref(),
            &file_path,
            footer.index_block_handle,
            true,
            Arc::clone(&comparator),
            byte_order,
        )?;

        Ok(Self {
            handle,
            cache,
            index_block_reader,
            bloom_filter,
            key_hasher,
            comparator,
            file_path,
            byte_order,
        })
    }

    fn read_block(
        cache: &BlockCache,
        handle: &dyn SstFileHandle,
        file_path: &Arc<str>,
        block_handle: BlockHandle,
        is_index: bool,
        comparator: Arc<dyn KeyComparator>,
        byte_order: ByteOrder,
    ) -> SstResult<BlockReader> {
        let trailer_key = CacheKey::new(
            Arc::clone(file_path),
            block_handle.offset + block_handle.size as u64,
            BlockTrailer::ENCODED_LENGTH as u32,
            is_index,
        );
        let trailer_segment = cache.get_block(handle, trailer_key)?;
        let trailer_slice =
            MemorySlice::new(Arc::clone(&trailer_segment), 0, trailer_segment.size())?;
        let trailer = BlockTrailer::read(&mut trailer_slice.to_input().with_order(byte_order))?;

        let data_key = CacheKey::new(
            Arc::clone(file_path),
            block_handle.offset,
            block_handle.size,
            is_index,
        );
        let data_segment = cache.get_block(handle, data_key)?;
        if !trailer.matches(data_segment.as_slice()) {
            log::error!(
                "CRC mismatch for block at offset {} in {}",
                block_handle.offset,
                file_path
            );
            return Err(SstError::CorruptFile(
                "block payload failed its CRC check".to_string(),
            ));
        }
        let data_slice = MemorySlice::new(Arc::clone(&data_segment), 0, data_segment.size())?;
        BlockReader::create(data_slice, comparator)
    }

    /// Looks up `key`. The bloom filter is advisory only: a `true` from
    /// `test_hash` never implies a hit, so a direct block scan always
    /// confirms it. Returns `None` rather than an error for "not found".
    pub fn lookup(&self, key: &[u8]) -> SstResult<Option<Vec<u8>>> {
        if let Some(bloom) = &self.bloom_filter {
            if !bloom.test_hash(self.key_hasher.hash(key)) {
                return Ok(None);
            }
        }

        let mut index_iterator = self.index_block_reader.iterator();
        index_iterator.seek_to(key)?;
        if !index_iterator.has_next() {
            return Ok(None);
        }
        let (_, handle_value, _) = index_iterator.next()?;
        let mut handle_input = handle_value.to_input().with_order(self.byte_order);
        let block_handle = BlockHandle::read(&mut handle_input)?;

        let data_reader = Self::read_block(
            &self.cache,
            self.handle.as_ref(),
            &self.file_path,
            block_handle,
            false,
            Arc::clone(&self.comparator),
            self.byte_order,
        )?;
        let mut data_iterator = data_reader.iterator();
        data_iterator.seek_to(key)?;
        if !data_iterator.has_next() {
            return Ok(None);
        }
        let (found_key, value, _) = data_iterator.next()?;
        if found_key.as_bytes() == key {
            Ok(Some(value.to_vec()))
        } else {
            Ok(None)
        }
    }

    /// Produces a file-level iterator positioned at the first entry.
    pub fn iterator(&self) -> SstResult<SstFileIterator<'_, R>> {
        let mut it = SstFileIterator {
            reader: self,
            index_iterator: self.index_block_reader.iterator(),
            data_iterator: None,
        };
        it.advance_to_next_data_block()?;
        Ok(it)
    }
}

/// Advances across all data blocks in key order, lazily loading the next
/// one as the current one is exhausted. Holds a non-owning reference back
/// to the reader it was created from, matching the design note that
/// iterators never co-own the reader that produced them.
pub struct SstFileIterator<'r, R: SstFileHandle> {
    reader: &'r SstFileReader<R>,
    index_iterator: BlockIterator,
    data_iterator: Option<BlockIterator>,
}

impl<'r, R: SstFileHandle> SstFileIterator<'r, R> {
    fn advance_to_next_data_block(&mut self) -> SstResult<()> {
        if !self.index_iterator.has_next() {
            self.data_iterator = None;
            return Ok(());
        }
        let (_, handle_value, _) = self.index_iterator.next()?;
        let mut input = handle_value.to_input().with_order(self.reader.byte_order);
        let block_handle = BlockHandle::read(&mut input)?;
        let data_reader = SstFileReader::<R>::read_block(
            &self.reader.cache,
            self.reader.handle.as_ref(),
            &self.reader.file_path,
            block_handle,
            false,
            Arc::clone(&self.reader.comparator),
            self.reader.byte_order,
        )?;
        self.data_iterator = Some(data_reader.iterator());
        Ok(())
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.data_iterator
            .as_ref()
            .map(BlockIterator::has_next)
            .unwrap_or(false)
    }

    pub fn next(&mut self) -> SstResult<(MemorySlice, MemorySlice)> {
        loop {
            if let Some(it) = &mut self.data_iterator {
                if it.has_next() {
                    let (key, value, _) = it.next()?;
                    return Ok((key, value));
                }
            }
            if !self.index_iterator.has_next() {
                return Err(SstError::OutOfRange(
                    "next() called on an exhausted file iterator".to_string(),
                ));
            }
            self.advance_to_next_data_block()?;
        }
    }

    /// Positions the index iterator at `key`, then the selected data
    /// iterator. If the index iterator is exhausted after seeking, the
    /// file iterator becomes empty.
    pub fn seek_to(&mut self, key: &[u8]) -> SstResult<()> {
        self.index_iterator.seek_to(key)?;
        if self.index_iterator.has_next() {
            self.advance_to_next_data_block()?;
            if let Some(it) = &mut self.data_iterator {
                it.seek_to(key)?;
            }
        } else {
            self.data_iterator = None;
        }
        Ok(())
    }
}
