//! Orchestrates data blocks, the index block, the bloom filter, and the
//! footer into one finished SST file.

use crate::block::{BlockHandle, BlockTrailer, BlockWriter, BloomFilterHandle, Footer};
use crate::config::SstConfig;
use crate::error::SstResult;
use crate::file::{SstFileSystem, SstFileWriteHandle};
use crate::hash::KeyHasher;
use crate::memory::pool::MemoryPool;
use bloom::BloomFilter;
use std::path::Path;
use std::sync::Arc;

/// Builds one SST file from a key-ordered stream of `(key, value)` writes.
/// `write` calls must arrive in non-decreasing key order; this is the
/// caller's contract and is never checked here.
pub struct SstFileWriter<'p, W: SstFileWriteHandle> {
    out: W,
    data_block_writer: BlockWriter<'p>,
    index_block_writer: BlockWriter<'p>,
    last_key: Option<Vec<u8>>,
    bloom_filter: Option<BloomFilter>,
    key_hasher: Arc<dyn KeyHasher>,
    config: SstConfig,
    pool: &'p dyn MemoryPool,
}

impl<'p, W: SstFileWriteHandle> SstFileWriter<'p, W> {
    pub fn create<FS: SstFileSystem<WriteHandle = W>>(
        fs: &FS,
        path: &Path,
        config: SstConfig,
        pool: &'p dyn MemoryPool,
        key_hasher: Arc<dyn KeyHasher>,
    ) -> SstResult<Self> {
        let out = fs.create_write(path)?;
        let bloom_filter = config
            .bloom_expected_entries
            .map(|n| BloomFilter::for_entries(n, config.bloom_bits_per_entry));
        Ok(Self {
            out,
            data_block_writer: BlockWriter::new(config.block_size_target, pool, config.byte_order),
            index_block_writer: BlockWriter::new(4096, pool, config.byte_order),
            last_key: None,
            bloom_filter,
            key_hasher,
            config,
            pool,
        })
    }

    /// Appends one entry to the active data block, rolling over to a new
    /// block and recording an index entry once the current one crosses
    /// `block_size_target`.
    pub fn write(&mut self, key: &[u8], value: &[u8]) -> SstResult<()> {
        self.data_block_writer.write(key, value)?;
        self.last_key = Some(key.to_vec());
        if self.data_block_writer.memory() > self.config.block_size_target {
            self.flush()?;
        }
        if let Some(bloom) = &mut self.bloom_filter {
            bloom.add_hash(self.key_hasher.hash(key));
        }
        Ok(())
    }

    /// Seals the active data block (if non-empty) and records its handle
    /// in the index block under `last_key`.
    pub fn flush(&mut self) -> SstResult<()> {
        if self.data_block_writer.is_empty() {
            return Ok(());
        }
        let handle = self.flush_block(true)?;
        let last_key = self
            .last_key
            .clone()
            .expect("write() always sets last_key before a non-empty block can flush");
        let handle_slice = handle.write(self.pool, self.config.byte_order)?;
        self.index_block_writer
            .write(&last_key, handle_slice.as_bytes())?;
        Ok(())
    }

    fn flush_block(&mut self, is_data: bool) -> SstResult<BlockHandle> {
        let offset = self.out.position();
        let block_data = if is_data {
            self.data_block_writer.finish()?
        } else {
            self.index_block_writer.finish()?
        };
        let trailer = BlockTrailer::for_payload(block_data.as_bytes());
        let trailer_slice = trailer.write(self.pool, self.config.byte_order)?;

        self.out.write_all(block_data.as_bytes())?;
        self.out.write_all(trailer_slice.as_bytes())?;

        if is_data {
            self.data_block_writer.reset();
        } else {
            self.index_block_writer.reset();
        }
        Ok(BlockHandle::new(offset, block_data.len() as u32))
    }

    /// Flushes any remaining data, writes the index block, the optional
    /// bloom filter bitset, and the footer, then syncs the file. The
    /// footer write is the commit point: a reader opening the file before
    /// this returns sees an incomplete, unreadable file.
    pub fn finish(mut self) -> SstResult<()> {
        self.flush()?;
        let index_handle = self.flush_block(false)?;

        let bloom_handle = if let Some(bloom) = &self.bloom_filter {
            let offset = self.out.position();
            let mut bitset = Vec::new();
            bloom
                .write_to(&mut bitset)
                .expect("writing to an in-memory Vec cannot fail");
            self.out.write_all(&bitset)?;
            BloomFilterHandle::new(offset, bitset.len() as u32, bloom.expected_entries())
        } else {
            BloomFilterHandle::absent()
        };

        let footer = Footer::new(index_handle, bloom_handle);
        let footer_slice = footer.write(self.pool, self.config.byte_order)?;
        self.out.write_all(footer_slice.as_bytes())?;
        self.out.sync()?;
        log::debug!("sst file sealed at {} bytes", self.out.position());
        Ok(())
    }
}
