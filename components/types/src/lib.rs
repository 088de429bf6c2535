pub mod codec;
pub mod file;

pub use file::ChunkedFile;

/// Every chunk a writer allocates has this capacity. The value is part of
/// the on-wire layout only indirectly (chunks carry their own lengths), but
/// the reader's index arithmetic assumes it, so changing it invalidates
/// already published files.
pub const CHUNK_SIZE: usize = 1 << 10; // 1 KiB

/// Upper bound on the chunk index a reader will ever compute. Lengths coming
/// out of the store are untrusted; a reader over a file whose length reaches
/// this many chunks is refused outright.
pub const MAX_CHUNK_COUNT: u64 = u32::MAX as u64;

pub type ChunkIndex = usize;
pub type FileOffset = u64;

pub fn cal_chunk_idx(offset: FileOffset, chunk_size: usize) -> ChunkIndex {
    (offset / chunk_size as u64) as ChunkIndex
}

pub fn cal_chunk_offset(offset: FileOffset, chunk_size: usize) -> usize {
    (offset % chunk_size as u64) as usize
}
