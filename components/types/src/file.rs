use serde::{Deserialize, Serialize};

/// A logical file stored as an ordered run of fixed-capacity byte chunks.
///
/// `length` is the number of meaningful bytes; `size_in_bytes` is the
/// capacity allocated across all chunks. The last chunk is usually only
/// partially meaningful, so `length <= size_in_bytes` always holds.
///
/// While a file is being produced it is owned exclusively by its writer;
/// once published into the namespace map it is decoded back as an immutable
/// snapshot and shared between readers behind an `Arc`.
///
/// Field order matters: the wire codec serializes `length`, then
/// `size_in_bytes`, then the chunk run, in that order.
#[derive(Default, Serialize, Deserialize)]
pub struct ChunkedFile {
    length: u64,
    size_in_bytes: u64,
    chunks: Vec<Box<[u8]>>,
}

impl ChunkedFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a zero-filled chunk of the requested capacity and returns it
    /// for the caller to fill. Capacity accounting grows by `size` and never
    /// shrinks for the lifetime of the file.
    pub fn allocate_chunk(&mut self, size: usize) -> &mut [u8] {
        self.chunks.push(vec![0u8; size].into_boxed_slice());
        self.size_in_bytes += size as u64;
        self.chunks.last_mut().unwrap()
    }

    /// Panics when `index >= chunk_count()`; cursor arithmetic in the
    /// writer and reader keeps indexes in range.
    pub fn chunk(&self, index: usize) -> &[u8] {
        &self.chunks[index]
    }

    pub fn chunk_mut(&mut self, index: usize) -> &mut [u8] {
        &mut self.chunks[index]
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn set_length(&mut self, length: u64) {
        self.length = length;
    }

    /// Allocated capacity, distinct from the logical length. This is the
    /// quantity the namespace-level memory accounting tracks.
    pub fn size_in_bytes(&self) -> u64 {
        self.size_in_bytes
    }
}

impl std::fmt::Debug for ChunkedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedFile")
            .field("length", &self.length)
            .field("size_in_bytes", &self.size_in_bytes)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CHUNK_SIZE;

    #[test]
    fn allocate_tracks_capacity() {
        let mut file = ChunkedFile::new();
        assert_eq!(file.chunk_count(), 0);
        assert_eq!(file.size_in_bytes(), 0);

        let chunk = file.allocate_chunk(CHUNK_SIZE);
        assert_eq!(chunk.len(), CHUNK_SIZE);
        assert!(chunk.iter().all(|b| *b == 0));

        file.allocate_chunk(CHUNK_SIZE);
        assert_eq!(file.chunk_count(), 2);
        assert_eq!(file.size_in_bytes(), 2 * CHUNK_SIZE as u64);
        // logical length is independent of allocation
        assert_eq!(file.length(), 0);
    }

    #[test]
    fn chunks_are_filled_in_place() {
        let mut file = ChunkedFile::new();
        file.allocate_chunk(4)[..3].copy_from_slice(b"abc");
        file.set_length(3);

        assert_eq!(&file.chunk(0)[..3], b"abc");
        assert_eq!(file.chunk(0)[3], 0);
        assert!(file.length() <= file.size_in_bytes());
    }

    #[test]
    #[should_panic]
    fn chunk_out_of_range_panics() {
        let file = ChunkedFile::new();
        let _ = file.chunk(0);
    }
}
