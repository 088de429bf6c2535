use std::cmp::min;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tracing::debug;

use kura_store::ClusterMapRef;
use kura_types::codec::FileCodec;
use kura_types::{ChunkedFile, CHUNK_SIZE};

use crate::err::{ChecksumDisabledSnafu, Result};

/// Where a flush publishes the buffered file.
struct PublishTarget {
    name: String,
    store: ClusterMapRef,
    codec: Arc<dyn FileCodec>,
}

/// Append-only producer of a chunked file.
///
/// The writer owns its file outright while writing; nothing observes the
/// buffered bytes until `flush` encodes a snapshot and publishes it into
/// the namespace map. Chunks are allocated lazily as the cursor crosses
/// into them and are retained across `reset` so a recycled writer appends
/// into the capacity it already paid for.
pub struct FileWriter {
    file: ChunkedFile,
    target: Option<PublishTarget>,
    crc: Option<crc32fast::Hasher>,
    /// Namespace-wide capacity counter; only writers handed out by a
    /// directory carry it, so files decoded back from the store never
    /// re-contribute.
    accounting: Option<Arc<AtomicI64>>,
    current_index: usize,
    chunk_start: u64,
    chunk_len: usize,
    pos: usize,
    started: bool,
    dirty: bool,
}

impl FileWriter {
    /// Writer bound to a namespace entry; `flush` publishes under `name`.
    pub(crate) fn new(
        name: &str,
        file: ChunkedFile,
        store: ClusterMapRef,
        codec: Arc<dyn FileCodec>,
        accounting: Arc<AtomicI64>,
    ) -> Self {
        Self {
            file,
            target: Some(PublishTarget {
                name: name.to_string(),
                store,
                codec,
            }),
            crc: Some(crc32fast::Hasher::new()),
            accounting: Some(accounting),
            current_index: 0,
            chunk_start: 0,
            chunk_len: 0,
            pos: 0,
            started: false,
            dirty: false,
        }
    }

    /// Unbound writer producing an in-memory file only; `flush` just seals
    /// the length. Scratch buffers skip the checksum when they do not need
    /// integrity verification.
    pub fn scratch(file: ChunkedFile, checksum: bool) -> Self {
        Self {
            file,
            target: None,
            crc: checksum.then(crc32fast::Hasher::new),
            accounting: None,
            current_index: 0,
            chunk_start: 0,
            chunk_len: 0,
            pos: 0,
            started: false,
            dirty: false,
        }
    }

    pub fn write_byte(&mut self, b: u8) {
        if self.pos == self.chunk_len {
            self.switch_chunk();
        }
        if let Some(crc) = &mut self.crc {
            crc.update(&[b]);
        }
        self.file.chunk_mut(self.current_index)[self.pos] = b;
        self.pos += 1;
        self.dirty = true;
    }

    pub fn write_bytes(&mut self, buf: &[u8]) {
        if let Some(crc) = &mut self.crc {
            crc.update(buf);
        }

        let mut total_write_len = 0;
        while total_write_len < buf.len() {
            if self.pos == self.chunk_len {
                self.switch_chunk();
            }
            let to_copy = min(buf.len() - total_write_len, self.chunk_len - self.pos);
            let chunk = self.file.chunk_mut(self.current_index);
            chunk[self.pos..self.pos + to_copy]
                .copy_from_slice(&buf[total_write_len..total_write_len + to_copy]);
            self.pos += to_copy;
            total_write_len += to_copy;
        }
        self.dirty = true;
    }

    /// Moves the cursor into the next chunk, allocating one when the
    /// cursor is at the end of the chunk list and reusing the retained
    /// chunk otherwise. The active bound is the chunk's actual capacity,
    /// which keeps a pre-existing odd-sized first chunk writable.
    fn switch_chunk(&mut self) {
        let index = if self.started { self.current_index + 1 } else { 0 };
        if index == self.file.chunk_count() {
            self.file.allocate_chunk(CHUNK_SIZE);
            if let Some(counter) = &self.accounting {
                counter.fetch_add(CHUNK_SIZE as i64, Ordering::Relaxed);
            }
        }
        self.started = true;
        self.current_index = index;
        self.chunk_start = index as u64 * CHUNK_SIZE as u64;
        self.chunk_len = self.file.chunk(index).len();
        self.pos = 0;
    }

    /// Current logical append offset.
    pub fn file_pointer(&self) -> u64 {
        if !self.started {
            0
        } else {
            self.chunk_start + self.pos as u64
        }
    }

    /// Seals the logical length and publishes the current state under the
    /// bound name. Flushing again without new writes re-publishes the same
    /// snapshot.
    pub fn flush(&mut self) -> Result<()> {
        let pointer = self.file_pointer();
        if pointer > self.file.length() {
            self.file.set_length(pointer);
        }
        if let Some(target) = &self.target {
            let encoded = target.codec.encode(&self.file)?;
            target.store.put(&target.name, encoded)?;
            debug!(
                "published {} (length {}, {} allocated)",
                target.name,
                self.file.length(),
                kura_utils::readable_size::ReadableSize(self.file.size_in_bytes()),
            );
        }
        self.dirty = false;
        Ok(())
    }

    /// Flushes iff there are unpublished writes; closing twice in a row is
    /// a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.dirty {
            self.flush()?;
        }
        Ok(())
    }

    /// Rewinds to the start for buffer reuse: cursor and checksum restart,
    /// logical length truncates to zero, allocated chunks stay.
    pub fn reset(&mut self) {
        self.started = false;
        self.current_index = 0;
        self.chunk_start = 0;
        self.chunk_len = 0;
        self.pos = 0;
        self.file.set_length(0);
        if let Some(crc) = &mut self.crc {
            crc.reset();
        }
    }

    /// CRC32 over every byte written since construction or the last
    /// `reset`.
    pub fn checksum(&self) -> Result<u32> {
        match &self.crc {
            Some(crc) => Ok(crc.clone().finalize()),
            None => ChecksumDisabledSnafu.fail(),
        }
    }

    /// Capacity held by the buffered file, for memory accounting. Grows at
    /// allocation time and survives `reset`.
    pub fn ram_bytes_used(&self) -> u64 {
        self.file.size_in_bytes()
    }

    pub fn file(&self) -> &ChunkedFile {
        &self.file
    }

    pub fn into_file(self) -> ChunkedFile {
        self.file
    }
}
