use std::cmp::min;
use std::sync::Arc;

use snafu::ensure;

use kura_types::{cal_chunk_idx, cal_chunk_offset, ChunkedFile, CHUNK_SIZE, MAX_CHUNK_COUNT};

use crate::err::{FileTooLargeSnafu, ReadPastEofSnafu, Result, SliceOutOfBoundsSnafu};

/// Random-access cursor over a published chunked file.
///
/// A reader addresses a window `[base, base + length)` of the underlying
/// file. The root reader's window is the whole logical length; `slice`
/// returns a reader over a sub-window of the same shared file, and slices
/// of slices compose by plain offset addition. Cloning a reader duplicates
/// the cursor, not the file.
///
/// Cursor arithmetic runs in absolute file coordinates; every public
/// position is window-relative.
#[derive(Clone)]
pub struct FileReader {
    file: Arc<ChunkedFile>,
    resource: String,
    base: u64,
    length: u64,
    positioned: bool,
    current_index: usize,
    chunk_start: u64,
    chunk_len: usize,
    pos: usize,
}

impl FileReader {
    /// Reader over the file's full logical length.
    pub fn new(resource: &str, file: Arc<ChunkedFile>) -> Result<Self> {
        let length = file.length();
        Self::with_window(resource, file, 0, length)
    }

    fn with_window(resource: &str, file: Arc<ChunkedFile>, base: u64, length: u64) -> Result<Self> {
        let end = base + length;
        // Lengths come from the store; refuse anything whose chunk indexes
        // would not stay in range before touching the chunk list.
        ensure!(
            end / CHUNK_SIZE as u64 < MAX_CHUNK_COUNT,
            FileTooLargeSnafu {
                resource,
                length: end,
            }
        );
        Ok(Self {
            file,
            resource: resource.to_string(),
            base,
            length,
            positioned: false,
            current_index: 0,
            chunk_start: 0,
            chunk_len: 0,
            pos: 0,
        })
    }

    /// Window length. A slice reports its own window, not the file extent.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Window-relative cursor position, 0 before the first chunk is active.
    pub fn file_pointer(&self) -> u64 {
        if !self.positioned {
            0
        } else {
            self.chunk_start + self.pos as u64 - self.base
        }
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        // A window ending exactly on a chunk boundary switches into a chunk
        // with an empty valid range first; loop so the read lands on
        // addressable data or reports EOF, never on bytes past the window.
        while self.pos >= self.chunk_len {
            self.advance_chunk()?;
        }
        let b = self.file.chunk(self.current_index)[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Fills all of `dst`, crossing as many chunk boundaries as needed.
    /// Fails without draining the window when fewer bytes remain.
    pub fn read_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        let mut total_read_len = 0;
        while total_read_len < dst.len() {
            if self.pos >= self.chunk_len {
                self.advance_chunk()?;
            }
            let to_copy = min(dst.len() - total_read_len, self.chunk_len - self.pos);
            let chunk = self.file.chunk(self.current_index);
            dst[total_read_len..total_read_len + to_copy]
                .copy_from_slice(&chunk[self.pos..self.pos + to_copy]);
            self.pos += to_copy;
            total_read_len += to_copy;
        }
        Ok(())
    }

    /// Repositions the cursor to a window-relative offset. Staying inside
    /// the active chunk's fixed-size range only moves the in-chunk
    /// position; anything else re-evaluates the chunk. Seeking at or past
    /// the window end is tolerated; the following read reports EOF.
    pub fn seek(&mut self, pos: u64) {
        let abs = self.base + pos;
        if !self.positioned
            || abs < self.chunk_start
            || abs >= self.chunk_start + CHUNK_SIZE as u64
        {
            let index = cal_chunk_idx(abs, CHUNK_SIZE);
            if !self.switch_chunk(index) {
                // Past the end of the data: park the cursor on the
                // attempted chunk with an empty valid range so the next
                // read runs the switch again and fails there.
                self.positioned = index > 0;
                self.current_index = index.saturating_sub(1);
                self.chunk_start = index as u64 * CHUNK_SIZE as u64;
                self.chunk_len = 0;
            }
        }
        self.pos = cal_chunk_offset(abs, CHUNK_SIZE);
    }

    /// Read-only sub-window `[offset, offset + len)` of this reader's own
    /// window, positioned at 0. Offsets compose across nested slices.
    pub fn slice(&self, description: &str, offset: u64, len: u64) -> Result<FileReader> {
        ensure!(
            offset
                .checked_add(len)
                .map_or(false, |end| end <= self.length),
            SliceOutOfBoundsSnafu {
                description,
                offset,
                len,
                length: self.length,
            }
        );
        let resource = format!("{} [slice={}]", self.resource, description);
        let mut sliced = Self::with_window(&resource, self.file.clone(), self.base + offset, len)?;
        sliced.seek(0);
        Ok(sliced)
    }

    /// Makes `index` the active chunk when it still holds addressable
    /// data. The `<=` on the window end is deliberate: a window ending
    /// exactly on a chunk boundary keeps its final full chunk readable.
    fn switch_chunk(&mut self, index: usize) -> bool {
        let chunk_start = index as u64 * CHUNK_SIZE as u64;
        let end = self.base + self.length;
        if chunk_start <= end && index < self.file.chunk_count() {
            self.positioned = true;
            self.current_index = index;
            self.chunk_start = chunk_start;
            self.pos = 0;
            let window = min(CHUNK_SIZE as u64, end - chunk_start) as usize;
            // the chunk actually fetched bounds the read, not the
            // configured chunk size
            self.chunk_len = min(window, self.file.chunk(index).len());
            true
        } else {
            false
        }
    }

    fn advance_chunk(&mut self) -> Result<()> {
        let next = if self.positioned {
            self.current_index + 1
        } else {
            0
        };
        ensure!(
            self.switch_chunk(next),
            ReadPastEofSnafu {
                resource: self.resource.clone(),
                position: self.file_pointer(),
                length: self.length,
            }
        );
        Ok(())
    }
}

impl std::fmt::Debug for FileReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileReader")
            .field("resource", &self.resource)
            .field("base", &self.base)
            .field("length", &self.length)
            .field("position", &self.file_pointer())
            .finish()
    }
}
