//! Chunk planning
//!
//! A frame of length `L` is cut into `ceil(L / C)` spans of `C` bytes, the
//! last one truncated to `L mod C` (or `C` when it divides evenly). Spans are
//! yielded in increasing offset order with no gaps.

/// One `(offset, size)` slice of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub offset: usize,
    pub size: usize,
}

impl ChunkSpan {
    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// Iterator over the spans covering `[0, len)`.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    len: usize,
    chunk_size: usize,
    next_offset: usize,
}

impl ChunkPlan {
    /// Plan chunks for a payload of `len` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero. [`DeviceConfig::validate`](crate::DeviceConfig::validate)
    /// and [`CaptureTransferEngine::new`](crate::engine::CaptureTransferEngine::new)
    /// both reject such settings up front.
    pub fn new(len: usize, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be non-zero");
        Self { len, chunk_size, next_offset: 0 }
    }

    /// Total number of chunks in the plan.
    pub fn chunk_count(&self) -> usize {
        self.len.div_ceil(self.chunk_size)
    }

    /// Payload length being planned.
    pub fn total_len(&self) -> usize {
        self.len
    }
}

impl Iterator for ChunkPlan {
    type Item = ChunkSpan;

    fn next(&mut self) -> Option<ChunkSpan> {
        if self.next_offset >= self.len {
            return None;
        }
        let offset = self.next_offset;
        let size = self.chunk_size.min(self.len - offset);
        self.next_offset += size;
        Some(ChunkSpan { offset, size })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.next_offset.min(self.len)).div_ceil(self.chunk_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkPlan {}

impl std::iter::FusedIterator for ChunkPlan {}
