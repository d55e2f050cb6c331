//! Captured frame

use std::sync::Arc;

use super::ChunkPlan;

/// One opaque, already-encoded still image.
///
/// The payload is never inspected on the device side; JPEG framing only
/// matters to the peer when it reassembles chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Encoded image bytes (zero-copy via Arc)
    pub data: Arc<[u8]>,

    /// Monotonic acquisition counter assigned by the frame source
    pub sequence: u32,
}

impl Frame {
    /// Create a new frame
    pub fn new(data: Vec<u8>, sequence: u32) -> Self {
        Self { data: data.into(), sequence }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Plan the chunks that cover this frame.
    pub fn chunk_plan(&self, chunk_size: usize) -> ChunkPlan {
        ChunkPlan::new(self.len(), chunk_size)
    }

    /// Bytes of one planned chunk.
    pub fn slice(&self, span: super::ChunkSpan) -> &[u8] {
        &self.data[span.offset..span.end()]
    }
}
