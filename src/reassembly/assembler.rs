//! Chunk-to-image reassembly

use tracing::{debug, warn};

/// JPEG start-of-image marker.
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// JPEG end-of-image marker.
pub const EOI: [u8; 2] = [0xFF, 0xD9];

/// Images larger than this are abandoned rather than buffered further.
pub const DEFAULT_MAX_FRAME_LEN: usize = 1 << 20;

/// Whether a reassembled image arrived whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// SOI through EOI
    Complete,
    /// Cut short by a new SOI, the size cap, or the end of input
    Truncated,
}

/// One image rebuilt from notification chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFrame {
    pub data: Vec<u8>,
    pub status: FrameStatus,
}

impl AssembledFrame {
    pub fn is_complete(&self) -> bool {
        self.status == FrameStatus::Complete
    }
}

/// Rebuilds images from a chunk sequence.
///
/// The device sends no per-frame header, so boundaries come from the JPEG
/// markers: a chunk that starts with SOI opens a new image, and a buffer that
/// ends with EOI closes one. A new SOI while an image is still open means the
/// previous transfer was cut off.
///
/// Closing on a trailing EOI assumes the device sends each frame as its own
/// run of chunks ending at the frame's last byte. An `FF D9` pair that
/// happens to end a chunk in the middle of an image (inside an embedded
/// thumbnail, say) closes the image early; the rest of its chunks are then
/// dropped as orphans until the next SOI.
#[derive(Debug)]
pub struct FrameAssembler {
    buffer: Vec<u8>,
    max_frame_len: usize,
    discarded_bytes: usize,
    damaged: bool,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

impl FrameAssembler {
    pub fn new(max_frame_len: usize) -> Self {
        Self { buffer: Vec::new(), max_frame_len, discarded_bytes: 0, damaged: false }
    }

    /// Bytes dropped because they did not belong to any image.
    pub fn discarded_bytes(&self) -> usize {
        self.discarded_bytes
    }

    /// Bytes of the image currently being assembled.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one chunk, returning any images it finished.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<AssembledFrame> {
        let mut finished = Vec::new();

        if chunk.starts_with(&SOI) {
            if let Some(partial) = self.take(FrameStatus::Truncated) {
                warn!(bytes = partial.data.len(), "New image started before previous one ended");
                finished.push(partial);
            }
        } else if self.buffer.is_empty() {
            debug!(bytes = chunk.len(), "Dropping chunk outside any image");
            self.discarded_bytes += chunk.len();
            return finished;
        }

        self.buffer.extend_from_slice(chunk);

        if self.buffer.len() >= SOI.len() + EOI.len() && self.buffer.ends_with(&EOI) {
            finished.extend(self.take(FrameStatus::Complete));
        } else if self.buffer.len() > self.max_frame_len {
            warn!(bytes = self.buffer.len(), limit = self.max_frame_len, "Image exceeds size cap");
            finished.extend(self.take(FrameStatus::Truncated));
        }

        finished
    }

    /// Flush whatever is buffered at end of input.
    pub fn finish(&mut self) -> Option<AssembledFrame> {
        self.take(FrameStatus::Truncated)
    }

    /// Record that a chunk of the open image was lost.
    ///
    /// The image is still assembled, but reported as truncated. With no
    /// image open this does nothing.
    pub fn mark_damaged(&mut self) {
        if !self.buffer.is_empty() {
            self.damaged = true;
        }
    }

    fn take(&mut self, status: FrameStatus) -> Option<AssembledFrame> {
        let damaged = std::mem::take(&mut self.damaged);
        if self.buffer.is_empty() {
            return None;
        }
        let status = if damaged { FrameStatus::Truncated } else { status };
        Some(AssembledFrame { data: std::mem::take(&mut self.buffer), status })
    }
}
