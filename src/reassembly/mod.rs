//! Peer-side reassembly of notified chunks into images.
//!
//! The device streams each frame as a run of chunks with no header or
//! terminator of its own; the JPEG SOI/EOI markers are the only framing. A
//! central uses [`FrameAssembler`] (or the [`ReassembleExt`] stream adapter)
//! to rebuild images and to notice transfers cut short by a disconnect.
//!
//! ```rust
//! use shutterlink::reassembly::FrameAssembler;
//!
//! let image = [0xFF, 0xD8, 0x10, 0x20, 0xFF, 0xD9];
//! let mut assembler = FrameAssembler::default();
//! assert!(assembler.push(&image[..3]).is_empty());
//! let frames = assembler.push(&image[3..]);
//! assert!(frames[0].is_complete());
//! ```

mod assembler;
pub mod nrf_log;
mod stream;

pub use assembler::{AssembledFrame, DEFAULT_MAX_FRAME_LEN, EOI, FrameAssembler, FrameStatus, SOI};
pub use stream::{Reassemble, ReassembleExt};
