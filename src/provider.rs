//! Collaborator traits for the camera, the radio and advertising.
//!
//! The capture pipeline never touches hardware directly. A camera driver
//! implements [`FrameSource`], the notify path of the GATT server implements
//! [`ChunkSink`], and the advertising controller implements [`Advertiser`].

use crate::Result;
use crate::types::Frame;

/// Produces one encoded frame on demand.
#[async_trait::async_trait]
pub trait FrameSource: Send + 'static {
    /// Grab the next frame from the sensor.
    ///
    /// Returns:
    /// - `Ok(frame)` - A frame the caller now owns until [`release`](Self::release)
    /// - `Err(TransferError::FrameUnavailable { .. })` - Sensor busy or failed
    ///
    /// Must tolerate two calls in quick succession (flush, then the real
    /// capture) and must not block indefinitely.
    async fn acquire(&mut self) -> Result<Frame>;

    /// Hand a frame buffer back to the driver.
    fn release(&mut self, frame: Frame);
}

/// Result of delivering one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    /// Chunk queued for notification
    Sent,

    /// Peer is no longer there to receive it
    PeerGone,
}

/// Delivers chunks to the connected peer.
#[async_trait::async_trait]
pub trait ChunkSink: Send + 'static {
    /// Notify one chunk. `chunk.len()` never exceeds the configured chunk size.
    async fn send(&mut self, chunk: &[u8]) -> SendStatus;
}

/// Controls discoverability.
#[async_trait::async_trait]
pub trait Advertiser: Send + 'static {
    /// (Re)start advertising the photo service.
    async fn start(&mut self);
}
