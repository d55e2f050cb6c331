//! Test doubles for the camera, the notify path and advertising
//!
//! Every double is cheaply cloneable and shares its bookkeeping, so a test
//! can hand one clone to the engine and keep another to inspect afterwards.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::connection::ConnectionTracker;
use crate::provider::{Advertiser, ChunkSink, FrameSource, SendStatus};
use crate::types::Frame;
use crate::{Result, TransferError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct SourceLog {
    script: VecDeque<Option<Vec<u8>>>,
    fallback_len: Option<usize>,
    acquisitions: usize,
    failures: usize,
    releases: usize,
    released_sequences: Vec<u32>,
}

/// Scripted frame source.
///
/// Each acquisition pops the next scripted entry (`None` means the camera
/// failed). Once the script is exhausted it falls back to frames of a fixed
/// length, or to failures if no length was given.
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    log: Arc<Mutex<SourceLog>>,
}

impl MockSource {
    /// Every acquisition succeeds with `len` bytes of a recognisable pattern.
    pub fn with_frame_len(len: usize) -> Self {
        let source = Self::default();
        lock(&source.log).fallback_len = Some(len);
        source
    }

    /// Play back `script` in order, then fail.
    pub fn scripted(script: impl IntoIterator<Item = Option<Vec<u8>>>) -> Self {
        let source = Self::default();
        lock(&source.log).script = script.into_iter().collect();
        source
    }

    pub fn acquisitions(&self) -> usize {
        lock(&self.log).acquisitions
    }

    pub fn releases(&self) -> usize {
        lock(&self.log).releases
    }

    /// Frames handed out whose buffers have not come back.
    pub fn outstanding(&self) -> usize {
        let log = lock(&self.log);
        log.acquisitions - log.failures - log.releases
    }

    pub fn released_sequences(&self) -> Vec<u32> {
        lock(&self.log).released_sequences.clone()
    }
}

#[async_trait::async_trait]
impl FrameSource for MockSource {
    async fn acquire(&mut self) -> Result<Frame> {
        let mut log = lock(&self.log);
        log.acquisitions += 1;
        let sequence = log.acquisitions as u32;

        let next = match log.script.pop_front() {
            Some(entry) => entry,
            None => log.fallback_len.map(|len| (0..len).map(|i| (i % 251) as u8).collect()),
        };

        match next {
            Some(data) => Ok(Frame::new(data, sequence)),
            None => {
                log.failures += 1;
                Err(TransferError::frame_unavailable("scripted camera failure"))
            }
        }
    }

    fn release(&mut self, frame: Frame) {
        let mut log = lock(&self.log);
        log.releases += 1;
        log.released_sequences.push(frame.sequence);
    }
}

#[derive(Debug, Default)]
struct SinkLog {
    chunks: Vec<Vec<u8>>,
}

/// Chunk sink that records everything it is given.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: Arc<Mutex<SinkLog>>,
    disconnect_after: Option<(usize, ConnectionTracker)>,
    gone_after: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the tracker's disconnect callback once `count` chunks were sent,
    /// as the radio stack would from its own context.
    pub fn disconnect_after(mut self, count: usize, tracker: ConnectionTracker) -> Self {
        self.disconnect_after = Some((count, tracker));
        self
    }

    /// Report [`SendStatus::PeerGone`] for every send after the first `count`.
    pub fn gone_after(mut self, count: usize) -> Self {
        self.gone_after = Some(count);
        self
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        lock(&self.log).chunks.iter().map(Vec::len).collect()
    }

    /// All received bytes, concatenated.
    pub fn payload(&self) -> Vec<u8> {
        lock(&self.log).chunks.concat()
    }
}

#[async_trait::async_trait]
impl ChunkSink for RecordingSink {
    async fn send(&mut self, chunk: &[u8]) -> SendStatus {
        let sent = {
            let mut log = lock(&self.log);
            if self.gone_after.is_some_and(|limit| log.chunks.len() >= limit) {
                return SendStatus::PeerGone;
            }
            log.chunks.push(chunk.to_vec());
            log.chunks.len()
        };

        if let Some((count, tracker)) = &self.disconnect_after {
            if sent == *count {
                tracker.on_disconnect();
            }
        }
        SendStatus::Sent
    }
}

/// Advertiser that only counts restarts.
#[derive(Debug, Clone, Default)]
pub struct CountingAdvertiser {
    starts: Arc<AtomicUsize>,
}

impl CountingAdvertiser {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::Acquire)
    }
}

#[async_trait::async_trait]
impl Advertiser for CountingAdvertiser {
    async fn start(&mut self) {
        self.starts.fetch_add(1, Ordering::AcqRel);
    }
}

/// Minimal JPEG-shaped payload: SOI, `body_len` filler bytes, EOI.
pub fn jpeg_like(body_len: usize, fill: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(body_len + 4);
    data.extend_from_slice(&[0xFF, 0xD8]);
    data.extend(std::iter::repeat_n(fill, body_len));
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}
