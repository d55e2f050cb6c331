//! Capture and chunked transfer
//!
//! [`CaptureTransferEngine::run_capture`] is the only entry point. It walks
//! `Idle -> Capturing -> Transmitting -> Idle`; every failure folds back to
//! `Idle` and nothing is retried within a call.
//!
//! Mutual exclusion rests on one flag, held through a [`TransferPermit`]
//! for the whole call. Dropping the permit clears the flag and returns the
//! state to `Idle`, so no exit path can leave the device wedged.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::config::DeviceConfig;
use crate::connection::Connection;
use crate::provider::{ChunkSink, FrameSource, SendStatus};
use crate::types::{DeviceClock, Frame, TransferReport, TriggerKind};
use crate::{Result, TransferError};

/// Where the engine is in one capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Idle,
    Capturing,
    Transmitting,
}

/// The "transfer in progress" flag.
#[derive(Debug)]
pub struct TransferGuard {
    in_progress: AtomicBool,
    state: watch::Sender<EngineState>,
}

impl Default for TransferGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferGuard {
    pub fn new() -> Self {
        let (state, _) = watch::channel(EngineState::Idle);
        Self { in_progress: AtomicBool::new(false), state }
    }

    /// Take the flag, or `None` if another transfer owns it.
    pub fn try_acquire(self: &Arc<Self>) -> Option<TransferPermit> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TransferPermit { guard: Arc::clone(self) })
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }
}

/// Ownership of the transfer flag. Released on drop.
#[derive(Debug)]
pub struct TransferPermit {
    guard: Arc<TransferGuard>,
}

impl TransferPermit {
    fn enter(&self, state: EngineState) {
        self.guard.state.send_replace(state);
    }
}

impl Drop for TransferPermit {
    fn drop(&mut self) {
        self.guard.state.send_replace(EngineState::Idle);
        self.guard.in_progress.store(false, Ordering::Release);
    }
}

/// Engine tunables, lifted from [`DeviceConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub chunk_size: usize,
    pub chunk_delay: Duration,
    pub flush_frames: u8,
}

impl From<&DeviceConfig> for EngineSettings {
    fn from(config: &DeviceConfig) -> Self {
        Self {
            chunk_size: config.transport.chunk_size,
            chunk_delay: config.timing.chunk_delay(),
            flush_frames: config.timing.flush_frames,
        }
    }
}

/// Captures one frame and pushes it to the peer in chunks.
pub struct CaptureTransferEngine<S, K> {
    source: S,
    sink: K,
    connection: Arc<Connection>,
    guard: Arc<TransferGuard>,
    settings: EngineSettings,
    clock: DeviceClock,
}

impl<S: FrameSource, K: ChunkSink> CaptureTransferEngine<S, K> {
    /// Build an engine. Fails with [`TransferError::Config`] on a zero chunk size.
    pub fn new(
        source: S,
        sink: K,
        connection: Arc<Connection>,
        guard: Arc<TransferGuard>,
        settings: EngineSettings,
        clock: DeviceClock,
    ) -> Result<Self> {
        if settings.chunk_size == 0 {
            return Err(TransferError::config_error("chunk_size must be non-zero"));
        }
        Ok(Self { source, sink, connection, guard, settings, clock })
    }

    pub fn guard(&self) -> &Arc<TransferGuard> {
        &self.guard
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Capture a fresh frame and transfer it.
    ///
    /// Returns a report when every chunk was delivered. Errors:
    /// - [`TransferError::TransferAlreadyInProgress`] - another call owns the guard
    /// - [`TransferError::PeerNotConnected`] - nobody to send to
    /// - [`TransferError::FrameUnavailable`] / [`TransferError::EmptyFrame`] - nothing to send
    /// - [`TransferError::PeerLostMidTransfer`] - peer left between chunks
    ///
    /// The frame is always released and the guard always cleared before
    /// this returns.
    pub async fn run_capture(&mut self, trigger: TriggerKind) -> Result<TransferReport> {
        let guard = Arc::clone(&self.guard);
        let Some(permit) = guard.try_acquire() else {
            warn!(%trigger, "Transfer already in progress, request dropped");
            return Err(TransferError::TransferAlreadyInProgress);
        };

        if !self.connection.is_attached() {
            warn!(%trigger, "No peer connected, capture skipped");
            return Err(TransferError::PeerNotConnected);
        }

        let started_at = self.clock.now();
        permit.enter(EngineState::Capturing);
        self.flush_stale_frames().await;

        debug!(%trigger, "Capturing frame");
        let frame = match self.source.acquire().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!(%trigger, "Capture failed: {}", e);
                return Err(e);
            }
        };

        if frame.is_empty() {
            warn!(%trigger, sequence = frame.sequence, "Camera returned an empty frame");
            self.source.release(frame);
            return Err(TransferError::EmptyFrame);
        }

        permit.enter(EngineState::Transmitting);
        let sequence = frame.sequence;
        let total_bytes = frame.len();
        let transmitted = self.transmit(&frame).await;
        self.source.release(frame);

        let chunks_sent = transmitted?;
        let report = TransferReport {
            trigger,
            frame_sequence: sequence,
            total_bytes,
            chunks_sent,
            started_at,
            completed_at: self.clock.now(),
        };
        info!(
            %trigger,
            sequence,
            bytes = total_bytes,
            chunks = chunks_sent,
            elapsed_ms = report.duration().as_millis() as u64,
            "Frame sent"
        );
        Ok(report)
    }

    /// Drain frames the driver buffered before the trigger.
    async fn flush_stale_frames(&mut self) {
        for _ in 0..self.settings.flush_frames {
            match self.source.acquire().await {
                Ok(stale) => {
                    trace!(sequence = stale.sequence, "Discarding stale frame");
                    self.source.release(stale);
                }
                Err(e) => debug!("Flush acquisition failed: {}", e),
            }
        }
    }

    /// Send every chunk of `frame` in offset order, pacing between chunks.
    ///
    /// Stops at the first chunk boundary where the peer is gone.
    async fn transmit(&mut self, frame: &Frame) -> Result<usize> {
        let plan = frame.chunk_plan(self.settings.chunk_size);
        let total_bytes = plan.total_len();
        debug!(
            bytes = total_bytes,
            chunks = plan.chunk_count(),
            chunk_size = self.settings.chunk_size,
            "Sending frame"
        );

        let mut chunks_sent = 0;
        let mut bytes_sent = 0;
        for span in plan {
            if !self.connection.is_attached() {
                warn!(chunks_sent, bytes_sent, total_bytes, "Peer disconnected mid-transfer, aborting");
                return Err(TransferError::PeerLostMidTransfer { chunks_sent, bytes_sent, total_bytes });
            }

            if self.sink.send(frame.slice(span)).await == SendStatus::PeerGone {
                warn!(chunks_sent, bytes_sent, total_bytes, "Sink reports peer gone, aborting");
                return Err(TransferError::PeerLostMidTransfer { chunks_sent, bytes_sent, total_bytes });
            }

            chunks_sent += 1;
            bytes_sent += span.size;
            trace!(offset = span.offset, size = span.size, "Chunk sent");

            tokio::time::sleep(self.settings.chunk_delay).await;
        }

        Ok(chunks_sent)
    }
}
