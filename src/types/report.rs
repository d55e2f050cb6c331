//! Transfer reports and counters

use std::time::Duration;

use super::{Timestamp, TriggerKind};
use crate::{Result, TransferError};

/// Summary of one completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub trigger: TriggerKind,
    /// Sequence number of the transferred frame
    pub frame_sequence: u32,
    pub total_bytes: usize,
    pub chunks_sent: usize,
    pub started_at: Timestamp,
    pub completed_at: Timestamp,
}

impl TransferReport {
    pub fn duration(&self) -> Duration {
        self.completed_at.saturating_since(self.started_at)
    }
}

/// Running counters kept by the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub ticks: u64,
    pub captures: u64,
    pub completed: u64,
    pub aborted: u64,
    pub capture_failures: u64,
    pub skipped: u64,
    pub bytes_sent: u64,
    pub disconnects: u64,
}

impl DeviceStats {
    /// Fold the result of one capture attempt into the counters.
    pub fn record(&mut self, result: &Result<TransferReport>) {
        self.captures += 1;
        match result {
            Ok(report) => {
                self.completed += 1;
                self.bytes_sent += report.total_bytes as u64;
            }
            Err(TransferError::PeerLostMidTransfer { bytes_sent, .. }) => {
                self.aborted += 1;
                self.bytes_sent += *bytes_sent as u64;
            }
            Err(TransferError::FrameUnavailable { .. } | TransferError::EmptyFrame) => {
                self.capture_failures += 1;
            }
            Err(_) => self.skipped += 1,
        }
    }
}
