//! Core types shared by the capture pipeline.
//!
//! - [`Frame`] is one opaque encoded image owned by the engine for one transfer
//! - [`ChunkPlan`] yields the `(offset, size)` spans a frame is sent in
//! - [`TriggerKind`] names why a capture ran
//! - [`TransferReport`] summarises one capture attempt
//! - [`DeviceClock`] stamps events in milliseconds since boot
//!
//! ```rust
//! use shutterlink::types::Frame;
//!
//! let frame = Frame::new(vec![0u8; 500], 1);
//! let sizes: Vec<usize> = frame.chunk_plan(240).map(|span| span.size).collect();
//! assert_eq!(sizes, vec![240, 240, 20]);
//! ```

mod chunk;
mod clock;
mod frame;
mod report;
mod trigger;

pub use chunk::{ChunkPlan, ChunkSpan};
pub use clock::{DeviceClock, Timestamp};
pub use frame::Frame;
pub use report::{DeviceStats, TransferReport};
pub use trigger::TriggerKind;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_slices_follow_plan() {
        let data: Vec<u8> = (0..=255u8).cycle().take(500).collect();
        let frame = Frame::new(data.clone(), 7);

        let mut rebuilt = Vec::new();
        for span in frame.chunk_plan(240) {
            rebuilt.extend_from_slice(frame.slice(span));
        }
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn stats_fold_results() {
        let mut stats = DeviceStats::default();
        let report = TransferReport {
            trigger: TriggerKind::Manual,
            frame_sequence: 1,
            total_bytes: 500,
            chunks_sent: 3,
            started_at: Timestamp::from_millis(0),
            completed_at: Timestamp::from_millis(60),
        };
        assert_eq!(report.duration(), std::time::Duration::from_millis(60));

        stats.record(&Ok(report));
        stats.record(&Err(crate::TransferError::PeerLostMidTransfer {
            chunks_sent: 2,
            bytes_sent: 480,
            total_bytes: 500,
        }));
        stats.record(&Err(crate::TransferError::EmptyFrame));
        stats.record(&Err(crate::TransferError::TransferAlreadyInProgress));

        assert_eq!(stats.captures, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.aborted, 1);
        assert_eq!(stats.capture_failures, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.bytes_sent, 980);
    }
}
