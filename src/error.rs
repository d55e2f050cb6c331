//! Error types for capture and transfer.
//!
//! Every capture-path failure is recovered inside the control-loop tick that
//! produced it: the driver logs it and the next tick's arbitration decides
//! whether to try again. Only configuration and file errors reach callers.
//!
//! ## Error Categories
//!
//! - **Capture Errors**: the camera had no frame to give, or gave an empty one
//! - **Peer Errors**: no peer attached, or the peer vanished between chunks
//! - **Exclusion Errors**: a capture was requested while another was in flight
//! - **Command Errors**: the peer wrote an opcode we do not understand
//! - **Setup Errors**: invalid configuration, unreadable files, malformed logs
//!
//! ```rust
//! use shutterlink::TransferError;
//!
//! let error = TransferError::frame_unavailable("sensor busy");
//! assert!(error.is_recoverable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for capture and transfer operations.
pub type Result<T, E = TransferError> = std::result::Result<T, E>;

/// Main error type for the capture pipeline.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransferError {
    #[error("Camera frame unavailable: {reason}")]
    FrameUnavailable { reason: String },

    #[error("Camera returned an empty frame")]
    EmptyFrame,

    #[error("No peer connected")]
    PeerNotConnected,

    #[error("A transfer is already in progress")]
    TransferAlreadyInProgress,

    #[error("Peer lost after {chunks_sent} chunks ({bytes_sent}/{total_bytes} bytes)")]
    PeerLostMidTransfer { chunks_sent: usize, bytes_sent: usize, total_bytes: usize },

    #[error("Unknown command opcode: {}", display_opcode(.opcode))]
    UnknownCommand { opcode: Option<u8> },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("File error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },
}

fn display_opcode(opcode: &Option<u8>) -> String {
    match opcode {
        Some(op) => format!("{op:#04x}"),
        None => "<empty payload>".to_string(),
    }
}

impl TransferError {
    /// Returns whether the control loop recovers from this error on its own.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransferError::FrameUnavailable { .. } => true,
            TransferError::EmptyFrame => true,
            TransferError::PeerNotConnected => true,
            TransferError::TransferAlreadyInProgress => true,
            TransferError::PeerLostMidTransfer { .. } => true,
            TransferError::UnknownCommand { .. } => true,
            TransferError::Config { .. } => false,
            TransferError::File { .. } => false,
            TransferError::Parse { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TransferError::FrameUnavailable { .. } => vec![
                "Check the camera module is seated and powered",
                "Lower the frame size or JPEG quality to reduce capture time",
                "Wait for the next trigger; captures are retried on demand",
            ],
            TransferError::EmptyFrame => vec![
                "Verify the sensor is configured for JPEG output",
                "Increase the flush depth if stale buffers are empty",
            ],
            TransferError::PeerNotConnected => vec![
                "Connect a central to the photo service",
                "Check advertising is running after the last disconnect",
            ],
            TransferError::TransferAlreadyInProgress => vec![
                "Wait for the current transfer to finish",
                "Lower the live-stream rate if requests pile up",
            ],
            TransferError::PeerLostMidTransfer { .. } => vec![
                "Discard the truncated image on the peer",
                "Move the peer closer to improve link quality",
                "Increase the inter-chunk delay if the notify queue overflows",
            ],
            TransferError::UnknownCommand { .. } => vec![
                "Send opcode 1 (photo), 2 (start live) or 3 (stop live)",
                "Check the peer app writes to the command characteristic",
            ],
            TransferError::Config { .. } => vec![
                "Keep chunk_size at or below att_mtu - 3",
                "Use non-zero intervals",
            ],
            TransferError::File { .. } => vec![
                "Check the file exists and is readable",
                "Check file permissions",
            ],
            TransferError::Parse { .. } => vec![
                "Verify the input format",
                "Check the source data is not truncated",
            ],
        }
    }

    /// Helper constructor for capture failures.
    pub fn frame_unavailable(reason: impl Into<String>) -> Self {
        TransferError::FrameUnavailable { reason: reason.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(reason: impl Into<String>) -> Self {
        TransferError::Config { reason: reason.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        TransferError::File { path, source }
    }

    /// Helper constructor for parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        TransferError::Parse { context: context.into(), details: details.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn messages_carry_their_context(
                reason in ".*",
                chunks in 0usize..1000,
                bytes in 0usize..100_000,
                opcode in any::<u8>(),
            ) {
                let unavailable = TransferError::frame_unavailable(reason.clone());
                prop_assert!(unavailable.to_string().contains(&reason));

                let lost = TransferError::PeerLostMidTransfer {
                    chunks_sent: chunks,
                    bytes_sent: bytes,
                    total_bytes: bytes + 1,
                };
                let msg = lost.to_string();
                prop_assert!(msg.contains(&chunks.to_string()));
                prop_assert!(msg.contains(&(bytes + 1).to_string()));

                let unknown = TransferError::UnknownCommand { opcode: Some(opcode) };
                let hex = format!("{:#04x}", opcode);
                prop_assert!(unknown.to_string().contains(&hex));
            }
        }
    }

    #[test]
    fn capture_errors_are_recoverable() {
        assert!(TransferError::frame_unavailable("busy").is_recoverable());
        assert!(TransferError::EmptyFrame.is_recoverable());
        assert!(TransferError::PeerNotConnected.is_recoverable());
        assert!(TransferError::TransferAlreadyInProgress.is_recoverable());
        assert!(
            TransferError::PeerLostMidTransfer { chunks_sent: 2, bytes_sent: 480, total_bytes: 500 }
                .is_recoverable()
        );
        assert!(!TransferError::config_error("bad").is_recoverable());
        assert!(!TransferError::parse_error("log", "bad hex").is_recoverable());
    }

    #[test]
    fn empty_payload_is_named_in_message() {
        let err = TransferError::UnknownCommand { opcode: None };
        assert!(err.to_string().contains("<empty payload>"));
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<TransferError>();

        let error = TransferError::PeerNotConnected;
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn every_variant_has_suggestions() {
        let errors = [
            TransferError::frame_unavailable("x"),
            TransferError::EmptyFrame,
            TransferError::PeerNotConnected,
            TransferError::TransferAlreadyInProgress,
            TransferError::PeerLostMidTransfer { chunks_sent: 0, bytes_sent: 0, total_bytes: 1 },
            TransferError::UnknownCommand { opcode: Some(9) },
            TransferError::config_error("x"),
            TransferError::file_error(
                PathBuf::from("/x"),
                std::io::Error::new(std::io::ErrorKind::NotFound, "x"),
            ),
            TransferError::parse_error("x", "y"),
        ];
        for error in &errors {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty(), "{error} has no suggestions");
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }
}
