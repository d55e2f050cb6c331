//! Import of nRF Connect notification logs
//!
//! nRF Connect records every notification as a line such as
//!
//! ```text
//! I 10:13:22.481 Notification received from 6df8c9f3-..., value: (0x) FF-D8-FF-E0-00-10
//! ```
//!
//! [`parse_log`] pulls the payloads back out so they can be fed through
//! [`FrameAssembler`], and [`extract_images`] writes the rebuilt JPEGs to disk.
//! A garbled line costs only the image it belonged to.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{FrameAssembler, FrameStatus};
use crate::{Result, TransferError};

const VALUE_PREFIX: &str = "value: (0x) ";

/// One notification line of a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Decoded chunk bytes
    Payload(Vec<u8>),

    /// A notification whose hex could not be decoded (1-based line number)
    Malformed { line: usize, hex: String },
}

/// Extract every notification from a log, in order.
///
/// Lines without a notification value are skipped. Lines with a value that
/// is not valid hex are logged and returned as [`Notification::Malformed`].
pub fn parse_log(text: &str) -> Vec<Notification> {
    let mut notifications = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let Some(start) = line.find(VALUE_PREFIX) else {
            continue;
        };
        let hex: String = line[start + VALUE_PREFIX.len()..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit() || *c == '-')
            .filter(|c| *c != '-')
            .collect();
        if hex.is_empty() {
            continue;
        }
        match decode_hex(&hex) {
            Some(payload) => notifications.push(Notification::Payload(payload)),
            None => {
                warn!(line = index + 1, %hex, "Invalid hex payload in log");
                notifications.push(Notification::Malformed { line: index + 1, hex });
            }
        }
    }
    notifications
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len()).step_by(2).map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok()).collect()
}

/// An image written by [`extract_images`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    pub path: PathBuf,
    pub bytes: usize,
    pub status: FrameStatus,
}

/// Rebuild every image in `log_path` and write them next to `output_base`
/// as `<stem>_1.jpg`, `<stem>_2.jpg`, ...
///
/// Truncated images are written too, so a partial picture can still be
/// inspected. An image that spans a malformed line is written as truncated.
pub async fn extract_images<P, Q>(log_path: P, output_base: Q) -> Result<Vec<ExtractedImage>>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let log_path = log_path.as_ref();
    let text = tokio::fs::read_to_string(log_path)
        .await
        .map_err(|e| TransferError::file_error(log_path.to_path_buf(), e))?;

    let notifications = parse_log(&text);
    if !notifications.iter().any(|n| matches!(n, Notification::Payload(_))) {
        return Err(TransferError::parse_error(
            format!("nRF Connect log {}", log_path.display()),
            "no notification payloads found",
        ));
    }

    let mut assembler = FrameAssembler::default();
    let mut frames = Vec::new();
    for notification in &notifications {
        match notification {
            Notification::Payload(payload) => frames.extend(assembler.push(payload)),
            Notification::Malformed { .. } => assembler.mark_damaged(),
        }
    }
    frames.extend(assembler.finish());

    let output_base = output_base.as_ref();
    let stem = output_base.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
    let dir = output_base.parent().unwrap_or_else(|| Path::new(""));

    let mut written = Vec::with_capacity(frames.len());
    for (index, frame) in frames.into_iter().enumerate() {
        let path = dir.join(format!("{}_{}.jpg", stem, index + 1));
        tokio::fs::write(&path, &frame.data)
            .await
            .map_err(|e| TransferError::file_error(path.clone(), e))?;

        if frame.is_complete() {
            info!(path = %path.display(), bytes = frame.data.len(), "Image saved");
        } else {
            warn!(path = %path.display(), bytes = frame.data.len(), "Truncated image saved");
        }
        written.push(ExtractedImage { path, bytes: frame.data.len(), status: frame.status });
    }
    Ok(written)
}
