//! Replay frame source for hosts without a camera

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{debug, info, trace};

use crate::provider::FrameSource;
use crate::types::Frame;
use crate::{Result, TransferError};

#[derive(Debug)]
enum Backing {
    Files(Vec<PathBuf>),
    Memory(Vec<Arc<[u8]>>),
}

impl Backing {
    fn len(&self) -> usize {
        match self {
            Backing::Files(paths) => paths.len(),
            Backing::Memory(frames) => frames.len(),
        }
    }
}

/// Frame source that cycles through recorded JPEG images.
///
/// Stands in for the sensor when running the pipeline on a development
/// machine. Frames are served round-robin in file-name order.
#[derive(Debug)]
pub struct ReplaySource {
    backing: Backing,

    /// Index of the next image to serve
    cursor: usize,

    /// Acquisition counter, used as the frame sequence number
    sequence: u32,

    /// Simulated exposure/encode time per acquisition
    capture_latency: Duration,

    /// Frames acquired but not yet released
    outstanding: usize,
}

impl ReplaySource {
    /// Collect every `.jpg`/`.jpeg` file in `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries =
            std::fs::read_dir(dir).map_err(|e| TransferError::file_error(dir.to_path_buf(), e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| TransferError::file_error(dir.to_path_buf(), e))?.path();
            let is_jpeg = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"));
            if is_jpeg {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(TransferError::config_error(format!(
                "no JPEG images found in {}",
                dir.display()
            )));
        }

        info!("Replaying {} images from {}", paths.len(), dir.display());
        Ok(Self::with_backing(Backing::Files(paths)))
    }

    /// Serve in-memory images.
    pub fn from_frames(frames: Vec<Vec<u8>>) -> Result<Self> {
        if frames.is_empty() {
            return Err(TransferError::config_error("replay source needs at least one frame"));
        }
        Ok(Self::with_backing(Backing::Memory(frames.into_iter().map(Arc::from).collect())))
    }

    fn with_backing(backing: Backing) -> Self {
        Self { backing, cursor: 0, sequence: 0, capture_latency: Duration::ZERO, outstanding: 0 }
    }

    /// Delay every acquisition, as a real sensor would.
    pub fn with_capture_latency(mut self, latency: Duration) -> Self {
        self.capture_latency = latency;
        self
    }

    /// Number of images in the rotation.
    pub fn image_count(&self) -> usize {
        self.backing.len()
    }

    /// Frames handed out and not yet returned.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }
}

#[async_trait::async_trait]
impl FrameSource for ReplaySource {
    async fn acquire(&mut self) -> Result<Frame> {
        if !self.capture_latency.is_zero() {
            tokio::time::sleep(self.capture_latency).await;
        }

        let index = self.cursor;
        self.cursor = (self.cursor + 1) % self.backing.len();

        let data: Arc<[u8]> = match &self.backing {
            Backing::Memory(frames) => Arc::clone(&frames[index]),
            Backing::Files(paths) => {
                let path = &paths[index];
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    TransferError::frame_unavailable(format!("{}: {}", path.display(), e))
                })?;
                debug!(path = %path.display(), bytes = bytes.len(), "Loaded replay image");
                bytes.into()
            }
        };

        self.sequence = self.sequence.wrapping_add(1);
        self.outstanding += 1;
        trace!(sequence = self.sequence, index, "Replay frame acquired");
        Ok(Frame { data, sequence: self.sequence })
    }

    fn release(&mut self, frame: Frame) {
        self.outstanding = self.outstanding.saturating_sub(1);
        trace!(sequence = frame.sequence, "Replay frame released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cycles_in_file_name_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("b.jpg"), [2u8; 4]).expect("write");
        std::fs::write(dir.path().join("a.JPEG"), [1u8; 3]).expect("write");
        std::fs::write(dir.path().join("notes.txt"), b"skip me").expect("write");

        let mut source = ReplaySource::open(dir.path()).expect("open");
        assert_eq!(source.image_count(), 2);

        let mut seen = Vec::new();
        for _ in 0..3 {
            let frame = source.acquire().await.expect("frame");
            seen.push((frame.sequence, frame.len()));
            source.release(frame);
        }
        assert_eq!(seen, vec![(1, 3), (2, 4), (3, 3)]);
        assert_eq!(source.outstanding(), 0);
    }

    #[test]
    fn empty_directory_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ReplaySource::open(dir.path()).unwrap_err();
        assert!(matches!(err, TransferError::Config { .. }), "got {err:?}");
    }

    #[test]
    fn missing_directory_reports_path() {
        let err = ReplaySource::open("/nonexistent/frames").unwrap_err();
        assert!(matches!(err, TransferError::File { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn deleted_file_surfaces_as_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("only.jpg");
        std::fs::write(&path, [9u8; 8]).expect("write");
        let mut source = ReplaySource::open(dir.path()).expect("open");

        std::fs::remove_file(&path).expect("remove");
        let err = source.acquire().await.unwrap_err();
        assert!(matches!(err, TransferError::FrameUnavailable { .. }), "got {err:?}");
        assert_eq!(source.outstanding(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn capture_latency_is_applied() {
        let mut source = ReplaySource::from_frames(vec![vec![1, 2, 3]])
            .expect("frames")
            .with_capture_latency(Duration::from_millis(120));

        let started = tokio::time::Instant::now();
        let frame = source.acquire().await.expect("frame");
        assert!(started.elapsed() >= Duration::from_millis(120));
        source.release(frame);
    }
}
