//! Capture-and-transfer core for a BLE camera peripheral.
//!
//! Shutterlink runs the device side of a simple photo service: a central
//! connects, writes one-byte commands, and receives JPEG frames as a run of
//! fixed-size notifications.
//!
//! # Features
//!
//! - **Three triggers**: manual requests, live streaming and periodic capture,
//!   arbitrated once per tick with manual first
//! - **Fresh frames**: stale camera buffers are flushed before every capture
//! - **Safe transfers**: one transfer at a time, aborted cleanly when the peer
//!   leaves between chunks
//! - **Peer tooling**: reassembly of notified chunks back into images
//!
//! The radio, camera and advertising are reached through the
//! [`FrameSource`], [`ChunkSink`] and [`Advertiser`] traits; [`providers`]
//! has host-side implementations for replay and loopback.
//!
//! ## Example (loopback)
//!
//! ```rust,no_run
//! use shutterlink::providers::{ChannelSink, LogAdvertiser, ReplaySource};
//! use shutterlink::reassembly::ReassembleExt;
//! use shutterlink::{DeviceConfig, Shutterlink};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> shutterlink::Result<()> {
//!     let source = ReplaySource::open("captures/")?;
//!     let (sink, chunks) = ChannelSink::channel(64);
//!     let device =
//!         Shutterlink::start(&DeviceConfig::default(), source, sink, LogAdvertiser::default())?;
//!
//!     let handle = device.handle();
//!     handle.on_connect();
//!     handle.on_command_write(&[0x01]);
//!
//!     let mut images = chunks.reassemble();
//!     if let Some(image) = images.next().await {
//!         println!("received {} bytes", image.data.len());
//!     }
//!     Ok(())
//! }
//! ```

mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Device pipeline
pub mod arbiter;
pub mod command;
pub mod config;
pub mod connection;
pub mod device;
pub mod driver;
pub mod engine;
pub mod profile;

// Host integration
pub mod provider;
pub mod providers;
pub mod reassembly;

// Core exports
pub use error::*;
pub use types::*;

pub use command::Command;
pub use config::{DeviceConfig, TimingConfig, TransportConfig};
pub use device::{Device, DeviceHandle};
pub use engine::EngineState;
pub use provider::{Advertiser, ChunkSink, FrameSource, SendStatus};

/// Unified entry point for starting a device.
///
/// # Examples
///
/// ```rust,no_run
/// use shutterlink::providers::{ChannelSink, LogAdvertiser, ReplaySource};
/// use shutterlink::{DeviceConfig, Shutterlink};
///
/// # #[tokio::main]
/// # async fn main() -> shutterlink::Result<()> {
/// let config = DeviceConfig::from_yaml_file("device.yaml").await?;
/// let source = ReplaySource::open("captures/")?;
/// let (sink, _chunks) = ChannelSink::channel(64);
/// let device = Shutterlink::start(&config, source, sink, LogAdvertiser::new(&config.device_name))?;
/// # Ok(())
/// # }
/// ```
pub struct Shutterlink;

impl Shutterlink {
    /// Start the control loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Config`] if `config` fails validation.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start<S, K, A>(config: &DeviceConfig, source: S, sink: K, advertiser: A) -> Result<Device>
    where
        S: FrameSource,
        K: ChunkSink,
        A: Advertiser,
    {
        Device::start(config, source, sink, advertiser)
    }

    /// Start a device that replays the JPEGs in `dir` into `sink`.
    ///
    /// Advertising is only logged.
    pub fn replay<P, K>(config: &DeviceConfig, dir: P, sink: K) -> Result<Device>
    where
        P: AsRef<std::path::Path>,
        K: ChunkSink,
    {
        let source = providers::ReplaySource::open(dir)?;
        let advertiser = providers::LogAdvertiser::new(config.device_name.clone());
        Device::start(config, source, sink, advertiser)
    }
}
