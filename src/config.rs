//! Device configuration.
//!
//! All timing and transport constants are named fields rather than literals so
//! a host can override them from YAML:
//!
//! ```yaml
//! device_name: SafeBaby-CAM
//! timing:
//!   chunk_delay_ms: 20
//!   live_stream_delay_ms: 100
//!   periodic_interval_ms: 60000
//! transport:
//!   chunk_size: 240
//!   att_mtu: 247
//! ```
//!
//! Missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::profile;
use crate::{Result, TransferError};

/// Bytes of ATT header overhead in every notification.
const ATT_HEADER_LEN: usize = 3;

/// Timing constants for the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause between two chunk notifications.
    pub chunk_delay_ms: u64,

    /// Pause after each completed live-stream capture.
    pub live_stream_delay_ms: u64,

    /// Minimum gap between the last capture and a periodic one.
    pub periodic_interval_ms: u64,

    /// Settle time between a disconnect and re-advertising.
    pub advertise_settle_ms: u64,

    /// Control-loop tick period.
    pub tick_interval_ms: u64,

    /// Frames discarded before the frame that is actually sent.
    pub flush_frames: u8,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            chunk_delay_ms: 20,
            live_stream_delay_ms: 100,
            periodic_interval_ms: 60_000,
            advertise_settle_ms: 500,
            tick_interval_ms: 10,
            flush_frames: 1,
        }
    }
}

impl TimingConfig {
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn live_stream_delay(&self) -> Duration {
        Duration::from_millis(self.live_stream_delay_ms)
    }

    pub fn periodic_interval(&self) -> Duration {
        Duration::from_millis(self.periodic_interval_ms)
    }

    pub fn advertise_settle(&self) -> Duration {
        Duration::from_millis(self.advertise_settle_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Link-layer sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Payload bytes per notification.
    pub chunk_size: usize,

    /// ATT MTU negotiated by the peer.
    pub att_mtu: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { chunk_size: 240, att_mtu: profile::ATT_MTU }
    }
}

impl TransportConfig {
    /// Largest payload one notification can carry under the negotiated MTU.
    pub fn max_payload(&self) -> usize {
        self.att_mtu.saturating_sub(ATT_HEADER_LEN)
    }
}

/// Complete device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Name advertised to centrals.
    pub device_name: String,

    pub timing: TimingConfig,

    pub transport: TransportConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_name: profile::DEVICE_NAME.to_string(),
            timing: TimingConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl DeviceConfig {
    /// Configuration of the snapshot-only firmware: one photo every ten seconds
    /// and no command channel traffic expected.
    pub fn snapshot() -> Self {
        Self {
            device_name: profile::SNAPSHOT_DEVICE_NAME.to_string(),
            timing: TimingConfig { periodic_interval_ms: 10_000, ..TimingConfig::default() },
            transport: TransportConfig::default(),
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: DeviceConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| TransferError::parse_error("device config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub async fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| TransferError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&yaml)
    }

    /// Check the configuration is internally consistent.
    pub fn validate(&self) -> Result<()> {
        let transport = &self.transport;
        if transport.chunk_size == 0 {
            return Err(TransferError::config_error("chunk_size must be non-zero"));
        }
        if transport.chunk_size > transport.max_payload() {
            return Err(TransferError::config_error(format!(
                "chunk_size {} exceeds the {}-byte payload of a {}-byte ATT MTU",
                transport.chunk_size,
                transport.max_payload(),
                transport.att_mtu
            )));
        }
        if self.timing.periodic_interval_ms == 0 {
            return Err(TransferError::config_error("periodic_interval_ms must be non-zero"));
        }
        if self.timing.tick_interval_ms == 0 {
            return Err(TransferError::config_error("tick_interval_ms must be non-zero"));
        }
        Ok(())
    }
}
