//! Running device and its radio-facing handle

use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::arbiter::{ModeArbiter, TriggerState};
use crate::command::{Command, CommandDecoder};
use crate::config::DeviceConfig;
use crate::connection::{Connection, ConnectionTracker};
use crate::driver::{ControlLoop, Driver};
use crate::engine::{CaptureTransferEngine, EngineSettings, EngineState, TransferGuard};
use crate::provider::{Advertiser, ChunkSink, FrameSource};
use crate::types::{DeviceClock, DeviceStats, TransferReport};
use crate::Result;

/// Entry points for the radio stack's callbacks.
///
/// Every method only touches atomics, so the handle can be cloned into
/// whatever context the BLE stack calls back from.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    tracker: ConnectionTracker,
    commands: CommandDecoder,
}

impl DeviceHandle {
    /// A central connected.
    pub fn on_connect(&self) {
        self.tracker.on_connect();
    }

    /// The central went away.
    pub fn on_disconnect(&self) {
        self.tracker.on_disconnect();
    }

    /// The central wrote to the command characteristic.
    pub fn on_command_write(&self, payload: &[u8]) -> Option<Command> {
        self.commands.on_write(payload)
    }

    pub fn is_attached(&self) -> bool {
        self.tracker.is_attached()
    }
}

/// A camera device with its control loop running in the background.
///
/// Dropping the device stops the loop after any transfer in flight.
pub struct Device {
    handle: DeviceHandle,
    guard: Arc<TransferGuard>,
    reports: watch::Receiver<Option<Arc<TransferReport>>>,
    stats: watch::Receiver<DeviceStats>,
    cancel: CancellationToken,
}

impl Device {
    /// Validate `config`, wire the pipeline together and spawn the loop.
    pub fn start<S, K, A>(config: &DeviceConfig, source: S, sink: K, advertiser: A) -> Result<Self>
    where
        S: FrameSource,
        K: ChunkSink,
        A: Advertiser,
    {
        config.validate()?;

        let clock = DeviceClock::new();
        let connection = Arc::new(Connection::new());
        let triggers = Arc::new(TriggerState::new());
        let guard = Arc::new(TransferGuard::new());

        let tracker = ConnectionTracker::new(Arc::clone(&connection), Arc::clone(&triggers), clock);
        let engine = CaptureTransferEngine::new(
            source,
            sink,
            connection,
            Arc::clone(&guard),
            EngineSettings::from(config),
            clock,
        )?;
        let control = ControlLoop::new(
            tracker.clone(),
            ModeArbiter::new(Arc::clone(&triggers)),
            engine,
            advertiser,
            config.timing,
            clock,
        );

        let channels = Driver::spawn(control);
        info!(
            name = %config.device_name,
            chunk_size = config.transport.chunk_size,
            "Device started"
        );

        Ok(Self {
            handle: DeviceHandle { tracker, commands: CommandDecoder::new(triggers) },
            guard,
            reports: channels.reports,
            stats: channels.stats,
            cancel: channels.cancel,
        })
    }

    /// Callback handle for the radio stack.
    pub fn handle(&self) -> DeviceHandle {
        self.handle.clone()
    }

    /// Completed transfers as they happen.
    ///
    /// Reports are published through a watch channel, so a slow consumer
    /// sees the latest report rather than every one.
    pub fn reports(&self) -> impl Stream<Item = Arc<TransferReport>> + 'static {
        WatchStream::from_changes(self.reports.clone()).filter_map(|opt| async move { opt })
    }

    pub fn latest_report(&self) -> Option<Arc<TransferReport>> {
        self.reports.borrow().clone()
    }

    /// Counters as of the last completed tick.
    pub fn stats(&self) -> DeviceStats {
        *self.stats.borrow()
    }

    pub fn engine_state(&self) -> watch::Receiver<EngineState> {
        self.guard.subscribe()
    }

    pub fn is_transfer_in_progress(&self) -> bool {
        self.guard.is_in_progress()
    }

    /// Stop the control loop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        debug!("Dropping device");
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::opcodes;
    use crate::config::TimingConfig;
    use crate::test_utils::{CountingAdvertiser, MockSource, RecordingSink};
    use crate::types::TriggerKind;
    use crate::TransferError;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn handle_drives_a_manual_capture() {
        let sink = RecordingSink::new();
        let device = Device::start(
            &DeviceConfig::default(),
            MockSource::with_frame_len(500),
            sink.clone(),
            CountingAdvertiser::default(),
        )
        .expect("valid config");
        let handle = device.handle();
        let mut reports = Box::pin(device.reports());

        handle.on_connect();
        assert_eq!(handle.on_command_write(&[opcodes::REQUEST_PHOTO]), Some(Command::RequestPhoto));

        let report = tokio::time::timeout(Duration::from_secs(1), reports.next())
            .await
            .expect("report in time")
            .expect("stream open");
        assert_eq!(report.trigger, TriggerKind::Manual);
        assert_eq!(sink.chunk_sizes(), vec![240, 240, 20]);
        assert!(!device.is_transfer_in_progress());
        assert_eq!(*device.engine_state().borrow(), EngineState::Idle);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let config = DeviceConfig {
            timing: TimingConfig { tick_interval_ms: 0, ..TimingConfig::default() },
            ..DeviceConfig::default()
        };
        let result = Device::start(
            &config,
            MockSource::with_frame_len(10),
            RecordingSink::new(),
            CountingAdvertiser::default(),
        );
        assert!(matches!(result, Err(TransferError::Config { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_the_loop() {
        let advertiser = CountingAdvertiser::default();
        let device = Device::start(
            &DeviceConfig::default(),
            MockSource::with_frame_len(10),
            RecordingSink::new(),
            advertiser.clone(),
        )
        .expect("valid config");
        let mut stats = device.stats.clone();
        stats.changed().await.expect("loop ticking");
        drop(device);

        // a tick already in flight may still publish once
        let closed = tokio::time::timeout(Duration::from_secs(1), async {
            while stats.changed().await.is_ok() {}
        })
        .await;
        assert!(closed.is_ok(), "loop task has exited");
        assert_eq!(advertiser.starts(), 1);
    }
}
