//! Driver spawns and runs the control loop

use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::arbiter::ModeArbiter;
use crate::config::TimingConfig;
use crate::connection::{ConnectionTracker, Edge};
use crate::engine::CaptureTransferEngine;
use crate::provider::{Advertiser, ChunkSink, FrameSource};
use crate::types::{DeviceClock, DeviceStats, TransferReport, TriggerKind};
use crate::Result;

/// Receivers handed back by [`Driver::spawn`].
pub struct DriverChannels {
    /// Most recent completed transfer
    pub reports: watch::Receiver<Option<Arc<TransferReport>>>,
    /// Running counters
    pub stats: watch::Receiver<DeviceStats>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// One iteration of the control loop, separated from scheduling so it can be
/// stepped directly.
pub struct ControlLoop<S, K, A> {
    tracker: ConnectionTracker,
    arbiter: ModeArbiter,
    engine: CaptureTransferEngine<S, K>,
    advertiser: A,
    timing: TimingConfig,
    clock: DeviceClock,
    stats: DeviceStats,
}

impl<S, K, A> ControlLoop<S, K, A>
where
    S: FrameSource,
    K: ChunkSink,
    A: Advertiser,
{
    pub fn new(
        tracker: ConnectionTracker,
        arbiter: ModeArbiter,
        engine: CaptureTransferEngine<S, K>,
        advertiser: A,
        timing: TimingConfig,
        clock: DeviceClock,
    ) -> Self {
        Self { tracker, arbiter, engine, advertiser, timing, clock, stats: DeviceStats::default() }
    }

    pub fn engine(&self) -> &CaptureTransferEngine<S, K> {
        &self.engine
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    /// Make the device discoverable for the first time.
    pub async fn start_advertising(&mut self) {
        self.advertiser.start().await;
        info!("Advertising started, waiting for a peer");
    }

    /// Run one tick.
    ///
    /// Returns `None` when no capture ran, otherwise the capture's result.
    /// Errors are already logged; they never stop the loop.
    pub async fn tick(&mut self) -> Option<Result<TransferReport>> {
        self.stats.ticks += 1;

        if let Some(Edge::Disconnected) =
            self.tracker.poll_edges(&mut self.advertiser, self.timing.advertise_settle()).await
        {
            self.stats.disconnects += 1;
        }

        if !self.tracker.is_attached() {
            return None;
        }

        let trigger =
            self.arbiter.select_trigger(self.clock.now(), self.timing.periodic_interval())?;
        debug!(%trigger, "Trigger fired");

        let result = self.engine.run_capture(trigger).await;
        self.arbiter.record_capture(self.clock.now());
        self.stats.record(&result);

        if let Err(e) = &result {
            debug!(%trigger, "Capture abandoned: {}", e);
        }

        if trigger == TriggerKind::LiveStream {
            tokio::time::sleep(self.timing.live_stream_delay()).await;
        }

        Some(result)
    }
}

/// Driver spawns and manages the control-loop task
pub struct Driver;

impl Driver {
    /// Spawn the control loop on the current tokio runtime.
    pub fn spawn<S, K, A>(control: ControlLoop<S, K, A>) -> DriverChannels
    where
        S: FrameSource,
        K: ChunkSink,
        A: Advertiser,
    {
        let (report_tx, report_rx) = watch::channel(None);
        let (stats_tx, stats_rx) = watch::channel(DeviceStats::default());
        let cancel = CancellationToken::new();
        let cancel_loop = cancel.clone();

        tokio::spawn(async move {
            Self::control_task(control, report_tx, stats_tx, cancel_loop).await;
        });

        DriverChannels { reports: report_rx, stats: stats_rx, cancel }
    }

    async fn control_task<S, K, A>(
        mut control: ControlLoop<S, K, A>,
        report_tx: watch::Sender<Option<Arc<TransferReport>>>,
        stats_tx: watch::Sender<DeviceStats>,
        cancel: CancellationToken,
    ) where
        S: FrameSource,
        K: ChunkSink,
        A: Advertiser,
    {
        info!("Control loop started");
        control.start_advertising().await;

        let mut ticker = tokio::time::interval(control.timing.tick_interval());
        // Captures can outlast a tick; never burst to catch up
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Control loop cancelled");
                    break;
                }
                _ = ticker.tick() => {}
            }

            // A transfer in flight is finished before cancellation is honoured
            if let Some(Ok(report)) = control.tick().await {
                trace!(sequence = report.frame_sequence, "Publishing transfer report");
                report_tx.send_replace(Some(Arc::new(report)));
            }
            stats_tx.send_replace(control.stats());
        }

        let stats = control.stats();
        info!(
            ticks = stats.ticks,
            captures = stats.captures,
            completed = stats.completed,
            "Control loop ended"
        );
    }
}
