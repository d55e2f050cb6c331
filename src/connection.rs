//! Peer attachment tracking
//!
//! The radio stack reports connects and disconnects from its own callback
//! context through [`ConnectionTracker::on_connect`] and
//! [`ConnectionTracker::on_disconnect`]. The control loop calls
//! [`ConnectionTracker::poll_edges`] once per tick to notice transitions and
//! re-arm advertising after a peer leaves.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use crate::arbiter::TriggerState;
use crate::provider::Advertiser;
use crate::types::DeviceClock;

/// Attachment flags.
///
/// `attached` is written only by the radio callbacks; `previous_attached`
/// only by the tick loop.
#[derive(Debug, Default)]
pub struct Connection {
    attached: AtomicBool,
    previous_attached: AtomicBool,
}

impl Connection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}

/// A one-tick transition in attachment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Connected,
    Disconnected,
}

/// Applies connection events and detects edges.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    connection: Arc<Connection>,
    triggers: Arc<TriggerState>,
    clock: DeviceClock,
}

impl ConnectionTracker {
    pub fn new(connection: Arc<Connection>, triggers: Arc<TriggerState>, clock: DeviceClock) -> Self {
        Self { connection, triggers, clock }
    }

    /// A central connected.
    ///
    /// Restarts the periodic timer so a fresh peer waits a full interval
    /// before its first automatic capture.
    pub fn on_connect(&self) {
        self.triggers.reset_periodic(self.clock.now());
        self.connection.attached.store(true, Ordering::Release);
        info!("Peer connected");
    }

    /// The central went away. Live-stream mode never survives a disconnect.
    pub fn on_disconnect(&self) {
        self.connection.attached.store(false, Ordering::Release);
        self.triggers.set_live_stream(false);
        info!("Peer disconnected");
    }

    pub fn is_attached(&self) -> bool {
        self.connection.is_attached()
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Compare the current level against the last tick's.
    ///
    /// On a disconnect edge, waits `settle` and restarts advertising before
    /// returning. A connect edge only updates the remembered level.
    pub async fn poll_edges<A: Advertiser>(
        &self,
        advertiser: &mut A,
        settle: Duration,
    ) -> Option<Edge> {
        let attached = self.connection.is_attached();
        let previous = self.connection.previous_attached.load(Ordering::Acquire);

        match (previous, attached) {
            (true, false) => {
                debug!(settle_ms = settle.as_millis() as u64, "Disconnect edge, re-arming advertising");
                tokio::time::sleep(settle).await;
                advertiser.start().await;
                info!("Advertising restarted");
                self.connection.previous_attached.store(false, Ordering::Release);
                Some(Edge::Disconnected)
            }
            (false, true) => {
                debug!("Connect edge");
                self.connection.previous_attached.store(true, Ordering::Release);
                Some(Edge::Connected)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::CountingAdvertiser;
    use crate::types::Timestamp;

    fn tracker() -> ConnectionTracker {
        ConnectionTracker::new(
            Arc::new(Connection::new()),
            Arc::new(TriggerState::new()),
            DeviceClock::new(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn connect_resets_periodic_reference() {
        let tracker = tracker();
        tokio::time::advance(Duration::from_secs(90)).await;
        tracker.on_connect();

        assert!(tracker.is_attached());
        assert_eq!(tracker.triggers.last_periodic_fire(), Timestamp::from_millis(90_000));
    }

    #[tokio::test]
    async fn disconnect_clears_live_stream() {
        let tracker = tracker();
        tracker.on_connect();
        tracker.triggers.set_live_stream(true);
        tracker.triggers.request_manual();

        tracker.on_disconnect();
        assert!(!tracker.is_attached());
        let snapshot = tracker.triggers.snapshot();
        assert!(!snapshot.live_stream_enabled);
        assert!(snapshot.manual_pending, "manual requests are not cleared by a disconnect");
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_edge_settles_then_advertises() {
        let tracker = tracker();
        let mut advertiser = CountingAdvertiser::default();
        let settle = Duration::from_millis(500);

        tracker.on_connect();
        assert_eq!(tracker.poll_edges(&mut advertiser, settle).await, Some(Edge::Connected));
        assert_eq!(tracker.poll_edges(&mut advertiser, settle).await, None);

        tracker.on_disconnect();
        let started = tokio::time::Instant::now();
        assert_eq!(tracker.poll_edges(&mut advertiser, settle).await, Some(Edge::Disconnected));
        assert!(started.elapsed() >= settle);
        assert_eq!(advertiser.starts(), 1);

        assert_eq!(tracker.poll_edges(&mut advertiser, settle).await, None);
        assert_eq!(advertiser.starts(), 1);
    }

    #[tokio::test]
    async fn connect_edge_does_not_advertise() {
        let tracker = tracker();
        let mut advertiser = CountingAdvertiser::default();
        tracker.on_connect();
        tracker.poll_edges(&mut advertiser, Duration::ZERO).await;
        assert_eq!(advertiser.starts(), 0);
    }
}
