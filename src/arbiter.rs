//! Trigger arbitration
//!
//! Three sources can start a capture. Once per tick, while a peer is
//! attached, [`ModeArbiter::select_trigger`] picks at most one of them:
//!
//! 1. **Manual** - a pending photo request, consumed exactly once
//! 2. **Live stream** - fires every tick while the mode is on
//! 3. **Periodic** - fires when the interval has elapsed since the last capture
//!
//! After any capture returns, the periodic reference point moves to that
//! moment, so a periodic photo never follows right behind a manual or
//! live-stream one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

use crate::types::{Timestamp, TriggerKind};

/// Trigger flags shared between the radio callbacks and the control loop.
///
/// Every field is a single atomic word; no lock is taken on either side.
#[derive(Debug, Default)]
pub struct TriggerState {
    manual_pending: AtomicBool,
    live_stream_enabled: AtomicBool,
    last_periodic_fire_ms: AtomicU64,
}

/// Point-in-time copy of [`TriggerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerSnapshot {
    pub manual_pending: bool,
    pub live_stream_enabled: bool,
    pub last_periodic_fire: Timestamp,
}

impl TriggerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch a manual photo request.
    pub fn request_manual(&self) {
        self.manual_pending.store(true, Ordering::Release);
    }

    /// Clear the manual request, returning whether one was pending.
    pub fn take_manual(&self) -> bool {
        self.manual_pending.swap(false, Ordering::AcqRel)
    }

    pub fn set_live_stream(&self, enabled: bool) {
        self.live_stream_enabled.store(enabled, Ordering::Release);
    }

    pub fn is_live_stream(&self) -> bool {
        self.live_stream_enabled.load(Ordering::Acquire)
    }

    pub fn last_periodic_fire(&self) -> Timestamp {
        Timestamp::from_millis(self.last_periodic_fire_ms.load(Ordering::Acquire))
    }

    /// Move the periodic reference point.
    pub fn reset_periodic(&self, at: Timestamp) {
        self.last_periodic_fire_ms.store(at.as_millis(), Ordering::Release);
    }

    pub fn snapshot(&self) -> TriggerSnapshot {
        TriggerSnapshot {
            manual_pending: self.manual_pending.load(Ordering::Acquire),
            live_stream_enabled: self.is_live_stream(),
            last_periodic_fire: self.last_periodic_fire(),
        }
    }
}

/// Priority-ordered trigger selection.
#[derive(Debug, Clone)]
pub struct ModeArbiter {
    triggers: Arc<TriggerState>,
}

impl ModeArbiter {
    pub fn new(triggers: Arc<TriggerState>) -> Self {
        Self { triggers }
    }

    /// Decide whether a capture runs this tick.
    ///
    /// Must only be called while a peer is attached: a manual request is
    /// consumed by this call.
    pub fn select_trigger(
        &self,
        now: Timestamp,
        periodic_interval: Duration,
    ) -> Option<TriggerKind> {
        if self.triggers.take_manual() {
            debug!("Manual photo request consumed");
            return Some(TriggerKind::Manual);
        }

        if self.triggers.is_live_stream() {
            return Some(TriggerKind::LiveStream);
        }

        let since_last = now.saturating_since(self.triggers.last_periodic_fire());
        if since_last >= periodic_interval {
            debug!(elapsed_ms = since_last.as_millis() as u64, "Periodic interval elapsed");
            return Some(TriggerKind::Periodic);
        }

        trace!("No trigger this tick");
        None
    }

    /// Record that a capture returned at `at`, whatever fired it.
    pub fn record_capture(&self, at: Timestamp) {
        self.triggers.reset_periodic(at);
    }

    pub fn triggers(&self) -> &Arc<TriggerState> {
        &self.triggers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MINUTE: Duration = Duration::from_secs(60);

    fn arbiter() -> ModeArbiter {
        ModeArbiter::new(Arc::new(TriggerState::new()))
    }

    #[test]
    fn nothing_fires_before_interval() {
        let arbiter = arbiter();
        assert_eq!(arbiter.select_trigger(Timestamp::from_millis(59_999), MINUTE), None);
        assert_eq!(
            arbiter.select_trigger(Timestamp::from_millis(60_000), MINUTE),
            Some(TriggerKind::Periodic)
        );
    }

    #[test]
    fn manual_is_consumed_once() {
        let arbiter = arbiter();
        arbiter.triggers().request_manual();

        let now = Timestamp::from_millis(10);
        assert_eq!(arbiter.select_trigger(now, MINUTE), Some(TriggerKind::Manual));
        assert!(!arbiter.triggers().snapshot().manual_pending);
        assert_eq!(arbiter.select_trigger(now, MINUTE), None);
    }

    #[test]
    fn manual_preempts_live_stream_for_one_tick() {
        let arbiter = arbiter();
        arbiter.triggers().set_live_stream(true);
        arbiter.triggers().request_manual();

        let now = Timestamp::from_millis(10);
        assert_eq!(arbiter.select_trigger(now, MINUTE), Some(TriggerKind::Manual));
        assert_eq!(arbiter.select_trigger(now, MINUTE), Some(TriggerKind::LiveStream));
    }

    #[test]
    fn live_stream_starves_periodic() {
        let arbiter = arbiter();
        arbiter.triggers().set_live_stream(true);
        let late = Timestamp::from_millis(10 * 60_000);
        assert_eq!(arbiter.select_trigger(late, MINUTE), Some(TriggerKind::LiveStream));
    }

    #[test]
    fn capture_pushes_periodic_back() {
        let arbiter = arbiter();
        arbiter.record_capture(Timestamp::from_millis(50_000));
        assert_eq!(arbiter.select_trigger(Timestamp::from_millis(60_000), MINUTE), None);
        assert_eq!(
            arbiter.select_trigger(Timestamp::from_millis(110_000), MINUTE),
            Some(TriggerKind::Periodic)
        );
    }

    proptest! {
        #[test]
        fn periodic_never_fires_within_interval_of_last_capture(
            last in 0u64..1_000_000,
            offset in 0u64..120_000,
            interval_ms in 1u64..120_000,
        ) {
            let arbiter = arbiter();
            arbiter.record_capture(Timestamp::from_millis(last));
            let now = Timestamp::from_millis(last + offset);
            let fired = arbiter.select_trigger(now, Duration::from_millis(interval_ms));
            if offset < interval_ms {
                prop_assert_eq!(fired, None);
            } else {
                prop_assert_eq!(fired, Some(TriggerKind::Periodic));
            }
        }

        #[test]
        fn priority_order_holds(manual: bool, live: bool, elapsed in 0u64..200_000) {
            let arbiter = arbiter();
            if manual {
                arbiter.triggers().request_manual();
            }
            arbiter.triggers().set_live_stream(live);

            let fired = arbiter.select_trigger(Timestamp::from_millis(elapsed), MINUTE);
            let expected = if manual {
                Some(TriggerKind::Manual)
            } else if live {
                Some(TriggerKind::LiveStream)
            } else if elapsed >= 60_000 {
                Some(TriggerKind::Periodic)
            } else {
                None
            };
            prop_assert_eq!(fired, expected);
            prop_assert!(!arbiter.triggers().snapshot().manual_pending);
        }
    }
}
