//! Capture triggers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a capture was started.
///
/// Variants are listed in arbitration priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerKind {
    /// Peer asked for one photo
    Manual,

    /// Live-stream mode is on; fires every tick
    LiveStream,

    /// Keep-alive timer expired
    Periodic,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerKind::Manual => "manual",
            TriggerKind::LiveStream => "live-stream",
            TriggerKind::Periodic => "periodic",
        };
        f.write_str(name)
    }
}
