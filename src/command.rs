//! Command channel decoding
//!
//! The peer writes single-byte opcodes to the command characteristic.
//! Applying a command only flips trigger flags; the capture itself happens
//! on the next control-loop tick.

use std::sync::Arc;
use tracing::{info, warn};

use crate::arbiter::TriggerState;
use crate::{Result, TransferError};

/// Opcode bytes accepted on the command characteristic.
pub mod opcodes {
    /// Take one photo now
    pub const REQUEST_PHOTO: u8 = 0x01;

    /// Send a frame every tick until stopped
    pub const START_LIVE_STREAM: u8 = 0x02;

    /// Leave live-stream mode
    pub const STOP_LIVE_STREAM: u8 = 0x03;
}

/// A decoded peer command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    RequestPhoto,
    StartLiveStream,
    StopLiveStream,
}

impl Command {
    /// Decode a characteristic write. Only the first byte is significant.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        match payload.first().copied() {
            Some(opcodes::REQUEST_PHOTO) => Ok(Command::RequestPhoto),
            Some(opcodes::START_LIVE_STREAM) => Ok(Command::StartLiveStream),
            Some(opcodes::STOP_LIVE_STREAM) => Ok(Command::StopLiveStream),
            opcode => Err(TransferError::UnknownCommand { opcode }),
        }
    }

    pub fn opcode(self) -> u8 {
        match self {
            Command::RequestPhoto => opcodes::REQUEST_PHOTO,
            Command::StartLiveStream => opcodes::START_LIVE_STREAM,
            Command::StopLiveStream => opcodes::STOP_LIVE_STREAM,
        }
    }
}

/// Turns command writes into trigger-state changes.
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    triggers: Arc<TriggerState>,
}

impl CommandDecoder {
    pub fn new(triggers: Arc<TriggerState>) -> Self {
        Self { triggers }
    }

    /// Handle one write from the peer.
    ///
    /// Unknown or empty writes are logged and leave state untouched.
    pub fn on_write(&self, payload: &[u8]) -> Option<Command> {
        match Command::decode(payload) {
            Ok(command) => {
                self.apply(command);
                Some(command)
            }
            Err(e) => {
                warn!("Ignoring command write: {}", e);
                None
            }
        }
    }

    pub fn apply(&self, command: Command) {
        match command {
            Command::RequestPhoto => {
                self.triggers.request_manual();
                info!("Command [1]: manual photo requested");
            }
            Command::StartLiveStream => {
                self.triggers.set_live_stream(true);
                info!("Command [2]: live stream started");
            }
            Command::StopLiveStream => {
                self.triggers.set_live_stream(false);
                info!("Command [3]: live stream stopped");
            }
        }
    }
}
