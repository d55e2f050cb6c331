//! Concrete collaborators for running the pipeline off-device.
//!
//! - [`ReplaySource`] serves recorded JPEG images in place of the sensor
//! - [`ChannelSink`] hands chunks to an in-process peer
//! - [`LogAdvertiser`] logs where a radio would advertise

pub mod advertise;
pub mod channel;
pub mod replay;

pub use advertise::LogAdvertiser;
pub use channel::ChannelSink;
pub use replay::ReplaySource;
