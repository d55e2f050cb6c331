//! GATT profile of the camera peripheral.
//!
//! One primary service with two characteristics: the photo characteristic
//! notifies image chunks, the command characteristic accepts one-byte opcodes.

/// Primary service advertised by the camera.
pub const SERVICE_UUID: &str = "19b10000-e8f2-537e-4f6c-d104768a1214";

/// Photo characteristic (notify). Carries frame chunks.
pub const PHOTO_CHARACTERISTIC_UUID: &str = "6df8c9f3-0d19-4457-aec9-befd07394aa0";

/// Command characteristic (write). See [`crate::command`] for opcodes.
pub const COMMAND_CHARACTERISTIC_UUID: &str = "a2191136-22a0-494b-a55c-a16250766324";

/// Advertised name of the live-stream firmware.
pub const DEVICE_NAME: &str = "SafeBaby-CAM";

/// Advertised name of the snapshot-only firmware.
pub const SNAPSHOT_DEVICE_NAME: &str = "ESP32-CAM-Enhanced";

/// ATT MTU requested by the companion app.
pub const ATT_MTU: usize = 247;

/// Preferred connection interval hints placed in the scan response
/// (units of 1.25 ms). Some iOS centrals refuse to connect without them.
pub const MIN_PREFERRED_INTERVALS: [u16; 2] = [0x06, 0x12];
