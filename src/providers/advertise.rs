//! Advertising controller that only logs

use tracing::info;

use crate::profile;
use crate::provider::Advertiser;

/// Advertiser for hosts where discoverability is handled elsewhere.
#[derive(Debug, Clone)]
pub struct LogAdvertiser {
    device_name: String,
}

impl LogAdvertiser {
    pub fn new(device_name: impl Into<String>) -> Self {
        Self { device_name: device_name.into() }
    }
}

impl Default for LogAdvertiser {
    fn default() -> Self {
        Self::new(profile::DEVICE_NAME)
    }
}

#[async_trait::async_trait]
impl Advertiser for LogAdvertiser {
    async fn start(&mut self) {
        info!(
            name = %self.device_name,
            service = profile::SERVICE_UUID,
            "Advertising photo service"
        );
    }
}
