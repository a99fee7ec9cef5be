//! Active scan results.

use serde::{Deserialize, Serialize};

use super::constants::{
    SCAN_KEY_ADDR, SCAN_KEY_CHANNEL, SCAN_KEY_CHANNEL_PAGE, SCAN_KEY_LQI, SCAN_KEY_PAIR_ID,
    SCAN_KEY_PAN_ID,
};

/// PAN coordinator found by an active scan.
///
/// Fields not reported by the module keep their default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanDescriptor {
    pub channel: u8,
    pub channel_page: u8,
    pub pan_id: u16,
    /// MAC address of the coordinator, 16 hex characters
    pub address: String,
    pub lqi: u8,
    pub pair_id: String,
}

impl PanDescriptor {
    /// Fold one `  Key:Value` scan line into the descriptor.
    ///
    /// Returns `true` if the line was a known key. A known key with an
    /// unparsable value is consumed but leaves the field unchanged.
    pub fn apply_line(&mut self, line: &str) -> bool {
        let value = move || line.split_once(':').map(|(_, v)| v.trim()).unwrap_or_default();

        if line.starts_with(SCAN_KEY_CHANNEL_PAGE) {
            if let Ok(v) = u8::from_str_radix(value(), 16) {
                self.channel_page = v;
            }
        } else if line.starts_with(SCAN_KEY_CHANNEL) {
            if let Ok(v) = u8::from_str_radix(value(), 16) {
                self.channel = v;
            }
        } else if line.starts_with(SCAN_KEY_PAN_ID) {
            if let Ok(v) = u16::from_str_radix(value(), 16) {
                self.pan_id = v;
            }
        } else if line.starts_with(SCAN_KEY_ADDR) {
            self.address = value().to_string();
        } else if line.starts_with(SCAN_KEY_LQI) {
            if let Ok(v) = u8::from_str_radix(value(), 16) {
                self.lqi = v;
            }
        } else if line.starts_with(SCAN_KEY_PAIR_ID) {
            self.pair_id = value().to_string();
        } else {
            return false;
        }
        true
    }
}
