//! Connection settings, loadable from TOML.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::protocol::{SCAN_CHANNEL_MASK_ALL, SCAN_DURATION_DEFAULT};
use crate::transport::serial::DEFAULT_READ_TIMEOUT_MS;

/// Serial link and Route B settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Serial device path.
    pub device: String,
    /// Baud rate.
    pub baud: u32,
    /// Serial read timeout in milliseconds.
    pub read_timeout_ms: u64,
    /// Route B credentials and scan parameters.
    pub route_b: RouteBConfig,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud: 115_200,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            route_b: RouteBConfig::default(),
        }
    }
}

impl ModuleConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ModuleConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Route B credentials issued by the electricity distributor, plus scan and
/// send parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteBConfig {
    /// Route B authentication ID (32 characters).
    pub rbid: String,
    /// Route B password (12 characters).
    pub password: String,
    /// Channels to scan, one bit per channel.
    pub channel_mask: u32,
    /// Scan duration exponent per channel.
    pub scan_duration: u8,
    /// UDP handle used for SKSENDTO.
    pub send_handle: u8,
    /// Send with PANA encryption.
    pub secured: bool,
}

impl Default for RouteBConfig {
    fn default() -> Self {
        Self {
            rbid: String::new(),
            password: String::new(),
            channel_mask: SCAN_CHANNEL_MASK_ALL,
            scan_duration: SCAN_DURATION_DEFAULT,
            send_handle: 1,
            secured: true,
        }
    }
}

impl RouteBConfig {
    pub const RBID_LEN: usize = 32;
    pub const PASSWORD_LEN: usize = 12;

    /// Reject credentials the module would refuse.
    pub fn validate(&self) -> Result<()> {
        if self.rbid.len() != Self::RBID_LEN || !self.rbid.is_ascii() {
            bail!(
                "Route B ID must be {} ASCII characters, got {}",
                Self::RBID_LEN,
                self.rbid.len()
            );
        }
        if self.password.len() != Self::PASSWORD_LEN || !self.password.is_ascii() {
            bail!(
                "Route B password must be {} ASCII characters, got {}",
                Self::PASSWORD_LEN,
                self.password.len()
            );
        }
        if self.password.contains(char::is_whitespace) {
            bail!("Route B password must not contain whitespace");
        }
        Ok(())
    }
}
