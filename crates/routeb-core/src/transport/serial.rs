//! serialport-based transport implementation.

use std::time::Duration;

use serialport::SerialPort;
use tracing::{info, instrument};

use super::io::IoTransport;
use super::traits::{LineTransport, TransportError};

/// Default read timeout; short enough for a frame stream to notice
/// cancellation while the module is quiet.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 500;

/// Serial port transport (8N1, no flow control).
pub struct SerialTransport {
    inner: IoTransport<Box<dyn SerialPort>>,
    device: String,
}

impl SerialTransport {
    /// Open a serial device at the given baud rate.
    #[instrument(level = "info")]
    pub fn open(device: &str, baud: u32) -> Result<Self, TransportError> {
        Self::open_with_timeout(device, baud, DEFAULT_READ_TIMEOUT_MS)
    }

    pub fn open_with_timeout(
        device: &str,
        baud: u32,
        timeout_ms: u64,
    ) -> Result<Self, TransportError> {
        let port = serialport::new(device, baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(timeout_ms))
            .open()
            .map_err(|e| TransportError::OpenFailed {
                device: device.to_string(),
                message: e.to_string(),
            })?;

        info!(device = %device, baud, "Serial port opened");

        Ok(Self {
            inner: IoTransport::new(port).with_timeout_ms(timeout_ms),
            device: device.to_string(),
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

impl LineTransport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        self.inner.write(data)
    }

    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        self.inner.read_line()
    }

    fn is_connected(&self) -> bool {
        // A vanished USB-serial adapter fails this query
        self.inner.get_ref().bytes_to_read().is_ok()
    }
}
