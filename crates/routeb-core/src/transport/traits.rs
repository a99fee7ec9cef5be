//! Line transport abstraction.
//!
//! Defines the `LineTransport` trait the command session and the frame
//! stream read from, allowing different implementations (serial, mock, any
//! duplex byte stream).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to open {device}: {message}")]
    OpenFailed { device: String, message: String },

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Device disconnected")]
    Disconnected,

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstract line-oriented transport to the radio module.
///
/// There is exactly one logical reader: whoever holds the transport by
/// `&mut` (a command) or by value (a frame stream) is the only consumer.
pub trait LineTransport: Send {
    /// Write raw bytes verbatim. The caller supplies line terminators.
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Read the next line with its terminator stripped.
    ///
    /// Returns `Ok(None)` at end-of-stream. A read timeout is reported as
    /// [`TransportError::Timeout`] and any partial line is kept for the next
    /// call.
    fn read_line(&mut self) -> Result<Option<String>, TransportError>;

    /// Check if the module is still reachable.
    fn is_connected(&self) -> bool {
        true
    }
}

impl<T: LineTransport + ?Sized> LineTransport for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        (**self).write(data)
    }

    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        (**self).read_line()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}
