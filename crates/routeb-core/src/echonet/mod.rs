//! ECHONET Lite module - frame and property codecs.
//!
//! Frames arrive from the module as hexadecimal text (the payload field of an
//! `ERXUDP` notification) and leave as raw bytes appended to `SKSENDTO`.
//! Both directions are handled here.

pub mod constants;
pub mod frame;
pub mod property;

pub use frame::Frame;
pub use property::Property;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("PDC {declared} does not match EDT length {actual}")]
    LengthMismatch { declared: u8, actual: usize },

    #[error("EDT too long: {0} bytes (max 255)")]
    ValueTooLong(usize),

    #[error("Object 0x{0:X} does not fit in 24 bits")]
    ObjectOutOfRange(u32),

    #[error("Too many properties: {0} (max 255)")]
    TooManyProperties(usize),

    #[error("Malformed property: {0}")]
    MalformedProperty(String),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode `bytes` bytes of hex text starting at character offset `start`.
///
/// The error is a human readable reason; callers wrap it in the variant for
/// their layer.
pub(crate) fn hex_field(text: &str, start: usize, bytes: usize) -> Result<Vec<u8>, String> {
    let end = start + bytes * 2;
    if text.len() < end {
        return Err(format!(
            "need {} hex characters at offset {}, only {} available",
            bytes * 2,
            start,
            text.len().saturating_sub(start)
        ));
    }
    let digits = text
        .get(start..end)
        .ok_or_else(|| format!("non-ASCII text at offset {}", start))?;
    hex::decode(digits).map_err(|e| format!("{} in {:?}", e, digits))
}
