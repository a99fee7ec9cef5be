//! ECHONET Lite property (EPC / PDC / EDT).

use super::{CodecError, hex_field};

/// A single property record: tag, declared length and value bytes.
///
/// `pdc == edt.len()` is checked at construction and the fields are not
/// mutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    epc: u8,
    pdc: u8,
    edt: Vec<u8>,
}

impl Property {
    pub fn new(epc: u8, pdc: u8, edt: Vec<u8>) -> Result<Self, CodecError> {
        if pdc as usize != edt.len() {
            return Err(CodecError::LengthMismatch {
                declared: pdc,
                actual: edt.len(),
            });
        }
        Ok(Self { epc, pdc, edt })
    }

    /// Build a property whose PDC is taken from the value length.
    pub fn with_value(epc: u8, edt: impl Into<Vec<u8>>) -> Result<Self, CodecError> {
        let edt = edt.into();
        let pdc = u8::try_from(edt.len()).map_err(|_| CodecError::ValueTooLong(edt.len()))?;
        Ok(Self { epc, pdc, edt })
    }

    /// Empty property, as used in Get requests.
    pub fn request(epc: u8) -> Self {
        Self {
            epc,
            pdc: 0,
            edt: Vec::new(),
        }
    }

    pub fn epc(&self) -> u8 {
        self.epc
    }

    pub fn pdc(&self) -> u8 {
        self.pdc
    }

    pub fn edt(&self) -> &[u8] {
        &self.edt
    }

    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        2 + self.edt.len()
    }

    /// Raw wire bytes: EPC, PDC, EDT.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buf);
        buf
    }

    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(self.epc);
        buf.push(self.pdc);
        buf.extend_from_slice(&self.edt);
    }

    /// Upper-case hex text of the wire bytes.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.to_bytes())
    }

    /// Decode one property from the start of `text`.
    ///
    /// Returns the property and the number of hex characters consumed.
    /// Characters after the property are left alone.
    pub fn from_hex(text: &str) -> Result<(Self, usize), CodecError> {
        let head = hex_field(text, 0, 2).map_err(CodecError::MalformedProperty)?;
        let (epc, pdc) = (head[0], head[1]);
        let edt = hex_field(text, 4, pdc as usize)
            .map_err(|e| CodecError::MalformedProperty(format!("EPC 0x{:02X}: {}", epc, e)))?;
        let consumed = 4 + 2 * pdc as usize;
        Ok((Self { epc, pdc, edt }, consumed))
    }

    /// Decode one property from the start of `data`.
    ///
    /// Returns the property and the number of bytes consumed.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), CodecError> {
        if data.len() < 2 {
            return Err(CodecError::MalformedProperty(format!(
                "need 2 header bytes, got {}",
                data.len()
            )));
        }
        let (epc, pdc) = (data[0], data[1]);
        let end = 2 + pdc as usize;
        if data.len() < end {
            return Err(CodecError::MalformedProperty(format!(
                "EPC 0x{:02X}: PDC {} but only {} value bytes",
                epc,
                pdc,
                data.len() - 2
            )));
        }
        let edt = data[2..end].to_vec();
        Ok((Self { epc, pdc, edt }, end))
    }
}
