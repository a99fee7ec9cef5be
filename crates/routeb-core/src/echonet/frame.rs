//! ECHONET Lite frame (format 1).
//!
//! ```text
//! +------+------+-------+--------+--------+-----+-----+------------------+
//! | EHD1 | EHD2 | TID   | SEOJ   | DEOJ   | ESV | OPC | OPC x properties |
//! | 1    | 1    | 2     | 3      | 3      | 1   | 1   | EPC PDC EDT...   |
//! +------+------+-------+--------+--------+-----+-----+------------------+
//! ```
//!
//! All multi-byte fields are big-endian.

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::constants::{EHD1_ECHONET_LITE, EHD2_FORMAT1, ESV_GET};
use super::{CodecError, Property, hex_field};

const OBJECT_MAX: u32 = 0x00FF_FFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    ehd1: u8,
    ehd2: u8,
    tid: u16,
    seoj: u32,
    deoj: u32,
    esv: u8,
    properties: Vec<Property>,
}

impl Frame {
    /// Fixed header size in bytes.
    pub const HEADER_SIZE: usize = 12;
    /// Fixed header size in hex characters.
    pub const HEADER_HEX_LEN: usize = Self::HEADER_SIZE * 2;

    /// Build a frame. OPC is the length of `properties`.
    pub fn new(
        ehd1: u8,
        ehd2: u8,
        tid: u16,
        seoj: u32,
        deoj: u32,
        esv: u8,
        properties: Vec<Property>,
    ) -> Result<Self, CodecError> {
        for obj in [seoj, deoj] {
            if obj > OBJECT_MAX {
                return Err(CodecError::ObjectOutOfRange(obj));
            }
        }
        if properties.len() > u8::MAX as usize {
            return Err(CodecError::TooManyProperties(properties.len()));
        }
        Ok(Self {
            ehd1,
            ehd2,
            tid,
            seoj,
            deoj,
            esv,
            properties,
        })
    }

    /// Get request (ESV 0x62) for the given EPCs.
    pub fn get_request(tid: u16, seoj: u32, deoj: u32, epcs: &[u8]) -> Result<Self, CodecError> {
        let properties = epcs.iter().copied().map(Property::request).collect();
        Self::new(
            EHD1_ECHONET_LITE,
            EHD2_FORMAT1,
            tid,
            seoj,
            deoj,
            ESV_GET,
            properties,
        )
    }

    pub fn ehd1(&self) -> u8 {
        self.ehd1
    }

    pub fn ehd2(&self) -> u8 {
        self.ehd2
    }

    pub fn tid(&self) -> u16 {
        self.tid
    }

    pub fn seoj(&self) -> u32 {
        self.seoj
    }

    pub fn deoj(&self) -> u32 {
        self.deoj
    }

    pub fn esv(&self) -> u8 {
        self.esv
    }

    pub fn opc(&self) -> u8 {
        self.properties.len() as u8
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// First property with the given EPC.
    pub fn property(&self, epc: u8) -> Option<&Property> {
        self.properties.iter().find(|p| p.epc() == epc)
    }

    pub fn encoded_len(&self) -> usize {
        Self::HEADER_SIZE
            + self
                .properties
                .iter()
                .map(Property::encoded_len)
                .sum::<usize>()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.write_u8(self.ehd1).unwrap();
        buf.write_u8(self.ehd2).unwrap();
        buf.write_u16::<BigEndian>(self.tid).unwrap();
        buf.write_u24::<BigEndian>(self.seoj).unwrap();
        buf.write_u24::<BigEndian>(self.deoj).unwrap();
        buf.write_u8(self.esv).unwrap();
        buf.write_u8(self.opc()).unwrap();
        for p in &self.properties {
            p.write_to(&mut buf);
        }
        buf
    }

    /// Upper-case hex text of the wire bytes, as the module prints it.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.to_bytes())
    }

    /// Decode a frame from hex text.
    ///
    /// Text after the last declared property is ignored. Any failure discards
    /// the whole frame.
    pub fn from_hex(text: &str) -> Result<Self, CodecError> {
        let header = hex_field(text, 0, Self::HEADER_SIZE)
            .map_err(|e| CodecError::MalformedFrame(format!("header: {}", e)))?;
        let mut frame = Self::parse_header(&header)?;

        let opc = header[Self::HEADER_SIZE - 1] as usize;
        let mut pos = Self::HEADER_HEX_LEN;
        for i in 0..opc {
            let rest = text.get(pos..).unwrap_or_default();
            let (prop, used) = Property::from_hex(rest)
                .map_err(|e| CodecError::MalformedFrame(format!("property {}: {}", i, e)))?;
            frame.properties.push(prop);
            pos += used;
        }
        Ok(frame)
    }

    /// Decode a frame from raw bytes. Trailing bytes are ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < Self::HEADER_SIZE {
            return Err(CodecError::MalformedFrame(format!(
                "header: need {} bytes, got {}",
                Self::HEADER_SIZE,
                data.len()
            )));
        }
        let mut frame = Self::parse_header(&data[..Self::HEADER_SIZE])?;

        let opc = data[Self::HEADER_SIZE - 1] as usize;
        let mut pos = Self::HEADER_SIZE;
        for i in 0..opc {
            let (prop, used) = Property::from_bytes(&data[pos..])
                .map_err(|e| CodecError::MalformedFrame(format!("property {}: {}", i, e)))?;
            frame.properties.push(prop);
            pos += used;
        }
        Ok(frame)
    }

    /// Parse the header bytes; properties are left empty with room for OPC.
    fn parse_header(header: &[u8]) -> Result<Self, CodecError> {
        let mut cursor = Cursor::new(header);
        let ehd1 = cursor.read_u8()?;
        let ehd2 = cursor.read_u8()?;
        let tid = cursor.read_u16::<BigEndian>()?;
        let seoj = cursor.read_u24::<BigEndian>()?;
        let deoj = cursor.read_u24::<BigEndian>()?;
        let esv = cursor.read_u8()?;
        let opc = cursor.read_u8()?;
        Ok(Self {
            ehd1,
            ehd2,
            tid,
            seoj,
            deoj,
            esv,
            properties: Vec::with_capacity(opc as usize),
        })
    }
}
