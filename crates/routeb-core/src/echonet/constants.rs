//! ECHONET Lite protocol constants.
//!
//! Only the subset needed to talk to a low-voltage smart electric energy
//! meter over Route B.

// ============================================================================
// Header
// ============================================================================

/// EHD1: ECHONET Lite protocol
pub const EHD1_ECHONET_LITE: u8 = 0x10;
/// EHD2: specified message format (format 1)
pub const EHD2_FORMAT1: u8 = 0x81;

/// UDP port ECHONET Lite nodes listen on (3610)
pub const ECHONET_LITE_PORT: u16 = 0x0E1A;

// ============================================================================
// Objects (SEOJ / DEOJ)
// ============================================================================

/// Controller class, instance 1
pub const CONTROLLER_OBJECT: u32 = 0x05FF01;
/// Low-voltage smart electric energy meter class, instance 1
pub const SMART_METER_OBJECT: u32 = 0x028801;
/// Node profile object, instance 1
pub const NODE_PROFILE_OBJECT: u32 = 0x0EF001;

// ============================================================================
// Service codes (ESV)
// ============================================================================

pub const ESV_SETI: u8 = 0x60;
pub const ESV_SETC: u8 = 0x61;
pub const ESV_GET: u8 = 0x62;
pub const ESV_INF_REQ: u8 = 0x63;
pub const ESV_SET_RES: u8 = 0x71;
pub const ESV_GET_RES: u8 = 0x72;
pub const ESV_INF: u8 = 0x73;
pub const ESV_INFC: u8 = 0x74;
pub const ESV_GET_SNA: u8 = 0x52;

// ============================================================================
// Smart meter properties (EPC)
// ============================================================================

/// Operation status
pub const EPC_OPERATION_STATUS: u8 = 0x80;
/// Coefficient for cumulative energy
pub const EPC_COEFFICIENT: u8 = 0xD3;
/// Number of effective digits for cumulative energy
pub const EPC_EFFECTIVE_DIGITS: u8 = 0xD7;
/// Cumulative energy, normal direction
pub const EPC_CUMULATIVE_ENERGY: u8 = 0xE0;
/// Unit for cumulative energy
pub const EPC_CUMULATIVE_UNIT: u8 = 0xE1;
/// Instantaneous power (W, signed 32-bit)
pub const EPC_INSTANTANEOUS_POWER: u8 = 0xE7;
/// Instantaneous current (R/T phase, 0.1 A, signed 16-bit each)
pub const EPC_INSTANTANEOUS_CURRENT: u8 = 0xE8;
