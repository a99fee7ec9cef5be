//! SKSTACK-IP command set constants (BP35A1 and compatible modules).

// ============================================================================
// Line framing
// ============================================================================

/// Line terminator for commands (Host -> Module)
pub const CRLF: &str = "\r\n";

/// Terminator line closing a successful synchronous reply
pub const REPLY_OK: &str = "OK";

/// Prefix of a failed synchronous reply (`FAIL ER04` etc.)
pub const REPLY_FAIL_PREFIX: &str = "FAIL";

// ============================================================================
// Command verbs
// ============================================================================

pub const CMD_INFO: &str = "SKINFO";
pub const CMD_VERSION: &str = "SKVER";
pub const CMD_SET_PASSWORD: &str = "SKSETPWD";
pub const CMD_SET_RBID: &str = "SKSETRBID";
pub const CMD_SET_REGISTER: &str = "SKSREG";
pub const CMD_LL64: &str = "SKLL64";
pub const CMD_SCAN: &str = "SKSCAN";
pub const CMD_JOIN: &str = "SKJOIN";
pub const CMD_SENDTO: &str = "SKSENDTO";

// ============================================================================
// Registers
// ============================================================================

/// Logical channel number
pub const REG_CHANNEL: &str = "S2";
/// PAN ID
pub const REG_PAN_ID: &str = "S3";

// ============================================================================
// Scan parameters
// ============================================================================

/// Active scan with information element (required to receive PairID)
pub const SCAN_MODE_ACTIVE_IE: u8 = 2;
/// Scan every channel
pub const SCAN_CHANNEL_MASK_ALL: u32 = 0xFFFF_FFFF;
/// Per-channel scan duration exponent
pub const SCAN_DURATION_DEFAULT: u8 = 6;

// ============================================================================
// Unsolicited events (Module -> Host)
// ============================================================================

/// Prefix of an event line: `EVENT <code> <sender> [param]`
pub const EVENT_PREFIX: &str = "EVENT";

/// Beacon received; scan result lines follow
pub const EVENT_BEACON_RECEIVED: u8 = 0x20;
/// UDP send complete
pub const EVENT_UDP_SENT: u8 = 0x21;
/// Active scan complete
pub const EVENT_SCAN_COMPLETE: u8 = 0x22;
/// PANA connection failed
pub const EVENT_PANA_FAILED: u8 = 0x24;
/// PANA connection established
pub const EVENT_PANA_SUCCESS: u8 = 0x25;

/// Received UDP datagram notification
pub const ERXUDP_PREFIX: &str = "ERXUDP";
/// Space-delimited field index holding the hex payload
pub const ERXUDP_PAYLOAD_FIELD: usize = 8;

// ============================================================================
// Scan result keys
// ============================================================================

pub const SCAN_KEY_CHANNEL: &str = "  Channel:";
pub const SCAN_KEY_CHANNEL_PAGE: &str = "  Channel Page:";
pub const SCAN_KEY_PAN_ID: &str = "  Pan ID:";
pub const SCAN_KEY_ADDR: &str = "  Addr:";
pub const SCAN_KEY_LQI: &str = "  LQI:";
pub const SCAN_KEY_PAIR_ID: &str = "  PairID:";
