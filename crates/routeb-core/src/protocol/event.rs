//! Classification of unsolicited lines from the module.

use super::constants::{ERXUDP_PAYLOAD_FIELD, ERXUDP_PREFIX, EVENT_PREFIX};

/// A parsed `EVENT <code> <sender> [param]` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLine<'a> {
    /// Event number (hex on the wire)
    pub code: u8,
    /// IPv6 address of the node that caused the event, if present
    pub sender: Option<&'a str>,
    /// Trailing parameter, if present
    pub param: Option<&'a str>,
}

impl<'a> EventLine<'a> {
    /// Parse an event line. Anything else yields `None`.
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        if fields.next()? != EVENT_PREFIX {
            return None;
        }
        let code = u8::from_str_radix(fields.next()?, 16).ok()?;
        Some(Self {
            code,
            sender: fields.next(),
            param: fields.next(),
        })
    }

    /// True if `line` is an event with the given code.
    pub fn is(line: &str, code: u8) -> bool {
        EventLine::parse(line).is_some_and(|e| e.code == code)
    }
}

/// Hex payload of an `ERXUDP` notification.
///
/// `ERXUDP <sender> <dest> <rport> <lport> <senderlla> <secured> <datalen> <data>`
pub fn erxudp_payload(line: &str) -> Option<&str> {
    if !line.starts_with(ERXUDP_PREFIX) {
        return None;
    }
    line.split(' ').nth(ERXUDP_PAYLOAD_FIELD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::*;

    #[test]
    fn test_parse_event() {
        let ev = EventLine::parse("EVENT 25 FE80:0000:0000:0000:021C:6400:030C:12A4").unwrap();
        assert_eq!(ev.code, EVENT_PANA_SUCCESS);
        assert_eq!(ev.sender, Some("FE80:0000:0000:0000:021C:6400:030C:12A4"));
        assert_eq!(ev.param, None);

        let ev = EventLine::parse("EVENT 21 FE80:0000:0000:0000:021C:6400:030C:12A4 00").unwrap();
        assert_eq!(ev.code, EVENT_UDP_SENT);
        assert_eq!(ev.param, Some("00"));

        assert_eq!(EventLine::parse("EVENT 1F").unwrap().code, 0x1F);
    }

    #[test]
    fn test_non_events() {
        assert!(EventLine::parse("OK").is_none());
        assert!(EventLine::parse("").is_none());
        assert!(EventLine::parse("EVENT").is_none());
        assert!(EventLine::parse("EVENT XYZ").is_none());
        assert!(EventLine::parse("EVENTS 20").is_none());
        assert!(EventLine::parse("  Channel:21").is_none());
    }

    #[test]
    fn test_event_is() {
        assert!(EventLine::is("EVENT 24 FE80::1", EVENT_PANA_FAILED));
        assert!(!EventLine::is("EVENT 24 FE80::1", EVENT_PANA_SUCCESS));
        assert!(!EventLine::is("EVENT 2", EVENT_BEACON_RECEIVED));
    }

    #[test]
    fn test_erxudp_payload() {
        let line = "ERXUDP FE80:0000:0000:0000:021C:6400:030C:12A4 FE80:0000:0000:0000:021D:1290:1234:5678 0E1A 0E1A 001C6400030C12A4 1 0012 1081000102880105FF017200";
        assert_eq!(erxudp_payload(line), Some("1081000102880105FF017200"));
        assert_eq!(erxudp_payload("ERXUDP FE80 too short"), None);
        assert_eq!(erxudp_payload("EVENT 21 FE80 00"), None);
    }
}
