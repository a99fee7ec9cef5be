//! Command/response session with the Wi-SUN module.
//!
//! Every command follows one of three reply shapes:
//!
//! - **Echo check** (`SKINFO`, `SKVER`): echo, payload line, `OK`.
//! - **Drain** (`SKSETPWD`, `SKSETRBID`, `SKSREG`): lines up to `OK`, not
//!   inspected.
//! - **Event sequence** (`SKSCAN`, `SKJOIN`): a drained acknowledgment, then
//!   unsolicited `EVENT` lines until a terminal event.
//!
//! Commands borrow the module mutably, so only one is ever in flight. Turning
//! the module into a [`FrameStream`] moves the transport to a background
//! reader; [`FrameStream::finish`] hands it back.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::RouteBConfig;
use crate::echonet::constants::ECHONET_LITE_PORT;
use crate::echonet::{CodecError, Frame};
use crate::events::{LineDirection, ModuleEvent, ModuleObserver, TracingObserver};
use crate::protocol::constants::*;
use crate::protocol::{EventLine, PanDescriptor};
use crate::stream::FrameStream;
use crate::transport::{LineTransport, TransportError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Echo mismatch: expected {expected:?}, got {actual:?}")]
    EchoMismatch { expected: String, actual: String },

    #[error("Malformed response to {command}: {reason}")]
    MalformedResponse { command: String, reason: String },

    #[error("{command} failed: {reply}")]
    CommandFailed { command: String, reply: String },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("PANA authentication rejected")]
    JoinRejected,

    #[error("No PAN coordinator found")]
    NoCoordinator,

    #[error("Failed to start frame stream: {0}")]
    StreamSpawn(std::io::Error),

    #[error("Frame stream worker panicked")]
    StreamPanicked,
}

impl SessionError {
    /// Conditions the caller can act on by re-issuing the command.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::JoinRejected
                | SessionError::NoCoordinator
                | SessionError::CommandFailed { .. }
        )
    }

    fn malformed(command: &str, reason: impl Into<String>) -> Self {
        SessionError::MalformedResponse {
            command: command.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result of a PANA join attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// `EVENT 25`: session established.
    Joined,
    /// `EVENT 24`: authentication failed.
    Failed,
}

impl JoinOutcome {
    pub fn is_joined(&self) -> bool {
        matches!(self, JoinOutcome::Joined)
    }

    /// Map a failed join to [`SessionError::JoinRejected`].
    pub fn into_result(self) -> Result<(), SessionError> {
        match self {
            JoinOutcome::Joined => Ok(()),
            JoinOutcome::Failed => Err(SessionError::JoinRejected),
        }
    }
}

/// An established Route B link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBLink {
    /// Coordinator found by the scan.
    pub pan: PanDescriptor,
    /// IPv6 link-local address of the smart meter.
    pub meter_address: String,
}

/// Driver for a BP35A1-compatible Wi-SUN module.
pub struct Bp35a1<T: LineTransport, O: ModuleObserver = TracingObserver> {
    pub(crate) transport: T,
    pub(crate) observer: Arc<O>,
}

impl<T: LineTransport> Bp35a1<T, TracingObserver> {
    /// Create a driver with the default tracing observer.
    pub fn new(transport: T) -> Self {
        Self::with_observer(transport, Arc::new(TracingObserver))
    }
}

impl<T: LineTransport, O: ModuleObserver> Bp35a1<T, O> {
    /// Create a driver with a custom observer.
    pub fn with_observer(transport: T, observer: Arc<O>) -> Self {
        Self {
            transport,
            observer,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub(crate) fn emit(&self, event: ModuleEvent) {
        self.observer.on_event(&event);
    }

    // ------------------------------------------------------------------------
    // Line I/O
    // ------------------------------------------------------------------------

    fn write_raw(&mut self, data: &[u8], shown: &str) -> Result<(), SessionError> {
        self.transport.write(data)?;
        self.emit(ModuleEvent::Line {
            direction: LineDirection::Tx,
            text: shown.to_string(),
        });
        Ok(())
    }

    fn send_command(&mut self, command: &str) -> Result<(), SessionError> {
        let verb = command.split(' ').next().unwrap_or(command);
        self.emit(ModuleEvent::CommandIssued {
            verb: verb.to_string(),
        });
        let line = format!("{}{}", command, CRLF);
        self.write_raw(line.as_bytes(), command)
    }

    /// One read from the transport, timeouts included.
    pub(crate) fn read_raw_line(&mut self) -> Result<Option<String>, TransportError> {
        let line = self.transport.read_line()?;
        if let Some(text) = &line {
            self.emit(ModuleEvent::Line {
                direction: LineDirection::Rx,
                text: text.clone(),
            });
        }
        Ok(line)
    }

    /// Fail a read timeout if the link itself has gone away. A quiet module
    /// and an unplugged adapter both look like timeouts on a serial port.
    pub(crate) fn check_link(&self) -> Result<(), TransportError> {
        if self.transport.is_connected() {
            Ok(())
        } else {
            Err(TransportError::Disconnected)
        }
    }

    /// Next line, waiting through read timeouts. `None` at end-of-stream.
    fn next_line(&mut self) -> Result<Option<String>, SessionError> {
        loop {
            match self.read_raw_line() {
                Ok(line) => return Ok(line),
                Err(TransportError::Timeout { .. }) => self.check_link()?,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn expect_line(&mut self, command: &str) -> Result<String, SessionError> {
        self.next_line()?
            .ok_or_else(|| SessionError::malformed(command, "stream ended mid-reply"))
    }

    /// Read lines up to and including the `OK` terminator.
    fn drain_until_ok(&mut self, command: &str) -> Result<Vec<String>, SessionError> {
        let mut lines = Vec::new();
        loop {
            let Some(line) = self.next_line()? else {
                return Err(SessionError::malformed(
                    command,
                    format!("stream ended after {} lines without OK", lines.len()),
                ));
            };
            if line == REPLY_OK {
                lines.push(line);
                return Ok(lines);
            }
            if line.starts_with(REPLY_FAIL_PREFIX) {
                return Err(SessionError::CommandFailed {
                    command: command.to_string(),
                    reply: line,
                });
            }
            lines.push(line);
        }
    }

    /// Echo-checked single-line query.
    fn query(&mut self, command: &str) -> Result<String, SessionError> {
        self.send_command(command)?;
        let lines = self.drain_until_ok(command)?;
        if lines.len() != 3 {
            return Err(SessionError::malformed(
                command,
                format!("expected 3 lines, got {}", lines.len()),
            ));
        }
        let mut lines = lines.into_iter();
        let echo = lines.next().unwrap_or_default();
        if echo != command {
            return Err(SessionError::EchoMismatch {
                expected: command.to_string(),
                actual: echo,
            });
        }
        Ok(lines.next().unwrap_or_default())
    }

    /// Command whose reply is only drained.
    fn execute(&mut self, command: &str) -> Result<Vec<String>, SessionError> {
        self.send_command(command)?;
        self.drain_until_ok(command)
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// `SKINFO`: link-local address, MAC, channel, PAN ID and more, as the
    /// module's `EINFO` line.
    #[instrument(skip(self))]
    pub fn info(&mut self) -> Result<String, SessionError> {
        self.query(CMD_INFO)
    }

    /// `SKVER`: firmware version line (`EVER x.y.z`).
    #[instrument(skip(self))]
    pub fn version(&mut self) -> Result<String, SessionError> {
        self.query(CMD_VERSION)
    }

    /// `SKSETPWD`: store the Route B password used by PANA.
    #[instrument(skip(self, password))]
    pub fn set_password(&mut self, password: &str) -> Result<(), SessionError> {
        let command = format!("{} {:X} {}", CMD_SET_PASSWORD, password.len(), password);
        self.execute(&command)?;
        Ok(())
    }

    /// `SKSETRBID`: store the Route B ID.
    #[instrument(skip(self, rbid))]
    pub fn set_rbid(&mut self, rbid: &str) -> Result<(), SessionError> {
        self.execute(&format!("{} {}", CMD_SET_RBID, rbid))?;
        Ok(())
    }

    /// `SKSREG`: write a virtual register.
    #[instrument(skip(self))]
    pub fn set_register(&mut self, register: &str, value: &str) -> Result<(), SessionError> {
        self.execute(&format!("{} {} {}", CMD_SET_REGISTER, register, value))?;
        Ok(())
    }

    /// `SKLL64`: IPv6 link-local address derived from a 64-bit MAC.
    #[instrument(skip(self))]
    pub fn link_local_address(&mut self, mac: &str) -> Result<String, SessionError> {
        let command = format!("{} {}", CMD_LL64, mac);
        self.send_command(&command)?;
        let echo = self.expect_line(&command)?;
        if echo != command {
            return Err(SessionError::EchoMismatch {
                expected: command,
                actual: echo,
            });
        }
        let address = self.expect_line(&command)?;
        Ok(address.trim().to_string())
    }

    /// `SKSCAN`: active scan for a PAN coordinator.
    ///
    /// Returns `None` if the scan completes without a beacon. Lines outside
    /// the expected shapes are ignored.
    #[instrument(skip(self), fields(mask = %format!("{:08X}", channel_mask)))]
    pub fn scan(
        &mut self,
        channel_mask: u32,
        duration: u8,
    ) -> Result<Option<PanDescriptor>, SessionError> {
        let command = format!(
            "{} {} {:08X} {:X}",
            CMD_SCAN, SCAN_MODE_ACTIVE_IE, channel_mask, duration
        );
        self.execute(&command)?;

        loop {
            let line = self.next_line()?.ok_or_else(|| {
                SessionError::malformed(&command, "stream ended before a beacon or scan end")
            })?;
            if EventLine::is(&line, EVENT_BEACON_RECEIVED) {
                break;
            }
            if EventLine::is(&line, EVENT_SCAN_COMPLETE) {
                info!("Scan complete, no beacon");
                self.emit(ModuleEvent::ScanEmpty);
                return Ok(None);
            }
        }

        let mut pan = PanDescriptor::default();
        while let Some(line) = self.next_line()? {
            if EventLine::is(&line, EVENT_SCAN_COMPLETE) {
                break;
            }
            if !pan.apply_line(&line) {
                debug!(line = %line, "Ignoring line during scan");
            }
        }

        self.emit(ModuleEvent::PanFound(pan.clone()));
        Ok(Some(pan))
    }

    /// `SKJOIN`: start PANA authentication with the coordinator.
    #[instrument(skip(self))]
    pub fn join(&mut self, address: &str) -> Result<JoinOutcome, SessionError> {
        let command = format!("{} {}", CMD_JOIN, address);
        self.execute(&command)?;

        loop {
            let line = self.next_line()?.ok_or_else(|| {
                SessionError::malformed(&command, "stream ended before join result")
            })?;
            let outcome = match EventLine::parse(&line) {
                Some(ev) if ev.code == EVENT_PANA_FAILED => JoinOutcome::Failed,
                Some(ev) if ev.code == EVENT_PANA_SUCCESS => JoinOutcome::Joined,
                _ => continue,
            };
            self.emit(ModuleEvent::JoinFinished {
                joined: outcome.is_joined(),
            });
            return Ok(outcome);
        }
    }

    /// `SKSENDTO`: send a UDP datagram. The payload is appended as raw bytes.
    ///
    /// Replies (`EVENT 21`, `OK`, received datagrams) are left on the line;
    /// read them with [`Bp35a1::into_frame_stream`].
    #[instrument(skip(self, data), fields(len = data.len()))]
    pub fn send_to(
        &mut self,
        handle: u8,
        address: &str,
        port: u16,
        secured: bool,
        data: &[u8],
    ) -> Result<(), SessionError> {
        let header = format!(
            "{} {:X} {} {:04X} {:X} {:04X} ",
            CMD_SENDTO,
            handle,
            address,
            port,
            secured as u8,
            data.len()
        );
        self.emit(ModuleEvent::CommandIssued {
            verb: CMD_SENDTO.to_string(),
        });

        let mut line = Vec::with_capacity(header.len() + data.len() + CRLF.len());
        line.extend_from_slice(header.as_bytes());
        line.extend_from_slice(data);
        line.extend_from_slice(CRLF.as_bytes());

        let shown = format!("{}{}", header, hex::encode_upper(data));
        self.write_raw(&line, &shown)
    }

    /// Send an ECHONET Lite frame to the standard port of `address`.
    pub fn send_frame(
        &mut self,
        address: &str,
        frame: &Frame,
        settings: &RouteBConfig,
    ) -> Result<(), SessionError> {
        self.send_to(
            settings.send_handle,
            address,
            ECHONET_LITE_PORT,
            settings.secured,
            &frame.to_bytes(),
        )
    }

    /// Full Route B bring-up: credentials, scan, channel and PAN ID
    /// registers, address resolution and PANA join.
    #[instrument(skip(self, settings))]
    pub fn establish(&mut self, settings: &RouteBConfig) -> Result<RouteBLink, SessionError> {
        self.set_password(&settings.password)?;
        self.set_rbid(&settings.rbid)?;

        let pan = self
            .scan(settings.channel_mask, settings.scan_duration)?
            .ok_or(SessionError::NoCoordinator)?;

        self.set_register(REG_CHANNEL, &format!("{:02X}", pan.channel))?;
        self.set_register(REG_PAN_ID, &format!("{:04X}", pan.pan_id))?;

        let meter_address = self.link_local_address(&pan.address)?;
        info!(address = %meter_address, "Joining smart meter");
        self.join(&meter_address)?.into_result()?;

        Ok(RouteBLink { pan, meter_address })
    }
}

impl<T, O> Bp35a1<T, O>
where
    T: LineTransport + 'static,
    O: ModuleObserver + 'static,
{
    /// Hand the transport to a background reader delivering received frames.
    pub fn into_frame_stream(self) -> Result<FrameStream<T, O>, SessionError> {
        FrameStream::spawn(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::RecordingObserver;
    use crate::transport::MockTransport;

    fn module(lines: &[&str]) -> (Bp35a1<MockTransport>, MockTransport) {
        let mock = MockTransport::with_lines(lines.iter().copied());
        (Bp35a1::new(mock.clone()), mock)
    }

    #[test]
    fn test_query_returns_payload() {
        let (mut m, mock) = module(&[
            "SKINFO",
            "EINFO FE80:0000:0000:0000:021D:1290:1234:5678 001D129012345678 21 8888 FFFE",
            "OK",
        ]);
        let info = m.info().unwrap();
        assert!(info.starts_with("EINFO "));
        assert_eq!(mock.written_text(), vec!["SKINFO\r\n"]);
    }

    #[test]
    fn test_query_echo_mismatch() {
        let (mut m, _) = module(&["WRONG", "EVER 1.2.10", "OK"]);
        match m.version() {
            Err(SessionError::EchoMismatch { expected, actual }) => {
                assert_eq!(expected, "SKVER");
                assert_eq!(actual, "WRONG");
            }
            other => panic!("expected echo mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_query_wrong_line_count() {
        let (mut m, _) = module(&["SKVER", "EVER 1.2.10", "extra", "OK"]);
        assert!(matches!(
            m.version(),
            Err(SessionError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_query_end_of_stream() {
        let (mut m, _) = module(&["SKVER", "EVER 1.2.10"]);
        assert!(matches!(
            m.version(),
            Err(SessionError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_timeouts_are_waited_through() {
        let mock = MockTransport::new();
        mock.queue_line("SKVER");
        mock.queue_timeout();
        mock.queue_line("EVER 1.2.10");
        mock.queue_timeout();
        mock.queue_line("OK");
        let mut m = Bp35a1::new(mock);
        assert_eq!(m.version().unwrap(), "EVER 1.2.10");
    }

    /// Times out forever and reports the adapter as gone.
    struct VanishedAdapter;

    impl LineTransport for VanishedAdapter {
        fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
            Ok(data.len())
        }

        fn read_line(&mut self) -> Result<Option<String>, TransportError> {
            Err(TransportError::Timeout { timeout_ms: 500 })
        }

        fn is_connected(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_timeout_on_vanished_link_fails() {
        let mut m = Bp35a1::new(VanishedAdapter);
        assert!(matches!(
            m.version(),
            Err(SessionError::Transport(TransportError::Disconnected))
        ));
    }

    #[test]
    fn test_set_commands_drain_to_ok() {
        let (mut m, mock) = module(&[
            "SKSETPWD C 0123456789AB",
            "OK",
            "SKSETRBID 00112233445566778899AABBCCDDEEFF",
            "OK",
            "SKSREG S2 21",
            "OK",
        ]);
        m.set_password("0123456789AB").unwrap();
        m.set_rbid("00112233445566778899AABBCCDDEEFF").unwrap();
        m.set_register(REG_CHANNEL, "21").unwrap();
        assert_eq!(
            mock.written_text(),
            vec![
                "SKSETPWD C 0123456789AB\r\n",
                "SKSETRBID 00112233445566778899AABBCCDDEEFF\r\n",
                "SKSREG S2 21\r\n",
            ]
        );
        assert_eq!(mock.pending(), 0);
    }

    #[test]
    fn test_fail_reply() {
        let (mut m, _) = module(&["SKSREG S2 ZZ", "FAIL ER06"]);
        match m.set_register(REG_CHANNEL, "ZZ") {
            Err(e @ SessionError::CommandFailed { .. }) => {
                assert!(e.is_recoverable());
                assert!(e.to_string().contains("ER06"));
            }
            other => panic!("expected command failure, got {:?}", other),
        }
    }

    #[test]
    fn test_link_local_address() {
        let (mut m, _) = module(&[
            "SKLL64 001D129012345678",
            "FE80:0000:0000:0000:021D:1290:1234:5678",
        ]);
        assert_eq!(
            m.link_local_address("001D129012345678").unwrap(),
            "FE80:0000:0000:0000:021D:1290:1234:5678"
        );
    }

    #[test]
    fn test_link_local_address_echo_mismatch() {
        let (mut m, _) = module(&["SKLL64 0000000000000000", "FE80::1"]);
        assert!(matches!(
            m.link_local_address("001D129012345678"),
            Err(SessionError::EchoMismatch { .. })
        ));
    }

    #[test]
    fn test_scan_parses_descriptor() {
        let (mut m, mock) = module(&[
            "SKSCAN 2 FFFFFFFF 6",
            "OK",
            "EVENT 20 FE80:0000:0000:0000:021D:1290:1234:5678",
            "EPANDESC",
            "  Channel:21",
            "  Channel Page:09",
            "  Pan ID:8888",
            "  Addr:FE80000000000001",
            "  LQI:A0",
            "  PairID:00112233",
            "EVENT 22 FE80:0000:0000:0000:021D:1290:1234:5678",
        ]);
        let pan = m
            .scan(SCAN_CHANNEL_MASK_ALL, SCAN_DURATION_DEFAULT)
            .unwrap()
            .unwrap();
        assert_eq!(pan.channel, 0x21);
        assert_eq!(pan.channel_page, 0x09);
        assert_eq!(pan.pan_id, 0x8888);
        assert_eq!(pan.address, "FE80000000000001");
        assert_eq!(pan.lqi, 0xA0);
        assert_eq!(pan.pair_id, "00112233");
        assert_eq!(mock.written_text(), vec!["SKSCAN 2 FFFFFFFF 6\r\n"]);
    }

    #[test]
    fn test_scan_ignores_chatter_before_beacon() {
        let (mut m, _) = module(&[
            "SKSCAN 2 FFFFFFFF 6",
            "OK",
            "EVENT 1F FE80:0000:0000:0000:021D:1290:1234:5678",
            "  Channel:33",
            "EVENT 20 FE80:0000:0000:0000:021D:1290:1234:5678",
            "  Channel:21",
            "EVENT 22 FE80:0000:0000:0000:021D:1290:1234:5678",
            "  Channel:3B",
        ]);
        let pan = m.scan(SCAN_CHANNEL_MASK_ALL, 6).unwrap().unwrap();
        assert_eq!(pan.channel, 0x21);
        assert_eq!(pan.pan_id, 0);
    }

    #[test]
    fn test_scan_end_of_stream_after_beacon() {
        let (mut m, _) = module(&[
            "SKSCAN 2 FFFFFFFF 6",
            "OK",
            "EVENT 20 FE80:0000:0000:0000:021D:1290:1234:5678",
            "EPANDESC",
            "  Channel:21",
            "  Pan ID:8888",
        ]);
        let pan = m.scan(SCAN_CHANNEL_MASK_ALL, 6).unwrap().unwrap();
        assert_eq!(pan.channel, 0x21);
        assert_eq!(pan.pan_id, 0x8888);
        assert!(pan.address.is_empty());
    }

    #[test]
    fn test_scan_without_beacon() {
        let (mut m, _) = module(&[
            "SKSCAN 2 00000001 4",
            "OK",
            "EVENT 22 FE80:0000:0000:0000:021D:1290:1234:5678",
        ]);
        assert_eq!(m.scan(0x0000_0001, 4).unwrap(), None);
    }

    #[test]
    fn test_scan_stream_ends_before_beacon() {
        let (mut m, _) = module(&["SKSCAN 2 FFFFFFFF 6", "OK"]);
        assert!(matches!(
            m.scan(SCAN_CHANNEL_MASK_ALL, 6),
            Err(SessionError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_join_success() {
        let observer = Arc::new(RecordingObserver::default());
        let mock = MockTransport::with_lines([
            "SKJOIN FE80:0000:0000:0000:021D:1290:1234:5678",
            "OK",
            "EVENT 21 FE80:0000:0000:0000:021D:1290:1234:5678 00",
            "ERXUDP FE80:0000:0000:0000:021D:1290:1234:5678 FE80:0000:0000:0000:021D:1290:1234:5679 02CC 02CC 001D129012345678 0 0028 00000028C0000002",
            "EVENT 25 FE80:0000:0000:0000:021D:1290:1234:5678",
        ]);
        let mut m = Bp35a1::with_observer(mock, observer.clone());
        let outcome = m.join("FE80:0000:0000:0000:021D:1290:1234:5678").unwrap();
        assert_eq!(outcome, JoinOutcome::Joined);
        assert!(outcome.into_result().is_ok());
        assert!(
            observer
                .snapshot()
                .iter()
                .any(|e| matches!(e, ModuleEvent::JoinFinished { joined: true }))
        );
    }

    #[test]
    fn test_join_end_of_stream() {
        let (mut m, _) = module(&[
            "SKJOIN FE80:0000:0000:0000:021D:1290:1234:5678",
            "OK",
            "EVENT 21 FE80:0000:0000:0000:021D:1290:1234:5678 00",
        ]);
        assert!(matches!(
            m.join("FE80:0000:0000:0000:021D:1290:1234:5678"),
            Err(SessionError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_join_failure() {
        let (mut m, _) = module(&[
            "SKJOIN FE80:0000:0000:0000:021D:1290:1234:5678",
            "OK",
            "EVENT 24 FE80:0000:0000:0000:021D:1290:1234:5678",
            "EVENT 25 FE80:0000:0000:0000:021D:1290:1234:5678",
        ]);
        let outcome = m.join("FE80:0000:0000:0000:021D:1290:1234:5678").unwrap();
        assert_eq!(outcome, JoinOutcome::Failed);
        assert!(!outcome.is_joined());
        assert!(matches!(
            outcome.into_result(),
            Err(SessionError::JoinRejected)
        ));
    }

    #[test]
    fn test_send_to_appends_raw_payload() {
        let (mut m, mock) = module(&[]);
        m.send_to(
            1,
            "FE80:0000:0000:0000:021D:1290:1234:5678",
            0x0E1A,
            true,
            &[0x10, 0x81, 0x00],
        )
        .unwrap();
        let writes = mock.get_writes();
        assert_eq!(writes.len(), 1);
        let mut expected =
            b"SKSENDTO 1 FE80:0000:0000:0000:021D:1290:1234:5678 0E1A 1 0003 ".to_vec();
        expected.extend_from_slice(&[0x10, 0x81, 0x00]);
        expected.extend_from_slice(b"\r\n");
        assert_eq!(writes[0], expected);
    }

    #[test]
    fn test_transport_failure_propagates() {
        let (mut m, mock) = module(&[]);
        mock.disconnect();
        assert!(matches!(
            m.version(),
            Err(SessionError::Transport(TransportError::Disconnected))
        ));
    }

    #[test]
    fn test_establish_runs_bring_up_sequence() {
        let meter = "FE80:0000:0000:0000:021D:1290:1234:5678";
        let (mut m, mock) = module(&[
            "SKSETPWD C 0123456789AB",
            "OK",
            "SKSETRBID 00112233445566778899AABBCCDDEEFF",
            "OK",
            "SKSCAN 2 FFFFFFFF 6",
            "OK",
            "EVENT 20 FE80:0000:0000:0000:021D:1290:1234:5678",
            "EPANDESC",
            "  Channel:21",
            "  Pan ID:8888",
            "  Addr:001D129012345678",
            "  LQI:A0",
            "EVENT 22 FE80:0000:0000:0000:021D:1290:1234:5678",
            "SKSREG S2 21",
            "OK",
            "SKSREG S3 8888",
            "OK",
            "SKLL64 001D129012345678",
            meter,
            "SKJOIN FE80:0000:0000:0000:021D:1290:1234:5678",
            "OK",
            "EVENT 25 FE80:0000:0000:0000:021D:1290:1234:5678",
        ]);
        let settings = RouteBConfig {
            rbid: "00112233445566778899AABBCCDDEEFF".to_string(),
            password: "0123456789AB".to_string(),
            ..Default::default()
        };

        let link = m.establish(&settings).unwrap();
        assert_eq!(link.meter_address, meter);
        assert_eq!(link.pan.pan_id, 0x8888);
        assert_eq!(mock.written_text().len(), 7);
        assert_eq!(mock.written_text()[6], format!("SKJOIN {}\r\n", meter));
    }

    #[test]
    fn test_establish_without_coordinator() {
        let (mut m, _) = module(&[
            "SKSETPWD C 0123456789AB",
            "OK",
            "SKSETRBID 00112233445566778899AABBCCDDEEFF",
            "OK",
            "SKSCAN 2 FFFFFFFF 6",
            "OK",
            "EVENT 22 FE80:0000:0000:0000:021D:1290:1234:5678",
        ]);
        let settings = RouteBConfig {
            rbid: "00112233445566778899AABBCCDDEEFF".to_string(),
            password: "0123456789AB".to_string(),
            ..Default::default()
        };
        let err = m.establish(&settings).unwrap_err();
        assert!(matches!(err, SessionError::NoCoordinator));
        assert!(err.is_recoverable());
    }
}
