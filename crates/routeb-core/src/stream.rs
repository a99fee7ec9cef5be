//! Background stream of received ECHONET Lite frames.
//!
//! A producer thread owns the module while the stream is alive. It reads
//! lines, decodes the payload of every `ERXUDP` notification and hands frames
//! over a zero-capacity channel, so it never reads further ahead than the
//! consumer. Undecodable datagrams are dropped: on a lossy radio link they
//! are noise, not a reason to stop listening. [`decode_datagram`] is the
//! strict counterpart for callers that want the error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, select};
use tracing::debug;

use crate::echonet::Frame;
use crate::events::{ModuleEvent, ModuleObserver, StreamEnd};
use crate::protocol::{ERXUDP_PREFIX, erxudp_payload};
use crate::session::{Bp35a1, SessionError};
use crate::transport::{LineTransport, TransportError};

/// Decode the frame carried by an `ERXUDP` line.
pub fn decode_datagram(line: &str) -> Result<Frame, SessionError> {
    let payload = erxudp_payload(line).ok_or_else(|| SessionError::MalformedResponse {
        command: ERXUDP_PREFIX.to_string(),
        reason: "missing payload field".to_string(),
    })?;
    Ok(Frame::from_hex(payload)?)
}

/// Cooperative cancellation for a [`FrameStream`].
///
/// Clones can be moved to other threads (a signal handler, a timer).
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
    wake: Sender<()>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // Full means a wake-up is already pending
        let _ = self.wake.try_send(());
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Producer side of the cancellation signal.
struct CancelListener {
    flag: Arc<AtomicBool>,
    wake: Receiver<()>,
}

impl CancelListener {
    fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

fn cancel_pair() -> (CancelHandle, CancelListener) {
    let flag = Arc::new(AtomicBool::new(false));
    let (tx, rx) = crossbeam_channel::bounded(1);
    (
        CancelHandle {
            flag: flag.clone(),
            wake: tx,
        },
        CancelListener { flag, wake: rx },
    )
}

/// Received frames, produced by a background reader.
///
/// Iterating blocks until the next frame, and ends when the transport reaches
/// end-of-stream or the stream is cancelled. Dropping the stream cancels it;
/// [`FrameStream::finish`] also returns the module for further commands.
pub struct FrameStream<T: LineTransport + 'static, O: ModuleObserver + 'static> {
    frames: Option<Receiver<Frame>>,
    cancel: CancelHandle,
    worker: Option<JoinHandle<(Bp35a1<T, O>, StreamEnd)>>,
}

impl<T: LineTransport + 'static, O: ModuleObserver + 'static> FrameStream<T, O> {
    pub(crate) fn spawn(module: Bp35a1<T, O>) -> Result<Self, SessionError> {
        let (frame_tx, frame_rx) = crossbeam_channel::bounded(0);
        let (cancel, listener) = cancel_pair();

        let worker = thread::Builder::new()
            .name("routeb-frames".to_string())
            .spawn(move || produce(module, frame_tx, listener))
            .map_err(SessionError::StreamSpawn)?;

        Ok(Self {
            frames: Some(frame_rx),
            cancel,
            worker: Some(worker),
        })
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block for the next frame. `None` once the stream has ended or been
    /// cancelled.
    pub fn recv(&self) -> Option<Frame> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let frame = self.frames.as_ref()?.recv().ok()?;
        // Cancelled while we were blocked
        if self.cancel.is_cancelled() {
            return None;
        }
        Some(frame)
    }

    /// Stop the producer and take the module back.
    pub fn finish(mut self) -> Result<(Bp35a1<T, O>, StreamEnd), SessionError> {
        self.cancel.cancel();
        self.frames.take();
        let worker = self.worker.take().ok_or(SessionError::StreamPanicked)?;
        worker.join().map_err(|_| SessionError::StreamPanicked)
    }
}

impl<T: LineTransport + 'static, O: ModuleObserver + 'static> Iterator for FrameStream<T, O> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        self.recv()
    }
}

impl<T: LineTransport + 'static, O: ModuleObserver + 'static> Drop for FrameStream<T, O> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn produce<T: LineTransport, O: ModuleObserver>(
    mut module: Bp35a1<T, O>,
    frames: Sender<Frame>,
    cancel: CancelListener,
) -> (Bp35a1<T, O>, StreamEnd) {
    module.emit(ModuleEvent::StreamStarted);

    let end = loop {
        if cancel.is_cancelled() {
            break StreamEnd::Cancelled;
        }

        let line = match module.read_raw_line() {
            Ok(Some(line)) => line,
            Ok(None) => break StreamEnd::EndOfStream,
            Err(TransportError::Timeout { .. }) => match module.check_link() {
                Ok(()) => continue,
                Err(e) => break StreamEnd::Failed(e.to_string()),
            },
            Err(e) => break StreamEnd::Failed(e.to_string()),
        };

        if !line.starts_with(ERXUDP_PREFIX) {
            continue;
        }
        let frame = match decode_datagram(&line) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "Dropping undecodable datagram");
                module.emit(ModuleEvent::DatagramSkipped {
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if cancel.is_cancelled() {
            break StreamEnd::Cancelled;
        }
        // Blocks until the consumer takes the frame or cancels; a dropped
        // receiver fails the send
        let delivered = select! {
            recv(cancel.wake) -> _ => false,
            send(frames, frame.clone()) -> res => res.is_ok(),
        };
        if !delivered {
            break StreamEnd::Cancelled;
        }
        module.emit(ModuleEvent::FrameReceived(frame));
    };

    // Close the sink before reporting, so the consumer sees completion first
    drop(frames);
    module.emit(ModuleEvent::StreamStopped(end.clone()));
    (module, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::echonet::Property;
    use crate::echonet::constants::*;
    use crate::events::testing::RecordingObserver;
    use crate::transport::MockTransport;

    const METER: &str = "FE80:0000:0000:0000:021D:1290:1234:5678";

    fn erxudp(payload: &str) -> String {
        format!(
            "ERXUDP {} FE80:0000:0000:0000:021C:6400:030C:12A4 0E1A 0E1A 001D129012345678 1 {:04X} {}",
            METER,
            payload.len() / 2,
            payload
        )
    }

    fn power_frame(tid: u16, watts: u32) -> Frame {
        Frame::new(
            EHD1_ECHONET_LITE,
            EHD2_FORMAT1,
            tid,
            SMART_METER_OBJECT,
            CONTROLLER_OBJECT,
            ESV_GET_RES,
            vec![
                Property::with_value(EPC_INSTANTANEOUS_POWER, watts.to_be_bytes().to_vec())
                    .unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_decode_datagram_strict() {
        let frame = decode_datagram(&erxudp("1081000102880105FF017200")).unwrap();
        assert_eq!(frame.opc(), 0);
        assert!(frame.properties().is_empty());

        assert!(matches!(
            decode_datagram(&erxudp("ZZZZ")),
            Err(SessionError::Codec(_))
        ));
        assert!(matches!(
            decode_datagram("ERXUDP FE80 short"),
            Err(SessionError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_stream_skips_noise_and_bad_datagrams() {
        let observer = Arc::new(RecordingObserver::default());
        let mock = MockTransport::new();
        mock.queue_line("SKSENDTO 1 FE80:0000:0000:0000:021D:1290:1234:5678 0E1A 1 000E ....");
        mock.queue_line(format!("EVENT 21 {} 00", METER));
        mock.queue_line("OK");
        mock.queue_line(erxudp("1081000102880105FF017200"));
        mock.queue_line(erxudp("10810001GG880105FF017200"));
        mock.queue_timeout();
        mock.queue_line(erxudp(&power_frame(2, 500).to_hex()));
        mock.queue_line(erxudp("1081000102880105FF017201E704"));

        let module = Bp35a1::with_observer(mock, observer.clone());
        let mut stream = module.into_frame_stream().unwrap();

        let frames: Vec<Frame> = stream.by_ref().collect();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].properties().is_empty());
        assert_eq!(frames[1], power_frame(2, 500));

        let (_module, end) = stream.finish().unwrap();
        assert_eq!(end, StreamEnd::EndOfStream);

        let skipped = observer
            .snapshot()
            .iter()
            .filter(|e| matches!(e, ModuleEvent::DatagramSkipped { .. }))
            .count();
        assert_eq!(skipped, 2);
    }

    #[test]
    fn test_cancel_stops_delivery() {
        let mock = MockTransport::new();
        for tid in 1..=3 {
            mock.queue_line(erxudp(&power_frame(tid, 100 * tid as u32).to_hex()));
        }

        let module = Bp35a1::new(mock.clone());
        let mut stream = module.into_frame_stream().unwrap();

        let first = stream.next().unwrap();
        assert_eq!(first.tid(), 1);

        stream.cancel();
        assert!(stream.next().is_none());
        assert!(stream.recv().is_none());

        let (_module, end) = stream.finish().unwrap();
        assert_eq!(end, StreamEnd::Cancelled);
        // Frame 3 was never read
        assert!(mock.pending() >= 1);
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let mock = MockTransport::new();
        for tid in 1..=4 {
            mock.queue_line(erxudp(&power_frame(tid, 1).to_hex()));
        }
        let mut stream = Bp35a1::new(mock).into_frame_stream().unwrap();
        let handle = stream.cancel_handle();

        assert!(stream.next().is_some());
        thread::spawn(move || handle.cancel()).join().unwrap();
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_finish_returns_module_for_commands() {
        let mock = MockTransport::new();
        mock.queue_line(erxudp("1081000102880105FF017200"));

        let mut stream = Bp35a1::new(mock.clone()).into_frame_stream().unwrap();
        assert!(stream.next().is_some());
        assert!(stream.next().is_none());
        let (mut module, end) = stream.finish().unwrap();
        assert_eq!(end, StreamEnd::EndOfStream);

        mock.queue_lines(["SKVER", "EVER 1.2.10", "OK"]);
        assert_eq!(module.version().unwrap(), "EVER 1.2.10");
    }

    #[test]
    fn test_transport_failure_ends_stream() {
        let mock = MockTransport::new();
        mock.disconnect();
        let mut stream = Bp35a1::new(mock).into_frame_stream().unwrap();
        assert!(stream.next().is_none());
        let (_module, end) = stream.finish().unwrap();
        assert!(matches!(end, StreamEnd::Failed(_)));
    }

    /// Reads time out while the adapter reports itself unplugged.
    struct UnpluggedAdapter;

    impl LineTransport for UnpluggedAdapter {
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
    fn test_timeout_on_unplugged_adapter_ends_stream() {
        let mut stream = Bp35a1::new(UnpluggedAdapter).into_frame_stream().unwrap();
        assert!(stream.next().is_none());
        let (_module, end) = stream.finish().unwrap();
        assert_eq!(end, StreamEnd::Failed(TransportError::Disconnected.to_string()));
    }
}
