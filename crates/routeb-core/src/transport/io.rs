//! Line transport over any duplex byte stream.

use std::io::{BufRead, BufReader, ErrorKind, Read, Write};

use tracing::trace;

use super::traits::{LineTransport, TransportError};

/// Adapts a `Read + Write` byte stream to [`LineTransport`].
///
/// Lines end at `\n`; a preceding `\r` is stripped too. Bytes received before
/// a read timeout are kept in `pending` so no partial line is lost.
pub struct IoTransport<S: Read + Write> {
    reader: BufReader<S>,
    pending: Vec<u8>,
    timeout_ms: u64,
}

impl<S: Read + Write> IoTransport<S> {
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::new(stream),
            pending: Vec::new(),
            timeout_ms: 0,
        }
    }

    /// Record the read timeout of the underlying stream, reported back in
    /// [`TransportError::Timeout`].
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }

    fn take_line(&mut self) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl<S: Read + Write + Send> LineTransport for IoTransport<S> {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let stream = self.reader.get_mut();
        stream
            .write_all(data)
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;
        stream
            .flush()
            .map_err(|e| TransportError::WriteFailed(e.to_string()))?;
        Ok(data.len())
    }

    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        match self.reader.read_until(b'\n', &mut self.pending) {
            Ok(0) if self.pending.is_empty() => Ok(None),
            // Either a complete line or a final line cut off by end-of-stream
            Ok(_) => {
                let line = self.take_line();
                trace!(line = %line, "line read");
                Ok(Some(line))
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                Err(TransportError::Timeout {
                    timeout_ms: self.timeout_ms,
                })
            }
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Err(TransportError::Disconnected),
            Err(e) => Err(TransportError::ReadFailed(e.to_string())),
        }
    }
}
