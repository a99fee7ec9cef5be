//! Mock line transport for testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::traits::{LineTransport, TransportError};

/// One scripted read result.
#[derive(Debug, Clone)]
enum Scripted {
    Line(String),
    Timeout,
}

/// Mock transport for unit testing the session and stream logic.
///
/// Clones share the same queues, so a test can keep a handle after the
/// transport has moved into a session or a stream thread. An empty read
/// queue is end-of-stream.
#[derive(Clone)]
pub struct MockTransport {
    /// Queued lines to return on read.
    line_queue: Arc<Mutex<VecDeque<Scripted>>>,
    /// Captured writes.
    write_log: Arc<Mutex<Vec<Vec<u8>>>>,
    /// Whether the module is "connected".
    connected: Arc<Mutex<bool>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            line_queue: Arc::new(Mutex::new(VecDeque::new())),
            write_log: Arc::new(Mutex::new(Vec::new())),
            connected: Arc::new(Mutex::new(true)),
        }
    }

    /// Build a mock that will yield the given lines in order.
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        mock.queue_lines(lines);
        mock
    }

    /// Queue a line to be returned on a later read.
    pub fn queue_line(&self, line: impl Into<String>) {
        self.line_queue
            .lock()
            .unwrap()
            .push_back(Scripted::Line(line.into()));
    }

    pub fn queue_lines<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.queue_line(line);
        }
    }

    /// Queue a read timeout.
    pub fn queue_timeout(&self) {
        self.line_queue.lock().unwrap().push_back(Scripted::Timeout);
    }

    /// Number of reads still queued.
    pub fn pending(&self) -> usize {
        self.line_queue.lock().unwrap().len()
    }

    /// Get all captured writes.
    pub fn get_writes(&self) -> Vec<Vec<u8>> {
        self.write_log.lock().unwrap().clone()
    }

    /// Captured writes as lossy text.
    pub fn written_text(&self) -> Vec<String> {
        self.get_writes()
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    /// Clear captured writes.
    pub fn clear_writes(&self) {
        self.write_log.lock().unwrap().clear();
    }

    /// Simulate module disconnect.
    pub fn disconnect(&self) {
        *self.connected.lock().unwrap() = false;
    }

    /// Simulate module reconnect.
    pub fn reconnect(&self) {
        *self.connected.lock().unwrap() = true;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LineTransport for MockTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if !*self.connected.lock().unwrap() {
            return Err(TransportError::Disconnected);
        }
        self.write_log.lock().unwrap().push(data.to_vec());
        Ok(data.len())
    }

    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        if !*self.connected.lock().unwrap() {
            return Err(TransportError::Disconnected);
        }
        match self.line_queue.lock().unwrap().pop_front() {
            Some(Scripted::Line(line)) => Ok(Some(line)),
            Some(Scripted::Timeout) => Err(TransportError::Timeout { timeout_ms: 500 }),
            None => Ok(None),
        }
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock().unwrap()
    }
}
