//! Event system for UI decoupling.
//!
//! Lets a CLI or a long-running collector follow what the module is doing
//! without the session knowing who is listening.

use std::fmt;

use crate::echonet::Frame;
use crate::protocol::PanDescriptor;

/// Line direction on the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDirection {
    Tx, // Host -> Module
    Rx, // Module -> Host
}

impl fmt::Display for LineDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineDirection::Tx => write!(f, "TX"),
            LineDirection::Rx => write!(f, "RX"),
        }
    }
}

/// Why a frame stream stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// The transport reached end-of-stream.
    EndOfStream,
    /// The consumer cancelled or went away.
    Cancelled,
    /// A transport error stopped the producer.
    Failed(String),
}

impl fmt::Display for StreamEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamEnd::EndOfStream => write!(f, "end of stream"),
            StreamEnd::Cancelled => write!(f, "cancelled"),
            StreamEnd::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

/// Events emitted by the module session and frame stream.
#[derive(Debug, Clone)]
pub enum ModuleEvent {
    /// A line was written to or read from the module.
    Line {
        direction: LineDirection,
        text: String,
    },
    /// A command was issued.
    CommandIssued { verb: String },
    /// Scan found a PAN coordinator.
    PanFound(PanDescriptor),
    /// Scan ended without a beacon.
    ScanEmpty,
    /// PANA authentication finished.
    JoinFinished { joined: bool },
    /// A frame stream started.
    StreamStarted,
    /// A datagram could not be decoded and was dropped.
    DatagramSkipped { reason: String },
    /// A frame was handed to the consumer.
    FrameReceived(Frame),
    /// A frame stream stopped.
    StreamStopped(StreamEnd),
}

/// Observer trait for receiving module events.
///
/// Implement this trait in your UI layer to receive updates.
pub trait ModuleObserver: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &ModuleEvent);
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl ModuleObserver for NullObserver {
    fn on_event(&self, _event: &ModuleEvent) {}
}

/// Observer that logs events using tracing.
pub struct TracingObserver;

impl ModuleObserver for TracingObserver {
    fn on_event(&self, event: &ModuleEvent) {
        match event {
            ModuleEvent::Line { direction, text } => {
                tracing::trace!(dir = %direction, "{}", text.escape_debug());
            }
            ModuleEvent::CommandIssued { verb } => {
                tracing::debug!(verb = %verb, "Command issued");
            }
            ModuleEvent::PanFound(pan) => {
                tracing::info!(
                    channel = %format!("{:02X}", pan.channel),
                    pan_id = %format!("{:04X}", pan.pan_id),
                    addr = %pan.address,
                    lqi = pan.lqi,
                    "PAN found"
                );
            }
            ModuleEvent::ScanEmpty => {
                tracing::warn!("Scan finished without a beacon");
            }
            ModuleEvent::JoinFinished { joined } => {
                if *joined {
                    tracing::info!("PANA session established");
                } else {
                    tracing::warn!("PANA authentication failed");
                }
            }
            ModuleEvent::StreamStarted => {
                tracing::debug!("Frame stream started");
            }
            ModuleEvent::DatagramSkipped { reason } => {
                tracing::debug!(reason = %reason, "Datagram skipped");
            }
            ModuleEvent::FrameReceived(frame) => {
                tracing::debug!(
                    tid = frame.tid(),
                    esv = %format!("{:02X}", frame.esv()),
                    opc = frame.opc(),
                    "Frame received"
                );
            }
            ModuleEvent::StreamStopped(end) => {
                tracing::info!(reason = %end, "Frame stream stopped");
            }
        }
    }
}
