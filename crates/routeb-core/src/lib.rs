//! RouteB-Core: Wi-SUN Route B smart meter access through a BP35A1 module.
//!
//! This crate drives a BP35A1-compatible Wi-SUN module over its serial text
//! protocol, joins the smart meter's PAN and exchanges ECHONET Lite frames
//! with it.
//!
//! # Architecture
//!
//! The crate is organized into layers:
//!
//! - **Transport**: Line-oriented link abstraction (serial port, generic I/O, mock)
//! - **ECHONET Lite**: Property and frame codecs, object and service codes
//! - **Protocol**: Module command verbs, `EVENT` lines, scan results
//! - **Events**: Observer pattern for UI decoupling
//! - **Session**: Command/response driver and Route B bring-up
//! - **Stream**: Background reader delivering received frames
//! - **Config**: TOML connection settings
//!
//! # Example
//!
//! ```no_run
//! use routeb_core::echonet::constants::*;
//! use routeb_core::{Bp35a1, Frame, ModuleConfig, SerialTransport};
//!
//! let config = ModuleConfig::load_from_file("routeb.toml").expect("config");
//! let transport = SerialTransport::open(&config.device, config.baud).expect("open");
//! let mut module = Bp35a1::new(transport);
//!
//! let link = module.establish(&config.route_b).expect("Route B join failed");
//! let request = Frame::get_request(
//!     1,
//!     CONTROLLER_OBJECT,
//!     SMART_METER_OBJECT,
//!     &[EPC_INSTANTANEOUS_POWER],
//! )
//! .expect("frame");
//! module
//!     .send_frame(&link.meter_address, &request, &config.route_b)
//!     .expect("send");
//!
//! for frame in module.into_frame_stream().expect("stream") {
//!     println!("{:?}", frame.property(EPC_INSTANTANEOUS_POWER));
//! }
//! ```

pub mod config;
pub mod echonet;
pub mod events;
pub mod protocol;
pub mod session;
pub mod stream;
pub mod transport;

// Re-exports for convenience
pub use config::{ModuleConfig, RouteBConfig};
pub use echonet::{CodecError, Frame, Property};
pub use events::{
    LineDirection, ModuleEvent, ModuleObserver, NullObserver, StreamEnd, TracingObserver,
};
pub use protocol::PanDescriptor;
pub use session::{Bp35a1, JoinOutcome, RouteBLink, SessionError};
pub use stream::{CancelHandle, FrameStream, decode_datagram};
pub use transport::{IoTransport, LineTransport, MockTransport, SerialTransport, TransportError};
