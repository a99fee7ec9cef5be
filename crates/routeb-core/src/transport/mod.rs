//! Transport layer module.

pub mod io;
pub mod mock;
pub mod serial;
pub mod traits;

pub use io::IoTransport;
pub use mock::MockTransport;
pub use serial::SerialTransport;
pub use traits::{LineTransport, TransportError};
