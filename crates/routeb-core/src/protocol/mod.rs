//! Protocol module - SKSTACK command set and line formats.

pub mod constants;
pub mod event;
pub mod scan;

pub use constants::*;
pub use event::{EventLine, erxudp_payload};
pub use scan::PanDescriptor;
