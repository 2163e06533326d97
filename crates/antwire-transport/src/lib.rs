//! Byte transports for ANT radio modules.
//!
//! The protocol engine only needs two things from the physical link:
//! - a bounded-timeout read that may return nothing
//! - a write that reports how many bytes went out
//!
//! This is the lowest layer of antwire. Opening and closing devices is left to
//! the concrete transport types; everything above works against the
//! [`TransportRead`] / [`TransportWrite`] traits.

pub mod canned;
pub mod error;
pub mod io;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use canned::CannedTransport;
pub use error::{Result, TransportError};
pub use io::IoTransport;
pub use traits::{TransportRead, TransportWrite};

#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialTransport};
