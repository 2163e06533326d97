//! ANT radio protocol engine.
//!
//! antwire turns the byte stream of an ANT USB stick into typed messages and
//! back, and runs a background pump that correlates replies with requests.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte transports (std streams, scripted double, serial behind `serial`)
//! - [`frame`]: Checksum, codec, message catalog, frame scanner and capture log
//! - [`event`]: Event machine: pump thread, callbacks and correlation waits

/// Re-export transport types.
pub mod transport {
    pub use antwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use antwire_frame::*;
}

/// Re-export event machine types.
pub mod event {
    pub use antwire_event::*;
}
