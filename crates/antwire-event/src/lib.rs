//! Background event pump and correlation waits for ANT radio modules.
//!
//! An [`EventMachine`] owns one pump thread per transport. The pump reads the
//! transport, recovers frames with the scanner, and hands every decoded
//! message to the registered callbacks in stream order. Callers block on
//! [`EventMachine::wait_for_ack`] or [`EventMachine::wait_for_message`]
//! while unrelated traffic keeps flowing.

pub mod callback;
pub mod config;
pub mod error;
pub mod machine;
pub mod queue;
pub mod status;

mod pump;

pub use callback::EventCallback;
pub use config::{
    CancelToken, EventConfig, WaitOptions, DEFAULT_READ_CHUNK_SIZE, MAX_ACK_QUEUE, MAX_MSG_QUEUE,
};
pub use error::{EventError, Result};
pub use machine::EventMachine;
pub use queue::BoundedQueue;
pub use status::{PumpEvent, StatusBus};
