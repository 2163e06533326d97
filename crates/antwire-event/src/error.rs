use std::time::Duration;

/// Errors that can occur while running the event machine.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] antwire_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] antwire_frame::FrameError),

    /// `start` found no transport to hand to the pump.
    #[error("no transport bound to the event machine")]
    NoTransport,

    /// The pump thread could not be spawned.
    #[error("failed to spawn pump thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// A blocking operation was invoked from inside a callback.
    #[error("{0} called from the pump thread")]
    CalledFromPump(&'static str),

    /// The pump thread panicked, usually inside a callback.
    #[error("pump thread panicked")]
    PumpPanicked,

    /// A correlation wait ran out of time.
    #[error("wait timed out after {0:?}")]
    Timeout(Duration),

    /// A correlation wait was cancelled through its token.
    #[error("wait cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, EventError>;
