use std::fmt;
use std::io;

use antwire_event::EventError;
use antwire_frame::FrameError;
use antwire_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::Transport(source) => transport_error(context, source),
        FrameError::FieldOutOfRange { .. } | FrameError::FieldLength { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn event_error(context: &str, err: EventError) -> CliError {
    match err {
        EventError::Transport(err) => transport_error(context, err),
        EventError::Frame(err) => frame_error(context, err),
        EventError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        EventError::Cancelled => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn malformed_frames_are_data_errors() {
        let err = frame_error("decode failed", FrameError::SyncMismatch(0x00));
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("decode failed: "));
    }

    #[test]
    fn bad_field_values_are_usage_errors() {
        let err = frame_error(
            "encode failed",
            FrameError::FieldOutOfRange {
                field: "channel",
                value: 300,
                max: 255,
            },
        );
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn wait_timeouts_map_to_124() {
        let err = event_error("no reply", EventError::Timeout(Duration::from_secs(1)));
        assert_eq!(err.code, TIMEOUT);
    }

    #[test]
    fn nested_io_errors_keep_their_kind() {
        let err = event_error(
            "read failed",
            EventError::Transport(TransportError::Io(io::Error::from(
                io::ErrorKind::PermissionDenied,
            ))),
        );
        assert_eq!(err.code, PERMISSION_DENIED);
        assert_eq!(
            transport_error("open failed", TransportError::Closed).code,
            TRANSPORT_ERROR
        );
    }
}
