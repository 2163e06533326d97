/// Errors that can occur during frame encoding/decoding and message building.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Not enough bytes for a complete frame yet.
    #[error("incomplete frame ({available} bytes available, {needed} needed)")]
    IncompleteFrame { needed: usize, available: usize },

    /// The trailing checksum byte does not match the frame contents.
    #[error("bad checksum (expected {expected:#04x}, got {actual:#04x})")]
    BadChecksum {
        expected: u8,
        actual: u8,
        /// Declared payload length of the corrupt frame.
        declared_len: usize,
    },

    /// The first byte is not the sync byte.
    #[error("sync mismatch (expected 0xa4, got {0:#04x})")]
    SyncMismatch(u8),

    /// Declared payload length exceeds the standard limit without the
    /// extended-format flag.
    #[error("payload too long ({0} bytes, max 9)")]
    PayloadTooLong(usize),

    /// An extended frame was built with a flag other than 0x80.
    #[error("unsupported extended flag {0:#04x}")]
    ExtendedFlag(u8),

    /// The type byte does not name any known message.
    #[error("unknown message type {0:#04x}")]
    UnknownMessageType(u8),

    /// A field value does not fit the field's wire width.
    #[error("field {field} out of range ({value}, max {max})")]
    FieldOutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// A fixed-length field was given the wrong number of bytes.
    #[error("field {field} expects {expected} bytes, got {actual}")]
    FieldLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Transport failure while writing frames.
    #[error("transport error: {0}")]
    Transport(#[from] antwire_transport::TransportError),

    /// A capture log line or header could not be parsed.
    #[error("capture log line {line}: {message}")]
    Capture { line: usize, message: String },

    /// I/O failure in the capture log.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// True only for the failure that makes the scanner skip ahead.
    pub fn triggers_resync(&self) -> bool {
        matches!(self, FrameError::BadChecksum { .. })
    }

    /// True when waiting for more bytes may turn this into a success.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, FrameError::IncompleteFrame { .. })
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
