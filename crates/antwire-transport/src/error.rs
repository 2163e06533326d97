use std::path::PathBuf;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device at the specified path.
    #[error("failed to open {path}: {message}")]
    Open { path: PathBuf, message: String },

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote end closed the stream.
    #[error("transport closed")]
    Closed,

    /// A write made no progress.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },
}

impl TransportError {
    /// Returns true if retrying the operation later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let timed_out = TransportError::Io(std::io::Error::from(std::io::ErrorKind::TimedOut));
        assert!(timed_out.is_transient());
        assert!(!TransportError::Closed.is_transient());

        let broken = TransportError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(!broken.is_transient());
    }
}
