use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use bytes::Bytes;
use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::{TransportRead, TransportWrite};

/// Adapts any std `Read + Write` stream to the transport traits.
///
/// A read that times out (`WouldBlock` / `TimedOut`) yields an empty buffer.
/// End-of-stream is reported as [`TransportError::Closed`].
pub struct IoTransport<T> {
    inner: T,
}

impl<T> IoTransport<T> {
    /// Wrap a stream.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the adapter and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Send> TransportRead for IoTransport<T> {
    fn read(&mut self, count: usize) -> Result<Bytes> {
        let mut chunk = vec![0u8; count];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) if count > 0 => return Err(TransportError::Closed),
                Ok(n) => {
                    trace!(bytes = n, "transport read");
                    chunk.truncate(n);
                    return Ok(Bytes::from(chunk));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    return Ok(Bytes::new())
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<T: Write + Send> TransportWrite for IoTransport<T> {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        loop {
            match self.inner.write(data) {
                Ok(n) => {
                    self.flush()?;
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<T: Write> IoTransport<T> {
    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

#[cfg(unix)]
impl IoTransport<std::os::unix::net::UnixStream> {
    /// Set the bounded read timeout on the socket.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Duplicate the socket so one half can be handed to a reader thread.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self::new(self.inner.try_clone()?))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    struct TimeoutThenData {
        calls: usize,
        data: Vec<u8>,
    }

    impl Read for TimeoutThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.calls += 1;
            match self.calls {
                1 => Err(std::io::Error::from(ErrorKind::TimedOut)),
                2 => Err(std::io::Error::from(ErrorKind::Interrupted)),
                _ => {
                    let n = self.data.len().min(buf.len());
                    buf[..n].copy_from_slice(&self.data[..n]);
                    self.data.drain(..n);
                    Ok(n)
                }
            }
        }
    }

    #[test]
    fn timeout_reads_as_empty_and_interrupt_retries() {
        let mut transport = IoTransport::new(TimeoutThenData {
            calls: 0,
            data: vec![0xA4, 0x01],
        });
        assert!(transport.read(30).unwrap().is_empty());
        assert_eq!(transport.read(30).unwrap().as_ref(), &[0xA4, 0x01]);
    }

    #[test]
    fn read_respects_count() {
        let mut transport = IoTransport::new(Cursor::new(vec![1u8, 2, 3, 4, 5]));
        assert_eq!(transport.read(2).unwrap().as_ref(), &[1, 2]);
        assert_eq!(transport.read(30).unwrap().as_ref(), &[3, 4, 5]);
    }

    #[test]
    fn eof_is_closed() {
        let mut transport = IoTransport::new(Cursor::new(Vec::<u8>::new()));
        assert!(matches!(transport.read(8), Err(TransportError::Closed)));
    }

    #[test]
    fn write_goes_to_inner_stream() {
        let mut transport = IoTransport::new(Vec::<u8>::new());
        transport.write_all(&[0xA4, 0x01, 0x4A, 0x00, 0xEF]).unwrap();
        assert_eq!(transport.into_inner(), vec![0xA4, 0x01, 0x4A, 0x00, 0xEF]);
    }

    #[test]
    #[cfg(unix)]
    fn socket_halves_with_read_timeout() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = IoTransport::new(left);
        let reader = IoTransport::new(right);
        reader
            .set_read_timeout(Some(Duration::from_millis(10)))
            .unwrap();
        let mut reader_half = reader.try_clone().unwrap();

        assert!(reader_half.read(16).unwrap().is_empty());

        writer.write_all(b"ping").unwrap();
        assert_eq!(reader_half.read(16).unwrap().as_ref(), b"ping");
    }
}
