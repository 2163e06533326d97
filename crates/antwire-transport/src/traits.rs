use bytes::Bytes;

use crate::error::{Result, TransportError};

/// Read half of a transport.
///
/// `read` must return within a bounded time. An empty buffer means the
/// timeout elapsed with nothing to deliver; it is not end-of-stream.
pub trait TransportRead: Send {
    /// Read up to `count` bytes.
    fn read(&mut self, count: usize) -> Result<Bytes>;
}

/// Write half of a transport.
pub trait TransportWrite: Send {
    /// Write some prefix of `data`, returning how many bytes were accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Write all of `data`, failing if the transport stops accepting bytes.
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < data.len() {
            match self.write(&data[offset..])? {
                0 => {
                    return Err(TransportError::ShortWrite {
                        written: offset,
                        expected: data.len(),
                    })
                }
                n => offset += n,
            }
        }
        Ok(())
    }
}

impl<T: TransportRead + ?Sized> TransportRead for Box<T> {
    fn read(&mut self, count: usize) -> Result<Bytes> {
        (**self).read(count)
    }
}

impl<T: TransportWrite + ?Sized> TransportWrite for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }
}
