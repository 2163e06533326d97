use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use serialport::SerialPort;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{TransportRead, TransportWrite};

/// Serial device settings.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0`.
    pub path: PathBuf,
    /// Line speed. ANT USB sticks run at 115200; older USB-m sticks at 57600.
    pub baud_rate: u32,
    /// Bounded read timeout.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/dev/ttyUSB0"),
            baud_rate: 115_200,
            read_timeout: Duration::from_millis(50),
        }
    }
}

/// A serial device opened 8-N-1 without flow control.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    path: PathBuf,
}

impl SerialTransport {
    /// Open the device described by `config`.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let path_str = config.path.to_string_lossy().into_owned();
        let port = serialport::new(&path_str, config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(|err| TransportError::Open {
                path: config.path.clone(),
                message: err.to_string(),
            })?;

        // Drop whatever the stick sent before we were listening.
        if let Err(err) = port.clear(serialport::ClearBuffer::All) {
            debug!(path = %path_str, %err, "failed clearing serial buffers");
        }

        info!(path = %path_str, baud = config.baud_rate, "opened serial device");
        Ok(Self {
            port,
            path: config.path.clone(),
        })
    }

    /// Device path this transport was opened from.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Clone the port handle so reads and writes can live on different threads.
    pub fn try_clone(&self) -> Result<Self> {
        let port = self.port.try_clone().map_err(|err| TransportError::Open {
            path: self.path.clone(),
            message: err.to_string(),
        })?;
        Ok(Self {
            port,
            path: self.path.clone(),
        })
    }
}

impl TransportRead for SerialTransport {
    fn read(&mut self, count: usize) -> Result<Bytes> {
        let mut chunk = vec![0u8; count];
        loop {
            match self.port.read(&mut chunk) {
                Ok(n) => {
                    chunk.truncate(n);
                    return Ok(Bytes::from(chunk));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut => return Ok(Bytes::new()),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl TransportWrite for SerialTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let n = self.port.write(data)?;
        self.port.flush()?;
        Ok(n)
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .finish()
    }
}
