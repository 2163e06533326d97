use antwire_transport::TransportWrite;
use bytes::BytesMut;
use tracing::trace;

use crate::capture::{record_shared, CaptureKind, SharedCapture};
use crate::constants::MAX_FRAME_SIZE;
use crate::error::Result;
use crate::message::Message;

/// Encodes messages and writes whole frames to a transport.
pub struct MessageWriter<W> {
    inner: W,
    buf: BytesMut,
    capture: Option<SharedCapture>,
}

impl<W: TransportWrite> MessageWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(2 * MAX_FRAME_SIZE),
            capture: None,
        }
    }

    /// Mirror every written frame into `capture`.
    pub fn with_capture(mut self, capture: SharedCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Encode and write one message (blocking until fully written).
    pub fn send(&mut self, message: &Message) -> Result<()> {
        self.buf.clear();
        message.encode_into(&mut self.buf);
        self.inner.write_all(&self.buf)?;
        trace!(kind = %message.kind(), len = self.buf.len(), "wrote message");

        if let Some(capture) = &self.capture {
            record_shared(capture, CaptureKind::Write, &self.buf);
        }
        Ok(())
    }

    /// Send several messages back to back.
    pub fn send_all<'a>(&mut self, messages: impl IntoIterator<Item = &'a Message>) -> Result<()> {
        for message in messages {
            self.send(message)?;
        }
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use antwire_transport::{CannedTransport, TransportError};
    use bytes::Bytes;

    use super::*;
    use crate::error::FrameError;
    use crate::message::{ChannelOpen, SystemReset};

    #[test]
    fn send_single_message() {
        let device = CannedTransport::new();
        let mut writer = MessageWriter::new(device.clone());

        writer.send(&SystemReset::new().into()).unwrap();

        assert_eq!(
            device.written(),
            vec![Bytes::from_static(&[0xA4, 0x01, 0x4A, 0x00, 0xEF])]
        );
    }

    #[test]
    fn send_many_in_order() {
        let device = CannedTransport::new();
        let mut writer = MessageWriter::new(device.clone());
        let messages: Vec<Message> = vec![SystemReset::new().into(), ChannelOpen::new(2).into()];

        writer.send_all(&messages).unwrap();

        let written = device.written();
        assert_eq!(written.len(), 2);
        assert_eq!(written[1].as_ref(), messages[1].encode().as_ref());
    }

    #[test]
    fn closed_transport_surfaces_error() {
        let device = CannedTransport::new();
        device.close();
        let mut writer = MessageWriter::new(device);

        let err = writer.send(&SystemReset::new().into()).unwrap_err();
        assert!(matches!(err, FrameError::Transport(TransportError::Closed)));
    }

    #[test]
    fn capture_records_writes() {
        let capture = crate::capture::shared_capture(std::io::sink()).unwrap();
        let device = CannedTransport::new();
        let mut writer = MessageWriter::new(device.clone()).with_capture(capture);
        writer.send(&ChannelOpen::new(0).into()).unwrap();
        assert_eq!(device.written().len(), 1);
    }
}
