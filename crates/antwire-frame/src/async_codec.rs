use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FrameError;
use crate::message::Message;
use crate::scanner::{step, Step};

/// `tokio_util` codec for ANT frames.
///
/// Decoding follows the scanner: corrupt frames are skipped by declared
/// length, and any other failure waits for more bytes without consuming.
#[derive(Debug, Default)]
pub struct AntCodec {
    skipped: usize,
}

impl AntCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes skipped by resynchronization so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Decoder for AntCodec {
    type Item = Message;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match step(src) {
                Step::Message(message) => return Ok(Some(message)),
                Step::Skipped(skip) => self.skipped += skip,
                Step::Halt(_) => return Ok(None),
            }
        }
    }
}

impl Encoder<Message> for AntCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode_into(dst);
        Ok(())
    }
}

impl Encoder<&Message> for AntCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode_into(dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::message::{ChannelEvent, MessageKind, StartupNotification, SystemReset};

    #[tokio::test]
    async fn decode_stream_with_corruption() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&Message::from(StartupNotification::new(0x20)).encode());
        wire.extend_from_slice(&[0xA4, 0x03, 0x40, 0x00, 0x4A, 0x00, 0x00]);
        wire.extend_from_slice(&Message::from(ChannelEvent::new(0, 0x4A, 0)).encode());

        let mut framed = FramedRead::new(wire.as_slice(), AntCodec::new());
        let mut kinds = Vec::new();
        while let Some(message) = framed.next().await {
            kinds.push(message.unwrap().kind());
        }

        assert_eq!(
            kinds,
            vec![MessageKind::StartupNotification, MessageKind::ChannelEvent]
        );
        assert_eq!(framed.decoder().skipped(), 7);
    }

    #[tokio::test]
    async fn encode_to_sink() {
        let mut framed = FramedWrite::new(Vec::new(), AntCodec::new());
        framed.send(Message::from(SystemReset::new())).await.unwrap();

        assert_eq!(framed.get_ref().as_slice(), &[0xA4, 0x01, 0x4A, 0x00, 0xEF]);
    }

    #[test]
    fn partial_input_waits() {
        let mut codec = AntCodec::new();
        let mut buf = BytesMut::from(&[0xA4, 0x01, 0x4A][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 3);

        buf.extend_from_slice(&[0x00, 0xEF]);
        let message = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(message.kind(), MessageKind::SystemReset);
        assert!(buf.is_empty());
    }

    #[test]
    fn stalled_input_matches_the_scanner() {
        let raw = [0xA4, 0x01, 0x6F, 0x20, 0xEA, 0x00, 0x01, 0x4A, 0x00, 0x4B];

        let mut codec = AntCodec::new();
        let mut buf = BytesMut::from(&raw[..]);
        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.kind(), MessageKind::StartupNotification);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        let mut scanned = BytesMut::from(&raw[..]);
        let scan = crate::scanner::scan_buffer(&mut scanned);
        assert_eq!(scan.messages, vec![first]);
        assert_eq!(buf, scanned);
    }
}
