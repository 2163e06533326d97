//! Type-byte dispatch from raw bytes to a concrete [`Message`] variant.

use crate::codec::decode_frame;
use crate::constants::MIN_FRAME_SIZE;
use crate::error::{FrameError, Result};
use crate::message::{Message, MessageKind};

const TYPE_OFFSET: usize = 2;

/// Decode the frame at the head of `raw` into its catalog variant.
///
/// The type byte is resolved before the frame is validated, so an unknown
/// type wins over a bad checksum. Returns the message and the bytes consumed.
pub fn lookup(raw: &[u8]) -> Result<(Message, usize)> {
    let Some(&msg_type) = raw.get(TYPE_OFFSET) else {
        return Err(FrameError::IncompleteFrame {
            needed: MIN_FRAME_SIZE,
            available: raw.len(),
        });
    };

    let kind = MessageKind::from_id(msg_type).ok_or(FrameError::UnknownMessageType(msg_type))?;
    let (frame, size) = decode_frame(raw)?;
    Ok((Message::assemble(kind, frame.payload, frame.extended), size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type() {
        let err = lookup(&[0xA4, 0x03, 0xFF, 0x00, 0x00, 0x00, 0xE5]).unwrap_err();
        assert!(matches!(err, FrameError::UnknownMessageType(0xFF)));
    }

    #[test]
    fn channel_assign() {
        let (message, size) = lookup(&[0xA4, 0x03, 0x42, 0x00, 0x00, 0x00, 0xE5]).unwrap();
        assert_eq!(size, 7);
        assert_eq!(message.kind(), MessageKind::ChannelAssign);
        assert_eq!(message.payload(), &[0x00, 0x00, 0x00]);
    }

    #[test]
    fn too_short_for_type_byte() {
        assert!(lookup(&[0xA4, 0x03]).unwrap_err().is_incomplete());
        assert!(lookup(&[]).unwrap_err().is_incomplete());
    }

    #[test]
    fn known_type_incomplete_body() {
        let err = lookup(&[0xA4, 0x05, 0x42, 0x00, 0x00, 0x00, 0x00]).unwrap_err();
        assert!(err.is_incomplete());
    }

    #[test]
    fn startup_notification() {
        let (message, _) = lookup(&[0xA4, 0x01, 0x6F, 0x20, 0xEA]).unwrap();
        let Message::StartupNotification(startup) = message else {
            panic!("expected startup notification");
        };
        assert_eq!(startup.reason(), 0x20);
    }
}
