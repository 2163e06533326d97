use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum;
use crate::constants::{
    EXTENDED_FLAG, EXTENDED_FLAG_OFFSET, FRAME_OVERHEAD, MAX_EXTENDED_DATA, MAX_PAYLOAD,
    MIN_FRAME_SIZE, SYNC,
};
use crate::error::{FrameError, Result};

/// Standard message payload: up to 9 bytes held inline.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Payload {
    bytes: [u8; MAX_PAYLOAD],
    len: u8,
}

impl Payload {
    /// Copy `bytes` into a payload, failing if it exceeds the standard limit.
    pub fn new(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLong(bytes.len()));
        }
        let mut payload = Self::default();
        payload.bytes[..bytes.len()].copy_from_slice(bytes);
        payload.len = bytes.len() as u8;
        Ok(payload)
    }

    /// A zero-filled payload of `len` bytes (clamped to the standard limit).
    pub fn zeroed(len: usize) -> Self {
        Self {
            bytes: [0; MAX_PAYLOAD],
            len: len.min(MAX_PAYLOAD) as u8,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte at `index`, or 0 when the payload is shorter.
    pub fn byte(&self, index: usize) -> u8 {
        self.as_slice().get(index).copied().unwrap_or(0)
    }

    /// Little-endian u16 at `index`; missing bytes read as 0.
    pub fn u16_le(&self, index: usize) -> u16 {
        u16::from_le_bytes([self.byte(index), self.byte(index + 1)])
    }

    /// Bytes from `start` to the end of the payload.
    pub fn tail(&self, start: usize) -> &[u8] {
        self.as_slice().get(start..).unwrap_or(&[])
    }

    /// Write one byte at `index`, growing the payload if needed.
    pub fn put_u8(&mut self, index: usize, field: &'static str, value: u32) -> Result<()> {
        if value > u8::MAX as u32 {
            return Err(FrameError::FieldOutOfRange {
                field,
                value: value as u64,
                max: u8::MAX as u64,
            });
        }
        self.put_slice(index, field, &[value as u8])
    }

    /// Write a little-endian u16 at `index`, growing the payload if needed.
    pub fn put_u16_le(&mut self, index: usize, field: &'static str, value: u32) -> Result<()> {
        if value > u16::MAX as u32 {
            return Err(FrameError::FieldOutOfRange {
                field,
                value: value as u64,
                max: u16::MAX as u64,
            });
        }
        self.put_slice(index, field, &(value as u16).to_le_bytes())
    }

    /// Write `data` starting at `index`, growing the payload if needed.
    pub fn put_slice(&mut self, index: usize, field: &'static str, data: &[u8]) -> Result<()> {
        let end = index + data.len();
        if end > MAX_PAYLOAD {
            return Err(FrameError::FieldLength {
                field,
                expected: MAX_PAYLOAD.saturating_sub(index),
                actual: data.len(),
            });
        }
        self.bytes[index..end].copy_from_slice(data);
        if end > self.len as usize {
            self.len = end as u8;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Payload({})", hex_spaced(self.as_slice()))
    }
}

/// Extra bytes carried by a flagged extended data message.
///
/// With flag 0x80 the first four bytes are the transmitting device's channel
/// id: device number (u16 LE), device type, transmission type.
///
/// The data must fit the one-byte length field together with the standard
/// payload and the flag byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtendedData {
    flag: u8,
    data: Bytes,
}

impl ExtendedData {
    /// Validate and wrap extended bytes for an outgoing frame.
    pub fn new(flag: u8, data: impl Into<Bytes>) -> Result<Self> {
        if flag != EXTENDED_FLAG {
            return Err(FrameError::ExtendedFlag(flag));
        }
        let data = data.into();
        if data.len() > MAX_EXTENDED_DATA {
            return Err(FrameError::PayloadTooLong(MAX_PAYLOAD + 1 + data.len()));
        }
        Ok(Self { flag, data })
    }

    pub fn flag(&self) -> u8 {
        self.flag
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Device number of the sender, when present.
    pub fn device_number(&self) -> Option<u16> {
        match self.data.get(0..2) {
            Some(&[lo, hi]) => Some(u16::from_le_bytes([lo, hi])),
            _ => None,
        }
    }

    pub fn device_type(&self) -> Option<u8> {
        self.data.get(2).copied()
    }

    pub fn transmission_type(&self) -> Option<u8> {
        self.data.get(3).copied()
    }
}

/// A checksum-verified frame before variant dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub msg_type: u8,
    pub payload: Payload,
    pub extended: Option<ExtendedData>,
}

impl Frame {
    /// Create a standard frame.
    pub fn new(msg_type: u8, payload: Payload) -> Self {
        Self {
            msg_type,
            payload,
            extended: None,
        }
    }

    /// Declared length byte as it appears on the wire.
    pub fn declared_len(&self) -> usize {
        match &self.extended {
            Some(ext) => MAX_PAYLOAD + 1 + ext.data.len(),
            None => self.payload.len(),
        }
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        self.declared_len() + FRAME_OVERHEAD
    }

    /// Append the encoded frame to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        let start = dst.len();
        dst.reserve(self.wire_size());
        dst.put_u8(SYNC);
        dst.put_u8(self.declared_len() as u8);
        dst.put_u8(self.msg_type);
        match &self.extended {
            Some(ext) => {
                // Extended frames always carry a full standard payload before the flag.
                let mut full = [0u8; MAX_PAYLOAD];
                full[..self.payload.len()].copy_from_slice(self.payload.as_slice());
                dst.put_slice(&full);
                dst.put_u8(ext.flag);
                dst.put_slice(&ext.data);
            }
            None => dst.put_slice(self.payload.as_slice()),
        }
        let cs = checksum::compute(&dst[start..]);
        dst.put_u8(cs);
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        self.encode_into(&mut buf);
        buf.freeze()
    }
}

/// Encode a standard frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬───────────┬──────────┬──────────────────┬──────────┐
/// │ Sync     │ Length    │ Type     │ Payload          │ Checksum │
/// │ 0xA4     │ N (0-9)   │ (1B)     │ (N bytes)        │ XOR fold │
/// └──────────┴───────────┴──────────┴──────────────────┴──────────┘
/// ```
pub fn encode_frame(msg_type: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let payload = Payload::new(payload)?;
    Frame::new(msg_type, payload).encode_into(dst);
    Ok(())
}

/// Decode the frame at the head of `raw`.
///
/// Returns the frame and the number of bytes it occupies. Trailing bytes past
/// the frame are ignored; the caller advances only on success.
pub fn decode_frame(raw: &[u8]) -> Result<(Frame, usize)> {
    if raw.len() < MIN_FRAME_SIZE {
        return Err(FrameError::IncompleteFrame {
            needed: MIN_FRAME_SIZE,
            available: raw.len(),
        });
    }

    let declared = raw[1] as usize;
    let size = declared + FRAME_OVERHEAD;
    if raw.len() < size {
        return Err(FrameError::IncompleteFrame {
            needed: size,
            available: raw.len(),
        });
    }

    let frame = &raw[..size];
    let expected = checksum::compute(&frame[..size - 1]);
    let actual = frame[size - 1];
    if expected != actual {
        return Err(FrameError::BadChecksum {
            expected,
            actual,
            declared_len: declared,
        });
    }

    if frame[0] != SYNC {
        return Err(FrameError::SyncMismatch(frame[0]));
    }

    let msg_type = frame[2];
    let body = &frame[3..size - 1];

    if declared <= MAX_PAYLOAD {
        return Ok((Frame::new(msg_type, Payload::new(body)?), size));
    }

    if frame.get(EXTENDED_FLAG_OFFSET) != Some(&EXTENDED_FLAG) {
        return Err(FrameError::PayloadTooLong(declared));
    }

    let payload = Payload::new(&body[..MAX_PAYLOAD])?;
    // declared fits in a byte, so the data is within MAX_EXTENDED_DATA
    let extended = ExtendedData {
        flag: EXTENDED_FLAG,
        data: Bytes::copy_from_slice(&body[MAX_PAYLOAD + 1..]),
    };
    Ok((
        Frame {
            msg_type,
            payload,
            extended: Some(extended),
        },
        size,
    ))
}

/// Uppercase hex, space separated, as used by logs and pretty output.
pub fn hex_spaced(data: &[u8]) -> String {
    let encoded = hex::encode_upper(data);
    let mut out = String::with_capacity(encoded.len() + data.len());
    for (i, pair) in encoded.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push(pair[0] as char);
        out.push(pair[1] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MESSAGE_CHANNEL_ASSIGN, MESSAGE_SYSTEM_RESET};

    #[test]
    fn encode_system_reset() {
        let mut buf = BytesMut::new();
        encode_frame(MESSAGE_SYSTEM_RESET, &[0x00], &mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0xA4, 0x01, 0x4A, 0x00, 0xEF]);

        let (frame, size) = decode_frame(&buf).unwrap();
        assert_eq!(size, 5);
        assert_eq!(frame.msg_type, 0x4A);
        assert_eq!(frame.payload.as_slice(), &[0x00]);
    }

    #[test]
    fn decode_channel_assign() {
        let raw = [0xA4, 0x03, 0x42, 0x00, 0x00, 0x00, 0xE5];
        let (frame, size) = decode_frame(&raw).unwrap();
        assert_eq!(size, 7);
        assert_eq!(frame.msg_type, MESSAGE_CHANNEL_ASSIGN);
        assert_eq!(frame.payload.as_slice(), &[0x00, 0x00, 0x00]);
        assert!(frame.extended.is_none());
    }

    #[test]
    fn decode_incomplete_header() {
        let err = decode_frame(&[0xA4, 0x03, 0x42]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::IncompleteFrame {
                needed: 5,
                available: 3
            }
        ));
    }

    #[test]
    fn decode_incomplete_payload() {
        let err = decode_frame(&[0xA4, 0x05, 0x42, 0x00, 0x00, 0x00, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::IncompleteFrame {
                needed: 9,
                available: 7
            }
        ));
    }

    #[test]
    fn decode_bad_checksum() {
        let err = decode_frame(&[0xA4, 0x03, 0x42, 0x01, 0x02, 0xF3, 0xE5]).unwrap_err();
        assert!(err.triggers_resync());
        assert!(matches!(
            err,
            FrameError::BadChecksum {
                declared_len: 3,
                actual: 0xE5,
                ..
            }
        ));
    }

    #[test]
    fn decode_sync_mismatch() {
        let mut raw = vec![0xA5, 0x01, 0x4A, 0x00];
        raw.push(checksum::compute(&raw));
        let err = decode_frame(&raw).unwrap_err();
        assert!(matches!(err, FrameError::SyncMismatch(0xA5)));
    }

    #[test]
    fn decode_payload_too_long_without_flag() {
        let mut raw = vec![0xA4, 0x0A, 0x4E];
        raw.extend_from_slice(&[0u8; 10]);
        raw.push(checksum::compute(&raw));
        let err = decode_frame(&raw).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLong(10)));
    }

    #[test]
    fn decode_extended_broadcast() {
        let mut raw = vec![0xA4, 0x0E, 0x4E, 0x00];
        raw.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        raw.push(EXTENDED_FLAG);
        raw.extend_from_slice(&[0x34, 0x12, 0x78, 0x01]);
        raw.push(checksum::compute(&raw));

        let (frame, size) = decode_frame(&raw).unwrap();
        assert_eq!(size, 18);
        assert_eq!(frame.payload.len(), 9);
        let ext = frame.extended.as_ref().unwrap();
        assert_eq!(ext.device_number(), Some(0x1234));
        assert_eq!(ext.device_type(), Some(0x78));
        assert_eq!(ext.transmission_type(), Some(0x01));

        assert_eq!(frame.encode().as_ref(), raw.as_slice());
    }

    #[test]
    fn extended_data_must_fit_the_length_byte() {
        let err = ExtendedData::new(EXTENDED_FLAG, vec![0u8; 250]).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLong(260)));

        let err = ExtendedData::new(0x20, vec![0u8; 4]).unwrap_err();
        assert!(matches!(err, FrameError::ExtendedFlag(0x20)));

        let ext = ExtendedData::new(EXTENDED_FLAG, vec![0u8; MAX_EXTENDED_DATA]).unwrap();
        let frame = Frame {
            msg_type: 0x4E,
            payload: Payload::new(&[0u8; 9]).unwrap(),
            extended: Some(ext),
        };
        let wire = frame.encode();
        assert_eq!(wire[1], 0xFF);
        assert_eq!(wire.len(), 0xFF + FRAME_OVERHEAD);

        let (decoded, size) = decode_frame(&wire).unwrap();
        assert_eq!(size, wire.len());
        assert_eq!(decoded, frame);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let raw = [0xA4, 0x01, 0x4A, 0x00, 0xEF, 0xA4, 0x01];
        let (_, size) = decode_frame(&raw).unwrap();
        assert_eq!(size, 5);
    }

    #[test]
    fn zero_length_frame_needs_min_size() {
        let mut raw = vec![0xA4, 0x00, 0x4A];
        raw.push(checksum::compute(&raw));
        assert!(decode_frame(&raw).unwrap_err().is_incomplete());

        raw.push(0xA4);
        let (frame, size) = decode_frame(&raw).unwrap();
        assert_eq!(size, 4);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn encode_rejects_long_payload() {
        let mut buf = BytesMut::new();
        let err = encode_frame(0x4E, &[0u8; 10], &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLong(10)));
        assert!(buf.is_empty());
    }

    #[test]
    fn payload_field_writers() {
        let mut payload = Payload::zeroed(1);
        payload.put_u16_le(1, "period", 8192).unwrap();
        assert_eq!(payload.as_slice(), &[0x00, 0x00, 0x20]);
        assert_eq!(payload.u16_le(1), 8192);

        let err = payload.put_u8(0, "channel", 256).unwrap_err();
        assert!(matches!(
            err,
            FrameError::FieldOutOfRange {
                field: "channel",
                value: 256,
                max: 255
            }
        ));
        let err = payload.put_u16_le(1, "period", 0x1_0000).unwrap_err();
        assert!(matches!(err, FrameError::FieldOutOfRange { max: 0xFFFF, .. }));

        let err = payload.put_slice(5, "data", &[0u8; 8]).unwrap_err();
        assert!(matches!(err, FrameError::FieldLength { .. }));
        assert_eq!(payload.len(), 3);
    }

    #[test]
    fn short_payload_reads_zero() {
        let payload = Payload::new(&[7]).unwrap();
        assert_eq!(payload.byte(0), 7);
        assert_eq!(payload.byte(5), 0);
        assert!(payload.tail(3).is_empty());
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(hex_spaced(&[0xA4, 0x01, 0x4A]), "A4 01 4A");
        assert_eq!(hex_spaced(&[]), "");
    }
}
