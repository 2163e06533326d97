//! ANT serial message framing.
//!
//! Every frame on the wire is:
//! - a sync byte (`0xA4`)
//! - a payload length byte (0-9, more only for flagged extended data)
//! - a message type byte
//! - the payload
//! - an XOR checksum over everything before it
//!
//! This crate turns bytes into typed [`Message`]s and back. The
//! [`FrameScanner`] recovers message sequences from an arbitrarily chunked
//! byte stream, skipping corrupt frames.

pub mod capture;
pub mod checksum;
pub mod codec;
pub mod constants;
pub mod error;
pub mod message;
pub mod registry;
pub mod scanner;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use capture::{
    shared_capture, CaptureEntry, CaptureKind, CaptureReader, CaptureWriter, CapturingWriter,
    SharedCapture, CAPTURE_HEADER,
};
pub use codec::{decode_frame, encode_frame, hex_spaced, ExtendedData, Frame, Payload};
pub use error::{FrameError, Result};
pub use message::*;
pub use registry::lookup;
pub use scanner::{scan_buffer, FrameScanner, Scan};
pub use writer::MessageWriter;

#[cfg(feature = "async")]
pub use async_codec::AntCodec;
