use bytes::{Buf, BytesMut};
use tracing::debug;

use crate::constants::{FRAME_OVERHEAD, MAX_FRAME_SIZE};
use crate::error::FrameError;
use crate::message::Message;
use crate::registry;

const INITIAL_BUFFER_CAPACITY: usize = 4 * MAX_FRAME_SIZE;

/// Result of one pass over the accumulated bytes.
#[derive(Debug, Default)]
pub struct Scan {
    /// Messages in stream order.
    pub messages: Vec<Message>,
    /// Bytes discarded while resynchronizing past corrupt frames.
    pub skipped: usize,
    /// The failure that halted the pass when it was not a lack of bytes.
    pub stalled: Option<FrameError>,
}

/// Outcome of one decode attempt at the head of a buffer.
pub(crate) enum Step {
    /// A message was decoded and its bytes consumed.
    Message(Message),
    /// A corrupt frame of this many bytes was dropped.
    Skipped(usize),
    /// Nothing more can be taken: `None` while waiting for bytes, otherwise
    /// the failure that stalled the stream.
    Halt(Option<FrameError>),
}

/// Decode or resynchronize once at the head of `buf`.
///
/// A frame with a bad checksum is skipped using its declared length. Any other
/// failure leaves `buf` untouched.
pub(crate) fn step(buf: &mut BytesMut) -> Step {
    match registry::lookup(buf) {
        Ok((message, size)) => {
            buf.advance(size);
            Step::Message(message)
        }
        Err(FrameError::BadChecksum { declared_len, .. }) => {
            let skip = (declared_len + FRAME_OVERHEAD).min(buf.len());
            debug!(skip, "bad checksum, resynchronizing");
            buf.advance(skip);
            Step::Skipped(skip)
        }
        Err(err) if err.is_incomplete() => Step::Halt(None),
        Err(err) => {
            debug!(error = %err, remaining = buf.len(), "scan stalled");
            Step::Halt(Some(err))
        }
    }
}

/// Extract every complete frame at the head of `buf`, advancing past them.
///
/// The next pass retries from where this one halted once more bytes arrive.
pub fn scan_buffer(buf: &mut BytesMut) -> Scan {
    let mut scan = Scan::default();

    loop {
        match step(buf) {
            Step::Message(message) => scan.messages.push(message),
            Step::Skipped(skip) => scan.skipped += skip,
            Step::Halt(stalled) => {
                scan.stalled = stalled;
                break;
            }
        }
    }

    scan
}

/// Accumulates stream bytes and yields the messages they contain.
///
/// Splitting a stream across any number of `push` calls yields the same
/// message sequence as pushing it in one piece.
///
/// A stalled scan never consumes the stuck bytes, so the buffer grows with
/// every later `push` until [`FrameScanner::clear`] is called.
#[derive(Debug)]
pub struct FrameScanner {
    buf: BytesMut,
    skipped_total: usize,
}

impl Default for FrameScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScanner {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            skipped_total: 0,
        }
    }

    /// Append bytes without scanning.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Scan the accumulated bytes.
    pub fn scan(&mut self) -> Scan {
        let scan = scan_buffer(&mut self.buf);
        self.skipped_total += scan.skipped;
        scan
    }

    /// Append bytes and scan.
    pub fn push(&mut self, data: &[u8]) -> Scan {
        self.extend(data);
        self.scan()
    }

    /// Bytes not yet consumed by a frame.
    pub fn remaining(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Total bytes skipped by resynchronization since creation.
    pub fn skipped_total(&self) -> usize {
        self.skipped_total
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
