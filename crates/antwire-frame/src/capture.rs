//! `ANT-LOG` traffic capture.
//!
//! A capture file starts with the header line `ANT-LOG`, followed by one line
//! per event:
//!
//! ```text
//! 1700000000 EVENT_READ: A4 01 6F 20 EA
//! 1700000000: A4 01 6F 20 EA
//! ```
//!
//! Lines with a label record raw transport activity; unlabeled lines record
//! decoded messages as their encoded frame.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use antwire_transport::{self as transport, TransportWrite};
use bytes::Bytes;
use tracing::warn;

use crate::codec::hex_spaced;
use crate::error::{FrameError, Result};
use crate::message::Message;

pub const CAPTURE_HEADER: &str = "ANT-LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureKind {
    Open,
    Close,
    Read,
    Write,
    /// A decoded message.
    Message,
}

impl CaptureKind {
    fn label(self) -> Option<&'static str> {
        match self {
            CaptureKind::Open => Some("EVENT_OPEN"),
            CaptureKind::Close => Some("EVENT_CLOSE"),
            CaptureKind::Read => Some("EVENT_READ"),
            CaptureKind::Write => Some("EVENT_WRITE"),
            CaptureKind::Message => None,
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "EVENT_OPEN" => Some(CaptureKind::Open),
            "EVENT_CLOSE" => Some(CaptureKind::Close),
            "EVENT_READ" => Some(CaptureKind::Read),
            "EVENT_WRITE" => Some(CaptureKind::Write),
            _ => None,
        }
    }
}

/// One line of a capture log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEntry {
    /// Unix time in whole seconds.
    pub timestamp: u64,
    pub kind: CaptureKind,
    pub data: Bytes,
}

impl CaptureEntry {
    pub fn new(kind: CaptureKind, data: impl Into<Bytes>) -> Self {
        Self {
            timestamp: unix_now(),
            kind,
            data: data.into(),
        }
    }

    /// Parse one log line. `line_no` is only used in error reports.
    pub fn parse(line: &str, line_no: usize) -> Result<Self> {
        let fail = |message: String| FrameError::Capture {
            line: line_no,
            message,
        };

        let (head, data) = line
            .split_once(':')
            .ok_or_else(|| fail("missing ':' separator".to_string()))?;

        let mut parts = head.split_whitespace();
        let timestamp = parts
            .next()
            .ok_or_else(|| fail("missing timestamp".to_string()))?
            .parse::<u64>()
            .map_err(|err| fail(format!("bad timestamp: {err}")))?;

        let kind = match parts.next() {
            None => CaptureKind::Message,
            Some(label) => CaptureKind::from_label(label)
                .ok_or_else(|| fail(format!("unknown event label {label}")))?,
        };
        if parts.next().is_some() {
            return Err(fail("unexpected text before ':'".to_string()));
        }

        let digits: String = data.split_whitespace().collect();
        let data = hex::decode(&digits).map_err(|err| fail(format!("bad hex data: {err}")))?;

        Ok(Self {
            timestamp,
            kind,
            data: Bytes::from(data),
        })
    }
}

impl fmt::Display for CaptureEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.timestamp)?;
        if let Some(label) = self.kind.label() {
            write!(f, " {label}")?;
        }
        f.write_str(":")?;
        if !self.data.is_empty() {
            write!(f, " {}", hex_spaced(&self.data))?;
        }
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Appends capture lines to any `Write` sink.
pub struct CaptureWriter<W: Write> {
    inner: W,
}

impl<W: Write> CaptureWriter<W> {
    /// Write the header and return the writer.
    pub fn new(mut inner: W) -> Result<Self> {
        writeln!(inner, "{CAPTURE_HEADER}")?;
        Ok(Self { inner })
    }

    pub fn record_entry(&mut self, entry: &CaptureEntry) -> Result<()> {
        writeln!(self.inner, "{entry}")?;
        Ok(())
    }

    pub fn record(&mut self, kind: CaptureKind, data: &[u8]) -> Result<()> {
        self.record_entry(&CaptureEntry::new(kind, Bytes::copy_from_slice(data)))
    }

    pub fn log_open(&mut self) -> Result<()> {
        self.record(CaptureKind::Open, &[])
    }

    pub fn log_close(&mut self) -> Result<()> {
        self.record(CaptureKind::Close, &[])
    }

    pub fn log_read(&mut self, data: &[u8]) -> Result<()> {
        self.record(CaptureKind::Read, data)
    }

    pub fn log_write(&mut self, data: &[u8]) -> Result<()> {
        self.record(CaptureKind::Write, data)
    }

    pub fn log_message(&mut self, message: &Message) -> Result<()> {
        self.record_entry(&CaptureEntry::new(CaptureKind::Message, message.encode()))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl CaptureWriter<BufWriter<File>> {
    /// Create (or truncate) a capture file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(BufWriter::new(File::create(path)?))
    }
}

/// A capture writer shared between the pump and transport wrappers.
pub type SharedCapture = Arc<Mutex<CaptureWriter<Box<dyn Write + Send>>>>;

/// Box `inner` into a [`SharedCapture`], writing the header.
pub fn shared_capture(inner: impl Write + Send + 'static) -> Result<SharedCapture> {
    let boxed: Box<dyn Write + Send> = Box::new(inner);
    Ok(Arc::new(Mutex::new(CaptureWriter::new(boxed)?)))
}

/// Record into a shared capture, logging rather than propagating failures.
pub fn record_shared(capture: &SharedCapture, kind: CaptureKind, data: &[u8]) {
    let mut writer = capture.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(err) = writer.record(kind, data) {
        warn!(error = %err, "capture write failed");
    }
}

/// Iterates the entries of a capture log.
pub struct CaptureReader<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> CaptureReader<R> {
    /// Validate the header line and position at the first entry.
    pub fn new(inner: R) -> Result<Self> {
        let mut lines = inner.lines();
        match lines.next() {
            Some(Ok(header)) if header.trim_end() == CAPTURE_HEADER => {}
            Some(Err(err)) => return Err(FrameError::Io(err)),
            _ => {
                return Err(FrameError::Capture {
                    line: 1,
                    message: "unknown format (missing ANT-LOG header)".to_string(),
                })
            }
        }
        Ok(Self { lines, line_no: 1 })
    }
}

impl CaptureReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: BufRead> Iterator for CaptureReader<R> {
    type Item = Result<CaptureEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(FrameError::Io(err))),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(CaptureEntry::parse(&line, self.line_no));
        }
    }
}

/// A transport writer that mirrors every successful write into a capture.
pub struct CapturingWriter<T> {
    inner: T,
    capture: SharedCapture,
}

impl<T: TransportWrite> CapturingWriter<T> {
    pub fn new(inner: T, capture: SharedCapture) -> Self {
        Self { inner, capture }
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: TransportWrite> TransportWrite for CapturingWriter<T> {
    fn write(&mut self, data: &[u8]) -> transport::Result<usize> {
        let written = self.inner.write(data)?;
        record_shared(&self.capture, CaptureKind::Write, &data[..written]);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use antwire_transport::CannedTransport;

    use super::*;
    use crate::message::{ChannelEvent, Message};

    #[test]
    fn entry_lines() {
        let entry = CaptureEntry {
            timestamp: 1_700_000_000,
            kind: CaptureKind::Read,
            data: Bytes::from_static(&[0xA4, 0x01, 0x6F, 0x20, 0xEA]),
        };
        assert_eq!(entry.to_string(), "1700000000 EVENT_READ: A4 01 6F 20 EA");

        let message = CaptureEntry {
            timestamp: 5,
            kind: CaptureKind::Message,
            data: Bytes::from_static(&[0xA4, 0x01]),
        };
        assert_eq!(message.to_string(), "5: A4 01");

        let open = CaptureEntry {
            timestamp: 5,
            kind: CaptureKind::Open,
            data: Bytes::new(),
        };
        assert_eq!(open.to_string(), "5 EVENT_OPEN:");
    }

    #[test]
    fn parse_lines() {
        let entry = CaptureEntry::parse("1700000000 EVENT_WRITE: A4 01 4A 00 EF", 2).unwrap();
        assert_eq!(entry.timestamp, 1_700_000_000);
        assert_eq!(entry.kind, CaptureKind::Write);
        assert_eq!(entry.data.as_ref(), &[0xA4, 0x01, 0x4A, 0x00, 0xEF]);

        let entry = CaptureEntry::parse("12: a4 01", 3).unwrap();
        assert_eq!(entry.kind, CaptureKind::Message);

        let entry = CaptureEntry::parse("12 EVENT_CLOSE: ", 4).unwrap();
        assert!(entry.data.is_empty());
    }

    #[test]
    fn parse_rejects_garbage() {
        for line in ["no separator", "abc: A4", "1 EVENT_BOGUS: A4", "1 EVENT_READ: A4 0"] {
            let err = CaptureEntry::parse(line, 7).unwrap_err();
            assert!(matches!(err, FrameError::Capture { line: 7, .. }), "{line}");
        }
    }

    #[test]
    fn write_then_read_back() {
        let mut writer = CaptureWriter::new(Vec::new()).unwrap();
        writer.log_open().unwrap();
        writer.log_read(&[0xA4, 0x01, 0x6F, 0x20, 0xEA]).unwrap();
        writer
            .log_message(&Message::from(ChannelEvent::new(0, 0x4B, 0)))
            .unwrap();
        writer.log_close().unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert!(text.starts_with("ANT-LOG\n"));

        let entries: Vec<_> = CaptureReader::new(Cursor::new(text))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let kinds: Vec<_> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CaptureKind::Open,
                CaptureKind::Read,
                CaptureKind::Message,
                CaptureKind::Close
            ]
        );
        assert_eq!(entries[1].data.as_ref(), &[0xA4, 0x01, 0x6F, 0x20, 0xEA]);
        assert_eq!(entries[2].data.len(), 7);
    }

    #[test]
    fn reader_requires_header() {
        let err = CaptureReader::new(Cursor::new("1: A4\n")).err().unwrap();
        assert!(matches!(err, FrameError::Capture { line: 1, .. }));
        assert!(CaptureReader::new(Cursor::new("")).is_err());
    }

    #[test]
    fn reader_reports_line_numbers() {
        let text = "ANT-LOG\n1: A4\n\n2 EVENT_NOPE: 00\n";
        let results: Vec<_> = CaptureReader::new(Cursor::new(text)).unwrap().collect();
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(FrameError::Capture { line: 4, .. })));
    }

    #[test]
    fn capturing_writer_mirrors_writes() {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let capture = shared_capture(SharedSink(Arc::clone(&sink))).unwrap();
        let device = CannedTransport::new();
        let mut writer = CapturingWriter::new(device.clone(), capture);

        writer.write_all(&[0xA4, 0x01, 0x4A, 0x00, 0xEF]).unwrap();

        assert_eq!(device.written().len(), 1);
        let text = String::from_utf8(sink.lock().unwrap().clone()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("ANT-LOG"));
        assert!(lines
            .next()
            .unwrap()
            .ends_with("EVENT_WRITE: A4 01 4A 00 EF"));
    }

    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
