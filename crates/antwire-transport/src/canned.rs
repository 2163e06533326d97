//! Scripted device double.
//!
//! `CannedTransport` behaves like a radio module that answers known requests
//! with canned responses. Clones share state, so one clone can be handed to the
//! event pump as its read half while another stays with the caller as the
//! write half.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Result, TransportError};
use crate::traits::{TransportRead, TransportWrite};

#[derive(Default)]
struct CannedState {
    pending: VecDeque<Bytes>,
    responses: HashMap<Vec<u8>, Vec<Bytes>>,
    written: Vec<Bytes>,
    fail_reads: Option<String>,
    closed: bool,
}

/// Scripted transport: queued reads plus write-triggered responses.
#[derive(Clone, Default)]
pub struct CannedTransport {
    state: Arc<Mutex<CannedState>>,
    read_timeout: Duration,
}

impl CannedTransport {
    /// Create an empty script. Reads with nothing queued return immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a bounded read timeout when nothing is queued.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Queue bytes for a future read. Each call is delivered by one read.
    pub fn push_read(&self, data: impl Into<Bytes>) {
        self.with_state(|state| state.pending.push_back(data.into()));
    }

    /// When exactly `request` is written, queue `responses` for reading.
    pub fn respond_to(&self, request: impl Into<Vec<u8>>, responses: Vec<Bytes>) {
        self.with_state(|state| {
            state.responses.insert(request.into(), responses);
        });
    }

    /// Make every subsequent read fail with the given message.
    pub fn fail_reads(&self, message: impl Into<String>) {
        self.with_state(|state| state.fail_reads = Some(message.into()));
    }

    /// Make every subsequent read and write report a closed transport.
    pub fn close(&self) {
        self.with_state(|state| state.closed = true);
    }

    /// Every buffer written so far, in order.
    pub fn written(&self) -> Vec<Bytes> {
        self.with_state(|state| state.written.clone())
    }

    /// Number of queued, not yet read, chunks.
    pub fn pending_reads(&self) -> usize {
        self.with_state(|state| state.pending.len())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut CannedState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

impl TransportRead for CannedTransport {
    fn read(&mut self, count: usize) -> Result<Bytes> {
        let next = self.with_state(|state| {
            if let Some(message) = &state.fail_reads {
                return Err(TransportError::Io(std::io::Error::other(message.clone())));
            }
            if state.closed {
                return Err(TransportError::Closed);
            }
            let Some(mut chunk) = state.pending.pop_front() else {
                return Ok(None);
            };
            if chunk.len() > count {
                let rest = chunk.split_off(count);
                state.pending.push_front(rest);
            }
            Ok(Some(chunk))
        })?;

        match next {
            Some(chunk) => Ok(chunk),
            None => {
                if !self.read_timeout.is_zero() {
                    thread::sleep(self.read_timeout);
                }
                Ok(Bytes::new())
            }
        }
    }
}

impl TransportWrite for CannedTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.with_state(|state| {
            if state.closed {
                return Err(TransportError::Closed);
            }
            state.written.push(Bytes::copy_from_slice(data));
            if let Some(responses) = state.responses.get(data) {
                state.pending.extend(responses.iter().cloned());
            }
            Ok(data.len())
        })
    }
}

impl std::fmt::Debug for CannedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CannedTransport")
            .field("pending_reads", &self.pending_reads())
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_script_reads_nothing() {
        let mut transport = CannedTransport::new();
        assert!(transport.read(30).unwrap().is_empty());
    }

    #[test]
    fn queued_chunks_are_split_by_count() {
        let mut transport = CannedTransport::new();
        transport.push_read(vec![1u8, 2, 3, 4, 5]);
        assert_eq!(transport.read(3).unwrap().as_ref(), &[1, 2, 3]);
        assert_eq!(transport.read(3).unwrap().as_ref(), &[4, 5]);
        assert!(transport.read(3).unwrap().is_empty());
    }

    #[test]
    fn write_triggers_response_on_shared_clone() {
        let mut writer = CannedTransport::new();
        let mut reader = writer.clone();
        writer.respond_to(
            vec![0xA4, 0x01, 0x4A, 0x00, 0xEF],
            vec![Bytes::from_static(&[0xA4, 0x01, 0x6F, 0x20, 0xEA])],
        );

        writer.write_all(&[0xA4, 0x01, 0x4A, 0x00, 0xEF]).unwrap();

        assert_eq!(
            reader.read(30).unwrap().as_ref(),
            &[0xA4, 0x01, 0x6F, 0x20, 0xEA]
        );
        assert_eq!(writer.written().len(), 1);
    }

    #[test]
    fn unmatched_write_is_only_recorded() {
        let mut transport = CannedTransport::new();
        transport.write_all(&[0x01, 0x02]).unwrap();
        assert_eq!(transport.pending_reads(), 0);
        assert_eq!(transport.written()[0].as_ref(), &[0x01, 0x02]);
    }

    #[test]
    fn failure_modes() {
        let mut transport = CannedTransport::new();
        transport.fail_reads("unplugged");
        assert!(matches!(transport.read(1), Err(TransportError::Io(_))));

        let mut closed = CannedTransport::new();
        closed.close();
        assert!(matches!(closed.read(1), Err(TransportError::Closed)));
        assert!(matches!(closed.write(&[0x00]), Err(TransportError::Closed)));
    }
}
