//! The background pump: transport bytes in, callbacks out.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, ThreadId};

use antwire_frame::capture::{record_shared, CaptureKind};
use antwire_frame::{ChannelEvent, FrameScanner, Message, SharedCapture};
use antwire_transport::TransportRead;
use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::callback::{AckCallback, EventCallback, MessageCallback};
use crate::config::EventConfig;
use crate::queue::BoundedQueue;
use crate::status::{PumpEvent, StatusBus};

/// Where the pump thread is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PumpPhase {
    Idle,
    Starting,
    Active,
}

/// State shared by the pump thread and every caller.
///
/// Each field group has its own guard; no code path holds two at once.
pub(crate) struct Shared {
    pub(crate) config: EventConfig,
    pub(crate) running: AtomicBool,
    phase: Mutex<PumpPhase>,
    phase_changed: Condvar,
    pump_thread: Mutex<Option<ThreadId>>,
    callbacks: RwLock<Vec<Arc<dyn EventCallback>>>,
    pub(crate) acks: Arc<BoundedQueue<ChannelEvent>>,
    pub(crate) messages: Arc<BoundedQueue<Message>>,
    injected: Mutex<VecDeque<Bytes>>,
    pub(crate) status: StatusBus,
    capture: Mutex<Option<SharedCapture>>,
}

impl Shared {
    pub(crate) fn new(config: EventConfig) -> Self {
        let acks = Arc::new(BoundedQueue::new(config.ack_queue_capacity));
        let messages = Arc::new(BoundedQueue::new(config.message_queue_capacity));
        let builtins: Vec<Arc<dyn EventCallback>> = vec![
            Arc::new(AckCallback {
                queue: Arc::clone(&acks),
            }),
            Arc::new(MessageCallback {
                queue: Arc::clone(&messages),
            }),
        ];

        Self {
            config,
            running: AtomicBool::new(false),
            phase: Mutex::new(PumpPhase::Idle),
            phase_changed: Condvar::new(),
            pump_thread: Mutex::new(None),
            callbacks: RwLock::new(builtins),
            acks,
            messages,
            injected: Mutex::new(VecDeque::new()),
            status: StatusBus::default(),
            capture: Mutex::new(None),
        }
    }

    pub(crate) fn set_phase(&self, phase: PumpPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
        self.phase_changed.notify_all();
    }

    /// Block while the pump is in `phase`.
    pub(crate) fn wait_while_phase(&self, phase: PumpPhase) {
        let guard = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        let _guard = self
            .phase_changed
            .wait_while(guard, |current| *current == phase)
            .unwrap_or_else(PoisonError::into_inner);
    }

    pub(crate) fn set_pump_thread(&self, id: Option<ThreadId>) {
        *self.pump_thread.lock().unwrap_or_else(PoisonError::into_inner) = id;
    }

    pub(crate) fn on_pump_thread(&self) -> bool {
        let current = thread::current().id();
        *self.pump_thread.lock().unwrap_or_else(PoisonError::into_inner) == Some(current)
    }

    pub(crate) fn callbacks_read(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, Vec<Arc<dyn EventCallback>>> {
        self.callbacks.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn callbacks_write(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, Vec<Arc<dyn EventCallback>>> {
        self.callbacks.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn inject(&self, bytes: Bytes) {
        self.injected_lock().push_back(bytes);
    }

    fn take_injected(&self) -> Option<Bytes> {
        self.injected_lock().pop_front()
    }

    fn injected_lock(&self) -> MutexGuard<'_, VecDeque<Bytes>> {
        self.injected.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_capture(&self, capture: Option<SharedCapture>) {
        *self.capture.lock().unwrap_or_else(PoisonError::into_inner) = capture;
    }

    fn capture(&self) -> Option<SharedCapture> {
        self.capture
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Hand each message to every callback, in registration order.
    fn dispatch(&self, messages: &[Message]) {
        let callbacks = self.callbacks_read();
        for message in messages {
            for callback in callbacks.iter() {
                callback.process(message);
            }
        }
    }
}

/// Marks the pump active for as long as it lives, including across a panic.
struct ActiveGuard<'a> {
    shared: &'a Shared,
}

impl<'a> ActiveGuard<'a> {
    fn enter(shared: &'a Shared) -> Self {
        shared.set_phase(PumpPhase::Active);
        Self { shared }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        self.shared.set_phase(PumpPhase::Idle);
        self.shared.status.publish(PumpEvent::Stopped);
        debug!("pump stopped");
    }
}

/// Pump body. Returns the transport so the machine can restart on it.
pub(crate) fn run(
    shared: Arc<Shared>,
    mut transport: Box<dyn TransportRead>,
) -> Box<dyn TransportRead> {
    shared.set_pump_thread(Some(thread::current().id()));
    let _active = ActiveGuard::enter(&shared);
    shared.status.publish(PumpEvent::Started);
    debug!("pump started");

    let mut scanner = FrameScanner::new();
    let mut stalled = false;
    while shared.running.load(Ordering::Acquire) {
        let chunk = match shared.take_injected() {
            Some(bytes) => bytes,
            None => match transport.read(shared.config.read_chunk_size) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(error = %err, "transport read failed");
                    shared.status.publish(PumpEvent::TransportFailed {
                        message: err.to_string(),
                    });
                    thread::sleep(shared.config.error_backoff);
                    continue;
                }
            },
        };

        if chunk.is_empty() {
            if !shared.config.idle_backoff.is_zero() {
                thread::sleep(shared.config.idle_backoff);
            }
            continue;
        }
        trace!(len = chunk.len(), buffered = scanner.len(), "read");

        let capture = shared.capture();
        if let Some(capture) = &capture {
            record_shared(capture, CaptureKind::Read, &chunk);
        }

        let scan = scanner.push(&chunk);
        if scan.skipped > 0 {
            shared.status.publish(PumpEvent::Resynchronized {
                skipped: scan.skipped,
            });
        }
        match &scan.stalled {
            Some(err) if !stalled => {
                warn!(error = %err, buffered = scanner.len(), "scan stalled");
                shared.status.publish(PumpEvent::Stalled {
                    error: err.to_string(),
                    buffered: scanner.len(),
                });
                stalled = true;
            }
            Some(_) => {}
            None => stalled = false,
        }
        if scan.messages.is_empty() {
            continue;
        }

        if let Some(capture) = &capture {
            for message in &scan.messages {
                record_shared(capture, CaptureKind::Message, &message.encode());
            }
        }
        shared.dispatch(&scan.messages);
    }

    transport
}
