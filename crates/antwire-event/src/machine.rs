use std::sync::atomic::Ordering;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use antwire_frame::{Message, MessageKind, SharedCapture};
use antwire_transport::TransportRead;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::callback::EventCallback;
use crate::config::{EventConfig, WaitOptions};
use crate::error::{EventError, Result};
use crate::pump::{self, PumpPhase, Shared};
use crate::status::PumpEvent;

type PumpHandle = JoinHandle<Box<dyn TransportRead>>;

struct Control {
    transport: Option<Box<dyn TransportRead>>,
    handle: Option<PumpHandle>,
}

/// Owns the pump thread for one transport and serves correlation waits.
///
/// Messages flow transport → scanner → callbacks. Two built-in callbacks
/// keep the most recent channel events and messages in bounded queues, which
/// back [`wait_for_ack`](Self::wait_for_ack) and
/// [`wait_for_message`](Self::wait_for_message).
pub struct EventMachine {
    shared: Arc<Shared>,
    control: Mutex<Control>,
}

impl EventMachine {
    /// Create a machine bound to `transport` with default configuration.
    pub fn new(transport: impl TransportRead + 'static) -> Self {
        Self::with_config(transport, EventConfig::default())
    }

    pub fn with_config(transport: impl TransportRead + 'static, config: EventConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new(config)),
            control: Mutex::new(Control {
                transport: Some(Box::new(transport)),
                handle: None,
            }),
        }
    }

    pub fn config(&self) -> &EventConfig {
        &self.shared.config
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Start the pump on the bound transport.
    ///
    /// Returns once the pump is consuming the transport. Does nothing if the
    /// pump is already running.
    pub fn start(&self) -> Result<()> {
        self.start_inner(None)
    }

    /// Rebind to `transport` and start. If the pump is already running the
    /// call does nothing and `transport` is dropped.
    pub fn start_with(&self, transport: impl TransportRead + 'static) -> Result<()> {
        self.start_inner(Some(Box::new(transport)))
    }

    fn start_inner(&self, transport: Option<Box<dyn TransportRead>>) -> Result<()> {
        if self.shared.on_pump_thread() {
            return Err(EventError::CalledFromPump("start"));
        }
        let mut control = self.control();

        if self.is_running() {
            return Ok(());
        }
        // A handle without a running pump means the thread died on its own.
        if let Some(handle) = control.handle.take() {
            if let Err(err) = reap(&mut control, handle) {
                warn!(error = %err, "previous pump exited abnormally");
            }
        }
        if let Some(transport) = transport {
            control.transport = Some(transport);
        }
        let transport = control.transport.take().ok_or(EventError::NoTransport)?;

        self.shared.running.store(true, Ordering::Release);
        self.shared.set_phase(PumpPhase::Starting);

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(self.shared.config.thread_name.clone())
            .spawn(move || pump::run(shared, transport));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                self.shared.running.store(false, Ordering::Release);
                self.shared.set_phase(PumpPhase::Idle);
                return Err(EventError::Spawn(err));
            }
        };

        control.handle = Some(handle);
        self.shared.wait_while_phase(PumpPhase::Starting);
        debug!("event machine started");
        Ok(())
    }

    /// Stop the pump and wait for it to exit.
    ///
    /// No callback runs after this returns. Does nothing if not running.
    pub fn stop(&self) -> Result<()> {
        if self.shared.on_pump_thread() {
            return Err(EventError::CalledFromPump("stop"));
        }
        let mut control = self.control();
        let Some(handle) = control.handle.take() else {
            return Ok(());
        };

        self.shared.running.store(false, Ordering::Release);
        self.shared.wait_while_phase(PumpPhase::Active);
        let reaped = reap(&mut control, handle);
        self.shared.set_pump_thread(None);
        debug!("event machine stopped");
        reaped
    }

    /// Add `callback` unless the same instance is already registered.
    pub fn register_callback(&self, callback: Arc<dyn EventCallback>) -> bool {
        let mut callbacks = self.shared.callbacks_write();
        if callbacks.iter().any(|existing| Arc::ptr_eq(existing, &callback)) {
            return false;
        }
        callbacks.push(callback);
        true
    }

    /// Register a closure, returning the handle needed to remove it.
    pub fn register_fn<F>(&self, f: F) -> Arc<dyn EventCallback>
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        let callback: Arc<dyn EventCallback> = Arc::new(f);
        self.register_callback(Arc::clone(&callback));
        callback
    }

    pub fn remove_callback(&self, callback: &Arc<dyn EventCallback>) -> bool {
        let mut callbacks = self.shared.callbacks_write();
        let before = callbacks.len();
        callbacks.retain(|existing| !Arc::ptr_eq(existing, callback));
        callbacks.len() != before
    }

    /// Registered callbacks, including the two built-in queue feeders.
    pub fn callback_count(&self) -> usize {
        self.shared.callbacks_read().len()
    }

    /// Wait for the channel event answering `outbound`, returning its code.
    pub fn wait_for_ack(&self, outbound: &Message) -> Result<u8> {
        self.wait_for_ack_with(outbound, &WaitOptions::default())
    }

    /// [`wait_for_ack`](Self::wait_for_ack) with a timeout and/or cancel token.
    pub fn wait_for_ack_with(&self, outbound: &Message, options: &WaitOptions) -> Result<u8> {
        if self.shared.on_pump_thread() {
            return Err(EventError::CalledFromPump("wait_for_ack"));
        }
        let msg_type = outbound.msg_type();
        let event = self.shared.acks.wait_take(
            |event| event.message_id() == msg_type,
            options,
            self.shared.config.cancel_poll_interval,
        )?;
        Ok(event.code())
    }

    /// Wait for the oldest queued message of `kind`.
    pub fn wait_for_message(&self, kind: MessageKind) -> Result<Message> {
        self.wait_for_message_with(kind, &WaitOptions::default())
    }

    /// [`wait_for_message`](Self::wait_for_message) with a timeout and/or cancel token.
    pub fn wait_for_message_with(
        &self,
        kind: MessageKind,
        options: &WaitOptions,
    ) -> Result<Message> {
        if self.shared.on_pump_thread() {
            return Err(EventError::CalledFromPump("wait_for_message"));
        }
        self.shared.messages.wait_take(
            |message| message.kind() == kind,
            options,
            self.shared.config.cancel_poll_interval,
        )
    }

    /// Queue bytes to be consumed ahead of the transport, as if read from it.
    pub fn inject(&self, bytes: impl Into<Bytes>) {
        self.shared.inject(bytes.into());
    }

    /// Receive pump lifecycle and health events.
    pub fn subscribe(&self) -> Receiver<PumpEvent> {
        self.shared.status.subscribe()
    }

    /// Mirror raw reads and decoded messages into `capture`, or stop with `None`.
    pub fn set_capture(&self, capture: Option<SharedCapture>) {
        self.shared.set_capture(capture);
    }

    pub fn ack_queue_len(&self) -> usize {
        self.shared.acks.len()
    }

    pub fn message_queue_len(&self) -> usize {
        self.shared.messages.len()
    }

    /// Drop every queued channel event and message.
    pub fn clear_queues(&self) {
        self.shared.acks.clear();
        self.shared.messages.clear();
    }

    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Join a finished pump, keeping its transport for the next start.
fn reap(control: &mut Control, handle: PumpHandle) -> Result<()> {
    match handle.join() {
        Ok(transport) => {
            control.transport = Some(transport);
            Ok(())
        }
        Err(_) => Err(EventError::PumpPanicked),
    }
}

impl Drop for EventMachine {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            self.shared.running.store(false, Ordering::Release);
            debug!(error = %err, "event machine dropped without a clean stop");
        }
    }
}

impl std::fmt::Debug for EventMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventMachine")
            .field("running", &self.is_running())
            .field("callbacks", &self.callback_count())
            .field("ack_queue", &self.ack_queue_len())
            .field("message_queue", &self.message_queue_len())
            .finish()
    }
}
