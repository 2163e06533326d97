use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};

/// Lifecycle and health notifications published by the pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpEvent {
    /// The pump thread is consuming the transport.
    Started,
    /// Corrupt frames were skipped.
    Resynchronized { skipped: usize },
    /// A transport read failed; the pump keeps retrying.
    TransportFailed { message: String },
    /// Scanning stopped on a frame that is neither complete-but-corrupt nor
    /// short. Published once per stall; later reads keep accumulating behind
    /// the stuck bytes until the pump is restarted.
    Stalled { error: String, buffered: usize },
    /// The pump thread has exited.
    Stopped,
}

/// Fan-out of [`PumpEvent`]s to any number of subscribers.
///
/// Publishing never blocks. Subscribers whose receiver was dropped are pruned
/// on the next publish.
#[derive(Debug, Default)]
pub struct StatusBus {
    senders: Mutex<Vec<Sender<PumpEvent>>>,
}

impl StatusBus {
    pub fn subscribe(&self) -> Receiver<PumpEvent> {
        let (tx, rx) = mpsc::channel();
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn publish(&self, event: PumpEvent) {
        let mut senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
