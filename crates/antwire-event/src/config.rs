use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Bytes requested from the transport per pump iteration.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 30;

/// Capacity of the channel-event (ack) queue.
pub const MAX_ACK_QUEUE: usize = 25;

/// Capacity of the generic message queue.
pub const MAX_MSG_QUEUE: usize = 25;

/// Event machine tuning.
#[derive(Debug, Clone)]
pub struct EventConfig {
    pub read_chunk_size: usize,
    pub ack_queue_capacity: usize,
    pub message_queue_capacity: usize,
    /// Pause after a failed transport read before retrying.
    pub error_backoff: Duration,
    /// Pause after a read that returned nothing.
    pub idle_backoff: Duration,
    /// How often a waiting caller re-checks its cancel token.
    pub cancel_poll_interval: Duration,
    pub thread_name: String,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            ack_queue_capacity: MAX_ACK_QUEUE,
            message_queue_capacity: MAX_MSG_QUEUE,
            error_backoff: Duration::from_millis(50),
            idle_backoff: Duration::from_millis(2),
            cancel_poll_interval: Duration::from_millis(5),
            thread_name: "antwire-pump".to_string(),
        }
    }
}

/// Cooperative cancellation flag shared between a waiter and its canceller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Bounds for a correlation wait. The default waits forever.
#[derive(Debug, Clone, Default)]
pub struct WaitOptions {
    pub timeout: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl WaitOptions {
    /// Wait at most `timeout`.
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            cancel: None,
        }
    }

    /// Also give up once `token` is cancelled.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
