use std::sync::Arc;

use antwire_frame::{ChannelEvent, Message};

use crate::queue::BoundedQueue;

/// Receives every message the pump decodes, in stream order.
///
/// Callbacks run on the pump thread while the callback set is locked, so they
/// must not register or remove callbacks themselves.
pub trait EventCallback: Send + Sync {
    fn process(&self, message: &Message);
}

impl<F> EventCallback for F
where
    F: Fn(&Message) + Send + Sync,
{
    fn process(&self, message: &Message) {
        self(message)
    }
}

/// Feeds channel events into the ack queue.
pub(crate) struct AckCallback {
    pub(crate) queue: Arc<BoundedQueue<ChannelEvent>>,
}

impl EventCallback for AckCallback {
    fn process(&self, message: &Message) {
        if let Message::ChannelEvent(event) = message {
            self.queue.push(event.clone());
        }
    }
}

/// Feeds every message into the generic queue.
pub(crate) struct MessageCallback {
    pub(crate) queue: Arc<BoundedQueue<Message>>,
}

impl EventCallback for MessageCallback {
    fn process(&self, message: &Message) {
        self.queue.push(message.clone());
    }
}

#[cfg(test)]
mod tests {
    use antwire_frame::{ChannelOpen, SystemReset};

    use super::*;

    #[test]
    fn closures_are_callbacks() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback = move |message: &Message| sink.lock().unwrap().push(message.kind());

        callback.process(&SystemReset::new().into());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn ack_callback_keeps_only_channel_events() {
        let queue = Arc::new(BoundedQueue::new(25));
        let callback = AckCallback {
            queue: Arc::clone(&queue),
        };

        callback.process(&ChannelOpen::new(0).into());
        callback.process(&ChannelEvent::new(0, 0x4B, 0).into());

        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn message_callback_keeps_everything() {
        let queue = Arc::new(BoundedQueue::new(25));
        let callback = MessageCallback {
            queue: Arc::clone(&queue),
        };

        callback.process(&ChannelOpen::new(0).into());
        callback.process(&ChannelEvent::new(0, 0x4B, 0).into());

        assert_eq!(queue.len(), 2);
    }
}
