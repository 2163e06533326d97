use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::WaitOptions;
use crate::error::{EventError, Result};

/// Fixed-capacity FIFO that evicts its oldest entry instead of blocking.
///
/// Producers never wait. Consumers remove the first entry matching a
/// predicate, optionally blocking until one arrives.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    arrived: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            arrived: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append `item`, returning the entry evicted to make room, if any.
    pub fn push(&self, item: T) -> Option<T> {
        let evicted = {
            let mut items = self.lock();
            let evicted = if items.len() >= self.capacity {
                items.pop_front()
            } else {
                None
            };
            items.push_back(item);
            evicted
        };
        self.arrived.notify_all();
        evicted
    }

    /// Remove and return the oldest entry matching `matches`, without waiting.
    pub fn take_first(&self, mut matches: impl FnMut(&T) -> bool) -> Option<T> {
        let mut items = self.lock();
        let pos = items.iter().position(&mut matches)?;
        items.remove(pos)
    }

    /// Remove the oldest entry matching `matches`, waiting for one to arrive.
    ///
    /// A cancel token is polled every `poll` since cancellation does not wake
    /// the condition variable.
    pub fn wait_take(
        &self,
        mut matches: impl FnMut(&T) -> bool,
        options: &WaitOptions,
        poll: Duration,
    ) -> Result<T> {
        let deadline = options.timeout.map(|timeout| Instant::now() + timeout);
        let mut items = self.lock();

        loop {
            if let Some(pos) = items.iter().position(&mut matches) {
                if let Some(item) = items.remove(pos) {
                    return Ok(item);
                }
            }

            if options.cancel.as_ref().is_some_and(|token| token.is_cancelled()) {
                return Err(EventError::Cancelled);
            }

            let mut wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(EventError::Timeout(options.timeout.unwrap_or_default()));
                    }
                    Some(deadline - now)
                }
                None => None,
            };
            if options.cancel.is_some() {
                wait = Some(wait.map_or(poll, |remaining| remaining.min(poll)));
            }

            items = match wait {
                Some(duration) => {
                    self.arrived
                        .wait_timeout(items, duration)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .arrived
                    .wait(items)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> BoundedQueue<T> {
    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().iter().cloned().collect()
    }
}
