use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::time::Duration;
use thiserror::Error;

use crate::error::SioError;
use crate::event::SioEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("event queue is full")]
    Full,
    #[error("event queue is disconnected")]
    Disconnected,
    #[error("timed out waiting for an event")]
    Timeout,
}

/// Largest queue a device may be opened with.
pub const MAX_QUEUE_CAPACITY: usize = 1 << 16;

/// Fixed-capacity FIFO between the receive interrupt and the reading task.
///
/// `push` never blocks and is safe from the interrupt context. `pop` may
/// suspend the caller indefinitely.
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: Sender<SioEvent>,
    rx: Receiver<SioEvent>,
    capacity: usize,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Result<Self, SioError> {
        // A zero-capacity crossbeam channel is a rendezvous, which would make
        // every push from the interrupt fail. Oversized ones panic in crossbeam.
        if capacity == 0 || capacity > MAX_QUEUE_CAPACITY {
            return Err(SioError::ResourceExhausted { capacity });
        }
        let (tx, rx) = bounded(capacity);
        Ok(Self { tx, rx, capacity })
    }

    pub fn push(&self, event: SioEvent) -> Result<(), QueueError> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => QueueError::Full,
            TrySendError::Disconnected(_) => QueueError::Disconnected,
        })
    }

    pub fn pop(&self) -> Result<SioEvent, QueueError> {
        self.rx.recv().map_err(|_| QueueError::Disconnected)
    }

    pub fn pop_timeout(&self, timeout: Duration) -> Result<SioEvent, QueueError> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => QueueError::Timeout,
            RecvTimeoutError::Disconnected => QueueError::Disconnected,
        })
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
