use thiserror::Error;

use crate::error::TransportError;
use crate::queue::QueueError;

/// Unrecoverable conditions raised from entry points that have no error slot.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("cannot queue received byte: {0}")]
    Push(QueueError),
    #[error("cannot re-arm reception: {0}")]
    Rearm(#[source] TransportError),
    #[error("reception failed: {0}")]
    Receive(#[source] TransportError),
    #[error("single-byte receive was cancelled or the queue failed")]
    ShortRecv,
    #[error("cannot queue read abort: {0}")]
    AbortRejected(QueueError),
    #[error("{0} is not implemented")]
    Unimplemented(&'static str),
}

/// Destination of every fatal escalation. Implementations must not return.
pub trait FaultHandler: Send + Sync {
    fn escalate(&self, fault: Fault) -> !;
}

/// Logs the fault and aborts the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct HaltHandler;

impl FaultHandler for HaltHandler {
    fn escalate(&self, fault: Fault) -> ! {
        log::error!("fatal sio fault: {fault}");
        std::process::abort()
    }
}
