use std::sync::Arc;

use crate::error::TransportError;
use crate::event::SioEvent;
use crate::fault::{Fault, FaultHandler};
use crate::queue::EventQueue;
use crate::transport::{RxComplete, Transport};

/// Interrupt-side producer: queues each received byte and re-arms the
/// hardware before returning. It has nobody to report failure to, so every
/// failure goes to the fault handler.
pub struct ReceiveBridge {
    queue: EventQueue,
    transport: Arc<dyn Transport>,
    fault: Arc<dyn FaultHandler>,
}

impl ReceiveBridge {
    pub fn new(queue: EventQueue, transport: Arc<dyn Transport>, fault: Arc<dyn FaultHandler>) -> Self {
        Self {
            queue,
            transport,
            fault,
        }
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn fault(&self) -> &dyn FaultHandler {
        self.fault.as_ref()
    }
}

impl RxComplete for ReceiveBridge {
    fn on_rx_complete(&self, byte: u8) {
        log::trace!("rx {byte:#04x}");
        if let Err(e) = self.queue.push(SioEvent::Data(byte)) {
            self.fault.escalate(Fault::Push(e));
        }
        if let Err(e) = self.transport.arm_receive() {
            self.fault.escalate(Fault::Rearm(e));
        }
    }

    fn on_rx_error(&self, error: TransportError) {
        self.fault.escalate(Fault::Receive(error));
    }
}
