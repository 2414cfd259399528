use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use crate::bridge::ReceiveBridge;
use crate::config::SioConfig;
use crate::error::{SioError, TransportError};
use crate::event::SioEvent;
use crate::fault::{Fault, FaultHandler};
use crate::port::SioPort;
use crate::queue::EventQueue;
use crate::reader::read_events;
use crate::transport::Transport;

/// Handle to the serial device.
///
/// The event queue is the only state shared with the receive interrupt.
/// One handle per transport: opening again rebinds reception to the new
/// handle and orphans the previous queue, which is never torn down.
pub struct SioDevice {
    devnum: u8,
    bridge: Arc<ReceiveBridge>,
}

impl SioDevice {
    pub fn open(
        devnum: u8,
        transport: Arc<dyn Transport>,
        config: &SioConfig,
        fault: Arc<dyn FaultHandler>,
    ) -> Result<Self, SioError> {
        let queue = EventQueue::new(config.queue_capacity)?;
        let bridge = Arc::new(ReceiveBridge::new(queue, transport.clone(), fault));

        let handler: Weak<ReceiveBridge> = Arc::downgrade(&bridge);
        transport.bind(handler);
        match transport.arm_receive() {
            Ok(()) => {}
            // A reception armed by an earlier open completes into this handle.
            Err(TransportError::Busy) => log::debug!("sio{devnum}: adopting reception already in flight"),
            Err(e) => return Err(SioError::Arm(e)),
        }

        log::debug!("sio{devnum}: opened with {} event slots", config.queue_capacity);
        Ok(Self { devnum, bridge })
    }

    pub fn devnum(&self) -> u8 {
        self.devnum
    }

    /// Number of events the queue can hold.
    pub fn capacity(&self) -> usize {
        self.bridge.queue().capacity()
    }

    /// Events queued and not yet consumed.
    pub fn pending(&self) -> usize {
        self.bridge.queue().len()
    }

    /// Like `read`, but gives up once `timeout` has elapsed for the whole
    /// buffer. A timeout reports 0 like an abort; bytes consumed before it
    /// are lost.
    pub fn read_timeout(&self, buf: &mut [u8], timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let queue = self.bridge.queue();
        read_events(buf, || {
            let left = deadline.saturating_duration_since(Instant::now());
            queue.pop_timeout(left)
        })
    }

    fn escalate(&self, fault: Fault) -> ! {
        self.bridge.fault().escalate(fault)
    }
}

impl SioPort for SioDevice {
    fn send(&self, byte: u8) {
        self.write(&[byte]);
    }

    fn recv(&self) -> u8 {
        let mut byte = [0u8; 1];
        if self.read(&mut byte) == 0 {
            self.escalate(Fault::ShortRecv);
        }
        byte[0]
    }

    fn read(&self, buf: &mut [u8]) -> usize {
        let queue = self.bridge.queue();
        read_events(buf, || queue.pop())
    }

    fn tryread(&self, _buf: &mut [u8]) -> usize {
        self.escalate(Fault::Unimplemented("tryread"))
    }

    fn write(&self, data: &[u8]) -> usize {
        log::trace!("sio{}: tx {} bytes", self.devnum, data.len());
        if let Err(e) = self.bridge.transport().transmit(data) {
            log::warn!("sio{}: transmit failed: {e}", self.devnum);
        }
        0
    }

    fn read_abort(&self) {
        log::debug!("sio{}: read abort requested", self.devnum);
        if let Err(e) = self.bridge.queue().push(SioEvent::Abort) {
            self.escalate(Fault::AbortRejected(e));
        }
    }
}

