use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Weak;
use std::time::Duration;

use crate::error::TransportError;
use crate::transport::{RxComplete, Transport};

/// In-memory UART for tests and loopback runs.
///
/// `deliver` plays the wire: it completes the armed reception and invokes
/// the bound handler on the calling thread, which acts as the interrupt
/// context. Deliveries must not overlap.
#[derive(Default)]
pub struct SimTransport {
    armed: AtomicBool,
    fail_arm: AtomicBool,
    fail_transmit: AtomicBool,
    arms: AtomicUsize,
    overruns: AtomicUsize,
    handler: Mutex<Option<Weak<dyn RxComplete>>>,
    sent: Mutex<Vec<u8>>,
    transmit_delay: Mutex<Duration>,
}

impl SimTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte from the line. Returns false when the byte was lost
    /// because no reception was armed or nothing is bound.
    pub fn deliver(&self, byte: u8) -> bool {
        if !self.armed.swap(false, Ordering::AcqRel) {
            self.overruns.fetch_add(1, Ordering::Relaxed);
            log::warn!("sim: overrun, byte {byte:#04x} arrived with no reception armed");
            return false;
        }
        let handler = self.handler.lock().as_ref().and_then(Weak::upgrade);
        match handler {
            Some(handler) => {
                handler.on_rx_complete(byte);
                true
            }
            None => {
                log::warn!("sim: no receiver bound, byte {byte:#04x} dropped");
                false
            }
        }
    }

    /// End the armed reception with `error` instead of a byte. Returns false
    /// when nothing was armed or nothing is bound.
    pub fn fail_reception(&self, error: TransportError) -> bool {
        if !self.armed.swap(false, Ordering::AcqRel) {
            return false;
        }
        let handler = self.handler.lock().as_ref().and_then(Weak::upgrade);
        match handler {
            Some(handler) => {
                handler.on_rx_error(error);
                true
            }
            None => false,
        }
    }

    pub fn deliver_all(&self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| self.deliver(b)).count()
    }

    pub fn set_arm_failure(&self, fail: bool) {
        self.fail_arm.store(fail, Ordering::Release);
    }

    pub fn set_transmit_failure(&self, fail: bool) {
        self.fail_transmit.store(fail, Ordering::Release);
    }

    /// Time each transmit takes before it completes.
    pub fn set_transmit_delay(&self, delay: Duration) {
        *self.transmit_delay.lock() = delay;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    pub fn arm_count(&self) -> usize {
        self.arms.load(Ordering::Relaxed)
    }

    pub fn overruns(&self) -> usize {
        self.overruns.load(Ordering::Relaxed)
    }

    pub fn take_sent(&self) -> Vec<u8> {
        std::mem::take(&mut *self.sent.lock())
    }
}

impl Transport for SimTransport {
    fn bind(&self, handler: Weak<dyn RxComplete>) {
        *self.handler.lock() = Some(handler);
    }

    fn arm_receive(&self) -> Result<(), TransportError> {
        if self.fail_arm.load(Ordering::Acquire) {
            return Err(TransportError::Unavailable("simulated arm failure".into()));
        }
        if self
            .armed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TransportError::Busy);
        }
        self.arms.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn transmit(&self, data: &[u8]) -> Result<(), TransportError> {
        let delay = *self.transmit_delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        if self.fail_transmit.load(Ordering::Acquire) {
            return Err(TransportError::Unavailable("simulated transmit failure".into()));
        }
        self.sent.lock().extend_from_slice(data);
        Ok(())
    }
}
