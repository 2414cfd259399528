//! Hardware seam: one-byte interrupt-driven reception and blocking transmit.

use std::sync::Weak;

use crate::error::TransportError;

/// Receive-complete notification, called from the interrupt context.
///
/// Implementations must not block. The transport clears its armed state
/// before calling, so the callback may re-arm the next reception.
pub trait RxComplete: Send + Sync {
    fn on_rx_complete(&self, byte: u8);

    /// The armed reception ended without a byte and cannot be retried.
    fn on_rx_error(&self, error: TransportError);
}

pub trait Transport: Send + Sync {
    /// Route future receive-complete notifications to `handler`, replacing
    /// any previous binding.
    fn bind(&self, handler: Weak<dyn RxComplete>);

    /// Arm reception of exactly one byte. Fails with `Busy` while a
    /// reception is already in flight.
    fn arm_receive(&self) -> Result<(), TransportError>;

    /// Send all of `data`, blocking with no timeout.
    fn transmit(&self, data: &[u8]) -> Result<(), TransportError>;
}
