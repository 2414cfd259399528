//! Serial I/O contract consumed by the network-stack adapter (the SLIP
//! netif). Operations mirror a classic `sio_*` interface; none of them can
//! report an error other than through its return value or a fatal fault.

pub trait SioPort: Send + Sync {
    /// Send one byte, blocking until it is on the wire.
    fn send(&self, byte: u8);

    /// Receive one byte, blocking. A cancelled or failed receive is fatal.
    fn recv(&self) -> u8;

    /// Fill `buf` completely, blocking. Returns `buf.len()`, or 0 when the
    /// read was aborted or the queue failed.
    fn read(&self, buf: &mut [u8]) -> usize;

    /// Non-blocking read. Not supported: always escalates.
    fn tryread(&self, buf: &mut [u8]) -> usize;

    /// Send all of `data`, blocking. Always returns 0.
    fn write(&self, data: &[u8]) -> usize;

    /// Cancel one blocked (or the next) `read`.
    fn read_abort(&self);
}
