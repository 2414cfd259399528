use thiserror::Error;

/// Failures reported by a hardware transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("a reception is already in flight")]
    Busy,
    #[error("transport closed")]
    Closed,
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Why `SioDevice::open` produced no handle.
#[derive(Debug, Error)]
pub enum SioError {
    #[error("cannot allocate an event queue of {capacity} slots")]
    ResourceExhausted { capacity: usize },
    #[error("failed to arm reception: {0}")]
    Arm(#[source] TransportError),
}
