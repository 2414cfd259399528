//! Interrupt-fed byte stream with blocking, cancelable reads, for SLIP links.

pub mod bridge;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod fault;
pub mod port;
pub mod queue;
pub mod reader;
pub mod serial;
pub mod sim;
pub mod transport;

pub use bridge::ReceiveBridge;
pub use config::{SioConfig, DEFAULT_QUEUE_CAPACITY};
pub use device::SioDevice;
pub use error::{SioError, TransportError};
pub use event::SioEvent;
pub use fault::{Fault, FaultHandler, HaltHandler};
pub use port::SioPort;
pub use queue::{EventQueue, QueueError, MAX_QUEUE_CAPACITY};
pub use serial::{PortInfo, SerialTransport};
pub use sim::SimTransport;
pub use transport::{RxComplete, Transport};
