use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use serialport::{SerialPort, SerialPortInfo};
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;

use crate::config::SioConfig;
use crate::error::TransportError;
use crate::transport::{RxComplete, Transport};

#[derive(Debug, Clone)]
pub struct PortInfo {
    pub port_name: String,
    pub port_type: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (port_type, vid, pid) = match &info.port_type {
            serialport::SerialPortType::UsbPort(usb) => ("USB".to_string(), Some(usb.vid), Some(usb.pid)),
            serialport::SerialPortType::PciPort => ("PCI".to_string(), None, None),
            serialport::SerialPortType::BluetoothPort => ("Bluetooth".to_string(), None, None),
            serialport::SerialPortType::Unknown => ("Unknown".to_string(), None, None),
        };
        Self {
            port_name: info.port_name,
            port_type,
            vid,
            pid,
        }
    }
}

struct Shared {
    armed: AtomicBool,
    closed: AtomicBool,
    handler: Mutex<Option<Weak<dyn RxComplete>>>,
}

/// Host serial port driven as a UART.
///
/// A dedicated reader thread stands in for the receive interrupt: each arm
/// request lets it read exactly one byte and deliver it to the bound
/// handler on that thread.
pub struct SerialTransport {
    port_name: String,
    writer: Mutex<Box<dyn SerialPort>>,
    arm_tx: Sender<()>,
    shared: Arc<Shared>,
}

impl SerialTransport {
    pub fn list_ports() -> Vec<PortInfo> {
        serialport::available_ports()
            .unwrap_or_default()
            .into_iter()
            .map(PortInfo::from)
            .collect()
    }

    pub fn open(cfg: &SioConfig) -> Result<Self, TransportError> {
        let writer = serialport::new(&cfg.port_name, cfg.baud_rate)
            .data_bits(cfg.data_bits)
            .parity(cfg.parity)
            .stop_bits(cfg.stop_bits)
            .flow_control(cfg.flow_control)
            .timeout(cfg.poll_interval)
            .open()?;
        let reader = writer.try_clone()?;

        let shared = Arc::new(Shared {
            armed: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            handler: Mutex::new(None),
        });
        let (arm_tx, arm_rx) = bounded::<()>(1);

        let thread_shared = shared.clone();
        let name = cfg.port_name.clone();
        thread::Builder::new()
            .name("sio-rx".into())
            .spawn(move || rx_loop(reader, arm_rx, thread_shared, name))?;

        log::debug!("opened {} at {} baud", cfg.port_name, cfg.baud_rate);
        Ok(Self {
            port_name: cfg.port_name.clone(),
            writer: Mutex::new(writer),
            arm_tx,
            shared,
        })
    }
}

/// Consecutive zero-length reads taken as a hang-up.
const MAX_EMPTY_READS: u32 = 3;

fn rx_loop(mut port: Box<dyn SerialPort>, arm_rx: Receiver<()>, shared: Arc<Shared>, name: String) {
    let mut buf = [0u8; 1];
    for () in arm_rx.iter() {
        let mut empty_reads = 0;
        let received = loop {
            if shared.closed.load(Ordering::Acquire) {
                return;
            }
            match port.read(&mut buf) {
                Ok(1) => break Ok(buf[0]),
                Ok(_) => {
                    empty_reads += 1;
                    if empty_reads >= MAX_EMPTY_READS {
                        break Err(TransportError::from(std::io::Error::from(ErrorKind::UnexpectedEof)));
                    }
                }
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted) => {}
                Err(e) => break Err(TransportError::from(e)),
            }
        };

        shared.armed.store(false, Ordering::Release);
        let handler = shared.handler.lock().as_ref().and_then(Weak::upgrade);
        match (handler, received) {
            (Some(handler), Ok(byte)) => handler.on_rx_complete(byte),
            (None, Ok(byte)) => log::warn!("{name}: no receiver bound, byte {byte:#04x} dropped"),
            (handler, Err(e)) => {
                shared.closed.store(true, Ordering::Release);
                match handler {
                    Some(handler) => handler.on_rx_error(e),
                    None => log::error!("{name}: receive failed: {e}"),
                }
                return;
            }
        }
    }
}

impl Transport for SerialTransport {
    fn bind(&self, handler: Weak<dyn RxComplete>) {
        *self.shared.handler.lock() = Some(handler);
    }

    fn arm_receive(&self) -> Result<(), TransportError> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        if self
            .shared
            .armed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TransportError::Busy);
        }
        self.arm_tx.try_send(()).map_err(|_| {
            self.shared.armed.store(false, Ordering::Release);
            TransportError::Closed
        })
    }

    fn transmit(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut port = self.writer.lock();
        let mut written = 0;
        while written < data.len() {
            match port.write(&data[written..]) {
                Ok(0) => return Err(std::io::Error::from(ErrorKind::WriteZero).into()),
                Ok(n) => written += n,
                // No deadline on transmit: keep waiting for the line.
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted) => {}
                Err(e) => return Err(e.into()),
            }
        }
        port.flush()?;
        log::trace!("{}: sent {} bytes", self.port_name, data.len());
        Ok(())
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
    }
}
