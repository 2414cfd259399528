// Scenarios run against the in-memory UART; no hardware needed.

use slipio_core::{
    Fault, FaultHandler, SimTransport, SioConfig, SioDevice, SioError, SioPort, Transport,
    TransportError,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Default)]
struct CountingFaults(AtomicUsize);

impl CountingFaults {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl FaultHandler for CountingFaults {
    fn escalate(&self, fault: Fault) -> ! {
        self.0.fetch_add(1, Ordering::SeqCst);
        panic!("fatal: {fault}");
    }
}

fn open_with(capacity: usize) -> (Arc<SimTransport>, SioDevice, Arc<CountingFaults>) {
    let sim = Arc::new(SimTransport::new());
    let faults = Arc::new(CountingFaults::default());
    let cfg = SioConfig {
        queue_capacity: capacity,
        ..Default::default()
    };
    let dev = SioDevice::open(0, sim.clone(), &cfg, faults.clone()).unwrap();
    (sim, dev, faults)
}

fn open_sim() -> (Arc<SimTransport>, SioDevice, Arc<CountingFaults>) {
    open_with(256)
}

#[test]
fn single_byte_read() {
    let (sim, dev, _) = open_sim();
    assert!(sim.deliver(0x41));
    let mut buf = [0u8; 1];
    assert_eq!(dev.read(&mut buf), 1);
    assert_eq!(buf[0], 0x41);
}

#[test]
fn multi_byte_read_in_order() {
    let (sim, dev, _) = open_sim();
    assert_eq!(sim.deliver_all(&[0x01, 0x02, 0x03]), 3);
    let mut buf = [0u8; 3];
    assert_eq!(dev.read(&mut buf), 3);
    assert_eq!(buf, [0x01, 0x02, 0x03]);
}

#[test]
fn abort_before_read_returns_zero() {
    let (_sim, dev, _) = open_sim();
    dev.read_abort();
    let mut buf = [0u8; 1];
    assert_eq!(dev.read(&mut buf), 0);
}

#[test]
fn abort_after_partial_progress_returns_zero() {
    let (sim, dev, _) = open_sim();
    sim.deliver_all(&[0x10, 0x20]);
    dev.read_abort();
    sim.deliver(0x30);

    let mut buf = [0u8; 4];
    assert_eq!(dev.read(&mut buf), 0);
    // Bytes queued after the abort are still there for the next read.
    let mut next = [0u8; 1];
    assert_eq!(dev.read(&mut next), 1);
    assert_eq!(next[0], 0x30);
}

#[test]
fn each_abort_cancels_one_read() {
    let (sim, dev, _) = open_sim();
    dev.read_abort();
    dev.read_abort();
    sim.deliver(0x55);
    let mut buf = [0u8; 1];
    assert_eq!(dev.read(&mut buf), 0);
    assert_eq!(dev.read(&mut buf), 0);
    assert_eq!(dev.read(&mut buf), 1);
    assert_eq!(buf[0], 0x55);
}

#[test]
fn abort_unblocks_a_waiting_reader() {
    let (sim, dev, _) = open_sim();
    let dev = Arc::new(dev);
    let reader = {
        let dev = dev.clone();
        thread::spawn(move || {
            let mut buf = [0u8; 8];
            dev.read(&mut buf)
        })
    };
    sim.deliver_all(&[1, 2, 3]);
    thread::sleep(Duration::from_millis(50));
    dev.read_abort();
    assert_eq!(reader.join().unwrap(), 0);
    assert_eq!(dev.pending(), 0);
}

#[test]
fn reader_wakes_when_bytes_arrive() {
    let (sim, dev, _) = open_sim();
    let dev = Arc::new(dev);
    let reader = {
        let dev = dev.clone();
        thread::spawn(move || {
            let mut buf = [0u8; 2];
            let n = dev.read(&mut buf);
            (n, buf)
        })
    };
    thread::sleep(Duration::from_millis(20));
    sim.deliver(0xc0);
    thread::sleep(Duration::from_millis(20));
    sim.deliver(0xdb);
    assert_eq!(reader.join().unwrap(), (2, [0xc0, 0xdb]));
}

#[test]
fn recv_returns_one_byte() {
    let (sim, dev, faults) = open_sim();
    sim.deliver(0x7e);
    assert_eq!(dev.recv(), 0x7e);
    assert_eq!(faults.count(), 0);
}

#[test]
fn aborted_recv_is_fatal() {
    let (_sim, dev, faults) = open_sim();
    dev.read_abort();
    let res = catch_unwind(AssertUnwindSafe(|| dev.recv()));
    assert!(res.is_err());
    assert_eq!(faults.count(), 1);
}

#[test]
fn tryread_is_always_fatal() {
    let (sim, dev, faults) = open_sim();
    sim.deliver(0x01);
    let mut buf = [0u8; 1];
    let res = catch_unwind(AssertUnwindSafe(|| dev.tryread(&mut buf)));
    assert!(res.is_err());
    assert_eq!(faults.count(), 1);
    assert_eq!(dev.pending(), 1);
}

#[test]
fn write_always_returns_zero() {
    let (sim, dev, _) = open_sim();
    assert_eq!(dev.write(b""), 0);
    assert_eq!(dev.write(b"hello"), 0);
    dev.send(b'!');
    assert_eq!(sim.take_sent(), b"hello!".to_vec());

    sim.set_transmit_failure(true);
    assert_eq!(dev.write(b"lost"), 0);
    assert!(sim.take_sent().is_empty());
}

#[test]
fn write_blocks_until_transmit_completes() {
    let (sim, dev, _) = open_sim();
    sim.set_transmit_delay(Duration::from_millis(30));
    let start = Instant::now();
    assert_eq!(dev.write(b"slow"), 0);
    assert!(start.elapsed() >= Duration::from_millis(30));
    assert_eq!(sim.take_sent(), b"slow".to_vec());
}

#[test]
fn queue_fills_to_capacity_then_overflow_is_fatal() {
    let (sim, dev, faults) = open_with(256);
    for i in 0..256u32 {
        assert!(sim.deliver(i as u8));
    }
    assert_eq!(dev.pending(), 256);
    assert_eq!(faults.count(), 0);

    let res = catch_unwind(AssertUnwindSafe(|| sim.deliver(0xff)));
    assert!(res.is_err());
    assert_eq!(faults.count(), 1);
}

#[test]
fn abort_into_full_queue_is_fatal() {
    let (sim, dev, faults) = open_with(2);
    sim.deliver_all(&[1, 2]);
    let res = catch_unwind(AssertUnwindSafe(|| dev.read_abort()));
    assert!(res.is_err());
    assert_eq!(faults.count(), 1);
}

#[test]
fn rearm_failure_after_first_byte_is_fatal() {
    let (sim, dev, faults) = open_sim();
    sim.set_arm_failure(true);
    let res = catch_unwind(AssertUnwindSafe(|| sim.deliver(0x42)));
    assert!(res.is_err());
    assert_eq!(faults.count(), 1);
    assert_eq!(dev.pending(), 1);
}

#[test]
fn open_reports_arm_failure() {
    let sim = Arc::new(SimTransport::new());
    sim.set_arm_failure(true);
    let res = SioDevice::open(0, sim, &SioConfig::default(), Arc::new(CountingFaults::default()));
    assert!(matches!(res, Err(SioError::Arm(TransportError::Unavailable(_)))));
}

#[test]
fn open_reports_resource_exhaustion() {
    let sim = Arc::new(SimTransport::new());
    let cfg = SioConfig {
        queue_capacity: 0,
        ..Default::default()
    };
    let res = SioDevice::open(0, sim.clone(), &cfg, Arc::new(CountingFaults::default()));
    assert!(matches!(res, Err(SioError::ResourceExhausted { capacity: 0 })));
    assert!(!sim.is_armed());
}

#[test]
fn open_rejects_an_oversized_queue() {
    let sim = Arc::new(SimTransport::new());
    let cfg = SioConfig {
        queue_capacity: usize::MAX / 2,
        ..Default::default()
    };
    let res = catch_unwind(AssertUnwindSafe(|| {
        SioDevice::open(0, sim.clone(), &cfg, Arc::new(CountingFaults::default()))
    }));
    assert!(matches!(res, Ok(Err(SioError::ResourceExhausted { .. }))));
    assert!(!sim.is_armed());
}

#[test]
fn reception_failure_is_fatal() {
    let (sim, dev, faults) = open_sim();
    sim.deliver(0x11);
    let res = catch_unwind(AssertUnwindSafe(|| sim.fail_reception(TransportError::Closed)));
    assert!(res.is_err());
    assert_eq!(faults.count(), 1);
    assert_eq!(dev.pending(), 1);
}

#[test]
fn open_arms_the_first_reception() {
    let (sim, dev, _) = open_sim();
    assert!(sim.is_armed());
    assert_eq!(sim.arm_count(), 1);
    assert_eq!(dev.devnum(), 0);
    assert_eq!(dev.capacity(), 256);
}

#[test]
fn reopen_orphans_the_previous_queue() {
    let (sim, first, _) = open_sim();
    sim.deliver(0x01);

    let faults = Arc::new(CountingFaults::default());
    let second = SioDevice::open(1, sim.clone(), &SioConfig::default(), faults).unwrap();
    sim.deliver(0x02);

    assert_eq!(first.pending(), 1);
    let mut buf = [0u8; 1];
    assert_eq!(second.read(&mut buf), 1);
    assert_eq!(buf[0], 0x02);
}

#[test]
fn dropped_device_stops_receiving() {
    let sim = Arc::new(SimTransport::new());
    let dev = SioDevice::open(0, sim.clone(), &SioConfig::default(), Arc::new(CountingFaults::default())).unwrap();
    drop(dev);
    assert!(!sim.deliver(0x01));
    assert!(sim.arm_receive().is_ok());
}

#[test]
fn read_timeout_gives_up() {
    let (sim, dev, _) = open_sim();
    sim.deliver(0x01);
    let mut buf = [0u8; 2];
    let start = Instant::now();
    assert_eq!(dev.read_timeout(&mut buf, Duration::from_millis(30)), 0);
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test]
fn read_timeout_completes_when_bytes_are_queued() {
    let (sim, dev, _) = open_sim();
    sim.deliver_all(&[0x0a, 0x0b]);
    let mut buf = [0u8; 2];
    assert_eq!(dev.read_timeout(&mut buf, Duration::from_secs(1)), 2);
    assert_eq!(buf, [0x0a, 0x0b]);
}

#[test]
fn adapter_sees_only_the_port_contract() {
    fn echo_one(port: &dyn SioPort) {
        let b = port.recv();
        port.send(b.wrapping_add(1));
    }

    let (sim, dev, _) = open_sim();
    sim.deliver(0x40);
    echo_one(&dev);
    assert_eq!(sim.take_sent(), vec![0x41]);
}
