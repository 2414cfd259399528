mod config;

use anyhow::{Context, Result};
use slipio_core::{HaltHandler, SerialTransport, SimTransport, SioDevice, SioPort, Transport};
use std::io::BufRead;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use config::AppConfig;

const MAX_LINE: usize = 1024;
const LOOPBACK_BACKOFF: Duration = Duration::from_millis(1);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("--list") {
        list_ports();
        return Ok(());
    }

    let path = AppConfig::default_path();
    let cfg = AppConfig::load(path.as_deref())?.apply_args(&args)?;
    let sio_cfg = cfg.sio_config();

    let sim = cfg.loopback.then(|| Arc::new(SimTransport::new()));
    let transport: Arc<dyn Transport> = match &sim {
        Some(sim) => sim.clone(),
        None => Arc::new(
            SerialTransport::open(&sio_cfg)
                .with_context(|| format!("cannot open {}", sio_cfg.port_name))?,
        ),
    };

    let dev = Arc::new(
        SioDevice::open(0, transport, &sio_cfg, Arc::new(HaltHandler))
            .context("cannot open sio device")?,
    );
    log::info!(
        "connected to {} at {} baud, ctrl-d to quit",
        if cfg.loopback { "loopback" } else { cfg.port_name.as_str() },
        cfg.baud_rate
    );

    let reader = {
        let dev = dev.clone();
        let chunk = cfg.chunk_size;
        thread::spawn(move || rx_loop(&*dev, chunk))
    };

    for line in std::io::stdin().lock().lines() {
        let mut data = line.context("reading stdin")?.into_bytes();
        data.push(b'\n');
        println!("TX: {}", hex_line(&data));
        dev.write(&data);
        if let Some(sim) = &sim {
            feed_loopback(sim, &dev, &sim.take_sent());
        }
    }

    dev.read_abort();
    reader.join().map_err(|_| anyhow::anyhow!("reader thread panicked"))?;
    Ok(())
}

/// Put `data` back on the simulated line no faster than the reader drains
/// the queue, the way a real wire is paced by its baud rate.
fn feed_loopback(sim: &SimTransport, dev: &SioDevice, data: &[u8]) {
    for &byte in data {
        while dev.pending() >= dev.capacity() {
            thread::sleep(LOOPBACK_BACKOFF);
        }
        sim.deliver(byte);
    }
}

fn rx_loop(port: &dyn SioPort, chunk: usize) {
    let mut buf = vec![0u8; chunk];
    let mut line = Vec::new();
    loop {
        if port.read(&mut buf) == 0 {
            break;
        }
        line.extend_from_slice(&buf);
        while let Some(pos) = line.iter().position(|&b| b == b'\n') {
            let rest = line.split_off(pos + 1);
            print_rx(&line);
            line = rest;
        }
        if line.len() > MAX_LINE {
            print_rx(&line);
            line.clear();
        }
    }
    if !line.is_empty() {
        print_rx(&line);
    }
    log::info!("reader stopped");
}

fn print_rx(data: &[u8]) {
    println!("RX: {}| {}", hex_line(data), String::from_utf8_lossy(data).trim_end());
}

fn hex_line(data: &[u8]) -> String {
    let hex = hex::encode_upper(data);
    let mut out = String::with_capacity(hex.len() * 3 / 2);
    for pair in hex.as_bytes().chunks(2) {
        out.push_str(std::str::from_utf8(pair).unwrap_or("??"));
        out.push(' ');
    }
    out
}

fn list_ports() {
    for p in SerialTransport::list_ports() {
        match (p.vid, p.pid) {
            (Some(vid), Some(pid)) => println!("{} ({:04X}:{:04X}) {}", p.port_name, vid, pid, p.port_type),
            _ => println!("{} {}", p.port_name, p.port_type),
        }
    }
}
