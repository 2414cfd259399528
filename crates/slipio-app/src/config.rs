use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use slipio_core::{SioConfig, DEFAULT_QUEUE_CAPACITY};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub queue_capacity: usize,
    /// Bytes per blocking read.
    pub chunk_size: usize,
    pub loopback: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: 115_200,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            chunk_size: 1,
            loopback: false,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("slipio").join("config.json"))
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cfg = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        Ok(cfg)
    }

    /// `[--loopback | <port>] [baud]` overrides the file.
    pub fn apply_args(mut self, args: &[String]) -> Result<Self> {
        let mut rest = args.iter();
        if let Some(first) = rest.next() {
            if first == "--loopback" {
                self.loopback = true;
            } else {
                self.port_name = first.clone();
            }
        }
        if let Some(baud) = rest.next() {
            self.baud_rate = baud
                .parse()
                .with_context(|| format!("invalid baud rate '{baud}'"))?;
        }
        if self.chunk_size == 0 {
            bail!("chunk_size must be at least 1");
        }
        if !self.loopback && self.port_name.is_empty() {
            bail!("no serial port given; pass <port> or --loopback");
        }
        Ok(self)
    }

    pub fn sio_config(&self) -> SioConfig {
        SioConfig {
            queue_capacity: self.queue_capacity,
            ..SioConfig::for_port(self.port_name.clone(), self.baud_rate)
        }
    }
}
