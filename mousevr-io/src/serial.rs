//! Reward/punishment peripheral on a serial line.
//!
//! The device is best effort: if it cannot be opened the session carries on
//! and every call becomes a no-op.

use crate::error::DeviceError;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::Write;
use std::time::Duration;
use tracing::{info, warn};

const REWARD: u8 = b'r';
const PUNISHMENT_ON: u8 = b'p';
const PUNISHMENT_OFF: u8 = b'0';

const WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// An open serial line, 8N1 without flow control
pub type SerialLine = Box<dyn SerialPort>;

pub struct RewardDevice<W: Write = SerialLine> {
    path: String,
    port: Option<W>,
    writes: u64,
}

impl RewardDevice<SerialLine> {
    /// Opens `path` as a raw serial line. Failure is logged once and leaves
    /// the device absent.
    pub fn open(path: &str, baud: u32) -> Self {
        match open_port(path, baud) {
            Ok(port) => {
                info!(path, baud, "reward device open");
                Self::from_writer(path, port)
            }
            Err(e) => {
                warn!("{}", e);
                Self::absent(path)
            }
        }
    }
}

impl<W: Write> RewardDevice<W> {
    pub fn absent(path: &str) -> Self {
        Self {
            path: path.to_string(),
            port: None,
            writes: 0,
        }
    }

    pub fn from_writer(path: &str, port: W) -> Self {
        Self {
            path: path.to_string(),
            port: Some(port),
            writes: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Bytes successfully written so far
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn reward(&mut self) {
        self.send(REWARD);
    }

    pub fn punishment_on(&mut self) {
        self.send(PUNISHMENT_ON);
    }

    pub fn punishment_off(&mut self) {
        self.send(PUNISHMENT_OFF);
    }

    fn send(&mut self, byte: u8) {
        let Some(port) = self.port.as_mut() else {
            return;
        };
        let result = port.write_all(&[byte]).and_then(|_| port.flush());
        match result {
            Ok(()) => self.writes += 1,
            Err(e) => warn!("{}", DeviceError::Write(e)),
        }
    }

    /// Closes the port if open; later calls are no-ops
    pub fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            let _ = port.flush();
            info!(path = %self.path, "reward device closed");
        }
    }

    pub fn into_inner(mut self) -> Option<W> {
        self.port.take()
    }
}

fn open_port(path: &str, baud: u32) -> Result<SerialLine, DeviceError> {
    serialport::new(path, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(WRITE_TIMEOUT)
        .open()
        .map_err(|source| DeviceError::Open {
            path: path.to_string(),
            source,
        })
}

impl<W: Write> Drop for RewardDevice<W> {
    fn drop(&mut self) {
        self.close();
    }
}
