//! Serial port transport for hardware tiles

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{info, warn};

use super::Transport;
use crate::{Result, WallError};

/// A write stalled for this long means the peer is hung; the write fails.
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Names of the serial ports the platform currently enumerates.
///
/// Enumeration failures are logged and yield an empty list.
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|port| port.port_name).collect(),
        Err(e) => {
            warn!("Failed to enumerate serial ports: {}", e);
            Vec::new()
        }
    }
}

/// Fail with [`WallError::PortNotFound`] unless `port` exists right now.
///
/// On Unix a device node that exists but is not enumerated (pseudo
/// terminals, udev-less systems) also counts as present.
pub fn ensure_port_exists(port: &str) -> Result<()> {
    let available = available_ports();
    if available.iter().any(|name| name == port) {
        return Ok(());
    }

    #[cfg(unix)]
    {
        if std::path::Path::new(port).exists() {
            return Ok(());
        }
    }

    Err(WallError::port_not_found(port, available))
}

/// Serial link to one tile.
pub struct SerialTransport {
    name: String,
    baud_rate: u32,
    // Shared with the blocking write so a cancelled write keeps the port.
    port: Arc<Mutex<Box<dyn SerialPort>>>,
}

impl SerialTransport {
    /// Open `port` at `baud_rate`, 8N1 without flow control.
    pub fn open(port: &str, baud_rate: u32) -> Result<Self> {
        ensure_port_exists(port)?;

        let serial = serialport::new(port, baud_rate)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|e| WallError::PortOpen { port: port.to_string(), source: Box::new(e) })?;

        info!(port, baud_rate, "Opened serial tile");

        Ok(Self { name: port.to_string(), baud_rate, port: Arc::new(Mutex::new(serial)) })
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

#[async_trait::async_trait]
impl Transport for SerialTransport {
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        let port = Arc::clone(&self.port);
        let frame = frame.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut port = port.lock().unwrap_or_else(PoisonError::into_inner);
            port.write_all(&frame).and_then(|()| port.flush())
        })
        .await
        .map_err(io::Error::other)?
    }

    fn describe(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_port_is_reported() {
        let err = ensure_port_exists("/dev/ttyCONTOURWALL_MISSING").unwrap_err();
        match err {
            WallError::PortNotFound { port, .. } => assert_eq!(port, "/dev/ttyCONTOURWALL_MISSING"),
            other => panic!("expected PortNotFound, got {other:?}"),
        }
    }

    #[test]
    fn open_checks_existence_first() {
        let result = SerialTransport::open("/dev/ttyCONTOURWALL_MISSING", 2_000_000);
        assert!(matches!(result, Err(WallError::PortNotFound { .. })));
    }
}
