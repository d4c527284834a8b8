//! Byte transports to tile firmware.
//!
//! The protocol is write-only: a [`Transport`] only ever pushes complete
//! frames. [`PacedTransport`] wraps any transport and enforces the minimum
//! frame time the firmware needs between two frames.

mod emulator;
mod paced;
#[cfg(feature = "serial")]
mod serial;

pub use emulator::{DEFAULT_HISTORY, EmulatorHandle, EmulatorTransport};
pub use paced::PacedTransport;
#[cfg(feature = "serial")]
pub use serial::{SerialTransport, available_ports, ensure_port_exists};

/// A write-only link to one tile.
///
/// Implementations write the whole frame in one operation. There is no
/// acknowledgment, so any error is final for the frame and for the tile.
#[async_trait::async_trait]
pub trait Transport: Send + 'static {
    /// Write one complete frame.
    async fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()>;

    /// Human readable endpoint name (port identifier) used in logs and errors.
    fn describe(&self) -> &str;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()> {
        (**self).write_frame(frame).await
    }

    fn describe(&self) -> &str {
        (**self).describe()
    }
}
