//! Async driver for modular serial LED walls.
//!
//! A ContourWall is built from square LED tiles, each behind its own serial
//! link. This crate turns logical pixel grids into the byte frames a tile's
//! firmware expects and pushes them out at a bounded frame rate.
//!
//! # Features
//!
//! - **Wiring tables**: logical `(row, col)` to physical LED slot, verified
//!   bijective before any frame is sent
//! - **Frame encoding**: channel order, brightness and trailing checksum per
//!   protocol version
//! - **Pacing**: per-tile minimum frame interval, tiles paced independently
//! - **Walls**: up to six tiles driven as one canvas, failures isolated per tile
//! - **Emulation**: an in-memory transport for development without hardware
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use contourwall::{ContourWall, PixelGrid, Rgb, WallConfig};
//!
//! #[tokio::main]
//! async fn main() -> contourwall::Result<()> {
//!     let config = WallConfig::load("contourwall.yaml")?;
//!     let mut wall = ContourWall::wall(&config)?;
//!
//!     let (rows, cols) = wall.canvas_dims();
//!     wall.set_pixels(&PixelGrid::filled(rows, cols, Rgb::BLUE))?;
//!
//!     let report = wall.show().await;
//!     for (tile, error) in report.failures() {
//!         eprintln!("tile {tile}: {error}");
//!     }
//!     Ok(())
//! }
//! ```

mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

pub mod config;
pub mod driver;
pub mod encoder;
pub mod logging;
pub mod tile;
pub mod transport;
pub mod wall;
pub mod wiring;

pub use error::*;
pub use types::*;

pub use config::{TileConfig, TileSettings, WallConfig};
pub use driver::{DriverStats, WallDriver, WallDriverHandle};
pub use encoder::FrameEncoder;
pub use logging::init_logging;
pub use tile::{ShowOutcome, TileDriver, TileState};
pub use transport::{EmulatorHandle, EmulatorTransport, Transport};
pub use wall::{WallComposer, WallLayout, WallReport};
pub use wiring::{WireOrderTable, WiringScheme};

use std::sync::Arc;

/// Entry point for building tile and wall drivers.
///
/// # Examples
///
/// ## Single hardware tile
/// ```rust,no_run
/// use contourwall::{ContourWall, TileConfig};
///
/// # fn main() -> contourwall::Result<()> {
/// let tile = ContourWall::tile(&TileConfig::new("/dev/ttyACM0"))?;
/// # Ok(())
/// # }
/// ```
///
/// ## Emulated wall
/// ```rust
/// use contourwall::{ContourWall, TileSettings, WallLayout};
///
/// # fn main() -> contourwall::Result<()> {
/// let (wall, emulators) = ContourWall::emulated_wall(WallLayout::FULL, &TileSettings::default())?;
/// assert_eq!(wall.canvas_dims(), (40, 60));
/// assert_eq!(emulators.len(), 6);
/// # Ok(())
/// # }
/// ```
pub struct ContourWall;

impl ContourWall {
    /// Open a single tile on a serial port.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The settings are invalid or the wiring scheme does not fit the size
    /// - The port does not exist or cannot be opened
    #[cfg(feature = "serial")]
    pub fn tile(config: &TileConfig) -> Result<TileDriver> {
        config.settings.validate()?;
        let table = Arc::new(WireOrderTable::new(config.settings.wiring, config.settings.size)?);
        let transport =
            transport::SerialTransport::open(&config.port, config.settings.baud_rate)?;
        TileDriver::with_table(Box::new(transport), table, &config.settings)
    }

    /// Open every tile of a wall.
    ///
    /// All ports are checked before the first one is opened, so a missing
    /// port fails the whole wall without touching the others.
    #[cfg(feature = "serial")]
    pub fn wall(config: &WallConfig) -> Result<WallComposer> {
        config.validate()?;
        for port in &config.ports {
            transport::ensure_port_exists(port)?;
        }

        let table = Arc::new(WireOrderTable::new(config.tile.wiring, config.tile.size)?);
        let mut tiles = Vec::with_capacity(config.ports.len());
        for port in &config.ports {
            let transport = transport::SerialTransport::open(port, config.tile.baud_rate)?;
            tiles.push(TileDriver::with_table(Box::new(transport), Arc::clone(&table), &config.tile)?);
        }

        tracing::info!(
            rows = config.layout.rows,
            cols = config.layout.cols,
            "Opened wall of {} tiles",
            tiles.len()
        );
        WallComposer::new(config.layout, tiles)
    }

    /// A tile backed by an in-memory emulator instead of a serial port.
    pub fn emulated_tile(settings: &TileSettings) -> Result<(TileDriver, EmulatorHandle)> {
        let (transport, handle) = EmulatorTransport::new("emulator");
        let tile = TileDriver::new(Box::new(transport), settings)?;
        Ok((tile, handle))
    }

    /// A wall of emulated tiles; handles are returned in wall order.
    pub fn emulated_wall(
        layout: WallLayout,
        settings: &TileSettings,
    ) -> Result<(WallComposer, Vec<EmulatorHandle>)> {
        settings.validate()?;
        let table = Arc::new(WireOrderTable::new(settings.wiring, settings.size)?);

        let mut tiles = Vec::with_capacity(layout.tile_count());
        let mut handles = Vec::with_capacity(layout.tile_count());
        for index in 0..layout.tile_count() {
            let (transport, handle) = EmulatorTransport::new(format!("emulator-{index}"));
            tiles.push(TileDriver::with_table(Box::new(transport), Arc::clone(&table), settings)?);
            handles.push(handle);
        }

        let wall = WallComposer::new(layout, tiles)?;
        Ok((wall, handles))
    }
}
