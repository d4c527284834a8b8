//! Error types for LED wall operations.
//!
//! Every error in this crate is surfaced to the caller. Nothing is retried
//! internally: the tile protocol is open-loop, so a frame that is written twice
//! cannot be told apart from a duplicate by the receiving firmware.
//!
//! ## Error Categories
//!
//! - **Configuration Errors**: invalid grid size, non-bijective wiring, bad layout
//! - **Port Errors**: the configured serial port does not exist or cannot be opened
//! - **Transport Errors**: a write to an already open tile failed
//! - **Dimension Errors**: a pixel grid of the wrong shape was supplied
//!
//! ## Example
//!
//! ```rust
//! use contourwall::WallError;
//!
//! let error = WallError::dimension_mismatch((20, 20), (20, 19));
//! assert!(!error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use thiserror::Error;

/// Result type alias for wall operations.
pub type Result<T, E = WallError> = std::result::Result<T, E>;

/// Main error type for wall operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WallError {
    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    #[error("Serial port '{port}' not found (available: {available:?})")]
    PortNotFound { port: String, available: Vec<String> },

    #[error("Failed to open serial port '{port}'")]
    PortOpen {
        port: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Write to tile {tile} on '{port}' failed")]
    TransportWrite {
        tile: usize,
        port: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Pixel grid is {found_rows}x{found_cols}, expected {expected_rows}x{expected_cols}"
    )]
    DimensionMismatch {
        expected_rows: usize,
        expected_cols: usize,
        found_rows: usize,
        found_cols: usize,
    },

    #[error("Pixel ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds { row: usize, col: usize, rows: usize, cols: usize },

    #[error("Buffer holds {found} bytes, expected {expected}")]
    BufferLength { expected: usize, found: usize },

    #[error("Malformed frame: {details}")]
    Frame { details: String },

    #[error("Tile {tile} has failed and must be reconstructed")]
    TileFailed { tile: usize },

    #[error("Config error in {context}")]
    Config {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Render driver stopped: {reason}")]
    DriverStopped { reason: String },
}

impl WallError {
    /// Returns whether this error is potentially recoverable through retry.
    ///
    /// Always `false`: a lost or duplicated frame cannot be detected by the
    /// peer, so callers must reconstruct the tile instead.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Returns whether this error leaves the affected tile unusable.
    pub fn is_fatal_for_tile(&self) -> bool {
        matches!(
            self,
            WallError::TransportWrite { .. }
                | WallError::TileFailed { .. }
                | WallError::PortNotFound { .. }
                | WallError::PortOpen { .. }
        )
    }

    /// The wall position of the tile this error belongs to, if any.
    pub fn tile(&self) -> Option<usize> {
        match self {
            WallError::TransportWrite { tile, .. } | WallError::TileFailed { tile } => Some(*tile),
            _ => None,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            WallError::Configuration { .. } => vec![
                "Check the tile size matches the wiring scheme",
                "Verify the layout covers exactly one tile per port",
                "Keep brightness between 0.0 and 1.0",
            ],
            WallError::PortNotFound { .. } => vec![
                "Check the tile is plugged in and powered",
                "Verify the port name (COM3, /dev/ttyUSB0, ...)",
                "Reconstruct the tile once the device is present",
            ],
            WallError::PortOpen { .. } => vec![
                "Check no other program holds the port",
                "Verify permissions on the serial device",
            ],
            WallError::TransportWrite { .. } => vec![
                "Check the USB cable of the reported tile",
                "Reconstruct the tile driver after reconnecting",
            ],
            WallError::DimensionMismatch { .. } | WallError::OutOfBounds { .. } => vec![
                "Match the grid size to the tile or canvas dimensions",
                "Query canvas_dims() before building frames",
            ],
            WallError::BufferLength { .. } | WallError::Frame { .. } => vec![
                "Supply three bytes per pixel in row-major order",
                "Check the protocol version matches the firmware",
            ],
            WallError::TileFailed { .. } => vec![
                "Reconstruct the tile driver",
                "Drive the remaining tiles in the meantime",
            ],
            WallError::Config { .. } => vec![
                "Check the configuration file exists and is readable",
                "Validate the YAML syntax and field names",
            ],
            WallError::DriverStopped { .. } => vec![
                "Inspect the logs for the render task failure",
                "Spawn a new driver with a fresh wall",
            ],
        }
    }

    /// Helper constructor for configuration errors.
    pub fn configuration(reason: impl Into<String>) -> Self {
        WallError::Configuration { reason: reason.into() }
    }

    /// Helper constructor for missing serial ports.
    pub fn port_not_found(port: impl Into<String>, available: Vec<String>) -> Self {
        WallError::PortNotFound { port: port.into(), available }
    }

    /// Helper constructor for failed tile writes.
    pub fn transport_write(tile: usize, port: impl Into<String>, source: std::io::Error) -> Self {
        WallError::TransportWrite { tile, port: port.into(), source }
    }

    /// Helper constructor for grid shape errors, `(rows, cols)` each.
    pub fn dimension_mismatch(expected: (usize, usize), found: (usize, usize)) -> Self {
        WallError::DimensionMismatch {
            expected_rows: expected.0,
            expected_cols: expected.1,
            found_rows: found.0,
            found_cols: found.1,
        }
    }

    /// Helper constructor for config loading errors.
    pub fn config_error(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        WallError::Config { context: context.into(), source: Box::new(source) }
    }
}
