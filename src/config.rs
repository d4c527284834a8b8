//! Tile and wall configuration.
//!
//! Configuration is plain serde data, loadable from YAML:
//!
//! ```yaml
//! layout: { rows: 2, cols: 3 }
//! ports: [COM3, COM4, COM5, COM6, COM7, COM8]
//! tile:
//!   baud_rate: 2000000
//!   frame_time_ms: 33
//!   protocol: v2
//!   brightness: 0.8
//! ```
//!
//! Ports are listed row-major: port `i` drives the tile at layout cell
//! `(i / cols, i % cols)`.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::ProtocolVersion;
use crate::wall::WallLayout;
use crate::wiring::{CONTOUR_WALL_TILE_SIZE, MAX_TILE_SIZE, WiringScheme};
use crate::{Result, WallError};

pub const DEFAULT_BAUD_RATE: u32 = 2_000_000;
pub const DEFAULT_FRAME_TIME_MS: u64 = 33;
pub const MAX_TILES: usize = 6;

/// Settings shared by every identically-wired tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSettings {
    /// Side length of the tile in LEDs.
    pub size: usize,
    pub wiring: WiringScheme,
    pub protocol: ProtocolVersion,
    pub baud_rate: u32,
    /// Minimum interval between two frames on one tile.
    pub frame_time_ms: u64,
    /// Sleep the full frame time before every frame.
    pub force_frame_time: bool,
    /// Channel scaling factor in `[0, 1]`.
    pub brightness: Option<f32>,
    /// Do not retransmit a frame identical to the last one sent.
    pub skip_unchanged: bool,
}

impl Default for TileSettings {
    fn default() -> Self {
        Self {
            size: CONTOUR_WALL_TILE_SIZE,
            wiring: WiringScheme::ContourWall,
            protocol: ProtocolVersion::default(),
            baud_rate: DEFAULT_BAUD_RATE,
            frame_time_ms: DEFAULT_FRAME_TIME_MS,
            force_frame_time: false,
            brightness: None,
            skip_unchanged: false,
        }
    }
}

impl TileSettings {
    pub fn frame_time(&self) -> Duration {
        Duration::from_millis(self.frame_time_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 || self.size > MAX_TILE_SIZE {
            return Err(WallError::configuration(format!(
                "tile size must be in 1..={}, got {}",
                MAX_TILE_SIZE, self.size
            )));
        }
        if self.frame_time_ms == 0 {
            return Err(WallError::configuration("frame_time_ms must be positive"));
        }
        if self.baud_rate == 0 {
            return Err(WallError::configuration("baud_rate must be positive"));
        }
        if self.brightness.is_some_and(f32::is_nan) {
            return Err(WallError::configuration("brightness must be a number in [0, 1]"));
        }
        Ok(())
    }
}

/// One tile on one serial port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileConfig {
    pub port: String,
    #[serde(flatten)]
    pub settings: TileSettings,
}

impl TileConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self { port: port.into(), settings: TileSettings::default() }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| WallError::config_error("tile configuration", e))?;
        config.settings.validate()?;
        Ok(config)
    }
}

/// A wall of tiles arranged in a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallConfig {
    pub layout: WallLayout,
    /// One port per tile, row-major over the layout.
    pub ports: Vec<String>,
    #[serde(default)]
    pub tile: TileSettings,
}

impl WallConfig {
    pub fn new(layout: WallLayout, ports: Vec<String>) -> Self {
        Self { layout, ports, tile: TileSettings::default() }
    }

    pub fn validate(&self) -> Result<()> {
        self.tile.validate()?;

        let tiles = self.ports.len();
        if tiles == 0 || tiles > MAX_TILES {
            return Err(WallError::configuration(format!(
                "a wall holds 1 to {} tiles, got {}",
                MAX_TILES, tiles
            )));
        }
        if self.layout.tile_count() != tiles {
            return Err(WallError::configuration(format!(
                "layout {}x{} needs {} ports, got {}",
                self.layout.rows,
                self.layout.cols,
                self.layout.tile_count(),
                tiles
            )));
        }

        let mut seen = HashSet::new();
        for port in &self.ports {
            if !seen.insert(port.as_str()) {
                return Err(WallError::configuration(format!(
                    "port '{}' is assigned to more than one tile",
                    port
                )));
            }
        }
        Ok(())
    }

    /// Per-tile configs in wall order.
    pub fn tile_configs(&self) -> Vec<TileConfig> {
        self.ports
            .iter()
            .map(|port| TileConfig { port: port.clone(), settings: self.tile.clone() })
            .collect()
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| WallError::config_error("wall configuration", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading wall configuration from {}", path.display());
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| WallError::config_error(path.display().to_string(), e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml_ng::to_string(self).map_err(|e| WallError::config_error("wall configuration", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_hardware() {
        let settings = TileSettings::default();
        assert_eq!(settings.size, 20);
        assert_eq!(settings.baud_rate, 2_000_000);
        assert_eq!(settings.frame_time(), Duration::from_millis(33));
        assert_eq!(settings.protocol, ProtocolVersion::V2);
        assert!(!settings.skip_unchanged);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn full_wall_from_yaml() {
        let yaml = r#"
layout: { rows: 2, cols: 3 }
ports: [COM3, COM4, COM5, COM6, COM7, COM8]
tile:
  baud_rate: 921600
  protocol: v1
  brightness: 0.5
"#;
        let config = WallConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.layout, WallLayout::new(2, 3));
        assert_eq!(config.tile.baud_rate, 921_600);
        assert_eq!(config.tile.protocol, ProtocolVersion::V1);
        assert_eq!(config.tile.brightness, Some(0.5));
        assert_eq!(config.tile.frame_time_ms, DEFAULT_FRAME_TIME_MS);

        let tiles = config.tile_configs();
        assert_eq!(tiles.len(), 6);
        assert_eq!(tiles[5].port, "COM8");
        assert_eq!(tiles[5].settings, config.tile);
    }

    #[test]
    fn single_tile_from_yaml() {
        let config = TileConfig::from_yaml_str("port: /dev/ttyUSB0\nframe_time_ms: 50\n").unwrap();
        assert_eq!(config.port, "/dev/ttyUSB0");
        assert_eq!(config.settings.frame_time_ms, 50);
        assert_eq!(config.settings.size, 20);
    }

    #[test]
    fn layout_must_match_ports() {
        let config = WallConfig::new(WallLayout::new(2, 3), vec!["COM3".into(), "COM4".into()]);
        assert!(matches!(config.validate(), Err(WallError::Configuration { .. })));
    }

    #[test]
    fn duplicate_ports_are_rejected() {
        let config = WallConfig::new(WallLayout::new(1, 2), vec!["COM3".into(), "COM3".into()]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("COM3"));
    }

    #[test]
    fn too_many_tiles_are_rejected() {
        let ports = (0..8).map(|i| format!("COM{i}")).collect();
        let config = WallConfig::new(WallLayout::new(2, 4), ports);
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_frame_time_is_rejected() {
        let yaml = "layout: { rows: 1, cols: 1 }\nports: [COM3]\ntile:\n  frame_time_ms: 0\n";
        assert!(matches!(WallConfig::from_yaml_str(yaml), Err(WallError::Configuration { .. })));
    }

    #[test]
    fn oversized_tile_is_rejected() {
        let yaml = "port: COM3\nwiring: row_major\nsize: 100000\n";
        assert!(matches!(TileConfig::from_yaml_str(yaml), Err(WallError::Configuration { .. })));

        let settings = TileSettings { size: MAX_TILE_SIZE + 1, ..TileSettings::default() };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        assert!(matches!(WallConfig::from_yaml_str("layout: ["), Err(WallError::Config { .. })));
    }

    #[test]
    fn yaml_round_trip() {
        let config = WallConfig::new(WallLayout::new(1, 1), vec!["COM3".into()]);
        let yaml = config.to_yaml_string().unwrap();
        assert_eq!(WallConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = WallConfig::load("/nonexistent/contourwall.yaml").unwrap_err();
        assert!(matches!(err, WallError::Config { .. }));
    }
}
