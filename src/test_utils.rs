//! Test utilities for building emulated tiles and walls
//!
//! Shared by unit tests and benchmarks so every test drives the same
//! emulator-backed setup the public API would produce.

#![cfg(any(test, feature = "benchmark"))]

use crate::config::TileSettings;
use crate::transport::{EmulatorHandle, EmulatorTransport};
use crate::types::{PixelGrid, Rgb};
use crate::wall::{WallComposer, WallLayout};
use crate::{ContourWall, TileDriver};

/// A tile backed by an emulator, panicking on invalid settings.
pub fn emulated_tile(settings: &TileSettings) -> (TileDriver, EmulatorHandle) {
    ContourWall::emulated_tile(settings).expect("Emulated tile settings should be valid")
}

/// A wall of emulated tiles, one handle per tile in wall order.
pub fn emulated_wall(
    layout: WallLayout,
    settings: &TileSettings,
) -> (WallComposer, Vec<EmulatorHandle>) {
    ContourWall::emulated_wall(layout, settings).expect("Emulated wall settings should be valid")
}

/// A bare emulator transport, boxed for a tile driver.
pub fn boxed_emulator(name: &str) -> (Box<dyn crate::transport::Transport>, EmulatorHandle) {
    let (transport, handle) = EmulatorTransport::new(name);
    (Box::new(transport), handle)
}

/// A grid where every cell has a distinct, position-derived color.
pub fn gradient_grid(rows: usize, cols: usize) -> PixelGrid {
    let mut grid = PixelGrid::new(rows, cols);
    for row in 0..rows {
        for col in 0..cols {
            let color = Rgb::new(row as u8, col as u8, (row * cols + col) as u8);
            grid.set(row, col, color).expect("gradient cell inside grid");
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_cells_are_distinct() {
        let grid = gradient_grid(20, 20);
        let mut colors: Vec<Rgb> = grid.as_slice().to_vec();
        colors.sort_by_key(|c| (c.r, c.g, c.b));
        colors.dedup();
        assert_eq!(colors.len(), 400);
    }

    #[test]
    fn emulated_wall_has_one_handle_per_tile() {
        let (wall, handles) = emulated_wall(WallLayout::new(2, 3), &TileSettings::default());
        assert_eq!(wall.tiles().len(), 6);
        assert_eq!(handles.len(), 6);
    }
}
