//! Logical-to-physical LED index mapping.
//!
//! A tile's LEDs sit on one data line in an order that has nothing to do with
//! their (row, column) position. A [`WireOrderTable`] stores, for every logical
//! cell, the physical slot that LED occupies on the line. Tables are built once
//! per tile, verified to be a bijection over `[0, N²)`, and shared read-only by
//! every frame after that.
//!
//! New tile geometries are added as [`WiringScheme`] variants; the encoder and
//! transport never look at the scheme itself.

use serde::{Deserialize, Serialize};

use crate::{Result, WallError};

/// Side length of a ContourWall tile.
pub const CONTOUR_WALL_TILE_SIZE: usize = 20;

/// Largest supported side length; keeps `N²` within `u16` LED addresses.
pub const MAX_TILE_SIZE: usize = 255;

// The ContourWall tile is built from vertical 5-wide strips. Every band of
// five rows occupies its own block of 100 slots; stepping one column to the
// right moves five slots down the line.
const BAND_HEIGHT: usize = 5;
const BAND_SLOTS: usize = 100;
const COLUMN_STRIDE: usize = 5;

/// Strategy for deriving the physical slot of a logical cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WiringScheme {
    /// Banded 5-wide strips of the 20x20 ContourWall tile.
    #[default]
    ContourWall,
    /// Slot equals `row * N + col`.
    RowMajor,
    /// Even columns run top-to-bottom, odd columns bottom-to-top.
    SerpentineColumnMajor,
}

impl WiringScheme {
    fn slot(self, size: usize, row: usize, col: usize) -> usize {
        match self {
            WiringScheme::ContourWall => {
                let band = row / BAND_HEIGHT;
                band * BAND_SLOTS + row % BAND_HEIGHT + col * COLUMN_STRIDE
            }
            WiringScheme::RowMajor => row * size + col,
            WiringScheme::SerpentineColumnMajor => {
                if col % 2 == 0 {
                    col * size + row
                } else {
                    col * size + (size - 1 - row)
                }
            }
        }
    }

    fn supports(self, size: usize) -> bool {
        match self {
            WiringScheme::ContourWall => size == CONTOUR_WALL_TILE_SIZE,
            WiringScheme::RowMajor | WiringScheme::SerpentineColumnMajor => {
                (1..=MAX_TILE_SIZE).contains(&size)
            }
        }
    }
}

/// Verified mapping from logical `(row, col)` to physical slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireOrderTable {
    size: usize,
    scheme: WiringScheme,
    /// Physical slot per logical cell, row-major.
    slots: Vec<usize>,
    /// Logical cell (row-major index) per physical slot.
    cells: Vec<usize>,
}

impl WireOrderTable {
    /// Build and verify the table for an `size x size` tile.
    ///
    /// Fails with [`WallError::Configuration`] when the scheme does not support
    /// `size` or the resulting mapping is not a bijection.
    pub fn new(scheme: WiringScheme, size: usize) -> Result<Self> {
        if !scheme.supports(size) {
            return Err(WallError::configuration(format!(
                "wiring scheme {:?} does not support {}x{} tiles",
                scheme, size, size
            )));
        }

        let leds = size.checked_mul(size).ok_or_else(|| {
            WallError::configuration(format!("{}x{} tile overflows the LED count", size, size))
        })?;
        let mut slots = Vec::with_capacity(leds);
        let mut cells = vec![usize::MAX; leds];

        for row in 0..size {
            for col in 0..size {
                let slot = scheme.slot(size, row, col);
                if slot >= leds {
                    return Err(WallError::configuration(format!(
                        "cell ({}, {}) maps to slot {} outside [0, {})",
                        row, col, slot, leds
                    )));
                }
                if cells[slot] != usize::MAX {
                    let other = cells[slot];
                    return Err(WallError::configuration(format!(
                        "cells ({}, {}) and ({}, {}) both map to slot {}",
                        other / size,
                        other % size,
                        row,
                        col,
                        slot
                    )));
                }
                cells[slot] = row * size + col;
                slots.push(slot);
            }
        }

        Ok(Self { size, scheme, slots, cells })
    }

    /// The table of a standard 20x20 ContourWall tile.
    pub fn contour_wall() -> Result<Self> {
        Self::new(WiringScheme::ContourWall, CONTOUR_WALL_TILE_SIZE)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn scheme(&self) -> WiringScheme {
        self.scheme
    }

    /// Number of LEDs on the tile.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Physical slot of a logical cell, `None` when outside the tile.
    pub fn slot(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.size && col < self.size {
            Some(self.slots[row * self.size + col])
        } else {
            None
        }
    }

    /// Logical `(row, col)` of a physical slot.
    pub fn cell(&self, slot: usize) -> Option<(usize, usize)> {
        self.cells.get(slot).map(|&cell| (cell / self.size, cell % self.size))
    }

    /// Physical slots in logical row-major order.
    pub fn slots(&self) -> &[usize] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn contour_wall_known_slots() {
        let table = WireOrderTable::contour_wall().unwrap();

        assert_eq!(table.slot(0, 0), Some(0));
        assert_eq!(table.slot(0, 1), Some(5));
        assert_eq!(table.slot(4, 0), Some(4));
        assert_eq!(table.slot(5, 0), Some(100));
        assert_eq!(table.slot(10, 19), Some(295));
        assert_eq!(table.slot(19, 0), Some(304));
        assert_eq!(table.slot(19, 19), Some(399));
        assert_eq!(table.slot(20, 0), None);
    }

    #[test]
    fn contour_wall_bands_are_contiguous() {
        let table = WireOrderTable::contour_wall().unwrap();
        for band in 0..4 {
            let mut slots: Vec<usize> = (band * 5..band * 5 + 5)
                .flat_map(|row| (0..20).map(move |col| (row, col)))
                .map(|(row, col)| table.slot(row, col).unwrap())
                .collect();
            slots.sort_unstable();
            let expected: Vec<usize> = (band * 100..band * 100 + 100).collect();
            assert_eq!(slots, expected, "band {band} must own one block of 100 slots");
        }
    }

    #[test]
    fn contour_wall_rejects_other_sizes() {
        for size in [0, 1, 5, 10, 19, 21, 25, 40] {
            let err = WireOrderTable::new(WiringScheme::ContourWall, size).unwrap_err();
            assert!(matches!(err, WallError::Configuration { .. }), "size {size}");
        }
    }

    #[test]
    fn oversized_tiles_are_rejected() {
        for size in [MAX_TILE_SIZE + 1, 1 << 20, usize::MAX] {
            for scheme in [WiringScheme::RowMajor, WiringScheme::SerpentineColumnMajor] {
                let err = WireOrderTable::new(scheme, size).unwrap_err();
                assert!(matches!(err, WallError::Configuration { .. }), "{scheme:?} {size}");
            }
        }
        assert_eq!(WireOrderTable::new(WiringScheme::RowMajor, MAX_TILE_SIZE).unwrap().len(), 65025);
    }

    #[test]
    fn serpentine_reverses_odd_columns() {
        let table = WireOrderTable::new(WiringScheme::SerpentineColumnMajor, 4).unwrap();
        assert_eq!(table.slot(0, 0), Some(0));
        assert_eq!(table.slot(3, 0), Some(3));
        assert_eq!(table.slot(3, 1), Some(4));
        assert_eq!(table.slot(0, 1), Some(7));
    }

    fn assert_bijective(table: &WireOrderTable) {
        let leds = table.size() * table.size();
        let mut seen = vec![false; leds];
        for row in 0..table.size() {
            for col in 0..table.size() {
                let slot = table.slot(row, col).unwrap();
                assert!(slot < leds);
                assert!(!seen[slot], "slot {slot} used twice");
                seen[slot] = true;
                assert_eq!(table.cell(slot), Some((row, col)));
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn contour_wall_is_bijective() {
        assert_bijective(&WireOrderTable::contour_wall().unwrap());
    }

    proptest! {
        #[test]
        fn generic_schemes_are_bijective(
            size in 1usize..40,
            scheme in prop::sample::select(vec![
                WiringScheme::RowMajor,
                WiringScheme::SerpentineColumnMajor,
            ]),
        ) {
            let table = WireOrderTable::new(scheme, size).unwrap();
            prop_assert_eq!(table.len(), size * size);
            assert_bijective(&table);
        }
    }
}
