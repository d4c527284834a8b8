//! Multi-tile wall composition.
//!
//! A [`WallComposer`] owns one [`TileDriver`] per tile and maps a composite
//! canvas onto them. Tiles are placed row-major on a [`WallLayout`]: tile `i`
//! covers canvas rows `(i / cols) * N ..` and columns `(i % cols) * N ..`.
//!
//! `show()` runs every tile's send concurrently inside the caller's task and
//! returns once all of them finished. Each tile keeps its own pacing clock, and
//! a failing tile is reported in the [`WallReport`] without stopping the others.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::config::MAX_TILES;
use crate::tile::{ShowOutcome, TileDriver, TileState};
use crate::types::{PixelGrid, Rgb};
use crate::{Result, WallError};

/// Arrangement of tiles on the wall, in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallLayout {
    pub rows: usize,
    pub cols: usize,
}

impl WallLayout {
    /// One tile.
    pub const SINGLE: WallLayout = WallLayout::new(1, 1);
    /// The full six-tile ContourWall, two rows of three.
    pub const FULL: WallLayout = WallLayout::new(2, 3);

    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn tile_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Layout cell `(row, col)` of tile `index`.
    pub fn tile_position(&self, index: usize) -> Option<(usize, usize)> {
        if index < self.tile_count() { Some((index / self.cols, index % self.cols)) } else { None }
    }

    /// Canvas dimensions `(rows, cols)` for tiles of side `tile_size`.
    pub fn canvas_dims(&self, tile_size: usize) -> (usize, usize) {
        (self.rows * tile_size, self.cols * tile_size)
    }

    /// Map a canvas pixel to `(tile index, local row, local col)`.
    pub fn locate(&self, tile_size: usize, row: usize, col: usize) -> Option<(usize, usize, usize)> {
        let (rows, cols) = self.canvas_dims(tile_size);
        if tile_size == 0 || row >= rows || col >= cols {
            return None;
        }
        let index = (row / tile_size) * self.cols + col / tile_size;
        Some((index, row % tile_size, col % tile_size))
    }
}

/// Per-tile results of one wall `show()`.
#[derive(Debug)]
pub struct WallReport {
    outcomes: Vec<Result<ShowOutcome>>,
}

impl WallReport {
    /// Outcome per tile, in wall order.
    pub fn outcomes(&self) -> &[Result<ShowOutcome>] {
        &self.outcomes
    }

    pub fn outcome(&self, tile: usize) -> Option<&Result<ShowOutcome>> {
        self.outcomes.get(tile)
    }

    /// Every tile either sent its frame or skipped an unchanged one.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(Result::is_ok)
    }

    /// `(tile index, error)` for every failed tile.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &WallError)> + '_ {
        self.outcomes.iter().enumerate().filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e)))
    }

    pub fn sent_count(&self) -> usize {
        self.outcomes.iter().filter(|r| matches!(r, Ok(ShowOutcome::Sent { .. }))).count()
    }

    pub fn into_outcomes(self) -> Vec<Result<ShowOutcome>> {
        self.outcomes
    }
}

/// Drives a wall of identically-wired tiles as one canvas.
#[derive(Debug)]
pub struct WallComposer {
    layout: WallLayout,
    tile_size: usize,
    tiles: Vec<TileDriver>,
}

impl WallComposer {
    /// Assemble a wall from tiles given in row-major layout order.
    pub fn new(layout: WallLayout, mut tiles: Vec<TileDriver>) -> Result<Self> {
        if tiles.is_empty() || tiles.len() > MAX_TILES {
            return Err(WallError::configuration(format!(
                "a wall holds 1 to {} tiles, got {}",
                MAX_TILES,
                tiles.len()
            )));
        }
        if layout.tile_count() != tiles.len() {
            return Err(WallError::configuration(format!(
                "layout {}x{} needs {} tiles, got {}",
                layout.rows,
                layout.cols,
                layout.tile_count(),
                tiles.len()
            )));
        }

        let tile_size = tiles[0].size();
        if let Some(odd) = tiles.iter().find(|t| t.size() != tile_size) {
            return Err(WallError::configuration(format!(
                "tile on '{}' is {}x{}, wall tiles are {}x{}",
                odd.port(),
                odd.size(),
                odd.size(),
                tile_size,
                tile_size
            )));
        }

        for (index, tile) in tiles.iter_mut().enumerate() {
            tile.set_index(index);
        }

        Ok(Self { layout, tile_size, tiles })
    }

    pub fn layout(&self) -> WallLayout {
        self.layout
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    /// Composite canvas dimensions `(rows, cols)`.
    pub fn canvas_dims(&self) -> (usize, usize) {
        self.layout.canvas_dims(self.tile_size)
    }

    /// An all-black grid of canvas size.
    pub fn blank_canvas(&self) -> PixelGrid {
        let (rows, cols) = self.canvas_dims();
        PixelGrid::new(rows, cols)
    }

    pub fn tiles(&self) -> &[TileDriver] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> Option<&TileDriver> {
        self.tiles.get(index)
    }

    pub fn tile_mut(&mut self, index: usize) -> Option<&mut TileDriver> {
        self.tiles.get_mut(index)
    }

    /// Indices of tiles that entered the failed state.
    pub fn failed_tiles(&self) -> Vec<usize> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.state() == TileState::Failed)
            .map(|(i, _)| i)
            .collect()
    }

    /// Map a canvas pixel to `(tile index, local row, local col)`.
    pub fn locate(&self, row: usize, col: usize) -> Option<(usize, usize, usize)> {
        self.layout.locate(self.tile_size, row, col)
    }

    /// Split a composite canvas over the tiles.
    ///
    /// The canvas shape is checked before any tile buffer is touched.
    pub fn set_pixels(&mut self, canvas: &PixelGrid) -> Result<()> {
        let expected = self.canvas_dims();
        if canvas.dimensions() != expected {
            return Err(WallError::dimension_mismatch(expected, canvas.dimensions()));
        }

        let (layout, size) = (self.layout, self.tile_size);
        for (index, tile) in self.tiles.iter_mut().enumerate() {
            let (tile_row, tile_col) = layout.tile_position(index).ok_or_else(|| {
                WallError::configuration(format!("tile {} is outside the layout", index))
            })?;
            tile.set_pixels_from_canvas(canvas, tile_row * size, tile_col * size)?;
        }
        Ok(())
    }

    /// Set one canvas pixel on whichever tile owns it.
    pub fn set_pixel(&mut self, row: usize, col: usize, color: Rgb) -> Result<()> {
        let (rows, cols) = self.canvas_dims();
        let (index, local_row, local_col) =
            self.locate(row, col).ok_or(WallError::OutOfBounds { row, col, rows, cols })?;
        self.tiles[index].set_pixel(local_row, local_col, color)
    }

    /// Set every LED of every tile to one color.
    pub fn fill(&mut self, color: Rgb) {
        for tile in &mut self.tiles {
            tile.fill(color);
        }
    }

    /// Show every tile concurrently and wait for all of them.
    pub async fn show(&mut self) -> WallReport {
        let outcomes = join_all(self.tiles.iter_mut().map(|tile| tile.show())).await;
        self.report(outcomes)
    }

    /// Like [`WallComposer::show`] but every tile sleeps its full frame time.
    pub async fn show_forced(&mut self) -> WallReport {
        let outcomes = join_all(self.tiles.iter_mut().map(|tile| tile.show_forced())).await;
        self.report(outcomes)
    }

    fn report(&self, outcomes: Vec<Result<ShowOutcome>>) -> WallReport {
        let report = WallReport { outcomes };
        for (tile, error) in report.failures() {
            warn!(tile, "Tile did not show its frame: {}", error);
        }
        trace!(sent = report.sent_count(), tiles = self.tiles.len(), "Wall frame done");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TileSettings;
    use crate::test_utils::{boxed_emulator, emulated_wall, gradient_grid};
    use std::time::Duration;
    use tokio::time::Instant;

    #[test]
    fn layout_locates_canvas_pixels() {
        let layout = WallLayout::FULL;
        assert_eq!(layout.canvas_dims(20), (40, 60));
        assert_eq!(layout.locate(20, 0, 0), Some((0, 0, 0)));
        assert_eq!(layout.locate(20, 0, 25), Some((1, 0, 5)));
        assert_eq!(layout.locate(20, 39, 59), Some((5, 19, 19)));
        assert_eq!(layout.locate(20, 20, 19), Some((3, 0, 19)));
        assert_eq!(layout.locate(20, 40, 0), None);
        assert_eq!(layout.tile_position(4), Some((1, 1)));
        assert_eq!(layout.tile_position(6), None);
    }

    #[test]
    fn every_canvas_pixel_has_one_owner() {
        let layout = WallLayout::FULL;
        let mut seen = vec![false; 6 * 400];
        for row in 0..40 {
            for col in 0..60 {
                let (tile, r, c) = layout.locate(20, row, col).unwrap();
                let key = tile * 400 + r * 20 + c;
                assert!(!seen[key]);
                seen[key] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn tile_count_must_match_layout() {
        let settings = TileSettings::default();
        let tiles = (0..2)
            .map(|i| TileDriver::new(boxed_emulator(&format!("emu{i}")).0, &settings).unwrap())
            .collect();
        let err = WallComposer::new(WallLayout::FULL, tiles).unwrap_err();
        assert!(matches!(err, WallError::Configuration { .. }));
    }

    #[test]
    fn tiles_are_reindexed_in_wall_order() {
        let (wall, _) = emulated_wall(WallLayout::new(1, 3), &TileSettings::default());
        let indices: Vec<usize> = wall.tiles().iter().map(TileDriver::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn canvas_split_matches_tile_blocks() {
        let (mut wall, handles) = emulated_wall(WallLayout::FULL, &TileSettings::default());
        let canvas = gradient_grid(40, 60);

        wall.set_pixels(&canvas).unwrap();
        assert!(wall.show().await.is_complete());

        for (index, handle) in handles.iter().enumerate() {
            let tile = wall.tile(index).unwrap();
            let decoded = tile.encoder().decode(&handle.last_frame().unwrap()).unwrap();
            let (tile_row, tile_col) = WallLayout::FULL.tile_position(index).unwrap();

            let mut expected = PixelGrid::new(20, 20);
            expected.copy_block_from(&canvas, tile_row * 20, tile_col * 20).unwrap();
            assert_eq!(decoded, expected, "tile {index}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_canvas_is_rejected_before_any_tile_changes() {
        let (mut wall, handles) = emulated_wall(WallLayout::FULL, &TileSettings::default());
        let err = wall.set_pixels(&PixelGrid::filled(60, 40, Rgb::RED)).unwrap_err();
        assert!(matches!(err, WallError::DimensionMismatch { expected_rows: 40, .. }));
        assert!(wall.tiles().iter().all(|t| t.pixels().as_slice().iter().all(|c| c.is_black())));
        assert!(handles.iter().all(|h| h.frame_count() == 0));
    }

    #[tokio::test(start_paused = true)]
    async fn tiles_pace_concurrently() {
        let (mut wall, _) = emulated_wall(WallLayout::FULL, &TileSettings::default());

        let start = Instant::now();
        wall.show().await;
        wall.show().await;
        // Two frames per tile, overlapped across tiles.
        assert_eq!(Instant::now().duration_since(start), Duration::from_millis(66));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_tile_does_not_stop_siblings() {
        let (mut wall, handles) = emulated_wall(WallLayout::FULL, &TileSettings::default());
        handles[2].disconnect();

        wall.fill(Rgb::WHITE);
        let report = wall.show().await;
        assert!(!report.is_complete());
        assert_eq!(report.sent_count(), 5);

        let failures: Vec<usize> = report.failures().map(|(i, _)| i).collect();
        assert_eq!(failures, vec![2]);
        assert!(matches!(report.outcome(2), Some(Err(WallError::TransportWrite { tile: 2, .. }))));

        let report = wall.show().await;
        assert!(matches!(report.outcome(2), Some(Err(WallError::TileFailed { tile: 2 }))));
        assert_eq!(report.sent_count(), 5);
        assert_eq!(wall.failed_tiles(), vec![2]);

        for (index, handle) in handles.iter().enumerate() {
            let expected = if index == 2 { 0 } else { 2 };
            assert_eq!(handle.frame_count(), expected, "tile {index}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn set_pixel_routes_to_owner() {
        let (mut wall, _) = emulated_wall(WallLayout::FULL, &TileSettings::default());
        wall.set_pixel(25, 41, Rgb::GREEN).unwrap();

        assert_eq!(wall.tile(5).unwrap().pixels().get(5, 1), Some(Rgb::GREEN));
        assert!(matches!(wall.set_pixel(40, 0, Rgb::RED), Err(WallError::OutOfBounds { .. })));
    }
}
