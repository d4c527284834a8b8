//! Logical pixel grid

use super::Rgb;
use crate::{Result, WallError};

/// A row-major grid of colors in logical (row, column) order.
///
/// Used both for a single tile's buffer and for the composite canvas of a
/// wall. Dimensions are fixed at construction; every mutation keeps them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    rows: usize,
    cols: usize,
    pixels: Vec<Rgb>,
}

impl PixelGrid {
    /// Create an all-black grid.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, Rgb::BLACK)
    }

    /// Create a grid with every cell set to `color`.
    pub fn filled(rows: usize, cols: usize, color: Rgb) -> Self {
        Self { rows, cols, pixels: vec![color; rows * cols] }
    }

    /// Build a grid from nested rows, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<Rgb>>) -> Result<Self> {
        let row_count = rows.len();
        let cols = rows.first().map_or(0, Vec::len);

        let mut pixels = Vec::with_capacity(row_count * cols);
        for row in rows {
            if row.len() != cols {
                return Err(WallError::dimension_mismatch((row_count, cols), (row_count, row.len())));
            }
            pixels.extend(row);
        }

        Ok(Self { rows: row_count, cols, pixels })
    }

    /// Build a grid from a row-major buffer with three bytes (R, G, B) per cell.
    ///
    /// This is the shape upstream frame producers hand over, e.g. a camera
    /// frame already downscaled to the canvas size.
    pub fn from_rgb_bytes(rows: usize, cols: usize, bytes: &[u8]) -> Result<Self> {
        let expected = rows * cols * 3;
        if bytes.len() != expected {
            return Err(WallError::BufferLength { expected, found: bytes.len() });
        }

        let pixels = bytes.chunks_exact(3).map(|c| Rgb::new(c[0], c[1], c[2])).collect();
        Ok(Self { rows, cols, pixels })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Rgb> {
        if row < self.rows && col < self.cols {
            Some(self.pixels[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn set(&mut self, row: usize, col: usize, color: Rgb) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(WallError::OutOfBounds { row, col, rows: self.rows, cols: self.cols });
        }
        self.pixels[row * self.cols + col] = color;
        Ok(())
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    /// One logical row.
    pub fn row(&self, row: usize) -> Option<&[Rgb]> {
        if row < self.rows {
            Some(&self.pixels[row * self.cols..(row + 1) * self.cols])
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Iterate `(row, col, color)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Rgb)> + '_ {
        let cols = self.cols.max(1);
        self.pixels.iter().enumerate().map(move |(i, &color)| (i / cols, i % cols, color))
    }

    /// Copy the `self.rows() x self.cols()` block of `source` starting at
    /// `(top, left)` into this grid.
    pub fn copy_block_from(&mut self, source: &PixelGrid, top: usize, left: usize) -> Result<()> {
        if top + self.rows > source.rows || left + self.cols > source.cols {
            return Err(WallError::dimension_mismatch(
                (top + self.rows, left + self.cols),
                source.dimensions(),
            ));
        }

        for row in 0..self.rows {
            let src = (top + row) * source.cols + left;
            let dst = row * self.cols;
            self.pixels[dst..dst + self.cols].copy_from_slice(&source.pixels[src..src + self.cols]);
        }
        Ok(())
    }

    /// Paste `region` into this grid with its top-left corner at `(top, left)`.
    pub fn paste(&mut self, region: &PixelGrid, top: usize, left: usize) -> Result<()> {
        if top + region.rows > self.rows || left + region.cols > self.cols {
            return Err(WallError::dimension_mismatch(
                self.dimensions(),
                (top + region.rows, left + region.cols),
            ));
        }

        for row in 0..region.rows {
            let dst = (top + row) * self.cols + left;
            let src = row * region.cols;
            self.pixels[dst..dst + region.cols]
                .copy_from_slice(&region.pixels[src..src + region.cols]);
        }
        Ok(())
    }
}
