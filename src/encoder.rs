//! Frame encoding: logical pixel grid to wire bytes.
//!
//! For every logical cell the encoder writes its three channel bytes at
//! `slot * 3`, where `slot` comes from the tile's [`WireOrderTable`]. Protocol
//! versions with a checksum get one trailing byte holding the sum of all
//! channel bytes modulo 256.

use std::sync::Arc;

use tracing::warn;

use crate::types::{FrameFormat, PixelGrid, Rgb};
use crate::wiring::WireOrderTable;
use crate::{Result, WallError};

/// Sum of `bytes` modulo 256.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Validate a brightness factor.
///
/// Values outside `[0, 1]` are clamped with a warning; NaN is rejected.
pub fn validate_brightness(factor: f32) -> Result<f32> {
    if factor.is_nan() {
        return Err(WallError::configuration("brightness must be a number in [0, 1]"));
    }
    if !(0.0..=1.0).contains(&factor) {
        let clamped = factor.clamp(0.0, 1.0);
        warn!(requested = factor, clamped, "Brightness out of range, clamping");
        return Ok(clamped);
    }
    Ok(factor)
}

/// Turns one tile's pixel grid into the exact bytes its firmware expects.
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    table: Arc<WireOrderTable>,
    format: FrameFormat,
    brightness: Option<f32>,
}

impl FrameEncoder {
    pub fn new(table: Arc<WireOrderTable>, format: FrameFormat) -> Self {
        Self { table, format, brightness: None }
    }

    /// Scale every channel by `factor` right before encoding.
    pub fn with_brightness(mut self, factor: f32) -> Result<Self> {
        self.set_brightness(Some(factor))?;
        Ok(self)
    }

    pub fn set_brightness(&mut self, factor: Option<f32>) -> Result<()> {
        self.brightness = factor.map(validate_brightness).transpose()?;
        Ok(())
    }

    pub fn brightness(&self) -> Option<f32> {
        self.brightness
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn table(&self) -> &WireOrderTable {
        &self.table
    }

    /// Length in bytes of every frame this encoder produces.
    pub fn frame_len(&self) -> usize {
        self.format.frame_len(self.table.len())
    }

    fn adjust(&self, color: Rgb) -> Rgb {
        match self.brightness {
            Some(factor) => color.scale(factor),
            None => color,
        }
    }

    fn finish(&self, mut frame: Vec<u8>) -> Vec<u8> {
        if self.format.checksum {
            let sum = checksum(&frame);
            frame.push(sum);
        }
        frame
    }

    /// Encode a full tile grid.
    ///
    /// The grid must be `N x N` for the table's `N`.
    pub fn encode(&self, grid: &PixelGrid) -> Result<Vec<u8>> {
        let size = self.table.size();
        if grid.dimensions() != (size, size) {
            return Err(WallError::dimension_mismatch((size, size), grid.dimensions()));
        }

        let mut frame = vec![0u8; self.table.len() * 3];
        for (&slot, &color) in self.table.slots().iter().zip(grid.as_slice()) {
            let offset = slot * 3;
            self.format.order.write(self.adjust(color), &mut frame[offset..offset + 3]);
        }

        Ok(self.finish(frame))
    }

    /// Encode a tile where every LED has the same color.
    ///
    /// Still walks the wiring table so the output is byte-identical to
    /// encoding a filled grid.
    pub fn encode_solid(&self, color: Rgb) -> Vec<u8> {
        let color = self.adjust(color);
        let mut frame = vec![0u8; self.table.len() * 3];
        for &slot in self.table.slots() {
            let offset = slot * 3;
            self.format.order.write(color, &mut frame[offset..offset + 3]);
        }
        self.finish(frame)
    }

    /// Decode a frame back into a logical grid.
    ///
    /// Brightness scaling is not undone: the result holds the colors as they
    /// were transmitted.
    pub fn decode(&self, frame: &[u8]) -> Result<PixelGrid> {
        let expected = self.frame_len();
        if frame.len() != expected {
            return Err(WallError::BufferLength { expected, found: frame.len() });
        }

        let data_len = self.table.len() * 3;
        let (data, trailer) = frame.split_at(data_len);
        if let Some(&sent) = trailer.first() {
            let computed = checksum(data);
            if sent != computed {
                return Err(WallError::Frame {
                    details: format!("checksum {:#04x} does not match {:#04x}", sent, computed),
                });
            }
        }

        let size = self.table.size();
        let mut grid = PixelGrid::new(size, size);
        for (cell, &slot) in self.table.slots().iter().enumerate() {
            let offset = slot * 3;
            let color = self.format.order.read(&data[offset..offset + 3]);
            grid.set(cell / size, cell % size, color)?;
        }
        Ok(grid)
    }
}
