//! Core value types shared by the encoder, tiles and walls.
//!
//! - [`Rgb`] is one LED color
//! - [`PixelGrid`] is a logical row-major grid of colors (one tile or a whole canvas)
//! - [`ProtocolVersion`] and [`FrameFormat`] pin down the byte layout a tile's firmware expects
//!
//! ```rust
//! use contourwall::types::{PixelGrid, Rgb};
//!
//! let mut grid = PixelGrid::new(20, 20);
//! grid.set(19, 0, Rgb::RED).unwrap();
//! assert_eq!(grid.get(19, 0), Some(Rgb::RED));
//! ```

mod color;
mod grid;
mod protocol;

pub use color::Rgb;
pub use grid::PixelGrid;
pub use protocol::{ChannelOrder, FrameFormat, ProtocolVersion};

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    prop_compose! {
        fn arb_grid()(rows in 1usize..24, cols in 1usize..24)
            (bytes in prop::collection::vec(any::<u8>(), rows * cols * 3), rows in Just(rows), cols in Just(cols))
            -> PixelGrid {
            PixelGrid::from_rgb_bytes(rows, cols, &bytes).unwrap()
        }
    }

    proptest! {
        #[test]
        fn iter_visits_every_cell_once(grid in arb_grid()) {
            let cells: Vec<_> = grid.iter().collect();
            prop_assert_eq!(cells.len(), grid.rows() * grid.cols());
            for (row, col, color) in cells {
                prop_assert_eq!(grid.get(row, col), Some(color));
            }
        }

        #[test]
        fn fill_keeps_dimensions(mut grid in arb_grid(), r: u8, g: u8, b: u8) {
            let dims = grid.dimensions();
            grid.fill(Rgb::new(r, g, b));
            prop_assert_eq!(grid.dimensions(), dims);
            prop_assert!(grid.as_slice().iter().all(|&c| c == Rgb::new(r, g, b)));
        }
    }
}
