//! Single tile driver.
//!
//! A [`TileDriver`] owns everything belonging to one physical tile: its pixel
//! buffer, its encoder (with the verified wiring table) and its paced
//! transport. Callers mutate the buffer between frames and call
//! [`TileDriver::show`] to push a full snapshot of it.
//!
//! ```rust
//! use contourwall::{ContourWall, TileSettings, Rgb};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> contourwall::Result<()> {
//! let (mut tile, emulator) = ContourWall::emulated_tile(&TileSettings::default())?;
//! tile.fill(Rgb::RED);
//! tile.show().await?;
//! assert_eq!(emulator.frame_count(), 1);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, trace};

use crate::config::TileSettings;
use crate::encoder::FrameEncoder;
use crate::transport::{PacedTransport, Transport};
use crate::types::{PixelGrid, Rgb};
use crate::wiring::WireOrderTable;
use crate::{Result, WallError};

/// Lifecycle of a tile driver.
///
/// A driver only exists once its wiring table and transport are bound, so it
/// starts out `Ready`. `Failed` is terminal: the tile must be reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    Ready,
    Sending,
    Failed,
}

/// What a single `show()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    /// Frame written; `elapsed` is the time since the previous write.
    Sent { elapsed: Duration },
    /// Frame identical to the last one sent and skipping is enabled.
    Unchanged,
}

impl ShowOutcome {
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            ShowOutcome::Sent { elapsed } => Some(*elapsed),
            ShowOutcome::Unchanged => None,
        }
    }

    pub fn was_sent(&self) -> bool {
        matches!(self, ShowOutcome::Sent { .. })
    }
}

/// Drives one tile over one exclusively owned transport.
pub struct TileDriver {
    index: usize,
    pixels: PixelGrid,
    encoder: FrameEncoder,
    transport: PacedTransport,
    state: TileState,
    skip_unchanged: bool,
    last_frame: Option<Vec<u8>>,
    skipped_frames: u64,
}

impl std::fmt::Debug for TileDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileDriver")
            .field("index", &self.index)
            .field("port", &self.transport.describe())
            .field("state", &self.state)
            .field("frames_sent", &self.transport.frames_sent())
            .finish_non_exhaustive()
    }
}

impl TileDriver {
    /// Bind a transport to a freshly built, verified wiring table.
    pub fn new(transport: Box<dyn Transport>, settings: &TileSettings) -> Result<Self> {
        settings.validate()?;
        let table = Arc::new(WireOrderTable::new(settings.wiring, settings.size)?);
        Self::with_table(transport, table, settings)
    }

    /// Like [`TileDriver::new`] but reuses an already verified table.
    pub fn with_table(
        transport: Box<dyn Transport>,
        table: Arc<WireOrderTable>,
        settings: &TileSettings,
    ) -> Result<Self> {
        if table.size() != settings.size || table.scheme() != settings.wiring {
            return Err(WallError::configuration(format!(
                "wiring table is {:?} {}x{}, settings ask for {:?} {}x{}",
                table.scheme(),
                table.size(),
                table.size(),
                settings.wiring,
                settings.size,
                settings.size
            )));
        }

        let mut encoder = FrameEncoder::new(table, settings.protocol.format());
        encoder.set_brightness(settings.brightness)?;

        let transport = PacedTransport::new(transport, settings.frame_time())
            .with_forced_frame_time(settings.force_frame_time);

        debug!(
            port = transport.describe(),
            size = settings.size,
            protocol = ?settings.protocol,
            "Tile ready"
        );

        Ok(Self {
            index: 0,
            pixels: PixelGrid::new(settings.size, settings.size),
            encoder,
            transport,
            state: TileState::Ready,
            skip_unchanged: settings.skip_unchanged,
            last_frame: None,
            skipped_frames: 0,
        })
    }

    /// Position of this tile on its wall, used to identify it in errors.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn port(&self) -> &str {
        self.transport.describe()
    }

    pub fn size(&self) -> usize {
        self.pixels.rows()
    }

    pub fn state(&self) -> TileState {
        self.state
    }

    pub fn pixels(&self) -> &PixelGrid {
        &self.pixels
    }

    pub fn encoder(&self) -> &FrameEncoder {
        &self.encoder
    }

    pub fn frames_sent(&self) -> u64 {
        self.transport.frames_sent()
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    /// The last frame written to the transport.
    pub fn last_frame(&self) -> Option<&[u8]> {
        self.last_frame.as_deref()
    }

    pub fn frame_time(&self) -> Duration {
        self.transport.frame_time()
    }

    pub fn set_frame_time(&mut self, frame_time: Duration) {
        self.transport.set_frame_time(frame_time);
    }

    pub fn set_brightness(&mut self, factor: Option<f32>) -> Result<()> {
        self.encoder.set_brightness(factor)
    }

    pub fn set_skip_unchanged(&mut self, skip: bool) {
        self.skip_unchanged = skip;
    }

    fn check_dimensions(&self, grid: &PixelGrid) -> Result<()> {
        if grid.dimensions() != self.pixels.dimensions() {
            return Err(WallError::dimension_mismatch(self.pixels.dimensions(), grid.dimensions()));
        }
        Ok(())
    }

    /// Replace the whole buffer. The grid must be `N x N`.
    pub fn set_pixels(&mut self, grid: &PixelGrid) -> Result<()> {
        self.check_dimensions(grid)?;
        self.pixels.clone_from(grid);
        Ok(())
    }

    /// Copy this tile's block out of a larger canvas.
    pub(crate) fn set_pixels_from_canvas(
        &mut self,
        canvas: &PixelGrid,
        top: usize,
        left: usize,
    ) -> Result<()> {
        self.pixels.copy_block_from(canvas, top, left)
    }

    pub fn set_pixel(&mut self, row: usize, col: usize, color: Rgb) -> Result<()> {
        self.pixels.set(row, col, color)
    }

    /// Paste `region` with its top-left corner at `(top, left)`.
    pub fn set_region(&mut self, top: usize, left: usize, region: &PixelGrid) -> Result<()> {
        self.pixels.paste(region, top, left)
    }

    /// Set every LED to one color.
    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    /// Encode the current buffer and send it, respecting the frame time.
    pub async fn show(&mut self) -> Result<ShowOutcome> {
        self.show_with(false).await
    }

    /// Like [`TileDriver::show`] but always sleeps the full frame time.
    pub async fn show_forced(&mut self) -> Result<ShowOutcome> {
        self.show_with(true).await
    }

    async fn show_with(&mut self, force: bool) -> Result<ShowOutcome> {
        if self.state == TileState::Failed {
            return Err(WallError::TileFailed { tile: self.index });
        }

        let frame = self.encoder.encode(&self.pixels)?;

        if self.skip_unchanged && self.last_frame.as_deref() == Some(frame.as_slice()) {
            self.skipped_frames += 1;
            trace!(tile = self.index, skipped = self.skipped_frames, "Frame unchanged, skipping");
            return Ok(ShowOutcome::Unchanged);
        }

        let result = {
            let mut sending = SendingGuard::enter(&mut self.state);
            let result = if force {
                self.transport.send_forced(&frame).await
            } else {
                self.transport.send(&frame).await
            };
            if result.is_err() {
                sending.settle(TileState::Failed);
            }
            result
        };

        match result {
            Ok(elapsed) => {
                self.last_frame = Some(frame);
                Ok(ShowOutcome::Sent { elapsed })
            }
            Err(source) => {
                error!(tile = self.index, port = self.port(), "Tile write failed: {}", source);
                Err(WallError::transport_write(self.index, self.port(), source))
            }
        }
    }
}

/// Holds a tile in `Sending` for the duration of one send.
///
/// A `show()` future dropped mid-send leaves the tile `Ready` again.
struct SendingGuard<'a> {
    state: &'a mut TileState,
    settled: TileState,
}

impl<'a> SendingGuard<'a> {
    fn enter(state: &'a mut TileState) -> Self {
        *state = TileState::Sending;
        Self { state, settled: TileState::Ready }
    }

    fn settle(&mut self, state: TileState) {
        self.settled = state;
    }
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        *self.state = self.settled;
    }
}
