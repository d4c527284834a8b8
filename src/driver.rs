//! Background render task for a wall
//!
//! [`WallDriver::spawn`] moves a [`WallComposer`] into a tokio task. Callers
//! publish composite canvases through a watch channel, so a slow wall only
//! ever renders the newest canvas, and observe cumulative [`DriverStats`]
//! on a second watch channel.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::types::PixelGrid;
use crate::wall::{WallComposer, WallReport};
use crate::{Result, WallError};

/// Cumulative statistics of a render task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Canvases handed to the wall's `show()`.
    pub frames_shown: u64,
    /// Shown canvases on which every tile succeeded.
    pub complete_frames: u64,
    /// Canvases rejected before reaching the tiles.
    pub rejected_frames: u64,
    /// Per tile, whether its last `show()` failed.
    pub tile_failed: Vec<bool>,
    pub last_error: Option<String>,
}

impl DriverStats {
    fn new(tiles: usize) -> Self {
        Self { tile_failed: vec![false; tiles], ..Self::default() }
    }

    fn record(&mut self, report: &WallReport) {
        self.frames_shown += 1;
        if report.is_complete() {
            self.complete_frames += 1;
        }
        for (failed, outcome) in self.tile_failed.iter_mut().zip(report.outcomes()) {
            *failed = outcome.is_err();
        }
        if let Some((_, error)) = report.failures().last() {
            self.last_error = Some(error.to_string());
        }
    }

    /// Indices of tiles whose last `show()` failed.
    pub fn failed_tiles(&self) -> Vec<usize> {
        self.tile_failed.iter().enumerate().filter(|(_, f)| **f).map(|(i, _)| i).collect()
    }
}

/// Spawns render tasks.
pub struct WallDriver;

impl WallDriver {
    /// Spawn a render task owning `wall`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(wall: WallComposer) -> WallDriverHandle {
        let canvas_dims = wall.canvas_dims();
        let (frame_tx, frame_rx) = watch::channel(None);
        let (stats_tx, stats_rx) = watch::channel(DriverStats::new(wall.tiles().len()));
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            Self::render_task(wall, frame_rx, stats_tx, task_cancel).await
        });

        WallDriverHandle { frames: frame_tx, stats: stats_rx, cancel, task: Some(task), canvas_dims }
    }

    async fn render_task(
        mut wall: WallComposer,
        mut frames: watch::Receiver<Option<Arc<PixelGrid>>>,
        stats: watch::Sender<DriverStats>,
        cancel: CancellationToken,
    ) -> WallComposer {
        info!(tiles = wall.tiles().len(), "Render task started");

        loop {
            // Cancellation is only observed between frames; a started show()
            // always finishes so no tile is left mid-write.
            let changed = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Render task cancelled");
                    break;
                }
                changed = frames.changed() => changed,
            };

            if changed.is_err() {
                debug!("Frame sender dropped, stopping render task");
                break;
            }

            let Some(canvas) = frames.borrow_and_update().clone() else {
                continue;
            };

            if let Err(e) = wall.set_pixels(&canvas) {
                warn!("Rejected canvas: {}", e);
                stats.send_modify(|s| {
                    s.rejected_frames += 1;
                    s.last_error = Some(e.to_string());
                });
                continue;
            }

            let report = wall.show().await;
            trace!(complete = report.is_complete(), "Rendered canvas");
            stats.send_modify(|s| s.record(&report));
        }

        let shown = stats.borrow().frames_shown;
        info!("Render task ended after {} frames", shown);
        wall
    }
}

/// Control handle of a running render task. Dropping it cancels the task.
pub struct WallDriverHandle {
    frames: watch::Sender<Option<Arc<PixelGrid>>>,
    stats: watch::Receiver<DriverStats>,
    cancel: CancellationToken,
    task: Option<JoinHandle<WallComposer>>,
    canvas_dims: (usize, usize),
}

impl WallDriverHandle {
    /// Composite canvas dimensions the wall expects.
    pub fn canvas_dims(&self) -> (usize, usize) {
        self.canvas_dims
    }

    /// Queue `canvas` for display, replacing any canvas not yet rendered.
    pub fn submit(&self, canvas: PixelGrid) -> Result<()> {
        if canvas.dimensions() != self.canvas_dims {
            return Err(WallError::dimension_mismatch(self.canvas_dims, canvas.dimensions()));
        }
        self.frames.send(Some(Arc::new(canvas))).map_err(|_| WallError::DriverStopped {
            reason: "render task is no longer running".to_string(),
        })
    }

    /// Snapshot of the current statistics.
    pub fn stats(&self) -> DriverStats {
        self.stats.borrow().clone()
    }

    /// A fresh receiver for statistics updates.
    pub fn subscribe(&self) -> watch::Receiver<DriverStats> {
        self.stats.clone()
    }

    /// Statistics as a stream, starting with the current value.
    pub fn stats_stream(&self) -> WatchStream<DriverStats> {
        WatchStream::new(self.stats.clone())
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop after the frame in progress and hand the wall back.
    pub async fn shutdown(mut self) -> Result<WallComposer> {
        self.cancel.cancel();
        let task = self.task.take().ok_or_else(|| WallError::DriverStopped {
            reason: "render task already joined".to_string(),
        })?;
        task.await.map_err(|e| WallError::DriverStopped { reason: e.to_string() })
    }
}

impl Drop for WallDriverHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
