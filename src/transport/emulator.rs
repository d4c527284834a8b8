//! In-memory tile emulator

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;
use tracing::debug;

use super::Transport;

/// Frames an emulator keeps unless told otherwise.
pub const DEFAULT_HISTORY: usize = 16;

#[derive(Debug)]
struct EmulatorState {
    frames: VecDeque<Vec<u8>>,
    write_times: VecDeque<Instant>,
    history: usize,
    written: usize,
    disconnected: bool,
}

impl EmulatorState {
    fn with_history(history: usize) -> Self {
        let history = history.max(1);
        Self {
            frames: VecDeque::with_capacity(history),
            write_times: VecDeque::with_capacity(history),
            history,
            written: 0,
            disconnected: false,
        }
    }

    fn record(&mut self, frame: &[u8]) {
        if self.frames.len() == self.history {
            self.frames.pop_front();
            self.write_times.pop_front();
        }
        self.frames.push_back(frame.to_vec());
        self.write_times.push_back(Instant::now());
        self.written += 1;
    }
}

/// Shared view into an [`EmulatorTransport`].
///
/// The transport itself moves into a tile driver; the handle stays with the
/// caller to inspect what was written or to pull the virtual plug. Only the
/// most recent frames are retained; see [`EmulatorTransport::with_history`].
#[derive(Debug, Clone)]
pub struct EmulatorHandle {
    state: Arc<Mutex<EmulatorState>>,
}

impl EmulatorHandle {
    fn lock(&self) -> MutexGuard<'_, EmulatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Retained frames, oldest first.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.lock().frames.iter().cloned().collect()
    }

    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.lock().frames.back().cloned()
    }

    /// Frames written since creation or the last `clear`, retained or not.
    pub fn frame_count(&self) -> usize {
        self.lock().written
    }

    /// Completion instants of the retained frames, oldest first.
    pub fn write_times(&self) -> Vec<Instant> {
        self.lock().write_times.iter().copied().collect()
    }

    /// Maximum number of retained frames.
    pub fn history(&self) -> usize {
        self.lock().history
    }

    /// Make every following write fail as if the device was unplugged.
    pub fn disconnect(&self) {
        self.lock().disconnected = true;
    }

    pub fn is_disconnected(&self) -> bool {
        self.lock().disconnected
    }

    /// Forget recorded frames.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.frames.clear();
        state.write_times.clear();
        state.written = 0;
    }
}

/// A [`Transport`] that records frames instead of sending them.
///
/// Stands in for real tiles in tests and while developing without hardware.
#[derive(Debug)]
pub struct EmulatorTransport {
    name: String,
    handle: EmulatorHandle,
}

impl EmulatorTransport {
    /// An emulator retaining the last [`DEFAULT_HISTORY`] frames.
    pub fn new(name: impl Into<String>) -> (Self, EmulatorHandle) {
        Self::with_history(name, DEFAULT_HISTORY)
    }

    /// An emulator retaining the last `history` frames (at least one).
    pub fn with_history(name: impl Into<String>, history: usize) -> (Self, EmulatorHandle) {
        let handle = EmulatorHandle {
            state: Arc::new(Mutex::new(EmulatorState::with_history(history))),
        };
        (Self { name: name.into(), handle: handle.clone() }, handle)
    }
}

#[async_trait::async_trait]
impl Transport for EmulatorTransport {
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        let mut state = self.handle.lock();
        if state.disconnected {
            debug!(port = %self.name, "Emulated tile is disconnected");
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "emulated tile disconnected"));
        }
        state.record(frame);
        Ok(())
    }

    fn describe(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_frames_in_order() {
        let (mut transport, handle) = EmulatorTransport::new("emu");
        transport.write_frame(&[1, 2]).await.unwrap();
        transport.write_frame(&[3]).await.unwrap();

        assert_eq!(handle.frames(), vec![vec![1, 2], vec![3]]);
        assert_eq!(handle.last_frame(), Some(vec![3]));
        assert_eq!(transport.describe(), "emu");

        handle.clear();
        assert_eq!(handle.frame_count(), 0);
    }

    #[tokio::test]
    async fn history_is_bounded() {
        let (mut transport, handle) = EmulatorTransport::with_history("emu", 3);
        for i in 0..10u8 {
            transport.write_frame(&[i]).await.unwrap();
        }

        assert_eq!(handle.frame_count(), 10);
        assert_eq!(handle.frames(), vec![vec![7], vec![8], vec![9]]);
        assert_eq!(handle.write_times().len(), 3);
        assert_eq!(handle.last_frame(), Some(vec![9]));
    }

    #[tokio::test]
    async fn default_history_caps_retained_frames() {
        let (mut transport, handle) = EmulatorTransport::new("emu");
        for _ in 0..DEFAULT_HISTORY * 4 {
            transport.write_frame(&[0; 1201]).await.unwrap();
        }

        assert_eq!(handle.history(), DEFAULT_HISTORY);
        assert_eq!(handle.frames().len(), DEFAULT_HISTORY);
        assert_eq!(handle.frame_count(), DEFAULT_HISTORY * 4);
    }

    #[tokio::test]
    async fn disconnect_fails_writes() {
        let (mut transport, handle) = EmulatorTransport::new("emu");
        handle.disconnect();
        assert!(handle.is_disconnected());

        let err = transport.write_frame(&[1]).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(handle.frame_count(), 0);
    }
}
