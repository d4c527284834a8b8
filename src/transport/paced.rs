//! Frame pacing over a transport

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use super::Transport;

/// Enforces a minimum interval between two consecutive writes on one transport.
///
/// Before each write, the time since the previous write is compared with the
/// configured frame time and the remainder is slept away. In forced mode the
/// full frame time is always slept, giving a fixed cadence instead of a floor.
///
/// The clock starts at construction, so the very first frame also waits for
/// the firmware to settle after the port was opened.
pub struct PacedTransport<T: Transport = Box<dyn Transport>> {
    transport: T,
    frame_time: Duration,
    force: bool,
    last_send: Instant,
    frames_sent: u64,
}

impl<T: Transport> PacedTransport<T> {
    pub fn new(transport: T, frame_time: Duration) -> Self {
        Self { transport, frame_time, force: false, last_send: Instant::now(), frames_sent: 0 }
    }

    /// Always sleep the full frame time before writing.
    pub fn with_forced_frame_time(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    pub fn set_frame_time(&mut self, frame_time: Duration) {
        self.frame_time = frame_time;
    }

    pub fn is_forced(&self) -> bool {
        self.force
    }

    pub fn set_forced(&mut self, force: bool) {
        self.force = force;
    }

    /// Number of frames written so far.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Instant of the last completed write (construction time before the first).
    pub fn last_send(&self) -> Instant {
        self.last_send
    }

    pub fn describe(&self) -> &str {
        self.transport.describe()
    }

    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    /// Send a frame using the configured pacing mode.
    ///
    /// Returns the time elapsed between the previous write and this one.
    pub async fn send(&mut self, frame: &[u8]) -> std::io::Result<Duration> {
        self.send_paced(frame, self.force).await
    }

    /// Send a frame after sleeping the full frame time.
    pub async fn send_forced(&mut self, frame: &[u8]) -> std::io::Result<Duration> {
        self.send_paced(frame, true).await
    }

    async fn send_paced(&mut self, frame: &[u8], force: bool) -> std::io::Result<Duration> {
        let since_last = self.last_send.elapsed();
        let delay =
            if force { self.frame_time } else { self.frame_time.saturating_sub(since_last) };

        if !delay.is_zero() {
            debug!(
                port = self.transport.describe(),
                ?since_last,
                ?delay,
                force,
                "Pacing frame"
            );
            sleep(delay).await;
        }

        self.transport.write_frame(frame).await?;

        let now = Instant::now();
        let elapsed = now.duration_since(self.last_send);
        self.last_send = now;
        self.frames_sent += 1;

        trace!(
            port = self.transport.describe(),
            frame = self.frames_sent,
            bytes = frame.len(),
            ?elapsed,
            "Frame written"
        );

        Ok(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::EmulatorTransport;

    const FRAME_TIME: Duration = Duration::from_millis(33);

    #[tokio::test(start_paused = true)]
    async fn consecutive_sends_respect_frame_time() {
        let (transport, handle) = EmulatorTransport::new("emu0");
        let mut paced = PacedTransport::new(transport, FRAME_TIME);

        for _ in 0..5 {
            let elapsed = paced.send(&[0; 4]).await.unwrap();
            assert!(elapsed >= FRAME_TIME, "elapsed {elapsed:?} below frame time");
        }

        let times = handle.write_times();
        assert_eq!(times.len(), 5);
        for pair in times.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= FRAME_TIME);
        }
        assert_eq!(paced.frames_sent(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn late_send_does_not_wait() {
        let (transport, _handle) = EmulatorTransport::new("emu0");
        let mut paced = PacedTransport::new(transport, FRAME_TIME);
        paced.send(&[1]).await.unwrap();

        tokio::time::advance(Duration::from_millis(100)).await;

        let before = Instant::now();
        let elapsed = paced.send(&[1]).await.unwrap();
        assert_eq!(Instant::now(), before, "no sleep expected after a long gap");
        assert_eq!(elapsed, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn forced_send_waits_full_frame_time() {
        let (transport, _handle) = EmulatorTransport::new("emu0");
        let mut paced = PacedTransport::new(transport, FRAME_TIME);
        paced.send(&[1]).await.unwrap();

        tokio::time::advance(Duration::from_millis(100)).await;

        let before = Instant::now();
        paced.send_forced(&[1]).await.unwrap();
        assert_eq!(Instant::now().duration_since(before), FRAME_TIME);

        let mut forced = PacedTransport::new(EmulatorTransport::new("emu1").0, FRAME_TIME)
            .with_forced_frame_time(true);
        tokio::time::advance(Duration::from_millis(500)).await;
        let before = Instant::now();
        forced.send(&[1]).await.unwrap();
        assert_eq!(Instant::now().duration_since(before), FRAME_TIME);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_write_leaves_counters_untouched() {
        let (transport, handle) = EmulatorTransport::new("emu0");
        let mut paced = PacedTransport::new(transport, FRAME_TIME);
        paced.send(&[1]).await.unwrap();
        let last = paced.last_send();

        handle.disconnect();
        let err = paced.send(&[1]).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
        assert_eq!(paced.frames_sent(), 1);
        assert_eq!(paced.last_send(), last);
    }
}
