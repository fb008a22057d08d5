//! Main loop pacing.
//!
//! The loop runs two phases at independent rates without threads: a
//! process phase (read clients, handle keys) at [`PROCESS_FREQ`] and a
//! render phase (scheduler, renderer) once per frame interval. Each phase
//! keeps a lag accumulator that grows with elapsed time; a phase runs when
//! its lag turns positive and then pays it back.
//!
//! Render lag is capped at [`MAX_RENDER_LAG_FRAMES`] frames so a stalled
//! process renders a bounded burst of catch-up frames instead of replaying
//! the whole stall.

use std::time::Duration;

/// Process phases per second.
pub const PROCESS_FREQ: i64 = 32;

/// Most frames of render lag carried over a stall.
pub const MAX_RENDER_LAG_FRAMES: i64 = 16;

/// Default render interval: 8 frames per second.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(125_000);

const PROCESS_INTERVAL: i64 = 1_000_000 / PROCESS_FREQ;

/// Phases due after a clock sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Strokes {
    /// Poll clients and handle input
    pub process: bool,
    /// Advance the timer, schedule and render
    pub render: bool,
}

/// Lag accumulators of the two loop phases, in microseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacer {
    frame_interval: i64,
    process_lag: i64,
    render_lag: i64,
}

impl Pacer {
    /// Pacer rendering every `frame_interval`. Both phases are due at once.
    pub fn new(frame_interval: Duration) -> Self {
        let frame_interval = i64::try_from(frame_interval.as_micros()).unwrap_or(i64::MAX).max(1);
        Self { frame_interval, process_lag: 1, render_lag: 1 }
    }

    /// Render interval.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(u64::try_from(self.frame_interval).unwrap_or(0))
    }

    /// Account for `elapsed` time since the last call and report which
    /// phases should run now. At most one render is due per call; after a
    /// stall, keep calling with zero elapsed time while
    /// [`is_due`](Self::is_due) holds to catch up.
    pub fn advance(&mut self, elapsed: Duration) -> Strokes {
        let elapsed = i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX);
        let mut strokes = Strokes::default();

        self.process_lag = self.process_lag.saturating_add(elapsed);
        if self.process_lag > 0 {
            strokes.process = true;
            self.process_lag = -PROCESS_INTERVAL;
        }

        self.render_lag = self.render_lag.saturating_add(elapsed);
        if self.render_lag > 0 {
            strokes.render = true;
            self.render_lag = self.render_lag.min(self.frame_interval.saturating_mul(MAX_RENDER_LAG_FRAMES));
            self.render_lag -= self.frame_interval;
        }

        strokes
    }

    /// Whether a phase is due without further elapsed time.
    pub fn is_due(&self) -> bool {
        self.process_lag > 0 || self.render_lag > 0
    }

    /// Time until the next phase is due; zero when one is due already.
    pub fn sleep_time(&self) -> Duration {
        let wait = (-self.process_lag).min(-self.render_lag);
        Duration::from_micros(u64::try_from(wait).unwrap_or(0))
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn both_phases_run_first() {
        let mut pacer = Pacer::default();
        assert_eq!(pacer.advance(Duration::ZERO), Strokes { process: true, render: true });
        assert_eq!(pacer.sleep_time(), Duration::from_micros(31_250));
    }

    #[test]
    fn process_runs_four_times_per_frame() {
        let mut pacer = Pacer::default();
        pacer.advance(Duration::ZERO);

        let mut processes = 0;
        let mut renders = 0;
        for _ in 0..1000 {
            let strokes = pacer.advance(MS);
            processes += usize::from(strokes.process);
            renders += usize::from(strokes.render);
        }
        assert_eq!(renders, 8);
        assert!((30..=32).contains(&processes), "{processes}");
    }

    #[test]
    fn stall_catch_up_is_bounded() {
        let mut pacer = Pacer::default();
        pacer.advance(Duration::ZERO);

        let mut renders = usize::from(pacer.advance(Duration::from_secs(60)).render);
        while pacer.is_due() {
            renders += usize::from(pacer.advance(Duration::ZERO).render);
        }
        assert_eq!(renders, 16);
    }
}
