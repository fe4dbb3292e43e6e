/// Fixed-step frame clock
///
/// Wall-clock frame time is banked in an accumulator and paid out as whole
/// simulation steps of `FIXED_TIMESTEP_MS`. Characters only ever see the
/// integer step, so every timer in the combat core fires on the same
/// millisecond no matter how unevenly frames arrive.
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Simulation step in milliseconds (62.5 steps per second)
pub const FIXED_TIMESTEP_MS: u32 = 16;

/// Steps paid out per frame at most; any larger backlog is dropped
const MAX_STEPS_PER_FRAME: u32 = 5;

/// Frames averaged for the FPS readout
const FPS_WINDOW_SIZE: usize = 60;

pub struct GameLoop {
    /// Unspent frame time, in microseconds
    backlog_us: u64,
    last_frame: Instant,
    started: Instant,
    paused: bool,
    recent_frames: VecDeque<Duration>,
    frame_count: u64,
    step_count: u64,
    fps: f32,
}

impl GameLoop {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            backlog_us: 0,
            last_frame: now,
            started: now,
            paused: false,
            recent_frames: VecDeque::with_capacity(FPS_WINDOW_SIZE),
            frame_count: 0,
            step_count: 0,
            fps: 0.0,
        }
    }

    /// Start a frame using the wall clock. Returns how many steps to simulate.
    pub fn begin_frame(&mut self) -> u32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.advance(elapsed)
    }

    /// Start a frame that took `elapsed`. Returns how many steps to simulate.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.frame_count += 1;
        self.record_frame(elapsed);

        if self.paused {
            return 0;
        }

        let step_us = u64::from(FIXED_TIMESTEP_MS) * 1000;
        self.backlog_us += u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        let due = self.backlog_us / step_us;

        let steps = if due > u64::from(MAX_STEPS_PER_FRAME) {
            log::debug!("frame clock dropping {} steps", due - u64::from(MAX_STEPS_PER_FRAME));
            self.backlog_us = 0;
            MAX_STEPS_PER_FRAME
        } else {
            self.backlog_us -= due * step_us;
            due as u32
        };

        self.step_count += u64::from(steps);
        steps
    }

    pub fn fixed_timestep_ms(&self) -> u32 {
        FIXED_TIMESTEP_MS
    }

    /// Frames per second averaged over the recent window
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Wall-clock time since the loop was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Simulated milliseconds so far
    pub fn simulated_ms(&self) -> u64 {
        self.step_count * u64::from(FIXED_TIMESTEP_MS)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Steps paid out so far
    pub fn update_count(&self) -> u64 {
        self.step_count
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            log::info!("Simulation paused at {}ms", self.simulated_ms());
        }
    }

    /// Resume without replaying the time spent paused
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.backlog_us = 0;
            log::info!("Simulation resumed");
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    fn record_frame(&mut self, elapsed: Duration) {
        if self.recent_frames.len() == FPS_WINDOW_SIZE {
            self.recent_frames.pop_front();
        }
        self.recent_frames.push_back(elapsed);

        let total: Duration = self.recent_frames.iter().sum();
        let average = total.as_secs_f32() / self.recent_frames.len() as f32;
        self.fps = if average > 0.0 { 1.0 / average } else { 0.0 };
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}
