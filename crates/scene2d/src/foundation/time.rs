//! Time management utilities

use std::time::Instant;

/// Frame timer used by the host loop to measure elapsed time between frames
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Restart measuring from now, discarding the time since the last frame
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Fixed-step accumulator
///
/// Variable frame times are accumulated and paid out as whole steps of
/// constant length. Without a cap, a long stall is paid back in full on the
/// next frame.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    accumulator: f32,
    max_steps: Option<u32>,
}

impl FixedTimestep {
    /// Default step length: 50 steps per time unit
    pub const DEFAULT_STEP: f32 = 0.02;

    /// Create an accumulator with the given step length and optional per-frame cap
    pub fn new(step: f32, max_steps: Option<u32>) -> Self {
        Self {
            step,
            accumulator: 0.0,
            max_steps,
        }
    }

    /// Step length
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Time accumulated but not yet paid out
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Take one step out of the accumulator, returning `false` once less
    /// than one step remains
    fn consume_step(&mut self) -> bool {
        if self.accumulator >= self.step {
            self.accumulator -= self.step;
            true
        } else {
            false
        }
    }

    /// Add frame time and return how many fixed steps are due this frame
    pub fn accumulate(&mut self, delta_time: f32) -> u32 {
        self.accumulator += delta_time;

        let mut steps = 0;
        while self.consume_step() {
            steps += 1;
            if self.max_steps.is_some_and(|max| steps >= max) {
                if self.accumulator >= self.step {
                    log::warn!(
                        "FixedTimestep: dropping {:.3}s of simulation time after {} catch-up steps",
                        self.accumulator,
                        steps
                    );
                    self.accumulator %= self.step;
                }
                break;
            }
        }
        steps
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STEP, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_timestep_accumulates_across_frames() {
        let mut fixed = FixedTimestep::default();

        assert_eq!(fixed.accumulate(0.015), 0);
        assert_eq!(fixed.accumulate(0.015), 1);
        assert_relative_eq!(fixed.accumulator(), 0.01, epsilon = 1e-6);
    }

    #[test]
    fn test_fixed_timestep_pays_out_multiple_steps() {
        let mut fixed = FixedTimestep::new(0.25, None);

        assert_eq!(fixed.accumulate(1.0), 4);
        assert_relative_eq!(fixed.accumulator(), 0.0);
    }

    #[test]
    fn test_fixed_timestep_cap_drops_excess() {
        let mut fixed = FixedTimestep::new(0.25, Some(2));

        assert_eq!(fixed.accumulate(2.1), 2);
        assert!(fixed.accumulator() < fixed.step());
    }

    #[test]
    fn test_timer_counts_frames() {
        let mut timer = Timer::new();
        timer.update();
        timer.update();

        assert_eq!(timer.frame_count(), 2);
        assert!(timer.delta_time() >= 0.0);

        timer.reset();
        assert_eq!(timer.frame_count(), 0);
    }
}
