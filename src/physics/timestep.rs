//! Fixed timestep accumulator
//!
//! Hosts that want frame-rate independent results feed real frame time in
//! and run the physics a whole number of fixed steps per frame.

/// Frames never run more than this many catch-up steps
pub const MAX_STEPS_PER_FRAME: u32 = 5;

#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(step_seconds: f32) -> Self {
        Self {
            step: step_seconds.max(f32::EPSILON),
            accumulator: 0.0,
        }
    }

    /// 60 Hz, the rate the physics constants are tuned for
    pub fn sixty_hz() -> Self {
        Self::new(1.0 / 60.0)
    }

    pub fn step_seconds(&self) -> f32 {
        self.step
    }

    /// Fraction of a step left over, for render interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }

    /// Add frame time and return how many fixed steps to run now.
    /// Backlog beyond `MAX_STEPS_PER_FRAME` is dropped.
    pub fn advance(&mut self, frame_seconds: f32) -> u32 {
        if frame_seconds.is_finite() && frame_seconds > 0.0 {
            self.accumulator += frame_seconds;
        }

        let mut steps = 0;
        while self.accumulator >= self.step && steps < MAX_STEPS_PER_FRAME {
            self.accumulator -= self.step;
            steps += 1;
        }
        if steps == MAX_STEPS_PER_FRAME && self.accumulator >= self.step {
            log::debug!("dropping {:.3}s of physics backlog", self.accumulator);
            self.accumulator %= self.step;
        }
        steps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_partial_frames() {
        let mut clock = FixedTimestep::new(0.25);
        assert_eq!(clock.advance(0.125), 0);
        assert_eq!(clock.advance(0.125), 1);
        assert_eq!(clock.advance(0.5), 2);
        assert_eq!(clock.alpha(), 0.0);
    }

    #[test]
    fn test_caps_backlog() {
        let mut clock = FixedTimestep::new(0.25);
        assert_eq!(clock.advance(10.0), MAX_STEPS_PER_FRAME);
        assert!(clock.alpha() < 1.0);
        assert_eq!(clock.advance(0.0), 0);
    }

    #[test]
    fn test_ignores_bad_frame_times() {
        let mut clock = FixedTimestep::new(0.25);
        assert_eq!(clock.advance(f32::NAN), 0);
        assert_eq!(clock.advance(-1.0), 0);
        assert_eq!(clock.advance(f32::INFINITY), 0);
        assert_eq!(clock.alpha(), 0.0);
    }
}
