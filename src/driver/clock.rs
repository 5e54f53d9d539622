use instant::Instant;
use std::time::Duration;

/// Measures real time between animation frames and caps each step so a long
/// pause never becomes one huge integration step.
#[derive(Debug)]
pub struct FrameClock {
    last: Option<Instant>,
    max_step: Duration,
}

impl FrameClock {
    pub fn new(max_step: Duration) -> Self {
        Self { last: None, max_step }
    }

    pub fn max_step(&self) -> Duration {
        self.max_step
    }

    /// Seconds since the previous tick, clamped. The first tick after a reset is zero.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = self.last.map(|last| now.duration_since(last)).unwrap_or(Duration::ZERO);
        self.last = Some(now);
        clamp_step(elapsed, self.max_step)
    }

    /// Forget the previous frame, e.g. after the loop was stopped.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

pub fn clamp_step(elapsed: Duration, max_step: Duration) -> f32 {
    elapsed.min(max_step).as_secs_f32()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_pauses_are_clamped() {
        let max = Duration::from_millis(50);
        assert!((clamp_step(Duration::from_secs(3), max) - 0.05).abs() < 1e-6);
        assert_eq!(
            clamp_step(Duration::from_millis(16), max),
            Duration::from_millis(16).as_secs_f32()
        );
    }

    #[test]
    fn first_tick_is_zero() {
        let mut clock = FrameClock::new(Duration::from_millis(50));
        assert_eq!(clock.tick(), 0.0);
        assert!(clock.tick() <= 0.05);
        clock.reset();
        assert_eq!(clock.tick(), 0.0);
    }
}
