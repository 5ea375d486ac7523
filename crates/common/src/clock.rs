use std::time::Instant;

/// Delta reported before the first real tick, roughly one 60 Hz frame.
pub const DEFAULT_DELTA_MS: f64 = 16.0;

/// Frame clock in milliseconds.
///
/// `tick()` samples the wall clock; `advance()` steps by a caller-supplied
/// delta, which keeps headless runs and tests reproducible.
#[derive(Debug, Clone)]
pub struct Clock {
    start: Instant,
    current: Instant,
    elapsed: f64,
    delta: f64,
    frames: u64,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            current: now,
            elapsed: 0.0,
            delta: DEFAULT_DELTA_MS,
            frames: 0,
        }
    }

    /// Milliseconds since the previous tick.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Milliseconds since the clock started.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of ticks so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advance using the wall clock.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = (now - self.current).as_secs_f64() * 1000.0;
        self.current = now;
        self.elapsed = (now - self.start).as_secs_f64() * 1000.0;
        self.frames += 1;
    }

    /// Advance by an explicit delta in milliseconds.
    pub fn advance(&mut self, delta_ms: f64) {
        self.delta = delta_ms;
        self.elapsed += delta_ms;
        self.frames += 1;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_with_default_delta() {
        let clock = Clock::new();
        assert_eq!(clock.delta(), DEFAULT_DELTA_MS);
        assert_eq!(clock.elapsed(), 0.0);
        assert_eq!(clock.frames(), 0);
    }

    #[test]
    fn advance_accumulates_elapsed() {
        let mut clock = Clock::new();
        clock.advance(10.0);
        clock.advance(20.0);
        assert_eq!(clock.delta(), 20.0);
        assert_eq!(clock.elapsed(), 30.0);
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn tick_measures_wall_time() {
        let mut clock = Clock::new();
        std::thread::sleep(Duration::from_millis(2));
        clock.tick();
        assert!(clock.delta() >= 1.0);
        assert!(clock.elapsed() >= clock.delta());
    }
}
