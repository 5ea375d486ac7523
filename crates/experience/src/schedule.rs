use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cloneable cancellation token for the render loop.
///
/// Any thread may raise it; the loop checks it before every frame.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How the clock advances for one scheduled frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Sample the wall clock.
    Wall,
    /// Advance by a fixed delta in milliseconds.
    Fixed(f64),
}

/// Decides when the next frame runs. `None` ends the loop.
pub trait FrameScheduler {
    fn next_frame(&mut self) -> Option<Tick>;
}

/// Paces frames to a target rate using the wall clock.
#[derive(Debug)]
pub struct FixedRateScheduler {
    interval: Duration,
    remaining: Option<u64>,
    next_deadline: Option<Instant>,
}

impl FixedRateScheduler {
    pub fn new(fps: f64) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 60.0 };
        Self {
            interval: Duration::from_secs_f64(1.0 / fps),
            remaining: None,
            next_deadline: None,
        }
    }

    /// Stop after `frames` frames.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameScheduler for FixedRateScheduler {
    fn next_frame(&mut self) -> Option<Tick> {
        if let Some(remaining) = &mut self.remaining {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        let now = Instant::now();
        match self.next_deadline {
            Some(deadline) if deadline > now => {
                std::thread::sleep(deadline - now);
                self.next_deadline = Some(deadline + self.interval);
            }
            // Late or first frame: restart pacing from now.
            _ => self.next_deadline = Some(now + self.interval),
        }
        Some(Tick::Wall)
    }
}

/// Runs a fixed number of frames back to back with a constant delta.
#[derive(Debug, Clone)]
pub struct FixedStepScheduler {
    delta_ms: f64,
    remaining: u64,
}

impl FixedStepScheduler {
    pub fn new(frames: u64, delta_ms: f64) -> Self {
        Self {
            delta_ms,
            remaining: frames,
        }
    }
}

impl FrameScheduler for FixedStepScheduler {
    fn next_frame(&mut self) -> Option<Tick> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(Tick::Fixed(self.delta_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_handle_is_shared() {
        let a = StopHandle::new();
        let b = a.clone();
        assert!(!b.is_stopped());
        a.stop();
        assert!(b.is_stopped());
    }

    #[test]
    fn stop_handle_crosses_threads() {
        let handle = StopHandle::new();
        let remote = handle.clone();
        std::thread::spawn(move || remote.stop()).join().unwrap();
        assert!(handle.is_stopped());
    }

    #[test]
    fn fixed_step_runs_exact_count() {
        let mut s = FixedStepScheduler::new(3, 20.0);
        let ticks: Vec<Tick> = std::iter::from_fn(|| s.next_frame()).collect();
        assert_eq!(ticks, vec![Tick::Fixed(20.0); 3]);
    }

    #[test]
    fn fixed_rate_limit_and_pacing() {
        let mut s = FixedRateScheduler::new(500.0).with_limit(3);
        assert!((s.interval().as_secs_f64() - 0.002).abs() < 1e-9);
        let start = Instant::now();
        let mut count = 0;
        while let Some(tick) = s.next_frame() {
            assert_eq!(tick, Tick::Wall);
            count += 1;
        }
        assert_eq!(count, 3);
        assert!(start.elapsed() >= Duration::from_millis(4));
    }

    #[test]
    fn invalid_rate_falls_back() {
        let s = FixedRateScheduler::new(0.0);
        assert_eq!(s.interval(), Duration::from_secs_f64(1.0 / 60.0));
    }
}
