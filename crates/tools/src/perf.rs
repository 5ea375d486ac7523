//! Frame timing overlay.

use std::collections::VecDeque;
use std::fmt;

/// Rolling window of frame deltas for FPS display.
///
/// Fed from the frame clock rather than sampling time itself, so the numbers
/// agree with what the rest of the frame saw.
#[derive(Debug, Clone)]
pub struct PerfOverlay {
    frame_times_ms: VecDeque<f64>,
    max_samples: usize,
    frames: u64,
}

impl PerfOverlay {
    /// Create an overlay with a 120-sample window.
    pub fn new() -> Self {
        Self::with_window(120)
    }

    pub fn with_window(max_samples: usize) -> Self {
        Self {
            frame_times_ms: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            frames: 0,
        }
    }

    /// Record one frame.
    pub fn update(&mut self, delta_ms: f64) {
        self.frames += 1;
        self.frame_times_ms.push_back(delta_ms);
        if self.frame_times_ms.len() > self.max_samples {
            self.frame_times_ms.pop_front();
        }
    }

    /// Average frames per second over the window.
    pub fn fps(&self) -> f64 {
        let total: f64 = self.frame_times_ms.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }
        self.frame_times_ms.len() as f64 * 1000.0 / total
    }

    /// Average frame time in milliseconds.
    pub fn frame_time_ms(&self) -> f64 {
        if self.frame_times_ms.is_empty() {
            return 0.0;
        }
        self.frame_times_ms.iter().sum::<f64>() / self.frame_times_ms.len() as f64
    }

    /// Worst frame time in the window.
    pub fn max_frame_time_ms(&self) -> f64 {
        self.frame_times_ms.iter().copied().fold(0.0, f64::max)
    }

    pub fn sample_count(&self) -> usize {
        self.frame_times_ms.len()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for PerfOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PerfOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0} fps ({:.2} ms avg, {:.2} ms max)",
            self.fps(),
            self.frame_time_ms(),
            self.max_frame_time_ms()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_fps_is_zero() {
        let perf = PerfOverlay::new();
        assert_eq!(perf.fps(), 0.0);
        assert_eq!(perf.frame_time_ms(), 0.0);
    }

    #[test]
    fn fps_from_steady_frames() {
        let mut perf = PerfOverlay::new();
        for _ in 0..10 {
            perf.update(20.0);
        }
        assert!((perf.fps() - 50.0).abs() < 1e-9);
        assert_eq!(perf.frame_time_ms(), 20.0);
        assert_eq!(perf.sample_count(), 10);
    }

    #[test]
    fn window_is_bounded() {
        let mut perf = PerfOverlay::with_window(8);
        for i in 0..20 {
            perf.update(i as f64);
        }
        assert_eq!(perf.sample_count(), 8);
        assert_eq!(perf.frames(), 20);
        assert_eq!(perf.max_frame_time_ms(), 19.0);
    }

    #[test]
    fn display_mentions_fps() {
        let mut perf = PerfOverlay::new();
        perf.update(16.0);
        assert!(perf.to_string().contains("fps"));
    }
}
