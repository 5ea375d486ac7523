//! Experience: the frame orchestrator.
//!
//! Builds every subsystem in dependency order, runs them once per frame,
//! propagates resize events and publishes telemetry derived from camera motion.
//!
//! # Invariants
//! - At most one live experience per host.
//! - Each resize event reaches the camera, pipeline and world exactly once.
//! - Telemetry is published only when a finite event-horizon radius exists.
//! - After `stop()` no frame runs and no resize is observed.

mod experience;
mod host;
mod options;
mod schedule;
mod telemetry;

pub use experience::Experience;
pub use host::ExperienceHost;
pub use options::{DEFAULT_ASSET_ROOT, DEFAULT_SEED, ExperienceOptions};
pub use schedule::{FixedRateScheduler, FixedStepScheduler, FrameScheduler, StopHandle, Tick};
pub use telemetry::{TelemetryLines, TelemetrySink, TelemetrySnapshot, TelemetryText, to_fixed};

/// Errors from constructing an experience.
#[derive(Debug, thiserror::Error)]
pub enum ExperienceError {
    #[error("no target surface to render into")]
    MissingTarget,
}

pub fn crate_info() -> &'static str {
    "horizon-experience v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("experience"));
    }
}
