//! Shared types for the event horizon engine.
//!
//! # Invariants
//! - Pixel ratio is always clamped to `[1, 2]`.
//! - Time is measured in milliseconds throughout the engine.
//! - Nothing here spawns threads; every type is driven from the frame loop.

mod clock;
mod param;
mod types;
mod viewport;

pub use clock::{Clock, DEFAULT_DELTA_MS};
pub use param::Param;
pub use types::{
    FixedSurface, PIXEL_RATIO_RANGE, RenderConfig, SurfaceBounds, TargetSurface, Transform,
    clamp_pixel_ratio,
};
pub use viewport::{SubscriptionId, ViewportTracker};

pub fn crate_info() -> &'static str {
    "horizon-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
