//! World kernel: the scene's entities and their per-frame animation.
//!
//! # Invariants
//! - Entities register their objects into scene layers once, at construction.
//! - Procedural content is a pure function of the world seed.
//! - Per-frame motion depends only on frame delta, never on wall time.

pub mod black_hole;
pub mod color;
pub mod stars;
pub mod world;

pub use black_hole::BlackHole;
pub use color::hsl_to_rgb;
pub use stars::{STAR_COUNT, StarField, StarSample};
pub use world::{World, WorldContext, WorldFrame};

pub fn crate_info() -> &'static str {
    "horizon-kernel v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("kernel"));
    }
}
