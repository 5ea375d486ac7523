//! Developer tooling: debug panel bindings and a frame-time overlay.
//!
//! # Invariants
//! - Tools observe and tweak; they never own scene state.
//! - An inactive debug panel registers nothing.

mod debug;
mod perf;

pub use debug::{Binding, Control, DEBUG_ENV, DebugFolder, DebugPanel};
pub use perf::PerfOverlay;

pub fn crate_info() -> &'static str {
    "horizon-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
