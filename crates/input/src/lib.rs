//! Input: key bindings mapped to actions shared by every embodiment.
//!
//! # Invariants
//! - Consumers see actions, never platform key events.
//! - Trigger actions fire once per press; movement actions are held.

pub mod action;
pub mod bindings;

pub use action::Action;
pub use bindings::{HeldActions, KeyBindings};

pub fn crate_info() -> &'static str {
    "horizon-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
