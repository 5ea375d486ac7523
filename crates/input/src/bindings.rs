use crate::action::Action;
use glam::Vec3;
use std::collections::{BTreeMap, BTreeSet};

/// Maps key names (e.g. `"KeyW"`, `"ShiftLeft"`) to actions.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: BTreeMap<String, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings
            .bind("KeyW", Action::MoveForward)
            .bind("KeyS", Action::MoveBackward)
            .bind("KeyA", Action::StrafeLeft)
            .bind("KeyD", Action::StrafeRight)
            .bind("Space", Action::Ascend)
            .bind("ControlLeft", Action::Descend)
            .bind("ShiftLeft", Action::Boost)
            .bind("F1", Action::ToggleDebugPanel)
            .bind("Escape", Action::Quit);
        bindings
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    pub fn bind(&mut self, key: impl Into<String>, action: Action) -> &mut Self {
        self.map.insert(key.into(), action);
        self
    }

    pub fn lookup(&self, key: &str) -> Option<Action> {
        self.map.get(key).copied()
    }
}

/// Set of currently held actions.
#[derive(Debug, Clone, Default)]
pub struct HeldActions {
    held: BTreeSet<Action>,
}

impl HeldActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key transition. Returns the action if it is a trigger that
    /// fired on this press.
    pub fn handle(&mut self, action: Action, pressed: bool) -> Option<Action> {
        if action.is_trigger() {
            return pressed.then_some(action);
        }
        if pressed {
            self.held.insert(action);
        } else {
            self.held.remove(&action);
        }
        None
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    /// Sum of the held movement axes. Opposing keys cancel out.
    pub fn movement_axis(&self) -> Vec3 {
        self.held.iter().map(|a| a.axis()).sum()
    }

    pub fn boosted(&self) -> bool {
        self.is_held(Action::Boost)
    }

    /// Forget everything, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        if !self.held.is_empty() {
            tracing::debug!(count = self.held.len(), "releasing held actions");
        }
        self.held.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.lookup("KeyW"), Some(Action::MoveForward));
        assert_eq!(bindings.lookup("F1"), Some(Action::ToggleDebugPanel));
        assert_eq!(bindings.lookup("KeyQ"), None);
    }

    #[test]
    fn rebinding_replaces() {
        let mut bindings = KeyBindings::default();
        bindings.bind("KeyW", Action::Ascend);
        assert_eq!(bindings.lookup("KeyW"), Some(Action::Ascend));
    }

    #[test]
    fn held_axes_combine_and_cancel() {
        let mut held = HeldActions::new();
        held.handle(Action::MoveForward, true);
        held.handle(Action::StrafeRight, true);
        assert_eq!(held.movement_axis(), Vec3::new(1.0, 0.0, 1.0));

        held.handle(Action::MoveBackward, true);
        assert_eq!(held.movement_axis(), Vec3::X);

        held.handle(Action::StrafeRight, false);
        held.handle(Action::MoveBackward, false);
        assert_eq!(held.movement_axis(), Vec3::Z);
    }

    #[test]
    fn triggers_fire_on_press_only() {
        let mut held = HeldActions::new();
        assert_eq!(
            held.handle(Action::ToggleDebugPanel, true),
            Some(Action::ToggleDebugPanel)
        );
        assert_eq!(held.handle(Action::ToggleDebugPanel, false), None);
        assert!(!held.is_held(Action::ToggleDebugPanel));
    }

    #[test]
    fn boost_and_clear() {
        let mut held = HeldActions::new();
        held.handle(Action::Boost, true);
        assert!(held.boosted());
        held.clear();
        assert!(!held.boosted());
    }
}
