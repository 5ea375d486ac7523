use glam::Vec3;

/// A high-level action produced from raw input.
///
/// The experience consumes actions, never platform key events, so any
/// windowing backend can drive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    Ascend,
    Descend,
    /// Held to multiply movement speed.
    Boost,
    /// Show or hide the debug panel.
    ToggleDebugPanel,
    /// Stop the render loop.
    Quit,
}

impl Action {
    /// Contribution to the camera's local movement axis
    /// (x = right, y = up, z = forward).
    pub fn axis(self) -> Vec3 {
        match self {
            Action::MoveForward => Vec3::Z,
            Action::MoveBackward => Vec3::NEG_Z,
            Action::StrafeLeft => Vec3::NEG_X,
            Action::StrafeRight => Vec3::X,
            Action::Ascend => Vec3::Y,
            Action::Descend => Vec3::NEG_Y,
            _ => Vec3::ZERO,
        }
    }

    /// True for actions that fire once on press rather than while held.
    pub fn is_trigger(self) -> bool {
        matches!(self, Action::ToggleDebugPanel | Action::Quit)
    }
}
