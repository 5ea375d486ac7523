use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A shared, mutable scalar: shader uniforms and debug-panel bindings.
///
/// Clones observe the same value. Single-threaded by construction (`Rc`), which
/// matches the frame loop: every writer and reader runs on the frame thread.
#[derive(Clone, Default)]
pub struct Param<T: Copy>(Rc<Cell<T>>);

impl<T: Copy> Param<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    pub fn get(&self) -> T {
        self.0.get()
    }

    pub fn set(&self, value: T) {
        self.0.set(value);
    }

    /// Apply `f` to the current value and store the result.
    pub fn update(&self, f: impl FnOnce(T) -> T) {
        self.0.set(f(self.0.get()));
    }

    /// True if both handles point at the same value.
    pub fn shares(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for Param<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Param").field(&self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_value() {
        let a = Param::new(1.0_f32);
        let b = a.clone();
        b.set(4.0);
        assert_eq!(a.get(), 4.0);
        assert!(a.shares(&b));
    }

    #[test]
    fn update_applies_function() {
        let p = Param::new(false);
        p.update(|v| !v);
        assert!(p.get());
    }

    #[test]
    fn independent_params_do_not_share() {
        let a = Param::new(0_u32);
        let b = Param::new(0_u32);
        assert!(!a.shares(&b));
    }
}
