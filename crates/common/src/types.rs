use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Measured bounds of a display surface, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceBounds {
    pub width: f32,
    pub height: f32,
}

impl SurfaceBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A surface the experience renders into.
///
/// The target is measured on construction and on every resize. Anything that
/// can report logical bounds and a pixel density qualifies: a window, a canvas,
/// or a fixed-size offscreen target.
pub trait TargetSurface {
    /// Current logical bounds of the surface.
    fn bounds(&self) -> SurfaceBounds;

    /// Device pixel ratio (physical pixels per logical pixel).
    fn device_pixel_ratio(&self) -> f64;

    /// Height of the hosting viewport, used when the surface reports no height
    /// of its own at construction time.
    fn viewport_height(&self) -> f32 {
        self.bounds().height
    }
}

/// Lower and upper bound applied to the device pixel ratio.
pub const PIXEL_RATIO_RANGE: (f64, f64) = (1.0, 2.0);

/// Clamp a device pixel ratio into [`PIXEL_RATIO_RANGE`].
pub fn clamp_pixel_ratio(ratio: f64) -> f64 {
    ratio.max(PIXEL_RATIO_RANGE.0).min(PIXEL_RATIO_RANGE.1)
}

/// Render configuration derived from the target surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub pixel_ratio: f64,
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

impl RenderConfig {
    /// Initial measurement. A surface without a measured height falls back to
    /// the hosting viewport height.
    pub fn measure_initial(target: &dyn TargetSurface) -> Self {
        let bounds = target.bounds();
        let height = if bounds.height > 0.0 {
            bounds.height
        } else {
            target.viewport_height()
        };
        Self {
            pixel_ratio: clamp_pixel_ratio(target.device_pixel_ratio()),
            width: bounds.width,
            height,
        }
    }

    /// Re-measurement after a resize. Bounds are taken exactly as reported.
    pub fn measure(target: &dyn TargetSurface) -> Self {
        let bounds = target.bounds();
        Self {
            pixel_ratio: clamp_pixel_ratio(target.device_pixel_ratio()),
            width: bounds.width,
            height: bounds.height,
        }
    }

    /// Width / height, guarding against a zero-height surface.
    pub fn aspect(&self) -> f32 {
        self.width / self.height.max(1.0)
    }

    /// Size in physical pixels, never below 1x1.
    pub fn physical_size(&self) -> (u32, u32) {
        let w = (self.width as f64 * self.pixel_ratio).round().max(1.0);
        let h = (self.height as f64 * self.pixel_ratio).round().max(1.0);
        (w as u32, h as u32)
    }
}

/// A fixed-size target, used by headless runs and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSurface {
    pub bounds: SurfaceBounds,
    pub pixel_ratio: f64,
}

impl FixedSurface {
    pub fn new(width: f32, height: f32, pixel_ratio: f64) -> Self {
        Self {
            bounds: SurfaceBounds::new(width, height),
            pixel_ratio,
        }
    }
}

impl TargetSurface for FixedSurface {
    fn bounds(&self) -> SurfaceBounds {
        self.bounds
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collapsed;

    impl TargetSurface for Collapsed {
        fn bounds(&self) -> SurfaceBounds {
            SurfaceBounds::new(640.0, 0.0)
        }

        fn device_pixel_ratio(&self) -> f64 {
            3.0
        }

        fn viewport_height(&self) -> f32 {
            480.0
        }
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn pixel_ratio_is_clamped() {
        assert_eq!(clamp_pixel_ratio(0.5), 1.0);
        assert_eq!(clamp_pixel_ratio(1.5), 1.5);
        assert_eq!(clamp_pixel_ratio(3.0), 2.0);
    }

    #[test]
    fn initial_measure_falls_back_to_viewport_height() {
        let config = RenderConfig::measure_initial(&Collapsed);
        assert_eq!(config.width, 640.0);
        assert_eq!(config.height, 480.0);
        assert_eq!(config.pixel_ratio, 2.0);
    }

    #[test]
    fn resize_measure_keeps_reported_height() {
        let config = RenderConfig::measure(&Collapsed);
        assert_eq!(config.height, 0.0);
        assert_eq!(config.aspect(), 640.0);
    }

    #[test]
    fn physical_size_scales_by_ratio() {
        let surface = FixedSurface::new(800.0, 600.0, 1.5);
        let config = RenderConfig::measure(&surface);
        assert_eq!(config.physical_size(), (1200, 900));
    }
}
