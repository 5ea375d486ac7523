use glam::{DVec3, Mat4, Vec3};
use horizon_common::RenderConfig;

/// Fly camera used to explore the scene.
///
/// Input moves and turns the rig; `update()` recomputes the view and
/// projection matrices once per frame, `resize()` follows the surface aspect.
#[derive(Debug, Clone)]
pub struct CameraRig {
    /// Kept in f64; the matrices are built from [`eye`](Self::eye).
    pub position: DVec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Units per second.
    pub speed: f32,
    pub boost: f32,
    pub sensitivity: f32,
    view: Mat4,
    projection: Mat4,
}

impl Default for CameraRig {
    fn default() -> Self {
        let mut rig = Self {
            position: DVec3::new(0.0, 4.0, 40.0),
            yaw: -90.0_f32.to_radians(),
            pitch: 0.0,
            fov: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 2000.0,
            speed: 10.0,
            boost: 4.0,
            sensitivity: 0.003,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        rig.look_at(Vec3::ZERO);
        rig.update();
        rig
    }
}

impl CameraRig {
    pub fn new(config: &RenderConfig) -> Self {
        let mut rig = Self::default();
        rig.resize(config);
        rig.update();
        rig
    }

    /// Position narrowed to f32 for matrices and GPU uniforms.
    pub fn eye(&self) -> Vec3 {
        self.position.as_vec3()
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Turn the rig to face `target`.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = (target.as_dvec3() - self.position)
            .normalize_or_zero()
            .as_vec3();
        if dir == Vec3::ZERO {
            return;
        }
        self.yaw = dir.z.atan2(dir.x);
        self.pitch = dir.y.clamp(-1.0, 1.0).asin();
    }

    /// Move along a local axis: x = right, y = up, z = forward.
    pub fn fly(&mut self, axis: Vec3, dt: f32, boosted: bool) {
        if axis == Vec3::ZERO {
            return;
        }
        let speed = if boosted {
            self.speed * self.boost
        } else {
            self.speed
        };
        let step = self.right() * axis.x + Vec3::Y * axis.y + self.forward() * axis.z;
        self.position += (step.normalize_or_zero() * speed * dt).as_dvec3();
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self
            .pitch
            .clamp(-89.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    /// Recompute view and projection for this frame.
    pub fn update(&mut self) {
        let eye = self.eye();
        self.view = Mat4::look_at_rh(eye, eye + self.forward(), Vec3::Y);
        self.projection = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
    }

    pub fn resize(&mut self, config: &RenderConfig) {
        self.aspect = config.aspect();
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rig_faces_origin() {
        let rig = CameraRig::default();
        let to_origin = (-rig.position).normalize();
        assert!(rig.forward().dot(to_origin.as_vec3()) > 0.999);
        assert!(!rig.view_projection().col(0).x.is_nan());
    }

    #[test]
    fn fly_forward_approaches_origin() {
        let mut rig = CameraRig::default();
        let before = rig.position.length();
        rig.fly(Vec3::Z, 1.0, false);
        assert!((before - rig.position.length() - f64::from(rig.speed)).abs() < 0.01);
    }

    #[test]
    fn boost_multiplies_speed() {
        let mut a = CameraRig::default();
        let mut b = CameraRig::default();
        a.fly(Vec3::X, 1.0, false);
        b.fly(Vec3::X, 1.0, true);
        let start = CameraRig::default().position;
        assert!(((b.position - start).length() - 4.0 * (a.position - start).length()).abs() < 1e-3);
    }

    #[test]
    fn resize_tracks_aspect() {
        let mut rig = CameraRig::default();
        rig.resize(&RenderConfig {
            pixel_ratio: 1.0,
            width: 1000.0,
            height: 500.0,
        });
        assert_eq!(rig.aspect, 2.0);
        rig.update();
        assert_eq!(
            rig.projection_matrix(),
            Mat4::perspective_rh(rig.fov, 2.0, rig.near, rig.far)
        );
    }

    #[test]
    fn pitch_is_clamped() {
        let mut rig = CameraRig::default();
        rig.rotate(0.0, -100_000.0);
        assert!(rig.pitch <= 89.0_f32.to_radians());
    }
}
