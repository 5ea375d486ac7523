use crate::color::hsl_to_rgb;
use crate::world::WorldContext;
use glam::{Quat, Vec3};
use horizon_common::Param;
use horizon_render::{
    Mesh, MeshMaterial, ObjectId, PointCloud, PointsMaterial, Renderable, SceneLayers,
    SceneObject, Side, SphereGeometry,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

pub const DEFAULT_HORIZON_RADIUS: f32 = 5.0;
pub const DISK_PARTICLES: usize = 3000;
/// Disk annulus, in multiples of the horizon radius.
pub const DISK_INNER: f32 = 1.6;
pub const DISK_OUTER: f32 = 4.5;
/// Disk spin in radians per millisecond.
pub const DISK_SPIN: f64 = 0.0002;
/// Disk sprites are small relative to their unit-scale geometry.
pub const DISK_SIZE_SCALE: f32 = 0.3;

/// The central black hole: a dark horizon sphere and a glowing accretion disk.
///
/// Geometry is built at unit scale; the live radius is applied through the
/// object transforms every frame, so the debug slider takes effect immediately.
#[derive(Debug)]
pub struct BlackHole {
    radius: Param<f32>,
    view_height: Param<f32>,
    horizon: ObjectId,
    disk: ObjectId,
    disk_angle: f64,
}

impl BlackHole {
    pub fn new(ctx: &mut WorldContext<'_>) -> Self {
        let radius = Param::new(DEFAULT_HORIZON_RADIUS);

        let mut horizon = SceneObject::new(
            "event horizon",
            Renderable::Mesh(Mesh {
                geometry: SphereGeometry::new(1.0, 48, 32),
                material: MeshMaterial {
                    color: [0.0, 0.0, 0.0],
                    texture: None,
                    side: Side::Front,
                    wireframe: Param::new(false),
                },
            }),
        );
        horizon.transform.scale = Vec3::splat(DEFAULT_HORIZON_RADIUS);
        let horizon = ctx.layers.distortion.add(horizon);

        let mut rng = ChaCha8Rng::seed_from_u64(ctx.seed.wrapping_add(1));
        let mut positions = Vec::with_capacity(DISK_PARTICLES);
        let mut sizes = Vec::with_capacity(DISK_PARTICLES);
        let mut colors = Vec::with_capacity(DISK_PARTICLES);
        for _ in 0..DISK_PARTICLES {
            let angle = rng.gen_range(0.0..TAU);
            let distance = rng.gen_range(DISK_INNER..DISK_OUTER);
            let lift = rng.gen_range(-0.04..0.04);
            positions.push(Vec3::new(angle.cos() * distance, lift, angle.sin() * distance));
            sizes.push(rng.gen_range(0.6..1.8));
            // Hotter, whiter near the inner edge.
            let t = (distance - DISK_INNER) / (DISK_OUTER - DISK_INNER);
            colors.push(hsl_to_rgb(40.0 - 25.0 * t, 0.9, 0.75 - 0.25 * t));
        }
        let mut material = PointsMaterial::new(ctx.view_height);
        material.size_scale = DISK_SIZE_SCALE;
        let view_height = material.view_height.clone();
        let mut disk = SceneObject::new(
            "accretion disk",
            Renderable::Points(PointCloud {
                positions,
                sizes,
                colors,
                material,
            }),
        );
        disk.transform.scale = Vec3::splat(DEFAULT_HORIZON_RADIUS);
        let disk = ctx.layers.overlay.add(disk);

        if let Some(folder) = ctx.debug.folder("black hole") {
            folder.add_slider("radius", &radius, 1.0, 15.0, 0.1);
        }

        tracing::debug!(radius = DEFAULT_HORIZON_RADIUS, "black hole created");

        Self {
            radius,
            view_height,
            horizon,
            disk,
            disk_angle: 0.0,
        }
    }

    /// Event-horizon radius, or `None` if it is not a finite number.
    pub fn event_horizon_radius(&self) -> Option<f32> {
        let r = self.radius.get();
        r.is_finite().then_some(r)
    }

    pub fn radius(&self) -> &Param<f32> {
        &self.radius
    }

    pub fn horizon_id(&self) -> ObjectId {
        self.horizon
    }

    pub fn disk_id(&self) -> ObjectId {
        self.disk
    }

    pub fn disk_angle(&self) -> f64 {
        self.disk_angle
    }

    pub fn update(&mut self, delta_ms: f64, layers: &mut SceneLayers) {
        self.disk_angle = (self.disk_angle + delta_ms * DISK_SPIN) % std::f64::consts::TAU;
        let Some(r) = self.event_horizon_radius() else {
            return;
        };
        let scale = Vec3::splat(r.max(0.0));
        if let Some(horizon) = layers.distortion.get_mut(self.horizon) {
            horizon.transform.scale = scale;
        }
        if let Some(disk) = layers.overlay.get_mut(self.disk) {
            disk.transform.scale = scale;
            disk.transform.rotation = Quat::from_rotation_y(self.disk_angle as f32);
        }
    }

    pub fn resize(&mut self, view_height: f32) {
        self.view_height.set(view_height);
    }
}
