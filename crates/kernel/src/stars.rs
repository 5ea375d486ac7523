use crate::color::hsl_to_rgb;
use crate::world::WorldContext;
use glam::{Quat, Vec3};
use horizon_assets::AssetManifest;
use horizon_common::Param;
use horizon_render::{
    Mesh, MeshMaterial, ObjectId, PointCloud, PointsMaterial, Renderable, SceneLayers,
    SceneObject, Side, SphereGeometry,
};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;

/// Number of stars in the particle field.
pub const STAR_COUNT: usize = 5000;
/// Radius of the sphere the stars sit on.
pub const STAR_SHELL_RADIUS: f64 = 300.0;
/// Star sizes are drawn from `[STAR_SIZE_MIN, STAR_SIZE_MIN + STAR_SIZE_SPAN)`.
pub const STAR_SIZE_MIN: f32 = 0.5;
pub const STAR_SIZE_SPAN: f32 = 1.5;
/// Star hues are drawn from `[STAR_HUE_MIN, STAR_HUE_MIN + STAR_HUE_SPAN)` degrees.
pub const STAR_HUE_MIN: f32 = 200.0;
pub const STAR_HUE_SPAN: f32 = 40.0;
pub const STAR_SATURATION: f32 = 0.7;
pub const STAR_LIGHTNESS: f32 = 0.9;

pub const SKYBOX_RADIUS: f32 = 800.0;
pub const SKYBOX_SEGMENTS: u32 = 64;
/// Skybox spin in radians per millisecond of frame time.
pub const SKYBOX_SPIN: f64 = 0.00001;

/// Procedural star particles, as parallel attribute arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct StarSample {
    pub positions: Vec<Vec3>,
    pub sizes: Vec<f32>,
    pub colors: Vec<[f32; 3]>,
}

impl StarSample {
    /// Sample `count` stars uniformly on a sphere of `radius`.
    ///
    /// `theta = 2π·u1`, `phi = acos(2·u2 - 1)` gives a uniform density over
    /// the sphere surface (no clustering at the poles).
    pub fn generate(rng: &mut impl Rng, count: usize, radius: f64) -> Self {
        let mut positions = Vec::with_capacity(count);
        let mut sizes = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);

        for _ in 0..count {
            let theta = 2.0 * PI * rng.gen_range(0.0..1.0);
            let phi = (2.0 * rng.gen_range(0.0..1.0) - 1.0_f64).acos();
            positions.push(Vec3::new(
                (theta.cos() * phi.sin() * radius) as f32,
                (theta.sin() * phi.sin() * radius) as f32,
                (phi.cos() * radius) as f32,
            ));

            sizes.push(rng.gen_range(0.0..1.0_f32) * STAR_SIZE_SPAN + STAR_SIZE_MIN);

            let hue = STAR_HUE_MIN + rng.gen_range(0.0..1.0_f32) * STAR_HUE_SPAN;
            colors.push(hsl_to_rgb(hue, STAR_SATURATION, STAR_LIGHTNESS));
        }

        Self {
            positions,
            sizes,
            colors,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Background sphere plus a shell of point stars, both in the `space` layer.
#[derive(Debug)]
pub struct StarField {
    skybox: ObjectId,
    points: ObjectId,
    view_height: Param<f32>,
    wireframe: Param<bool>,
    skybox_angle: f64,
}

impl StarField {
    pub fn new(ctx: &mut WorldContext<'_>) -> Self {
        let wireframe = Param::new(false);
        let skybox = SceneObject::new(
            "skybox",
            Renderable::Mesh(Mesh {
                geometry: SphereGeometry::new(SKYBOX_RADIUS, SKYBOX_SEGMENTS, SKYBOX_SEGMENTS),
                material: MeshMaterial {
                    color: [1.0, 1.0, 1.0],
                    texture: Some(AssetManifest::SPACE_BACKGROUND.to_string()),
                    side: Side::Back,
                    wireframe: wireframe.clone(),
                },
            }),
        );
        let skybox = ctx.layers.space.add(skybox);

        if let Some(folder) = ctx.debug.folder("skybox") {
            folder.add_toggle("wireframe", &wireframe);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(ctx.seed);
        let sample = StarSample::generate(&mut rng, STAR_COUNT, STAR_SHELL_RADIUS);
        let material = PointsMaterial::new(ctx.view_height);
        let view_height = material.view_height.clone();
        let mut points = SceneObject::new(
            "stars",
            Renderable::Points(PointCloud {
                positions: sample.positions,
                sizes: sample.sizes,
                colors: sample.colors,
                material,
            }),
        );
        // The shell surrounds the camera; bounding-sphere culling would
        // discard it from inside.
        points.frustum_culled = false;
        let points = ctx.layers.space.add(points);

        tracing::debug!(count = STAR_COUNT, seed = ctx.seed, "star field generated");

        Self {
            skybox,
            points,
            view_height,
            wireframe,
            skybox_angle: 0.0,
        }
    }

    pub fn skybox_id(&self) -> ObjectId {
        self.skybox
    }

    pub fn points_id(&self) -> ObjectId {
        self.points
    }

    /// Current value of the points shader's view height.
    pub fn view_height(&self) -> f32 {
        self.view_height.get()
    }

    pub fn wireframe(&self) -> &Param<bool> {
        &self.wireframe
    }

    pub fn skybox_angle(&self) -> f64 {
        self.skybox_angle
    }

    pub fn resize(&mut self, view_height: f32) {
        self.view_height.set(view_height);
    }

    /// Spin the skybox about the vertical axis in proportion to frame time.
    pub fn update(&mut self, delta_ms: f64, layers: &mut SceneLayers) {
        self.skybox_angle += delta_ms * SKYBOX_SPIN;
        if let Some(skybox) = layers.space.get_mut(self.skybox) {
            skybox.transform.rotation = Quat::from_rotation_y(self.skybox_angle as f32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_tools::DebugPanel;

    fn build(debug: bool, seed: u64) -> (StarField, SceneLayers, DebugPanel) {
        let mut layers = SceneLayers::new();
        let mut panel = DebugPanel::new(debug);
        let stars = StarField::new(&mut WorldContext {
            layers: &mut layers,
            debug: &mut panel,
            view_height: 720.0,
            seed,
        });
        (stars, layers, panel)
    }

    fn cloud<'a>(stars: &StarField, layers: &'a SceneLayers) -> &'a PointCloud {
        match &layers.space.get(stars.points_id()).unwrap().body {
            Renderable::Points(p) => p,
            other => panic!("expected points, got {other:?}"),
        }
    }

    #[test]
    fn generates_exact_count_on_shell() {
        let (stars, layers, _) = build(false, 1);
        let cloud = cloud(&stars, &layers);
        assert_eq!(cloud.len(), STAR_COUNT);
        assert_eq!(cloud.sizes.len(), STAR_COUNT);
        assert_eq!(cloud.colors.len(), STAR_COUNT);
        for p in &cloud.positions {
            assert!((p.length() - 300.0).abs() < 1e-3, "star at {}", p.length());
        }
    }

    #[test]
    fn sizes_and_colors_in_range() {
        let (stars, layers, _) = build(false, 2);
        let cloud = cloud(&stars, &layers);
        assert!(cloud.sizes.iter().all(|s| (0.5..2.0).contains(s)));
        let lo = hsl_to_rgb(STAR_HUE_MIN, STAR_SATURATION, STAR_LIGHTNESS);
        for c in &cloud.colors {
            // Near-white and cool: blue is the brightest channel.
            assert!(c[2] >= c[0] && c[2] >= c[1]);
            assert!(c.iter().all(|v| *v >= lo[0] - 1e-4 && *v <= 1.0));
        }
    }

    #[test]
    fn shell_is_roughly_uniform() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let sample = StarSample::generate(&mut rng, 20_000, 1.0);
        let north = sample.positions.iter().filter(|p| p.z > 0.0).count();
        let polar = sample.positions.iter().filter(|p| p.z.abs() > 0.5).count();
        // Uniform on a sphere: half above the equator, and |z| > 0.5 covers
        // exactly half the surface area.
        assert!((north as f64 / 20_000.0 - 0.5).abs() < 0.02);
        assert!((polar as f64 / 20_000.0 - 0.5).abs() < 0.02);
    }

    #[test]
    fn same_seed_same_field() {
        let mut a = ChaCha8Rng::seed_from_u64(99);
        let mut b = ChaCha8Rng::seed_from_u64(99);
        assert_eq!(
            StarSample::generate(&mut a, 64, 300.0),
            StarSample::generate(&mut b, 64, 300.0)
        );
    }

    #[test]
    fn registers_skybox_and_points_in_space_layer() {
        let (stars, layers, _) = build(false, 3);
        assert_eq!(layers.space.len(), 2);
        assert!(layers.distortion.is_empty());
        let skybox = layers.space.get(stars.skybox_id()).unwrap();
        match &skybox.body {
            Renderable::Mesh(mesh) => {
                assert_eq!(mesh.geometry.radius, SKYBOX_RADIUS);
                assert_eq!(mesh.geometry.width_segments, 64);
                assert_eq!(mesh.material.side, Side::Back);
                assert_eq!(
                    mesh.material.texture.as_deref(),
                    Some(AssetManifest::SPACE_BACKGROUND)
                );
            }
            other => panic!("expected mesh, got {other:?}"),
        }
        assert!(!layers.space.get(stars.points_id()).unwrap().frustum_culled);
    }

    #[test]
    fn debug_panel_gets_wireframe_toggle() {
        let (stars, layers, panel) = build(true, 4);
        let folder = panel.get_folder("skybox").unwrap();
        assert!(folder.find("wireframe").is_some());

        stars.wireframe().set(true);
        match &layers.space.get(stars.skybox_id()).unwrap().body {
            Renderable::Mesh(mesh) => assert!(mesh.material.wireframe.get()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn inactive_debug_panel_stays_empty() {
        let (_, _, panel) = build(false, 5);
        assert!(panel.folders().is_empty());
    }

    #[test]
    fn resize_updates_view_height_uniform() {
        let (mut stars, layers, _) = build(false, 6);
        assert_eq!(stars.view_height(), 720.0);
        stars.resize(1080.0);
        assert_eq!(cloud(&stars, &layers).material.view_height.get(), 1080.0);
    }

    #[test]
    fn skybox_rotates_with_frame_time() {
        let (mut stars, mut layers, _) = build(false, 7);
        stars.update(1000.0, &mut layers);
        stars.update(1000.0, &mut layers);
        assert!((stars.skybox_angle() - 0.02).abs() < 1e-12);
        let rotation = layers.space.get(stars.skybox_id()).unwrap().transform.rotation;
        let expected = Quat::from_rotation_y(0.02);
        assert!(rotation.abs_diff_eq(expected, 1e-6));
    }
}
