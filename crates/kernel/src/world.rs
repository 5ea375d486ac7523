use crate::black_hole::BlackHole;
use crate::stars::StarField;
use horizon_render::SceneLayers;
use horizon_tools::DebugPanel;

/// Everything a world needs at construction, passed explicitly.
pub struct WorldContext<'a> {
    pub layers: &'a mut SceneLayers,
    pub debug: &'a mut DebugPanel,
    /// Initial height of the space layer, for size-attenuated points.
    pub view_height: f32,
    /// Seed for every procedural generator in the world.
    pub seed: u64,
}

/// Timing for one world update, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldFrame {
    pub delta: f64,
    pub elapsed: f64,
}

/// The scene world.
///
/// Entities are optional so partial worlds (e.g. stars only) stay valid; every
/// consumer checks presence before use.
#[derive(Debug, Default)]
pub struct World {
    black_hole: Option<BlackHole>,
    stars: Option<StarField>,
    frames: u64,
}

impl World {
    /// Build the full scene: black hole and star field.
    pub fn new(ctx: &mut WorldContext<'_>) -> Self {
        let black_hole = BlackHole::new(ctx);
        let stars = StarField::new(ctx);
        tracing::info!(
            objects = ctx.layers.object_count(),
            seed = ctx.seed,
            "world created"
        );
        Self {
            black_hole: Some(black_hole),
            stars: Some(stars),
            frames: 0,
        }
    }

    /// A world with no entities.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A world with only the star field.
    pub fn stars_only(ctx: &mut WorldContext<'_>) -> Self {
        Self {
            black_hole: None,
            stars: Some(StarField::new(ctx)),
            frames: 0,
        }
    }

    pub fn black_hole(&self) -> Option<&BlackHole> {
        self.black_hole.as_ref()
    }

    pub fn stars(&self) -> Option<&StarField> {
        self.stars.as_ref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn update(&mut self, frame: WorldFrame, layers: &mut SceneLayers) {
        self.frames += 1;
        tracing::trace!(frame = self.frames, elapsed = frame.elapsed, "world update");
        if let Some(black_hole) = &mut self.black_hole {
            black_hole.update(frame.delta, layers);
        }
        if let Some(stars) = &mut self.stars {
            stars.update(frame.delta, layers);
        }
    }

    pub fn resize(&mut self, view_height: f32) {
        if let Some(black_hole) = &mut self.black_hole {
            black_hole.resize(view_height);
        }
        if let Some(stars) = &mut self.stars {
            stars.resize(view_height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(seed: u64) -> (World, SceneLayers) {
        let mut layers = SceneLayers::new();
        let mut panel = DebugPanel::new(false);
        let world = World::new(&mut WorldContext {
            layers: &mut layers,
            debug: &mut panel,
            view_height: 600.0,
            seed,
        });
        (world, layers)
    }

    #[test]
    fn full_world_fills_all_layers() {
        let (world, layers) = build(1);
        assert!(world.black_hole().is_some());
        assert!(world.stars().is_some());
        assert_eq!(layers.space.len(), 2);
        assert_eq!(layers.distortion.len(), 1);
        assert_eq!(layers.overlay.len(), 1);
    }

    #[test]
    fn empty_world_ignores_updates() {
        let mut world = World::empty();
        let mut layers = SceneLayers::new();
        world.update(
            WorldFrame {
                delta: 16.0,
                elapsed: 16.0,
            },
            &mut layers,
        );
        world.resize(100.0);
        assert_eq!(world.frames(), 1);
        assert!(world.black_hole().is_none());
        assert_eq!(layers.object_count(), 0);
    }

    #[test]
    fn stars_only_has_no_black_hole() {
        let mut layers = SceneLayers::new();
        let mut panel = DebugPanel::new(false);
        let world = World::stars_only(&mut WorldContext {
            layers: &mut layers,
            debug: &mut panel,
            view_height: 600.0,
            seed: 3,
        });
        assert!(world.black_hole().is_none());
        assert!(layers.distortion.is_empty());
    }

    #[test]
    fn update_advances_entities() {
        let (mut world, mut layers) = build(2);
        let frame = WorldFrame {
            delta: 500.0,
            elapsed: 500.0,
        };
        world.update(frame, &mut layers);
        assert!((world.stars().unwrap().skybox_angle() - 0.005).abs() < 1e-12);
        assert!(world.black_hole().unwrap().disk_angle() > 0.0);
    }

    #[test]
    fn resize_reaches_star_field() {
        let (mut world, _layers) = build(4);
        world.resize(1024.0);
        assert_eq!(world.stars().unwrap().view_height(), 1024.0);
    }
}
