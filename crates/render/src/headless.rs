use crate::layer::{Renderable, SceneLayer};
use crate::pipeline::{Frame, RenderError, RenderPipeline};
use horizon_common::{RenderConfig, TargetSurface};
use std::fmt::Write;

/// Headless pipeline: composes each frame into a text summary.
///
/// Useful for CLI runs, logging, and exercising the frame loop without a GPU.
#[derive(Debug, Default)]
pub struct HeadlessPipeline {
    config: Option<RenderConfig>,
    frames: u64,
    resizes: u64,
    last_output: String,
}

impl HeadlessPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn resize_count(&self) -> u64 {
        self.resizes
    }

    pub fn config(&self) -> Option<&RenderConfig> {
        self.config.as_ref()
    }

    /// Summary of the most recent frame.
    pub fn last_output(&self) -> &str {
        &self.last_output
    }
}

impl RenderPipeline for HeadlessPipeline {
    fn attach(
        &mut self,
        _target: &dyn TargetSurface,
        config: &RenderConfig,
    ) -> Result<(), RenderError> {
        self.config = Some(*config);
        Ok(())
    }

    fn update(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        let config = self.config.ok_or(RenderError::NotAttached)?;
        self.frames += 1;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({:.0}x{:.0} @{}x) ===",
            self.frames, config.width, config.height, config.pixel_ratio
        );
        let p = frame.camera.position;
        let _ = writeln!(out, "Camera: pos=({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
        for layer in frame.layers.iter() {
            describe_layer(&mut out, layer);
        }
        self.last_output = out;
        Ok(())
    }

    fn resize(&mut self, config: &RenderConfig) {
        self.config = Some(*config);
        self.resizes += 1;
    }

    fn space_height(&self) -> f32 {
        self.config.map(|c| c.height).unwrap_or(0.0)
    }
}

fn describe_layer(out: &mut String, layer: &SceneLayer) {
    let _ = writeln!(out, "Layer {}: {} objects", layer.kind().name(), layer.len());
    for object in layer.objects().iter().filter(|o| o.visible) {
        match &object.body {
            Renderable::Mesh(mesh) => {
                let _ = writeln!(
                    out,
                    "  mesh {} r={:.1}{}",
                    object.name,
                    mesh.geometry.radius,
                    if mesh.material.wireframe.get() {
                        " wireframe"
                    } else {
                        ""
                    }
                );
            }
            Renderable::Points(points) => {
                let _ = writeln!(
                    out,
                    "  points {} n={} view_height={:.0}",
                    object.name,
                    points.len(),
                    points.material.view_height.get()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraRig;
    use crate::geometry::SphereGeometry;
    use crate::layer::{Mesh, MeshMaterial, SceneLayers, SceneObject};
    use horizon_assets::ResourceSet;
    use horizon_common::FixedSurface;

    fn config() -> RenderConfig {
        RenderConfig {
            pixel_ratio: 1.0,
            width: 800.0,
            height: 600.0,
        }
    }

    #[test]
    fn update_requires_attach() {
        let mut pipeline = HeadlessPipeline::new();
        let layers = SceneLayers::new();
        let camera = CameraRig::default();
        let resources = ResourceSet::empty();
        let cfg = config();
        let frame = Frame {
            layers: &layers,
            camera: &camera,
            resources: &resources,
            config: &cfg,
        };
        assert!(matches!(
            pipeline.update(&frame),
            Err(RenderError::NotAttached)
        ));
    }

    #[test]
    fn frame_summary_lists_layers() {
        let mut pipeline = HeadlessPipeline::new();
        let surface = FixedSurface::new(800.0, 600.0, 1.0);
        pipeline.attach(&surface, &config()).unwrap();

        let mut layers = SceneLayers::new();
        layers.distortion.add(SceneObject::new(
            "horizon",
            Renderable::Mesh(Mesh {
                geometry: SphereGeometry::new(5.0, 8, 8),
                material: MeshMaterial::default(),
            }),
        ));
        let camera = CameraRig::default();
        let resources = ResourceSet::empty();
        let cfg = config();
        pipeline
            .update(&Frame {
                layers: &layers,
                camera: &camera,
                resources: &resources,
                config: &cfg,
            })
            .unwrap();

        let out = pipeline.last_output();
        assert!(out.contains("Frame 1"));
        assert!(out.contains("Layer space: 0 objects"));
        assert!(out.contains("mesh horizon r=5.0"));
        assert_eq!(pipeline.frames(), 1);
    }

    #[test]
    fn resize_updates_space_height() {
        let mut pipeline = HeadlessPipeline::new();
        assert_eq!(pipeline.space_height(), 0.0);
        pipeline.resize(&RenderConfig {
            height: 720.0,
            ..config()
        });
        assert_eq!(pipeline.space_height(), 720.0);
        assert_eq!(pipeline.resize_count(), 1);
    }
}
