//! Rendering adapter: renderer-agnostic scene layers and pipeline interface.
//!
//! # Invariants
//! - Pipelines read scene layers and never mutate them.
//! - Each scene object is owned by exactly one layer.
//! - Layers composite in order: space, distortion, overlay.

mod camera;
mod geometry;
mod headless;
mod layer;
mod pipeline;

pub use camera::CameraRig;
pub use geometry::{MeshData, SphereGeometry};
pub use headless::HeadlessPipeline;
pub use layer::{
    LayerKind, Mesh, MeshMaterial, ObjectId, PointCloud, PointsMaterial, Renderable, SceneLayer,
    SceneLayers, SceneObject, Side,
};
pub use pipeline::{Frame, RenderError, RenderPipeline};

pub fn crate_info() -> &'static str {
    "horizon-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
