//! wgpu render backend for the event horizon scene.
//!
//! Composites the `space`, `distortion` and `overlay` layers into a window
//! surface. Overlays such as egui paint into the same surface texture before it
//! is presented.
//!
//! # Invariants
//! - The pipeline never mutates scene layers.
//! - Colors are stored sRGB in the scene and converted to linear on upload.
//! - At most one surface texture is held between `update` and presentation.

mod gpu;
mod shaders;

pub use gpu::{OverlayTarget, WgpuPipeline, sphere_in_frustum, srgb_to_linear};
