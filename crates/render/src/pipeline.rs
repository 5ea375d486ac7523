use crate::camera::CameraRig;
use crate::layer::SceneLayers;
use horizon_assets::ResourceSet;
use horizon_common::{RenderConfig, TargetSurface};
use std::cell::RefCell;
use std::rc::Rc;

/// Everything a pipeline reads to produce one frame.
#[derive(Clone, Copy)]
pub struct Frame<'a> {
    pub layers: &'a SceneLayers,
    pub camera: &'a CameraRig,
    pub resources: &'a ResourceSet,
    pub config: &'a RenderConfig,
}

/// Errors from render backends.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("surface error: {0}")]
    Surface(String),
    #[error("device request failed: {0}")]
    Device(String),
    #[error("pipeline is not attached to a target")]
    NotAttached,
}

/// Multi-layer render pipeline. All renderers implement this trait.
///
/// The pipeline composites the `space`, `distortion` and `overlay` layers into
/// the final frame. It reads scene state and never mutates it.
pub trait RenderPipeline {
    /// Bind the pipeline's output to the target surface.
    fn attach(&mut self, target: &dyn TargetSurface, config: &RenderConfig)
    -> Result<(), RenderError>;

    /// Composite one frame.
    fn update(&mut self, frame: &Frame<'_>) -> Result<(), RenderError>;

    /// Follow a new surface size.
    fn resize(&mut self, config: &RenderConfig);

    /// Current viewport height of the space layer, in logical pixels.
    fn space_height(&self) -> f32;
}

/// Lets the owner of a pipeline keep a handle to it after handing it to the
/// experience (the desktop app paints its UI through the same surface).
impl<P: RenderPipeline + ?Sized> RenderPipeline for Rc<RefCell<P>> {
    fn attach(
        &mut self,
        target: &dyn TargetSurface,
        config: &RenderConfig,
    ) -> Result<(), RenderError> {
        self.borrow_mut().attach(target, config)
    }

    fn update(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        self.borrow_mut().update(frame)
    }

    fn resize(&mut self, config: &RenderConfig) {
        self.borrow_mut().resize(config);
    }

    fn space_height(&self) -> f32 {
        self.borrow().space_height()
    }
}
