use crate::telemetry::TelemetrySink;
use horizon_assets::{AssetManifest, ResourceSet};
use horizon_common::TargetSurface;
use horizon_render::RenderPipeline;
use std::fmt;
use std::path::PathBuf;

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;
/// Directory assets are resolved against when none is configured.
pub const DEFAULT_ASSET_ROOT: &str = "assets";

/// Everything needed to construct an [`Experience`](crate::Experience).
///
/// Only the target surface is required. Without a pipeline nothing is drawn;
/// without a telemetry sink no telemetry is computed.
pub struct ExperienceOptions {
    pub(crate) target: Option<Box<dyn TargetSurface>>,
    pub(crate) pipeline: Option<Box<dyn RenderPipeline>>,
    pub(crate) telemetry: Option<Box<dyn TelemetrySink>>,
    /// `None` reads the debug flag from the environment.
    pub(crate) debug: Option<bool>,
    pub(crate) manifest: AssetManifest,
    pub(crate) asset_root: PathBuf,
    pub(crate) load_budget: usize,
    pub(crate) seed: u64,
}

impl Default for ExperienceOptions {
    fn default() -> Self {
        Self {
            target: None,
            pipeline: None,
            telemetry: None,
            debug: None,
            manifest: AssetManifest::builtin(),
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
            load_budget: ResourceSet::DEFAULT_LOAD_BUDGET,
            seed: DEFAULT_SEED,
        }
    }
}

impl ExperienceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: impl TargetSurface + 'static) -> Self {
        self.target = Some(Box::new(target));
        self
    }

    pub fn pipeline(mut self, pipeline: impl RenderPipeline + 'static) -> Self {
        self.pipeline = Some(Box::new(pipeline));
        self
    }

    pub fn telemetry(mut self, sink: impl TelemetrySink + 'static) -> Self {
        self.telemetry = Some(Box::new(sink));
        self
    }

    pub fn debug(mut self, active: bool) -> Self {
        self.debug = Some(active);
        self
    }

    pub fn manifest(mut self, manifest: AssetManifest) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn load_budget(mut self, budget: usize) -> Self {
        self.load_budget = budget;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }
}

impl fmt::Debug for ExperienceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExperienceOptions")
            .field("target", &self.target.is_some())
            .field("pipeline", &self.pipeline.is_some())
            .field("telemetry", &self.telemetry.is_some())
            .field("debug", &self.debug)
            .field("assets", &self.manifest.len())
            .field("asset_root", &self.asset_root)
            .field("load_budget", &self.load_budget)
            .field("seed", &self.seed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_common::FixedSurface;

    #[test]
    fn defaults() {
        let options = ExperienceOptions::new();
        assert!(!options.has_target());
        assert_eq!(options.seed, DEFAULT_SEED);
        assert_eq!(options.manifest, AssetManifest::builtin());
        assert_eq!(options.load_budget, 1);
        assert_eq!(options.debug, None);
    }

    #[test]
    fn builder_sets_fields() {
        let options = ExperienceOptions::new()
            .target(FixedSurface::new(800.0, 600.0, 1.0))
            .debug(true)
            .seed(7)
            .asset_root("/tmp/x");
        assert!(options.has_target());
        assert_eq!(options.debug, Some(true));
        assert_eq!(options.seed, 7);
        assert_eq!(options.asset_root, PathBuf::from("/tmp/x"));
        assert!(format!("{options:?}").contains("seed: 7"));
    }
}
