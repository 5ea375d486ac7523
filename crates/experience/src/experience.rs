use crate::ExperienceError;
use crate::options::ExperienceOptions;
use crate::schedule::{FrameScheduler, StopHandle, Tick};
use crate::telemetry::{TelemetrySink, TelemetrySnapshot};
use glam::DVec3;
use horizon_assets::ResourceSet;
use horizon_common::{
    Clock, DEFAULT_DELTA_MS, RenderConfig, SubscriptionId, TargetSurface, ViewportTracker,
};
use horizon_kernel::{BlackHole, World, WorldContext, WorldFrame};
use horizon_render::{CameraRig, Frame, RenderPipeline, SceneLayers};
use horizon_tools::{DebugPanel, PerfOverlay};

/// The frame orchestrator.
///
/// Owns every subsystem, runs them in a fixed order each frame, forwards
/// resize events and publishes telemetry. An experience built without a target
/// surface is degenerate: it owns nothing and every operation is a no-op.
pub struct Experience {
    systems: Option<Systems>,
    stop: StopHandle,
}

struct Systems {
    target: Box<dyn TargetSurface>,
    config: RenderConfig,
    clock: Clock,
    viewport: ViewportTracker,
    subscription: Option<SubscriptionId>,
    debug: DebugPanel,
    perf: Option<PerfOverlay>,
    layers: SceneLayers,
    camera: CameraRig,
    renderer: Option<Box<dyn RenderPipeline>>,
    resources: ResourceSet,
    world: Option<World>,
    telemetry: Option<Box<dyn TelemetrySink>>,
    last_telemetry: Option<TelemetrySnapshot>,
    previous_position: DVec3,
    seed: u64,
}

impl Experience {
    /// Build an experience. A missing target is logged and yields a degenerate
    /// instance instead of an error.
    pub fn new(options: ExperienceOptions) -> Self {
        match Self::try_new(options) {
            Ok(experience) => experience,
            Err(e) => {
                tracing::warn!("{e}; experience is not operational");
                Self::degenerate()
            }
        }
    }

    /// Build an experience, failing when no target surface was provided.
    pub fn try_new(options: ExperienceOptions) -> Result<Self, ExperienceError> {
        let ExperienceOptions {
            target,
            pipeline,
            telemetry,
            debug,
            manifest,
            asset_root,
            load_budget,
            seed,
        } = options;
        let target = target.ok_or(ExperienceError::MissingTarget)?;

        let clock = Clock::new();
        let bounds = target.bounds();
        let mut viewport =
            ViewportTracker::new(bounds.width, bounds.height, target.device_pixel_ratio());
        let config = RenderConfig::measure_initial(target.as_ref());

        let mut debug = debug.map(DebugPanel::new).unwrap_or_else(DebugPanel::from_env);
        let perf = debug.active().then(PerfOverlay::new);

        let mut layers = SceneLayers::new();
        let camera = CameraRig::new(&config);

        let renderer = pipeline.and_then(|mut pipeline| {
            match pipeline.attach(target.as_ref(), &config) {
                Ok(()) => Some(pipeline),
                Err(e) => {
                    tracing::error!("render pipeline failed to attach: {e}");
                    None
                }
            }
        });

        let resources = ResourceSet::new(manifest, asset_root).with_load_budget(load_budget);

        let view_height = renderer
            .as_ref()
            .map(|r| r.space_height())
            .unwrap_or(config.height);
        let world = World::new(&mut WorldContext {
            layers: &mut layers,
            debug: &mut debug,
            view_height,
            seed,
        });

        let previous_position = camera.position;
        let subscription = Some(viewport.subscribe());

        let debug_active = debug.active();
        tracing::info!(
            width = config.width,
            height = config.height,
            pixel_ratio = config.pixel_ratio,
            renderer = renderer.is_some(),
            telemetry = telemetry.is_some(),
            debug_active,
            seed,
            "experience started"
        );

        let mut experience = Self {
            systems: Some(Systems {
                target,
                config,
                clock,
                viewport,
                subscription,
                debug,
                perf,
                layers,
                camera,
                renderer,
                resources,
                world: Some(world),
                telemetry,
                last_telemetry: None,
                previous_position,
                seed,
            }),
            stop: StopHandle::new(),
        };
        experience.step(DEFAULT_DELTA_MS);
        Ok(experience)
    }

    fn degenerate() -> Self {
        Self {
            systems: None,
            stop: StopHandle::new(),
        }
    }

    pub fn is_operational(&self) -> bool {
        self.systems.is_some()
    }

    /// Run one frame timed by the wall clock.
    pub fn update(&mut self) {
        self.frame(Tick::Wall);
    }

    /// Run one frame with an explicit delta in milliseconds.
    pub fn step(&mut self, delta_ms: f64) {
        self.frame(Tick::Fixed(delta_ms));
    }

    fn frame(&mut self, tick: Tick) {
        if self.stop.is_stopped() {
            return;
        }
        let Some(s) = &mut self.systems else {
            return;
        };

        match tick {
            Tick::Wall => s.clock.tick(),
            Tick::Fixed(delta) => s.clock.advance(delta),
        }
        let _span = tracing::trace_span!("frame", n = s.clock.frames()).entered();

        if let Some(id) = s.subscription {
            for _ in 0..s.viewport.drain(id) {
                s.resize();
            }
        }
        s.resources.poll();

        let delta = s.clock.delta();
        if let Some(perf) = &mut s.perf {
            perf.update(delta);
        }
        if let Some(world) = &mut s.world {
            world.update(
                WorldFrame {
                    delta,
                    elapsed: s.clock.elapsed(),
                },
                &mut s.layers,
            );
        }
        s.camera.update();

        if let Some(renderer) = &mut s.renderer {
            let frame = Frame {
                layers: &s.layers,
                camera: &s.camera,
                resources: &s.resources,
                config: &s.config,
            };
            if let Err(e) = renderer.update(&frame) {
                tracing::error!("render failed: {e}");
            }
        }

        s.publish_telemetry(delta);
    }

    /// Re-measure the target and forward the new size to every subsystem.
    pub fn resize(&mut self) {
        if let Some(s) = &mut self.systems {
            s.resize();
        }
    }

    /// Drive frames from `scheduler` until it ends or the experience stops.
    /// Returns the number of frames run.
    pub fn run(&mut self, scheduler: &mut dyn FrameScheduler) -> u64 {
        if !self.is_operational() {
            return 0;
        }
        let mut frames = 0;
        while !self.stop.is_stopped() {
            let Some(tick) = scheduler.next_frame() else {
                break;
            };
            if self.stop.is_stopped() {
                break;
            }
            self.frame(tick);
            frames += 1;
        }
        tracing::debug!(frames, "run loop finished");
        frames
    }

    /// Stop the loop and unsubscribe from viewport changes.
    pub fn stop(&mut self) {
        self.stop.stop();
        if let Some(s) = &mut self.systems {
            if let Some(id) = s.subscription.take() {
                s.viewport.unsubscribe(id);
                tracing::info!(frames = s.clock.frames(), "experience stopped");
            }
        }
    }

    pub fn destroy(&mut self) {
        self.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Token that stops the loop from anywhere, including other threads.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Record a new surface size; subsystems follow on the next frame.
    pub fn observe_viewport(&mut self, width: f32, height: f32, pixel_ratio: f64) {
        if let Some(s) = &mut self.systems {
            s.viewport.observe(width, height, pixel_ratio);
        }
    }

    pub fn config(&self) -> Option<&RenderConfig> {
        self.systems.as_ref().map(|s| &s.config)
    }

    pub fn clock(&self) -> Option<&Clock> {
        self.systems.as_ref().map(|s| &s.clock)
    }

    pub fn viewport(&self) -> Option<&ViewportTracker> {
        self.systems.as_ref().map(|s| &s.viewport)
    }

    pub fn camera(&self) -> Option<&CameraRig> {
        self.systems.as_ref().map(|s| &s.camera)
    }

    pub fn camera_mut(&mut self) -> Option<&mut CameraRig> {
        self.systems.as_mut().map(|s| &mut s.camera)
    }

    pub fn layers(&self) -> Option<&SceneLayers> {
        self.systems.as_ref().map(|s| &s.layers)
    }

    pub fn world(&self) -> Option<&World> {
        self.systems.as_ref().and_then(|s| s.world.as_ref())
    }

    pub fn black_hole(&self) -> Option<&BlackHole> {
        self.world().and_then(World::black_hole)
    }

    pub fn resources(&self) -> Option<&ResourceSet> {
        self.systems.as_ref().map(|s| &s.resources)
    }

    pub fn debug_panel(&self) -> Option<&DebugPanel> {
        self.systems.as_ref().map(|s| &s.debug)
    }

    pub fn perf(&self) -> Option<&PerfOverlay> {
        self.systems.as_ref().and_then(|s| s.perf.as_ref())
    }

    pub fn has_renderer(&self) -> bool {
        self.systems.as_ref().is_some_and(|s| s.renderer.is_some())
    }

    /// Telemetry from the most recent frame that computed it.
    pub fn telemetry(&self) -> Option<TelemetrySnapshot> {
        self.systems.as_ref().and_then(|s| s.last_telemetry)
    }

    pub fn seed(&self) -> Option<u64> {
        self.systems.as_ref().map(|s| s.seed)
    }
}

impl Systems {
    fn resize(&mut self) {
        self.config = RenderConfig::measure(self.target.as_ref());
        tracing::debug!(
            width = self.config.width,
            height = self.config.height,
            pixel_ratio = self.config.pixel_ratio,
            "resize"
        );
        self.camera.resize(&self.config);
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(&self.config);
        }
        if let Some(world) = &mut self.world {
            world.resize(self.viewport.height());
        }
    }

    fn publish_telemetry(&mut self, delta: f64) {
        let Some(sink) = self.telemetry.as_deref_mut() else {
            return;
        };
        let Some(radius) = self
            .world
            .as_ref()
            .and_then(World::black_hole)
            .and_then(BlackHole::event_horizon_radius)
        else {
            return;
        };

        let position = self.camera.position;
        let snapshot = TelemetrySnapshot::compute(
            position,
            self.previous_position,
            delta,
            f64::from(radius),
        );
        snapshot.publish(sink);
        self.previous_position = position;
        self.last_telemetry = Some(snapshot);
    }
}

impl std::fmt::Debug for Experience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("Experience");
        d.field("operational", &self.is_operational())
            .field("stopped", &self.is_stopped());
        if let Some(s) = &self.systems {
            d.field("config", &s.config)
                .field("frames", &s.clock.frames())
                .field("objects", &s.layers.object_count())
                .field("renderer", &s.renderer.is_some());
        }
        d.finish()
    }
}
