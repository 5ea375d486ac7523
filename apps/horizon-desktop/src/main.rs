use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use horizon_assets::AssetManifest;
use horizon_common::{SurfaceBounds, TargetSurface};
use horizon_experience::{
    DEFAULT_ASSET_ROOT, DEFAULT_SEED, Experience, ExperienceHost, ExperienceOptions,
    TelemetryText,
};
use horizon_input::{Action, HeldActions, KeyBindings};
use horizon_render_wgpu::{OverlayTarget, WgpuPipeline};
use horizon_tools::Control;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "horizon-desktop", about = "Fly toward a black hole")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Show the debug panel (otherwise HORIZON_DEBUG decides)
    #[arg(long)]
    debug: bool,

    /// Asset directory holding manifest.json and textures
    #[arg(long, default_value = DEFAULT_ASSET_ROOT)]
    assets: PathBuf,

    /// Seed for the procedural star field
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

/// What the experience is launched with once a window exists.
struct Settings {
    manifest: AssetManifest,
    assets: PathBuf,
    seed: u64,
    debug: bool,
}

impl Settings {
    fn from_cli(cli: &Cli) -> Result<Self> {
        let path = cli.assets.join("manifest.json");
        let manifest = if path.exists() {
            AssetManifest::load(&path)
                .with_context(|| format!("failed to read {}", path.display()))?
        } else {
            tracing::debug!("no manifest at {}, using builtin", path.display());
            AssetManifest::builtin()
        };
        Ok(Self {
            manifest,
            assets: cli.assets.clone(),
            seed: cli.seed,
            debug: cli.debug,
        })
    }
}

/// A winit window measured in logical pixels.
struct WindowTarget(Arc<Window>);

impl TargetSurface for WindowTarget {
    fn bounds(&self) -> SurfaceBounds {
        let size: LogicalSize<f32> = self.0.inner_size().to_logical(self.0.scale_factor());
        SurfaceBounds::new(size.width, size.height)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.0.scale_factor()
    }
}

struct App {
    settings: Settings,
    host: ExperienceHost,
    window: Option<Arc<Window>>,
    pipeline: Option<Rc<RefCell<WgpuPipeline>>>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    telemetry: Rc<RefCell<TelemetryText>>,
    bindings: KeyBindings,
    held: HeldActions,
    mouse_captured: bool,
    show_panel: bool,
    last_frame: Instant,
}

impl App {
    fn new(settings: Settings) -> Self {
        Self {
            settings,
            host: ExperienceHost::new(),
            window: None,
            pipeline: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
            telemetry: Rc::new(RefCell::new(TelemetryText::default())),
            bindings: KeyBindings::default(),
            held: HeldActions::new(),
            mouse_captured: false,
            show_panel: true,
            last_frame: Instant::now(),
        }
    }

    fn handle_key(&mut self, key: &str, pressed: bool, event_loop: &ActiveEventLoop) {
        let Some(action) = self.bindings.lookup(key) else {
            return;
        };
        match self.held.handle(action, pressed) {
            Some(Action::ToggleDebugPanel) => self.show_panel = !self.show_panel,
            Some(Action::Quit) => {
                if let Some(experience) = self.host.get_mut() {
                    experience.stop();
                }
                event_loop.exit();
            }
            _ => {}
        }
    }

    fn observe_window(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let bounds = WindowTarget(window.clone()).bounds();
        if let Some(experience) = self.host.get_mut() {
            experience.observe_viewport(bounds.width, bounds.height, window.scale_factor());
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        let Some(experience) = self.host.get_mut() else {
            return;
        };
        if experience.is_stopped() {
            return;
        }
        let axis = self.held.movement_axis();
        let boosted = self.held.boosted();
        if let Some(camera) = experience.camera_mut() {
            camera.fly(axis, dt, boosted);
        }
        experience.update();
        let experience: &Experience = experience;

        let (Some(window), Some(pipeline), Some(egui_winit), Some(egui_renderer)) = (
            &self.window,
            &self.pipeline,
            &mut self.egui_winit,
            &mut self.egui_renderer,
        ) else {
            return;
        };

        let raw_input = egui_winit.take_egui_input(window);
        let telemetry = self.telemetry.borrow();
        let show_panel = self.show_panel;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            draw_ui(ctx, experience, &telemetry, show_panel);
        });
        drop(telemetry);
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let pixels_per_point = full_output.pixels_per_point;
        let paint_jobs = self.egui_ctx.tessellate(full_output.shapes, pixels_per_point);
        let textures = full_output.textures_delta;
        pipeline.borrow_mut().finish_frame(|target| {
            paint_overlay(egui_renderer, target, &paint_jobs, &textures, pixels_per_point);
        });
        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Event Horizon")
            .with_inner_size(LogicalSize::new(1280.0, 720.0));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        let pipeline = match WgpuPipeline::new(window.clone()) {
            Ok(pipeline) => Rc::new(RefCell::new(pipeline)),
            Err(e) => {
                tracing::error!("failed to initialize GPU: {e}");
                event_loop.exit();
                return;
            }
        };

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = {
            let pipeline = pipeline.borrow();
            egui_wgpu::Renderer::new(pipeline.device(), pipeline.surface_format(), None, 1, false)
        };

        let mut options = ExperienceOptions::new()
            .target(WindowTarget(window.clone()))
            .pipeline(pipeline.clone())
            .telemetry(self.telemetry.clone())
            .manifest(self.settings.manifest.clone())
            .asset_root(self.settings.assets.clone())
            .seed(self.settings.seed);
        if self.settings.debug {
            options = options.debug(true);
        }
        let experience = self.host.launch(options);
        self.show_panel = experience.debug_panel().is_some_and(|d| d.active());

        self.window = Some(window);
        self.pipeline = Some(pipeline);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        self.last_frame = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            if egui_winit.on_window_event(window, &event).consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.host.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.observe_window();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                let name = format!("{key:?}");
                self.handle_key(&name, state == ElementState::Pressed, event_loop);
            }
            WindowEvent::Focused(false) => self.held.clear(),
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state,
                ..
            } => {
                self.mouse_captured = state == ElementState::Pressed;
                if let Some(window) = &self.window {
                    window.set_cursor_visible(!self.mouse_captured);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if !self.mouse_captured {
                return;
            }
            if let Some(camera) = self.host.get_mut().and_then(Experience::camera_mut) {
                camera.rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// Telemetry HUD plus, when shown, the debug panel's folders.
fn draw_ui(ctx: &EguiContext, experience: &Experience, telemetry: &TelemetryText, show_panel: bool) {
    egui::Area::new(egui::Id::new("telemetry"))
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(16.0, -16.0))
        .show(ctx, |ui| {
            for line in [&telemetry.distance, &telemetry.velocity, &telemetry.dilation] {
                ui.label(egui::RichText::new(line).monospace().color(egui::Color32::WHITE));
            }
        });

    let Some(panel) = experience.debug_panel().filter(|d| d.active()) else {
        return;
    };
    if !show_panel {
        return;
    }

    egui::SidePanel::right("debug")
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.heading("Debug");
            if let Some(perf) = experience.perf() {
                ui.monospace(perf.to_string());
            }
            if let Some(camera) = experience.camera() {
                ui.label(format!(
                    "Camera: ({:.1}, {:.1}, {:.1})",
                    camera.position.x, camera.position.y, camera.position.z
                ));
            }
            for folder in panel.folders() {
                ui.separator();
                egui::CollapsingHeader::new(folder.name())
                    .default_open(true)
                    .show(ui, |ui| {
                        for binding in folder.bindings() {
                            match &binding.control {
                                Control::Toggle(value) => {
                                    let mut on = value.get();
                                    if ui.checkbox(&mut on, binding.label.as_str()).changed() {
                                        value.set(on);
                                    }
                                }
                                Control::Slider {
                                    value,
                                    min,
                                    max,
                                    step,
                                } => {
                                    let mut v = value.get();
                                    let slider = egui::Slider::new(&mut v, *min..=*max)
                                        .step_by(f64::from(*step))
                                        .text(binding.label.as_str());
                                    if ui.add(slider).changed() {
                                        value.set(v);
                                    }
                                }
                            }
                        }
                    });
            }
            ui.separator();
            ui.small("F1: Toggle Panel | RMB: Look | WASD: Move | Esc: Quit");
        });
}

fn paint_overlay(
    renderer: &mut egui_wgpu::Renderer,
    target: &OverlayTarget<'_>,
    paint_jobs: &[egui::ClippedPrimitive],
    textures: &egui::TexturesDelta,
    pixels_per_point: f32,
) {
    let screen_descriptor = egui_wgpu::ScreenDescriptor {
        size_in_pixels: target.size_in_pixels,
        pixels_per_point,
    };
    for (id, image_delta) in &textures.set {
        renderer.update_texture(target.device, target.queue, *id, image_delta);
    }
    let mut encoder = target
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
    let callbacks = renderer.update_buffers(
        target.device,
        target.queue,
        &mut encoder,
        paint_jobs,
        &screen_descriptor,
    );
    {
        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            })
            .forget_lifetime();
        renderer.render(&mut pass, paint_jobs, &screen_descriptor);
    }
    target
        .queue
        .submit(callbacks.into_iter().chain(std::iter::once(encoder.finish())));
    for id in &textures.free {
        renderer.free_texture(id);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("horizon-desktop starting");

    let settings = Settings::from_cli(&cli)?;
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(settings);
    event_loop.run_app(&mut app)?;
    app.host.shutdown();

    Ok(())
}
