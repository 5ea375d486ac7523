use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use glam::{DVec3, Vec3};
use horizon_assets::AssetManifest;
use horizon_common::FixedSurface;
use horizon_experience::{
    DEFAULT_ASSET_ROOT, DEFAULT_SEED, Experience, ExperienceOptions, FixedRateScheduler,
    FixedStepScheduler, FrameScheduler, TelemetryText, Tick,
};
use horizon_kernel::stars::STAR_SHELL_RADIUS;
use horizon_kernel::{STAR_COUNT, StarSample};
use horizon_render::HeadlessPipeline;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "horizon-cli", about = "Headless event horizon runs")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Dive the camera toward the event horizon and print telemetry
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Seed for the procedural star field
        #[arg(short, long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Frame delta in milliseconds
        #[arg(short, long, default_value = "16.0")]
        delta: f64,
        /// Surface width in logical pixels
        #[arg(long, default_value = "1280")]
        width: f32,
        /// Surface height in logical pixels
        #[arg(long, default_value = "720")]
        height: f32,
        /// Print telemetry every N frames
        #[arg(long, default_value = "10")]
        every: u64,
        /// Asset directory
        #[arg(long, default_value = DEFAULT_ASSET_ROOT)]
        assets: PathBuf,
    },
    /// Run the frame loop in real time without moving the camera
    Run {
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Target frames per second
        #[arg(long, default_value = "60")]
        fps: f64,
        /// Seed for the procedural star field
        #[arg(short, long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Print statistics of a generated star sample
    Stars {
        /// RNG seed
        #[arg(short, long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Number of stars
        #[arg(short, long, default_value_t = STAR_COUNT)]
        count: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("horizon-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", horizon_common::crate_info());
            println!("assets: {}", horizon_assets::crate_info());
            println!("render: {}", horizon_render::crate_info());
            println!("tools: {}", horizon_tools::crate_info());
            println!("input: {}", horizon_input::crate_info());
            println!("kernel: {}", horizon_kernel::crate_info());
            println!("experience: {}", horizon_experience::crate_info());
        }
        Commands::Simulate {
            frames,
            seed,
            delta,
            width,
            height,
            every,
            assets,
        } => simulate(frames, seed, delta, width, height, every.max(1), assets)?,
        Commands::Run { frames, fps, seed } => {
            if fps.is_nan() || fps <= 0.0 {
                bail!("fps must be positive, got {fps}");
            }
            let pipeline = Rc::new(RefCell::new(HeadlessPipeline::new()));
            let mut experience = Experience::try_new(
                ExperienceOptions::new()
                    .target(FixedSurface::new(1280.0, 720.0, 1.0))
                    .pipeline(pipeline.clone())
                    .manifest(AssetManifest::default())
                    .debug(true)
                    .seed(seed),
            )?;
            let mut scheduler = FixedRateScheduler::new(fps).with_limit(frames);
            let ran = experience.run(&mut scheduler);
            println!("Ran {ran} frames at {fps} fps target");
            if let Some(perf) = experience.perf() {
                println!("{perf}");
            }
            experience.destroy();
        }
        Commands::Stars { seed, count } => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let sample = StarSample::generate(&mut rng, count, STAR_SHELL_RADIUS);
            print_star_stats(&sample, seed);
        }
    }

    Ok(())
}

fn simulate(
    frames: u64,
    seed: u64,
    delta: f64,
    width: f32,
    height: f32,
    every: u64,
    assets: PathBuf,
) -> anyhow::Result<()> {
    let pipeline = Rc::new(RefCell::new(HeadlessPipeline::new()));
    let telemetry = Rc::new(RefCell::new(TelemetryText::default()));
    let mut experience = Experience::try_new(
        ExperienceOptions::new()
            .target(FixedSurface::new(width, height, 1.0))
            .pipeline(pipeline.clone())
            .telemetry(telemetry.clone())
            .asset_root(assets)
            .debug(false)
            .seed(seed),
    )?;

    let radius = experience
        .black_hole()
        .and_then(|b| b.event_horizon_radius())
        .context("experience has no event horizon")?;
    let start = experience
        .camera()
        .map(|c| c.position)
        .context("experience has no camera")?;
    let end = start.try_normalize().unwrap_or(DVec3::Z) * f64::from(radius + 1.0);

    println!("Dive: seed={seed}, frames={frames}, delta={delta}ms, horizon r={radius}");
    let mut scheduler = FixedStepScheduler::new(frames, delta);
    let mut frame = 0u64;
    while let Some(tick) = scheduler.next_frame() {
        frame += 1;
        let t = frame as f64 / frames.max(1) as f64;
        if let Some(camera) = experience.camera_mut() {
            camera.position = start.lerp(end, t);
            camera.look_at(Vec3::ZERO);
        }
        match tick {
            Tick::Fixed(delta_ms) => experience.step(delta_ms),
            Tick::Wall => experience.update(),
        }
        if frame % every == 0 || frame == frames {
            let text = telemetry.borrow();
            println!(
                "[{frame:>5}] {:<16} {:<12} {}",
                text.distance, text.velocity, text.dilation
            );
        }
    }

    println!("{}", pipeline.borrow().last_output());
    experience.destroy();
    Ok(())
}

fn print_star_stats(sample: &StarSample, seed: u64) {
    println!("Stars: seed={seed}, count={}", sample.len());
    if sample.is_empty() {
        return;
    }

    let n = sample.len() as f32;
    let radii = sample.positions.iter().map(|p| p.length());
    let (min_r, max_r) = radii.fold((f32::MAX, f32::MIN), |(lo, hi), r| (lo.min(r), hi.max(r)));
    let centroid = sample.positions.iter().copied().sum::<Vec3>() / n;
    let (min_s, max_s) = sample
        .sizes
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    let mean_s = sample.sizes.iter().sum::<f32>() / n;
    let mean_color = sample.colors.iter().fold([0.0f32; 3], |acc, c| {
        [acc[0] + c[0] / n, acc[1] + c[1] / n, acc[2] + c[2] / n]
    });

    println!("radius: {min_r:.2}..{max_r:.2}");
    println!(
        "centroid: ({:.2}, {:.2}, {:.2})",
        centroid.x, centroid.y, centroid.z
    );
    println!("size: {min_s:.3}..{max_s:.3} (mean {mean_s:.3})");
    println!(
        "mean color: ({:.3}, {:.3}, {:.3})",
        mean_color[0], mean_color[1], mean_color[2]
    );
}
