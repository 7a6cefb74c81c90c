//! Orrery viewer.
//!
//! Usage:
//!   orrery [--config orrery.toml] [--shape monogram] [--theme dark] [--masks assets/masks]
//!   orrery --snapshot out.png --frames 240 --shape contact

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use orrery::{
    Engine, EngineConfig, HomeLayout, RasterSurface, RunError, ShapeRequest, ThemeMode, Viewer,
    VirtualClock,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "orrery.toml";
const SNAPSHOT_DT: f32 = 1.0 / 60.0;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Layout {
    Planet,
    Drift,
}

impl From<Layout> for HomeLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Planet => HomeLayout::Planet,
            Layout::Drift => HomeLayout::Drift,
        }
    }
}

#[derive(Parser)]
#[command(name = "orrery")]
#[command(about = "A particle planet that morphs into glyphs and icons")]
struct Args {
    /// Path to a TOML config file (defaults to ./orrery.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of particles
    #[arg(long)]
    particles: Option<usize>,

    /// Shape to request at startup (e.g. monogram, code, contact, hobbies)
    #[arg(long)]
    shape: Option<ShapeRequest>,

    /// Theme override: auto, light or dark
    #[arg(long, default_value = "auto")]
    theme: ThemeMode,

    /// Directory of refined shape masks (<shape>.png)
    #[arg(long)]
    masks: Option<PathBuf>,

    /// Idle arrangement
    #[arg(long, value_enum)]
    layout: Option<Layout>,

    /// Render headlessly and write a PNG instead of opening a window
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Frames to simulate before writing the snapshot
    #[arg(long, default_value_t = 180)]
    frames: u32,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Log filter, overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orrery=info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(args: &Args) -> Result<EngineConfig, RunError> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG).is_file() => EngineConfig::load(Path::new(DEFAULT_CONFIG))?,
        None => EngineConfig::default(),
    };
    if let Some(count) = args.particles {
        config = config.with_particle_count(count);
    }
    if let Some(dir) = &args.masks {
        config = config.with_mask_dir(dir);
    }
    if let Some(layout) = args.layout {
        config = config.with_layout(layout.into());
    }
    Ok(config)
}

fn snapshot(mut engine: Engine, args: &Args, path: &Path) -> Result<(), RunError> {
    let mut clock = VirtualClock::new(engine.config().clock.day_seconds, engine.config().clock.start_hours);
    let mut surface = RasterSurface::new(args.width, args.height);
    engine.resize(args.width, args.height);

    for _ in 0..args.frames {
        clock.tick(SNAPSHOT_DT);
        engine.update(SNAPSHOT_DT, clock.hours());
    }
    engine.render(&mut surface)?;
    let status = engine.status();
    info!(
        phase = ?status.phase,
        morph = status.morph,
        hours = status.hours,
        "simulated {} frames",
        args.frames
    );
    surface.save_png(path)?;
    Ok(())
}

fn run(args: Args) -> Result<(), RunError> {
    let config = load_config(&args)?;
    let mut engine = Engine::new(config)?;
    engine.set_theme(args.theme);
    if let Some(request) = args.shape {
        engine.request_shape(request);
    }

    match &args.snapshot {
        Some(path) => snapshot(engine, &args, path),
        None => {
            info!("keys: 0-6 shapes, T theme, H hand control, Space pause, Esc quit");
            Viewer {
                width: args.width,
                height: args.height,
                ..Viewer::default()
            }
            .run(engine)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
