use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use orbitview_assets::{ObjExporter, write_png};
use orbitview_common::ShadingMode;
use orbitview_input::Action;
use orbitview_kernel::{NullPresenter, Viewer, ViewerConfig};
use orbitview_model::{FitConfig, ProceduralConfig, ProceduralSource, ShapeFitter};
use orbitview_schedule::{ScheduleDecision, StepScheduler};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orbitview-cli", about = "Headless orbitview viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    view: ViewArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Viewer overrides applied on top of the config file.
#[derive(Args)]
struct ViewArgs {
    /// JSON viewer config
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Viewport width in pixels
    #[arg(long, global = true)]
    width: Option<u32>,
    /// Viewport height in pixels
    #[arg(long, global = true)]
    height: Option<u32>,
    /// Camera distance from the orbit center
    #[arg(long, global = true)]
    radius: Option<f32>,
    /// Vertical field of view in degrees
    #[arg(long, global = true)]
    fovy: Option<f32>,
    /// Seed sequence start state
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Latitude bands of the generated mesh
    #[arg(long, global = true, default_value = "48")]
    rings: u32,
    /// Longitude slices of the generated mesh
    #[arg(long, global = true, default_value = "96")]
    segments: u32,
}

impl ViewArgs {
    fn load(&self) -> anyhow::Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)?,
            None => ViewerConfig::default(),
        };
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(radius) = self.radius {
            config.radius = radius;
        }
        if let Some(fovy) = self.fovy {
            config.fovy = fovy;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }

    fn source(&self) -> ProceduralSource {
        ProceduralSource::new(ProceduralConfig {
            rings: self.rings,
            segments: self.segments,
            ..ProceduralConfig::default()
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the effective config
    Info,
    /// Generate a mesh and render one frame to PNG
    Render {
        /// Output PNG path
        #[arg(short, long, default_value = "frame.png")]
        output: PathBuf,
        /// Shading mode: depth, albedo, normal or lambertian
        #[arg(short, long)]
        mode: Option<ShadingMode>,
        /// Horizontal orbit drag in pixels before rendering
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        orbit_x: f32,
        /// Vertical orbit drag in pixels before rendering
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        orbit_y: f32,
    },
    /// Generate a mesh and write it as OBJ + MTL + albedo PNG
    Export {
        #[arg(short, long, default_value = "mesh.obj")]
        output: PathBuf,
    },
    /// Run the frame loop headless with training enabled
    Train {
        /// Number of frames to run
        #[arg(short, long, default_value = "20")]
        frames: u32,
        /// Seed of the shape the fitter pulls toward
        #[arg(long, default_value = "1")]
        target: u64,
        /// Write the last frame here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Trace scheduler decisions for a synthetic per-unit cost
    Schedule {
        /// Milliseconds one unit of work takes
        #[arg(long, default_value = "62.5")]
        unit_ms: f64,
        /// Number of observations
        #[arg(short, long, default_value = "10")]
        steps: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = cli.view.load()?;

    match cli.command {
        Commands::Info => {
            println!("orbitview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", orbitview_common::crate_info());
            println!("render: {}", orbitview_render::crate_info());
            println!("schedule: {}", orbitview_schedule::crate_info());
            println!("input: {}", orbitview_input::crate_info());
            println!("kernel: {}", orbitview_kernel::crate_info());
            println!("model: {}", orbitview_model::crate_info());
            println!("assets: {}", orbitview_assets::crate_info());
            println!("config: {}", config.to_json_pretty()?);
        }
        Commands::Render {
            output,
            mode,
            orbit_x,
            orbit_y,
        } => {
            let mut viewer = Viewer::new(&config)?;
            let seeds = viewer.generate(&mut cli.view.source())?;
            if let Some(mode) = mode {
                viewer.apply(&Action::SetShading(mode));
            }
            viewer.apply(&Action::Orbit {
                dx: orbit_x,
                dy: orbit_y,
            });
            if !viewer.render() {
                anyhow::bail!("render produced no image");
            }
            let buffer = viewer.color_buffer();
            write_png(buffer, &output)?;
            println!("{seeds}");
            println!("{}  {}", buffer.digest(), output.display());
            println!("{}", viewer.log().infer_time_line());
        }
        Commands::Export { output } => {
            let mut viewer = Viewer::new(&config)?;
            let mut exporter = ObjExporter::new();
            viewer.handle(Action::GenerateMesh, &mut cli.view.source(), &mut exporter)?;
            viewer.handle(
                Action::ExportMesh(output),
                &mut cli.view.source(),
                &mut exporter,
            )?;
            if let Some(files) = exporter.last() {
                println!("{}", files.obj.display());
                println!("{}", files.mtl.display());
                println!("{}", files.texture.display());
            }
        }
        Commands::Train {
            frames,
            target,
            output,
        } => {
            let mut viewer = Viewer::new(&config)?;
            viewer.generate(&mut cli.view.source())?;
            viewer.set_training(true);
            let mut fitter = ShapeFitter::new(target, FitConfig::default());
            for _ in 0..frames {
                let report = viewer.frame(&mut fitter, &mut NullPresenter);
                if !viewer.training_enabled() {
                    anyhow::bail!("training stopped after {} steps", viewer.log().steps());
                }
                tracing::debug!(units = report.trained_units, rendered = report.rendered, "frame");
                println!("{}", viewer.log().progress_line());
            }
            println!("train: {}", viewer.log().train_time_line());
            println!("infer: {}", viewer.log().infer_time_line());
            if let Some(output) = output {
                write_png(viewer.color_buffer(), &output)?;
                println!("{}  {}", viewer.color_buffer().digest(), output.display());
            }
        }
        Commands::Schedule { unit_ms, steps } => {
            let mut scheduler = StepScheduler::new(config.scheduler)?;
            println!(
                "target={}ms hysteresis={} start={}",
                config.scheduler.target_ms,
                config.scheduler.hysteresis,
                scheduler.unit_size()
            );
            for step in 0..steps {
                let units = scheduler.unit_size();
                let t_ms = units as f64 * unit_ms;
                let decision = scheduler.observe(units, t_ms);
                let outcome = match decision {
                    ScheduleDecision::Skipped => "skipped".to_string(),
                    ScheduleDecision::Kept { candidate, .. } => format!("kept (candidate {candidate})"),
                    ScheduleDecision::Resized { from, to } => format!("resized {from} -> {to}"),
                };
                println!("{step:3}: units={units:3} t={t_ms:8.1}ms {outcome}");
            }
        }
    }

    Ok(())
}
