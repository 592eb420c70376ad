use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nalgebra::Point2;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use gait_renderer::animation::{FramePacer, GaitAnimation, Rig};
use gait_renderer::calibration::{AngleSample, Calibrator};
use gait_renderer::config::Config;
use gait_renderer::kinematics::FrameGeometry;
use gait_renderer::render::{Compositor, SpriteSet, Style};
use gait_renderer::signals::{load_signals, write_angle_table};
use gait_renderer::sink::{FanOut, FrameSink, PngSequenceSink};

const CONFIG_PATH: &str = "config.toml";
const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "avi", "mov"];

/// Render a walking-gait sprite animation from hip/knee/foot signals
#[derive(Parser, Debug)]
#[command(name = "gait-renderer", version = env!("GAIT_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./config.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one frame per input row into a video file or PNG directory
    Render {
        /// Input CSV with Hip, Knee, Foot columns
        input: PathBuf,

        /// Output .mp4/.avi/.mov file, or a directory for PNG frames
        output: PathBuf,

        /// Draw joint markers and bone lines
        #[arg(long)]
        overlay: bool,

        /// Hide the background grid
        #[arg(long)]
        no_grid: bool,

        /// Pace frames at the configured fps
        #[arg(long)]
        realtime: bool,

        /// Show frames in a window while rendering
        #[arg(long)]
        preview: bool,
    },

    /// Write the input table with calibrated angle columns
    Angles {
        input: PathBuf,
        output: PathBuf,
    },

    /// Dump per-frame joint positions and segment angles as JSON
    Geometry {
        input: PathBuf,
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct FrameRecord {
    index: usize,
    angles: AngleSample,
    geometry: FrameGeometry,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load_or_default(CONFIG_PATH)
            .with_context(|| format!("failed to load config {}", CONFIG_PATH))?,
    };

    match cli.command {
        Commands::Render {
            input,
            output,
            overlay,
            no_grid,
            realtime,
            preview,
        } => {
            config.render.overlay |= overlay;
            config.render.show_grid &= !no_grid;
            config.render.realtime |= realtime;
            run_render(&config, &input, &output, preview)
        }
        Commands::Angles { input, output } => run_angles(&config, &input, &output),
        Commands::Geometry { input, output } => run_geometry(&config, &input, &output),
    }
}

fn rig_from_config(config: &Config) -> Rig {
    let [x, y] = config.rig.hip;
    Rig::new(Point2::new(x, y), config.rig.lengths())
}

/// 設定検査と入力読み込み。フレーム処理前に失敗させる。
fn prepare(config: &Config, input: &Path) -> Result<GaitAnimation> {
    config.validate().context("invalid configuration")?;
    let calibrator = Calibrator::from_config(&config.calibration)?;

    let rows = load_signals(input)
        .with_context(|| format!("failed to load signals from {}", input.display()))?;
    tracing::info!(input = %input.display(), rows = rows.len(), "signal table loaded");

    Ok(GaitAnimation::from_rows(&calibrator, rig_from_config(config), &rows))
}

fn is_video_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(feature = "desktop")]
fn open_video(config: &Config, output: &Path) -> Result<Box<dyn FrameSink>> {
    let r = &config.render;
    let sink = gait_renderer::sink::VideoSink::create(output, r.width, r.height, r.fps)?;
    Ok(Box::new(sink))
}

#[cfg(not(feature = "desktop"))]
fn open_video(_config: &Config, output: &Path) -> Result<Box<dyn FrameSink>> {
    anyhow::bail!(
        "video output {} requires the `desktop` feature; pass a directory to write PNG frames",
        output.display()
    )
}

#[cfg(feature = "desktop")]
fn open_preview(config: &Config) -> Result<Box<dyn FrameSink>> {
    let r = &config.render;
    let window = gait_renderer::render::PreviewWindow::new("Gait Preview", r.width, r.height)?;
    Ok(Box::new(window))
}

#[cfg(not(feature = "desktop"))]
fn open_preview(_config: &Config) -> Result<Box<dyn FrameSink>> {
    anyhow::bail!("--preview requires the `desktop` feature")
}

fn run_render(config: &Config, input: &Path, output: &Path, preview: bool) -> Result<()> {
    let animation = prepare(config, input)?;

    let sprites = SpriteSet::load(&config.assets, &config.rig.lengths())
        .context("failed to load sprite assets")?;
    let compositor = Compositor::new(Style::from_config(&config.render), sprites);

    // 出力先を全て開いてからフレーム処理を始める
    let mut sinks = FanOut::new();
    if is_video_path(output) {
        sinks.push(open_video(config, output)?);
    } else {
        sinks.push(PngSequenceSink::create(output)?);
    }
    if preview {
        sinks.push(open_preview(config)?);
    }

    let mut pacer = FramePacer::new(config.render.fps, config.render.realtime);
    let stats = animation
        .render(&compositor, &mut sinks, &mut pacer)
        .context("render failed")?;

    println!("{} frames -> {}", stats.frames_written, output.display());
    Ok(())
}

fn run_angles(config: &Config, input: &Path, output: &Path) -> Result<()> {
    config.validate().context("invalid configuration")?;
    let calibrator = Calibrator::from_config(&config.calibration)?;
    let rows = load_signals(input)
        .with_context(|| format!("failed to load signals from {}", input.display()))?;
    let samples = calibrator.convert(&rows);

    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    write_angle_table(BufWriter::new(file), &rows, &samples)?;

    println!("{} rows -> {}", rows.len(), output.display());
    Ok(())
}

fn run_geometry(config: &Config, input: &Path, output: &Path) -> Result<()> {
    let animation = prepare(config, input)?;

    let records: Vec<FrameRecord> = animation
        .samples()
        .iter()
        .zip(animation.frames())
        .enumerate()
        .map(|(index, (angles, geometry))| FrameRecord {
            index,
            angles: *angles,
            geometry,
        })
        .collect();

    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &records)?;

    println!("{} frames -> {}", records.len(), output.display());
    Ok(())
}
