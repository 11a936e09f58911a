use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use nalgebra::Point2;
use serde::Serialize;
use touchhear::overlay::render;
use touchhear::project::{DirectoryProjectStore, ProjectStore};
use touchhear::regions::{RegionGeometryMm, RegionLayout};
use touchhear::sensor::{load_color, load_depth_png, ReplayManifest};
use touchhear::{
    AudioSink, LogAudioSink, ReplaySource, SensorFrame, SensorSession, TouchHearConfig,
};
#[cfg(feature = "tracing")]
use tracing_log::LogTracer;

/// Printed-sheet touch surface tools.
#[derive(Debug, Parser)]
#[command(author, version, about = "Fiducial sheet touch detection")]
struct Cli {
    /// Log level for the stderr logger.
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    /// Emit JSON logs (tracing builds only).
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Process one still color (+depth) frame and print the result.
    Detect {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        color: PathBuf,
        /// 16-bit depth image aligned with the color frame.
        #[arg(long)]
        depth: Option<PathBuf>,
        /// Millimeters per raw depth unit.
        #[arg(long, default_value_t = 1.0)]
        depth_scale: f32,
        /// Fingertip pixel as `X,Y`; repeatable.
        #[arg(long = "fingertip", value_parser = parse_point)]
        fingertips: Vec<Point2<f32>>,
        #[command(flatten)]
        project: ProjectArgs,
        /// Feed the frame this many times (lets calibration settle).
        #[arg(long, default_value_t = 1)]
        frames: u32,
        /// Write the annotated frame here.
        #[arg(long)]
        annotated: Option<PathBuf>,
    },
    /// Process a recorded session and print one JSON line per frame.
    Replay {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        manifest: PathBuf,
        #[command(flatten)]
        project: ProjectArgs,
        /// Stop after this many frames.
        #[arg(long)]
        frames: Option<u64>,
    },
    /// Print a project's regions resolved into sheet millimeters.
    Regions {
        #[arg(long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        project: ProjectArgs,
    },
    /// Write the default configuration.
    InitConfig {
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
struct ProjectArgs {
    /// Directory holding one sub-directory per project.
    #[arg(long, requires = "project")]
    project_root: Option<PathBuf>,
    /// Project id (directory name).
    #[arg(long, requires = "project_root")]
    project: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResolvedRegion {
    id: String,
    name: String,
    audio: Option<String>,
    #[serde(flatten)]
    geometry: GeometryOut,
}

#[derive(Debug, Serialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
enum GeometryOut {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Ellipse {
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
    },
}

impl From<RegionGeometryMm> for GeometryOut {
    fn from(g: RegionGeometryMm) -> Self {
        match g {
            RegionGeometryMm::Rect {
                x,
                y,
                width,
                height,
            } => Self::Rect {
                x,
                y,
                width,
                height,
            },
            RegionGeometryMm::Ellipse { cx, cy, rx, ry } => Self::Ellipse { cx, cy, rx, ry },
        }
    }
}

fn parse_point(s: &str) -> Result<Point2<f32>, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x in {s:?}: {e}"))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y in {s:?}: {e}"))?;
    Ok(Point2::new(x, y))
}

fn load_config(path: Option<&Path>) -> Result<TouchHearConfig, Box<dyn Error>> {
    Ok(match path {
        Some(p) => TouchHearConfig::load_json(p)?,
        None => TouchHearConfig::default(),
    })
}

fn load_layout(
    config: &TouchHearConfig,
    args: &ProjectArgs,
) -> Result<Option<RegionLayout>, Box<dyn Error>> {
    let (Some(root), Some(id)) = (&args.project_root, &args.project) else {
        return Ok(None);
    };
    let loaded = DirectoryProjectStore::new(root).load(id)?;
    info!(
        "project {:?}: {} regions",
        loaded.project.name,
        loaded.project.rois.len()
    );
    Ok(Some(loaded.layout(config.regions.canvas, config.sheet)))
}

fn init_logging(level: LevelFilter, json: bool) -> Result<(), Box<dyn Error>> {
    #[cfg(feature = "tracing")]
    {
        let _ = level;
        let _ = LogTracer::init();
        touchhear::core::init_tracing(json);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = json;
        touchhear::core::init_with_level(level)?;
    }
    Ok(())
}

fn run_detect(
    config: &TouchHearConfig,
    frame: SensorFrame,
    fingertips: &[Point2<f32>],
    project: &ProjectArgs,
    frames: u32,
    annotated: Option<&Path>,
) -> Result<String, Box<dyn Error>> {
    let mut processor = config.build_processor()?;
    if let Some(layout) = load_layout(config, project)? {
        processor.set_layout(Some(layout));
    }
    let mut audio = LogAudioSink;

    let mut last = None;
    for _ in 0..frames.max(1) {
        let out = processor.process(&frame, fingertips, Instant::now());
        for trigger in &out.triggers {
            audio.play(trigger);
        }
        last = Some(out);
    }
    let Some(out) = last else {
        return Err("no frame processed".into());
    };
    if let Some(path) = annotated {
        render(&frame.color, &out.overlay).save(path)?;
        info!("annotated frame written to {}", path.display());
    }
    Ok(serde_json::to_string_pretty(&out.result)?)
}

fn run_replay(
    config: &TouchHearConfig,
    manifest_path: &Path,
    project: &ProjectArgs,
    limit: Option<u64>,
) -> Result<(), Box<dyn Error>> {
    let manifest = ReplayManifest::load_json(manifest_path)?;
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let (frames, tips) = manifest.load_frames(base_dir)?;

    let mut processor = config.build_processor()?;
    if let Some(layout) = load_layout(config, project)? {
        processor.set_layout(Some(layout));
    }
    let mut audio = LogAudioSink;
    let mut session = SensorSession::start(Box::new(ReplaySource::new(frames)))?;
    let timeout = config.runtime.frame_timeout();

    let mut index = 0usize;
    while let Some(frame) = session.wait_for_frame(timeout)? {
        if limit.is_some_and(|n| index as u64 >= n) {
            break;
        }
        let fingertips = tips.get(index).map(Vec::as_slice).unwrap_or_default();
        let out = processor.process(&frame, fingertips, Instant::now());
        for trigger in &out.triggers {
            audio.play(trigger);
        }
        println!("{}", serde_json::to_string(&out.result)?);
        index += 1;
    }
    session.stop();
    Ok(())
}

fn run_regions(config: &TouchHearConfig, project: &ProjectArgs) -> Result<String, Box<dyn Error>> {
    let Some(layout) = load_layout(config, project)? else {
        return Err("--project-root and --project are required".into());
    };
    let regions: Vec<ResolvedRegion> = layout
        .resolved()
        .into_iter()
        .map(|(region, geometry)| ResolvedRegion {
            id: region.id.clone(),
            name: region.name.clone(),
            audio: region.audio().map(str::to_string),
            geometry: geometry.into(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&regions)?)
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.json_logs)?;

    match cli.command {
        Command::Detect {
            config,
            color,
            depth,
            depth_scale,
            fingertips,
            project,
            frames,
            annotated,
        } => {
            let config = load_config(config.as_deref())?;
            let frame = SensorFrame {
                color: load_color(&color)?,
                depth: depth
                    .as_deref()
                    .map(|p| load_depth_png(p, depth_scale))
                    .transpose()?,
            };
            let json = run_detect(
                &config,
                frame,
                &fingertips,
                &project,
                frames,
                annotated.as_deref(),
            )?;
            println!("{json}");
        }
        Command::Replay {
            config,
            manifest,
            project,
            frames,
        } => {
            let config = load_config(config.as_deref())?;
            run_replay(&config, &manifest, &project, frames)?;
        }
        Command::Regions { config, project } => {
            let config = load_config(config.as_deref())?;
            println!("{}", run_regions(&config, &project)?);
        }
        Command::InitConfig { out } => {
            TouchHearConfig::default().write_json(&out)?;
            info!("default configuration written to {}", out.display());
        }
    }
    Ok(())
}
