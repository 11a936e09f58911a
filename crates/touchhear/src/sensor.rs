//! Camera / depth-sensor collaborators.

use image::RgbImage;
use log::{debug, info};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, thread};
use touchhear_core::DepthImage;

#[derive(thiserror::Error, Debug)]
pub enum SensorError {
    #[error("sensor failed to start: {0}")]
    Start(String),
    #[error("frame read failed: {0}")]
    Read(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// One synchronized color (+ optional depth) capture.
#[derive(Clone, Debug)]
pub struct SensorFrame {
    pub color: RgbImage,
    pub depth: Option<DepthImage>,
}

/// A frame producer with an explicit start/stop lifecycle.
pub trait FrameSource: Send {
    fn start(&mut self) -> Result<(), SensorError>;

    /// Block for at most `timeout`; `Ok(None)` means no frame this time.
    fn wait_for_frame(&mut self, timeout: Duration) -> Result<Option<SensorFrame>, SensorError>;

    fn stop(&mut self);
}

/// A started source that is stopped exactly once, on [`SensorSession::stop`]
/// or on drop.
pub struct SensorSession {
    source: Box<dyn FrameSource>,
    active: bool,
}

impl SensorSession {
    pub fn start(mut source: Box<dyn FrameSource>) -> Result<Self, SensorError> {
        source.start()?;
        info!("sensor started");
        Ok(Self {
            source,
            active: true,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn wait_for_frame(&mut self, timeout: Duration) -> Result<Option<SensorFrame>, SensorError> {
        if !self.active {
            return Ok(None);
        }
        self.source.wait_for_frame(timeout)
    }

    pub fn stop(&mut self) {
        if self.active {
            self.active = false;
            self.source.stop();
            info!("sensor stopped");
        }
    }
}

impl Drop for SensorSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Plays back prepared frames, e.g. captured PNG pairs.
#[derive(Clone, Debug, Default)]
pub struct ReplaySource {
    frames: Vec<SensorFrame>,
    cursor: usize,
    looping: bool,
    running: bool,
}

impl ReplaySource {
    pub fn new(frames: Vec<SensorFrame>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    /// Restart from the first frame after the last one.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ReplaySource {
    fn start(&mut self) -> Result<(), SensorError> {
        if self.frames.is_empty() {
            return Err(SensorError::Start("replay has no frames".to_string()));
        }
        self.cursor = 0;
        self.running = true;
        Ok(())
    }

    fn wait_for_frame(&mut self, timeout: Duration) -> Result<Option<SensorFrame>, SensorError> {
        if !self.running {
            return Err(SensorError::Read("replay not started".to_string()));
        }
        if self.cursor >= self.frames.len() {
            if !self.looping {
                // behave like an idle device: nothing arrives within the timeout
                thread::sleep(timeout);
                return Ok(None);
            }
            self.cursor = 0;
        }
        let frame = self.frames[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(frame))
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

fn default_depth_scale() -> f32 {
    1.0
}

/// On-disk description of a recorded session.
///
/// Paths are relative to the manifest file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayManifest {
    #[serde(default = "default_depth_scale")]
    pub depth_scale_mm: f32,
    pub frames: Vec<ReplayFrameSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayFrameSpec {
    pub color: PathBuf,
    #[serde(default)]
    pub depth: Option<PathBuf>,
    /// Fingertip pixels recorded for this frame.
    #[serde(default)]
    pub fingertips: Vec<[f32; 2]>,
}

impl ReplayManifest {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SensorError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Decode every referenced image.
    ///
    /// Returns the frames and the per-frame fingertip script.
    pub fn load_frames(
        &self,
        base_dir: &Path,
    ) -> Result<(Vec<SensorFrame>, Vec<Vec<Point2<f32>>>), SensorError> {
        let mut frames = Vec::with_capacity(self.frames.len());
        let mut tips = Vec::with_capacity(self.frames.len());
        for entry in &self.frames {
            let depth = entry
                .depth
                .as_ref()
                .map(|p| load_depth_png(&base_dir.join(p), self.depth_scale_mm))
                .transpose()?;
            frames.push(SensorFrame {
                color: load_color(&base_dir.join(&entry.color))?,
                depth,
            });
            tips.push(
                entry.fingertips
                    .iter()
                    .map(|&[x, y]| Point2::new(x, y))
                    .collect(),
            );
        }
        debug!("replay manifest: {} frames", frames.len());
        Ok((frames, tips))
    }
}

pub fn load_color(path: &Path) -> Result<RgbImage, SensorError> {
    Ok(image::open(path)?.to_rgb8())
}

/// Load a 16-bit single-channel depth image (8-bit images are widened).
pub fn load_depth_png(path: &Path, scale_mm: f32) -> Result<DepthImage, SensorError> {
    let img = image::open(path)?.to_luma16();
    let (w, h) = img.dimensions();
    Ok(DepthImage {
        width: w as usize,
        height: h as usize,
        data: img.into_raw(),
        scale_mm,
    })
}
