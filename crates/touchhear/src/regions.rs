//! Authored regions, their resolution into sheet millimeters, and hit-testing.
//!
//! Regions are drawn on a fixed-size authoring canvas. When the project has
//! a background image, the editor fits it into the canvas (aspect preserved,
//! centered) and the image spans the whole sheet; region geometry then goes
//! canvas px -> background px -> mm. Without a background the canvas itself
//! spans the sheet.

use crate::audio::Trigger;
use crate::sheet::PhysicalSheet;
use log::{debug, info};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Region outline in canvas pixels.
///
/// For circles, `(x, y)` is the top-left corner of the bounding box and the
/// center is `(x + radius, y + radius)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RegionShape {
    Rectangle {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Circle {
        x: f32,
        y: f32,
        radius: f32,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub shape: RegionShape,
    #[serde(default)]
    pub audio_file: Option<String>,
}

impl Region {
    /// Audio reference, treating an empty string as none.
    pub fn audio(&self) -> Option<&str> {
        self.audio_file.as_deref().filter(|a| !a.trim().is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthoringCanvas {
    pub width: f32,
    pub height: f32,
}

impl Default for AuthoringCanvas {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Where the editor drew the background image inside the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackgroundPlacement {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub native_width: u32,
    pub native_height: u32,
}

impl BackgroundPlacement {
    /// Fit `native_width x native_height` into the canvas the way the editor
    /// does: uniform scale, integer scaled size, integer centering offset.
    pub fn fit(canvas: &AuthoringCanvas, native_width: u32, native_height: u32) -> Option<Self> {
        if native_width == 0 || native_height == 0 || canvas.width <= 0.0 || canvas.height <= 0.0 {
            return None;
        }
        let scale = (canvas.width / native_width as f32).min(canvas.height / native_height as f32);
        let scaled_w = (native_width as f32 * scale).floor();
        let scaled_h = (native_height as f32 * scale).floor();
        Some(Self {
            scale,
            offset_x: ((canvas.width - scaled_w) / 2.0).floor(),
            offset_y: ((canvas.height - scaled_h) / 2.0).floor(),
            native_width,
            native_height,
        })
    }
}

/// Region outline on the sheet, in millimeters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RegionGeometryMm {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// Canvas circles become ellipses when the two axes scale differently.
    Ellipse { cx: f32, cy: f32, rx: f32, ry: f32 },
}

impl RegionGeometryMm {
    /// Inclusive containment test.
    pub fn contains(&self, p: Point2<f32>) -> bool {
        match *self {
            Self::Rect {
                x,
                y,
                width,
                height,
            } => p.x >= x && p.x <= x + width && p.y >= y && p.y <= y + height,
            Self::Ellipse { cx, cy, rx, ry } => {
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let dx = (p.x - cx) / rx;
                let dy = (p.y - cy) / ry;
                dx * dx + dy * dy <= 1.0
            }
        }
    }
}

/// Canvas -> sheet mapping for one project.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionFrame {
    pub canvas: AuthoringCanvas,
    pub background: Option<BackgroundPlacement>,
    pub sheet: PhysicalSheet,
}

impl RegionFrame {
    pub fn new(
        canvas: AuthoringCanvas,
        background_size: Option<(u32, u32)>,
        sheet: PhysicalSheet,
    ) -> Self {
        let background = background_size.and_then(|(w, h)| BackgroundPlacement::fit(&canvas, w, h));
        Self {
            canvas,
            background,
            sheet,
        }
    }

    /// Millimeters per canvas pixel along x and y.
    fn mm_per_px(&self) -> (f32, f32) {
        match self.background {
            Some(bg) => (
                self.sheet.width_mm / (bg.scale * bg.native_width as f32),
                self.sheet.height_mm / (bg.scale * bg.native_height as f32),
            ),
            None => (
                self.sheet.width_mm / self.canvas.width,
                self.sheet.height_mm / self.canvas.height,
            ),
        }
    }

    /// Canvas pixel position -> sheet millimeters.
    pub fn canvas_to_mm(&self, x: f32, y: f32) -> Point2<f32> {
        let (sx, sy) = self.mm_per_px();
        match self.background {
            Some(bg) => Point2::new((x - bg.offset_x) * sx, (y - bg.offset_y) * sy),
            None => Point2::new(x * sx, y * sy),
        }
    }

    pub fn resolve(&self, shape: &RegionShape) -> RegionGeometryMm {
        let (sx, sy) = self.mm_per_px();
        match *shape {
            RegionShape::Rectangle {
                x,
                y,
                width,
                height,
            } => {
                let o = self.canvas_to_mm(x, y);
                RegionGeometryMm::Rect {
                    x: o.x,
                    y: o.y,
                    width: width * sx,
                    height: height * sy,
                }
            }
            RegionShape::Circle { x, y, radius } => {
                let c = self.canvas_to_mm(x + radius, y + radius);
                RegionGeometryMm::Ellipse {
                    cx: c.x,
                    cy: c.y,
                    rx: radius * sx,
                    ry: radius * sy,
                }
            }
        }
    }
}

/// The regions of one loaded project, ready for hit-testing.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionLayout {
    pub regions: Vec<Region>,
    pub frame: RegionFrame,
    /// Directory audio references are relative to.
    pub audio_dir: Option<PathBuf>,
}

impl RegionLayout {
    pub fn new(regions: Vec<Region>, frame: RegionFrame) -> Self {
        Self {
            regions,
            frame,
            audio_dir: None,
        }
    }

    pub fn with_audio_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audio_dir = Some(dir.into());
        self
    }

    /// Every region resolved into millimeters.
    pub fn resolved(&self) -> Vec<(&Region, RegionGeometryMm)> {
        self.regions
            .iter()
            .map(|r| (r, self.frame.resolve(&r.shape)))
            .collect()
    }

    fn audio_path(&self, audio: &str) -> PathBuf {
        match &self.audio_dir {
            Some(dir) => dir.join(audio),
            None => PathBuf::from(audio),
        }
    }
}

/// One region touched in a frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionHit {
    pub region_id: String,
    pub region_name: String,
    pub point_mm: Point2<f32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HitReport {
    /// Regions under a touching fingertip, including ones still cooling down.
    pub touched: Vec<RegionHit>,
    /// Regions whose audio should start now.
    pub triggered: Vec<Trigger>,
}

/// Hit-tests touch points and rate-limits audio per region.
#[derive(Clone, Debug)]
pub struct RegionHitTester {
    cooldown: Duration,
    last_fired: HashMap<String, Instant>,
}

impl Default for RegionHitTester {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl RegionHitTester {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: HashMap::new(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn last_fired(&self, region_id: &str) -> Option<Instant> {
        self.last_fired.get(region_id).copied()
    }

    pub fn reset(&mut self) {
        self.last_fired.clear();
    }

    /// Test touching points (sheet mm) against every region.
    ///
    /// A region with audio triggers when it never fired before or its last
    /// trigger is more than the cooldown ago. Each region is reported at most
    /// once per call.
    pub fn check_touches(
        &mut self,
        points_mm: &[Point2<f32>],
        layout: &RegionLayout,
        now: Instant,
    ) -> HitReport {
        let mut report = HitReport::default();
        if points_mm.is_empty() {
            return report;
        }

        for (region, geometry) in layout.resolved() {
            let Some(&point) = points_mm.iter().find(|p| geometry.contains(**p)) else {
                continue;
            };
            debug!("region {:?} touched at {:?}", region.id, point);
            report.touched.push(RegionHit {
                region_id: region.id.clone(),
                region_name: region.name.clone(),
                point_mm: point,
            });

            let Some(audio) = region.audio() else {
                continue;
            };
            let ready = match self.last_fired.get(&region.id) {
                None => true,
                Some(&last) => now.saturating_duration_since(last) > self.cooldown,
            };
            if !ready {
                continue;
            }
            self.last_fired.insert(region.id.clone(), now);
            info!("region {:?} triggered", region.name);
            report.triggered.push(Trigger {
                region_id: region.id.clone(),
                region_name: region.name.clone(),
                audio: layout.audio_path(audio),
            });
        }

        report
    }
}
