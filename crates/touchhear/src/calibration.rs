//! Plane depth estimation from the corner markers.
//!
//! The sheet is modelled as a single depth value. Each accepted frame feeds
//! the median marker depth through a first-order low-pass filter
//! `d <- a*x + (1-a)*d`; with `a = 0.1` a step change settles to within 5%
//! after about 29 frames.

use log::{debug, info};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use touchhear_core::{median_f32, DepthImageView};

/// Depth readings outside `(min_mm, max_mm)` are treated as invalid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthRange {
    pub min_mm: f32,
    pub max_mm: f32,
}

impl Default for DepthRange {
    fn default() -> Self {
        Self {
            min_mm: 20.0,
            max_mm: 2000.0,
        }
    }
}

impl DepthRange {
    #[inline]
    pub fn accepts(&self, d: f32) -> bool {
        d > self.min_mm && d < self.max_mm
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    /// Half-size of the depth window sampled around each marker center.
    pub sample_radius_px: i32,
    /// Markers with fewer valid depth pixels are skipped.
    pub min_valid_samples: usize,
    pub valid_depth: DepthRange,
    /// Smoothing factor of the plane depth filter, in `(0, 1]`.
    pub smoothing_alpha: f32,
    /// Cap on the accepted-sample counter.
    pub max_samples: u32,
    /// Accepted samples needed before the plane counts as calibrated.
    pub calibrated_after: u32,
    /// Markers with a valid depth needed for a frame to be accepted.
    pub min_marker_depths: usize,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            sample_radius_px: 20,
            min_valid_samples: 5,
            valid_depth: DepthRange::default(),
            smoothing_alpha: 0.1,
            max_samples: 30,
            calibrated_after: 10,
            min_marker_depths: 2,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    pub plane_depth_mm: Option<f32>,
    pub sample_count: u32,
    pub is_calibrated: bool,
}

/// Owns the calibration state of one detection session.
#[derive(Clone, Debug)]
pub struct PlaneCalibrator {
    params: CalibrationParams,
    state: CalibrationState,
}

impl PlaneCalibrator {
    pub fn new(params: CalibrationParams) -> Self {
        Self {
            params,
            state: CalibrationState::default(),
        }
    }

    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    pub fn is_calibrated(&self) -> bool {
        self.state.is_calibrated
    }

    /// Fraction of the calibration threshold reached, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        let target = self.params.calibrated_after.max(1) as f32;
        (self.state.sample_count as f32 / target).min(1.0)
    }

    pub fn reset(&mut self) {
        self.state = CalibrationState::default();
        info!("plane calibration reset");
    }

    /// Feed one frame. Returns `true` if the plane estimate was updated.
    ///
    /// `markers` are in color-frame pixels; `color_size` is the color frame's
    /// `(width, height)` so marker positions can be rescaled onto the depth
    /// grid.
    pub fn calibrate(
        &mut self,
        markers: &BTreeMap<u32, Point2<f32>>,
        depth: &DepthImageView<'_>,
        color_size: (usize, usize),
    ) -> bool {
        if markers.len() < 3 {
            return false;
        }

        let marker_depths: Vec<f32> = markers
            .values()
            .filter_map(|&p| self.marker_depth(depth, depth.from_color(p, color_size.0, color_size.1)))
            .collect();
        if marker_depths.len() < self.params.min_marker_depths.max(1) {
            debug!(
                "calibration: only {} marker depths, need {}",
                marker_depths.len(),
                self.params.min_marker_depths
            );
            return false;
        }
        let Some(current) = median_f32(&marker_depths) else {
            return false;
        };

        let alpha = self.params.smoothing_alpha.clamp(f32::EPSILON, 1.0);
        let plane = match self.state.plane_depth_mm {
            None => current,
            Some(prev) => alpha * current + (1.0 - alpha) * prev,
        };
        self.state.plane_depth_mm = Some(plane);
        self.state.sample_count = (self.state.sample_count + 1).min(self.params.max_samples);

        let was_calibrated = self.state.is_calibrated;
        if self.state.sample_count >= self.params.calibrated_after {
            self.state.is_calibrated = true;
        }
        if self.state.is_calibrated && !was_calibrated {
            info!(
                "plane calibrated at {:.1} mm after {} samples",
                plane, self.state.sample_count
            );
        }
        true
    }

    /// Median valid depth in the window around `center` (depth-grid pixels).
    fn marker_depth(&self, depth: &DepthImageView<'_>, center: Point2<f32>) -> Option<f32> {
        if !center.x.is_finite() || !center.y.is_finite() {
            return None;
        }
        let r = self.params.sample_radius_px.max(1);
        let (cx, cy) = (center.x as i32, center.y as i32);
        let mut samples = Vec::with_capacity((4 * r * r) as usize);
        for y in cy - r..cy + r {
            for x in cx - r..cx + r {
                if let Some(d) = depth.depth_mm(x, y) {
                    if self.params.valid_depth.accepts(d) {
                        samples.push(d);
                    }
                }
            }
        }
        if samples.len() < self.params.min_valid_samples {
            return None;
        }
        median_f32(&samples)
    }
}
