use crate::calibration::CalibrationState;
use crate::contact::ContactState;
use crate::mapping::TransformKind;
use crate::regions::RegionHit;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// One tracked fingertip in one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Color-frame pixel reported by the fingertip detector.
    pub pixel: Point2<f32>,
    /// Sheet position in mm; absent when unmapped or off the sheet.
    pub physical_mm: Option<Point2<f32>>,
    pub contact_state: ContactState,
    /// Plane depth minus fingertip depth.
    pub distance_mm: Option<f32>,
    pub finger_depth_mm: Option<f32>,
}

/// Snapshot of one processed frame.
///
/// Plain data only; safe to hand to readers on other threads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// 1-based; 0 means no frame was processed yet.
    pub frame_index: u64,
    pub board_detected: bool,
    pub detected_markers: Vec<u32>,
    pub calibration: CalibrationState,
    /// Share of the calibration threshold reached, in `[0, 1]`.
    pub calibration_progress: f32,
    /// Transform model used for this frame, if any.
    pub transform: Option<TransformKind>,
    pub touches: Vec<TouchPoint>,
    pub touched_regions: Vec<RegionHit>,
    /// Ids of regions whose audio fired on this frame.
    pub triggered_regions: Vec<String>,
}

impl DetectionResult {
    pub fn plane_depth_mm(&self) -> Option<f32> {
        self.calibration.plane_depth_mm
    }

    /// Touches whose contact state is `Touch`.
    pub fn touching(&self) -> impl Iterator<Item = &TouchPoint> {
        self.touches.iter().filter(|t| t.contact_state.is_touch())
    }
}
