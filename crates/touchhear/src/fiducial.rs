//! Locating the four corner markers in a camera frame.

use crate::sheet::SheetCorner;
use image::RgbImage;
use log::debug;
use nalgebra::Point2;
use std::collections::BTreeMap;
use touchhear_aruco::{ArucoDetector, ArucoDetectorParams, Dictionary, MarkerDetection};
use touchhear_core::{rgb_to_gray, GrayImageView};

/// Distinct corner markers needed before the sheet counts as detected.
pub const MIN_BOARD_MARKERS: usize = 3;

/// Markers found in one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FiducialObservation {
    /// `true` iff at least [`MIN_BOARD_MARKERS`] corner ids were found.
    pub board_detected: bool,
    /// Corner id -> centroid of the marker's four image corners.
    pub markers: BTreeMap<u32, Point2<f32>>,
    /// Raw corner-marker detections, kept for overlays.
    pub detections: Vec<MarkerDetection>,
}

impl FiducialObservation {
    fn from_detections(detections: Vec<MarkerDetection>) -> Self {
        let detections: Vec<MarkerDetection> = detections
            .into_iter()
            .filter(|d| SheetCorner::from_id(d.id).is_some())
            .collect();
        let markers: BTreeMap<u32, Point2<f32>> =
            detections.iter().map(|d| (d.id, d.center)).collect();
        Self {
            board_detected: markers.len() >= MIN_BOARD_MARKERS,
            markers,
            detections,
        }
    }

    /// Detected corner ids in ascending order.
    pub fn detected_ids(&self) -> Vec<u32> {
        self.markers.keys().copied().collect()
    }
}

/// Runs the marker detector and keeps only the sheet's corner ids.
#[derive(Clone, Debug)]
pub struct FiducialLocator {
    detector: ArucoDetector,
}

impl FiducialLocator {
    pub fn new(dictionary: Dictionary, params: ArucoDetectorParams) -> Self {
        Self {
            detector: ArucoDetector::new(dictionary, params),
        }
    }

    pub fn locate(&self, gray: &GrayImageView<'_>) -> FiducialObservation {
        let obs = FiducialObservation::from_detections(self.detector.detect(gray));
        debug!(
            "fiducials: ids {:?}, board_detected={}",
            obs.detected_ids(),
            obs.board_detected
        );
        obs
    }

    pub fn locate_rgb(&self, color: &RgbImage) -> FiducialObservation {
        let (w, h) = (color.width() as usize, color.height() as usize);
        match rgb_to_gray(w, h, color.as_raw()) {
            Some(gray) => self.locate(&gray.view()),
            None => FiducialObservation::default(),
        }
    }
}
