use super::{DetectionResult, TouchPoint};
use crate::audio::Trigger;
use crate::calibration::PlaneCalibrator;
use crate::contact::{ContactClassifier, ContactInput, ContactReading, ContactState};
use crate::fiducial::{FiducialLocator, FiducialObservation};
use crate::mapping::CoordinateMapper;
use crate::overlay::OverlayData;
use crate::regions::{HitReport, RegionHitTester, RegionLayout};
use crate::sensor::SensorFrame;
use crate::sheet::SheetCorner;
use log::debug;
use nalgebra::Point2;
use std::time::Instant;
use touchhear_core::{convex_hull, RegionMask};

/// Everything one frame produced.
#[derive(Clone, Debug)]
pub struct FrameOutput {
    pub result: DetectionResult,
    /// Region audio to start now.
    pub triggers: Vec<Trigger>,
    pub overlay: OverlayData,
}

/// Owns all per-session detector state: plane calibration, region cooldowns
/// and the frame counter.
pub struct FrameProcessor {
    locator: FiducialLocator,
    calibrator: PlaneCalibrator,
    mapper: CoordinateMapper,
    classifier: Box<dyn ContactClassifier>,
    hit_tester: RegionHitTester,
    layout: Option<RegionLayout>,
    frame_index: u64,
}

impl FrameProcessor {
    pub fn new(
        locator: FiducialLocator,
        calibrator: PlaneCalibrator,
        mapper: CoordinateMapper,
        classifier: Box<dyn ContactClassifier>,
        hit_tester: RegionHitTester,
    ) -> Self {
        Self {
            locator,
            calibrator,
            mapper,
            classifier,
            hit_tester,
            layout: None,
            frame_index: 0,
        }
    }

    pub fn with_layout(mut self, layout: RegionLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Swap the active project; cooldowns start over.
    pub fn set_layout(&mut self, layout: Option<RegionLayout>) {
        self.layout = layout;
        self.hit_tester.reset();
    }

    pub fn layout(&self) -> Option<&RegionLayout> {
        self.layout.as_ref()
    }

    pub fn calibrator(&self) -> &PlaneCalibrator {
        &self.calibrator
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    pub fn reset_calibration(&mut self) {
        self.calibrator.reset();
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame_index
    }

    /// Run all stages on one frame.
    ///
    /// Stages that lack input are skipped and the result carries whatever
    /// was computed; this never fails.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            level = "debug",
            skip_all,
            fields(frame = self.frame_index + 1, fingertips = fingertips.len())
        )
    )]
    pub fn process(
        &mut self,
        frame: &SensorFrame,
        fingertips: &[Point2<f32>],
        now: Instant,
    ) -> FrameOutput {
        self.frame_index += 1;
        let color = &frame.color;
        let color_size = (color.width() as usize, color.height() as usize);

        let obs = self.locator.locate_rgb(color);

        if obs.board_detected {
            if let Some(depth) = &frame.depth {
                self.calibrator.calibrate(&obs.markers, &depth.view(), color_size);
            }
        }

        let hull = if obs.board_detected {
            let centers: Vec<Point2<f32>> = obs.markers.values().copied().collect();
            convex_hull(&centers)
        } else {
            Vec::new()
        };
        let mask = RegionMask::from_convex_polygon(color_size.0, color_size.1, &hull);
        let transform = if obs.board_detected {
            self.mapper.transform(&obs.markers)
        } else {
            None
        };

        let classify = obs.board_detected
            && (!self.classifier.requires_plane() || self.calibrator.is_calibrated());
        let plane_depth_mm = self.calibrator.state().plane_depth_mm;
        let depth_view = frame.depth.as_ref().map(|d| d.view());

        let touches: Vec<TouchPoint> = fingertips
            .iter()
            .map(|&tip| {
                if !classify {
                    return TouchPoint {
                        pixel: tip,
                        physical_mm: None,
                        contact_state: ContactState::Unknown,
                        distance_mm: None,
                        finger_depth_mm: None,
                    };
                }
                let reading: ContactReading = self.classifier.classify(&ContactInput {
                    fingertip: tip,
                    color,
                    depth: depth_view,
                    mask: mask.as_ref(),
                    plane_depth_mm,
                });
                let physical_mm = transform
                    .as_ref()
                    .and_then(|t| self.mapper.map_with(t, tip));
                TouchPoint {
                    pixel: tip,
                    physical_mm,
                    contact_state: reading.state,
                    distance_mm: reading.distance_mm,
                    finger_depth_mm: reading.finger_depth_mm,
                }
            })
            .collect();

        let touching_mm: Vec<Point2<f32>> = touches
            .iter()
            .filter(|t| t.contact_state.is_touch())
            .filter_map(|t| t.physical_mm)
            .collect();
        let report = match &self.layout {
            Some(layout) if obs.board_detected => {
                self.hit_tester.check_touches(&touching_mm, layout, now)
            }
            _ => HitReport::default(),
        };

        debug!(
            "frame {}: board={} markers={:?} touches={} triggered={}",
            self.frame_index,
            obs.board_detected,
            obs.detected_ids(),
            touches.len(),
            report.triggered.len()
        );

        let overlay = self.overlay(&obs, hull, &touches);
        let result = DetectionResult {
            frame_index: self.frame_index,
            board_detected: obs.board_detected,
            detected_markers: obs.detected_ids(),
            calibration: self.calibrator.state().clone(),
            calibration_progress: self.calibrator.progress(),
            transform: transform.map(|t| t.kind()),
            touches,
            touched_regions: report.touched,
            triggered_regions: report
                .triggered
                .iter()
                .map(|t| t.region_id.clone())
                .collect(),
        };

        FrameOutput {
            result,
            triggers: report.triggered,
            overlay,
        }
    }

    fn overlay(
        &self,
        obs: &FiducialObservation,
        sheet_hull: Vec<Point2<f32>>,
        touches: &[TouchPoint],
    ) -> OverlayData {
        let mut corners_present = [false; 4];
        for corner in SheetCorner::ALL {
            corners_present[corner.id() as usize] = obs.markers.contains_key(&corner.id());
        }
        OverlayData {
            marker_quads: obs.detections.iter().map(|d| d.corners).collect(),
            marker_centers: obs.markers.values().copied().collect(),
            sheet_hull,
            fingertips: touches.iter().map(|t| (t.pixel, t.contact_state)).collect(),
            corners_present,
            calibration_progress: self.calibrator.progress(),
            is_calibrated: self.calibrator.is_calibrated(),
        }
    }
}
