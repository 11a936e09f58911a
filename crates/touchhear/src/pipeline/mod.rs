//! Per-frame orchestration.
//!
//! One call to [`FrameProcessor::process`] walks a frame through marker
//! location, plane calibration, sheet masking, contact classification,
//! coordinate mapping and region hit-testing, and returns a plain
//! [`DetectionResult`] snapshot.

mod processor;
mod result;

pub use processor::{FrameOutput, FrameProcessor};
pub use result::{DetectionResult, TouchPoint};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::{CalibrationParams, PlaneCalibrator};
    use crate::contact::{ContactState, ContactStrategy, ShadowContactParams};
    use crate::fiducial::FiducialLocator;
    use crate::mapping::{CoordinateMapper, TransformKind};
    use crate::regions::{
        AuthoringCanvas, Region, RegionFrame, RegionHitTester, RegionLayout, RegionShape,
    };
    use crate::sensor::SensorFrame;
    use crate::sheet::PhysicalSheet;
    use crate::test_support::{draw_marker_rgb, white_frame};
    use nalgebra::Point2;
    use std::time::{Duration, Instant};
    use touchhear_aruco::builtins::DICT_4X4_50;
    use touchhear_aruco::ArucoDetectorParams;
    use touchhear_core::DepthImage;

    fn processor(strategy: ContactStrategy) -> FrameProcessor {
        FrameProcessor::new(
            FiducialLocator::new(DICT_4X4_50, ArucoDetectorParams::default()),
            PlaneCalibrator::new(CalibrationParams {
                calibrated_after: 2,
                ..CalibrationParams::default()
            }),
            CoordinateMapper::new(PhysicalSheet::A4),
            strategy.build(),
            RegionHitTester::new(Duration::from_secs(1)),
        )
    }

    /// Markers centered at x 60/260, y 40/200 on a 320x240 frame.
    fn sheet_frame(depth_mm: Option<u16>) -> SensorFrame {
        let mut color = white_frame(320, 240);
        for (id, x, y) in [(0, 36, 16), (1, 236, 16), (2, 236, 176), (3, 36, 176)] {
            draw_marker_rgb(&mut color, id, 8, x, y);
        }
        SensorFrame {
            color,
            depth: depth_mm.map(|d| DepthImage::filled(320, 240, d, 1.0)),
        }
    }

    #[test]
    fn blank_frame_reports_unknown_fingertips() {
        let mut p = processor(ContactStrategy::default());
        let frame = SensorFrame {
            color: white_frame(160, 120),
            depth: None,
        };
        let out = p.process(&frame, &[Point2::new(10.0, 10.0)], Instant::now());
        assert_eq!(out.result.frame_index, 1);
        assert!(!out.result.board_detected);
        assert_eq!(out.result.transform, None);
        assert_eq!(out.result.touches.len(), 1);
        assert_eq!(out.result.touches[0].contact_state, ContactState::Unknown);
        assert_eq!(out.result.touches[0].physical_mm, None);
        assert!(out.overlay.sheet_hull.is_empty());
    }

    #[test]
    fn depth_classification_waits_for_calibration() {
        let mut p = processor(ContactStrategy::default());
        let frame = sheet_frame(Some(600));
        let tip = [Point2::new(160.0, 120.0)];
        let now = Instant::now();

        let first = p.process(&frame, &tip, now).result;
        assert!(first.board_detected);
        assert_eq!(first.detected_markers, vec![0, 1, 2, 3]);
        assert_eq!(first.transform, Some(TransformKind::Projective));
        assert!(!first.calibration.is_calibrated);
        assert_eq!(first.touches[0].contact_state, ContactState::Unknown);

        let second = p.process(&frame, &tip, now).result;
        assert!(second.calibration.is_calibrated);
        assert_eq!(second.calibration_progress, 1.0);
        let plane = second.plane_depth_mm().expect("plane depth");
        assert!((plane - 600.0).abs() < 1e-3);
        // flat depth everywhere: the fingertip reads as lying on the plane
        assert_eq!(second.touches[0].contact_state, ContactState::Touch);
        assert!(second.touches[0].physical_mm.is_some());
    }

    #[test]
    fn shadow_strategy_needs_no_depth() {
        let mut p = processor(ContactStrategy::Shadow(ShadowContactParams::default()));
        let out = p.process(&sheet_frame(None), &[Point2::new(160.0, 120.0)], Instant::now());
        assert!(out.result.board_detected);
        assert!(!out.result.calibration.is_calibrated);
        // white paper around the fingertip: no shadow
        assert_eq!(out.result.touches[0].contact_state, ContactState::Hover);
    }

    #[test]
    fn touches_trigger_regions_once_per_cooldown() {
        let region = Region {
            id: "r1".to_string(),
            name: "whole".to_string(),
            shape: RegionShape::Rectangle {
                x: 0.0,
                y: 0.0,
                width: 800.0,
                height: 600.0,
            },
            audio_file: Some("a.wav".to_string()),
        };
        let layout = RegionLayout::new(
            vec![region],
            RegionFrame::new(AuthoringCanvas::default(), None, PhysicalSheet::A4),
        );
        let mut p = processor(ContactStrategy::default()).with_layout(layout.clone());
        let frame = sheet_frame(Some(600));
        let tip = [Point2::new(160.0, 120.0)];
        let t0 = Instant::now();

        p.process(&frame, &tip, t0);
        let hit = p.process(&frame, &tip, t0);
        assert_eq!(hit.result.triggered_regions, vec!["r1".to_string()]);
        assert_eq!(hit.triggers.len(), 1);
        assert_eq!(hit.triggers[0].audio, std::path::PathBuf::from("a.wav"));

        let again = p.process(&frame, &tip, t0 + Duration::from_millis(500));
        assert_eq!(again.result.touched_regions.len(), 1);
        assert!(again.triggers.is_empty());

        p.set_layout(Some(layout));
        let fresh = p.process(&frame, &tip, t0 + Duration::from_millis(600));
        assert_eq!(fresh.triggers.len(), 1);
    }

    #[test]
    fn reset_clears_calibration() {
        let mut p = processor(ContactStrategy::default());
        let frame = sheet_frame(Some(600));
        let now = Instant::now();
        p.process(&frame, &[], now);
        p.process(&frame, &[], now);
        assert!(p.calibrator().is_calibrated());

        p.reset_calibration();
        let out = p.process(&SensorFrame { depth: None, ..frame }, &[], now);
        assert!(!out.result.calibration.is_calibrated);
        assert_eq!(out.result.calibration.plane_depth_mm, None);
        assert_eq!(p.frames_processed(), 3);
    }
}
