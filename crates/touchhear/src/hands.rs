//! Fingertip sources.
//!
//! Hand tracking runs outside this crate; a tracker only has to report one
//! pixel position per hand. [`LandmarkFingertipDetector`] adapts any
//! 21-landmark hand model, [`ScriptedFingertips`] replays fixed positions.

use image::RgbImage;
use nalgebra::Point2;

/// Indices of the 21 standard hand landmarks.
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_TIP: usize = 20;
    pub const COUNT: usize = 21;
}

/// Landmark in normalized image coordinates (`x`, `y` in `[0, 1]`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    pub landmarks: [Landmark; landmarks::COUNT],
    pub confidence: f32,
    pub handedness: Handedness,
}

impl HandLandmarks {
    /// Pixel position of landmark `index` in a `width x height` frame.
    pub fn landmark_px(&self, index: usize, width: u32, height: u32) -> Option<Point2<f32>> {
        let lm = self.landmarks.get(index)?;
        if !lm.x.is_finite() || !lm.y.is_finite() {
            return None;
        }
        Some(Point2::new(lm.x * width as f32, lm.y * height as f32))
    }

    pub fn index_finger_tip(&self, width: u32, height: u32) -> Option<Point2<f32>> {
        self.landmark_px(landmarks::INDEX_FINGER_TIP, width, height)
    }
}

/// Reports one tracked pixel per visible hand.
pub trait FingertipDetector: Send {
    fn detect(&mut self, color: &RgbImage) -> Vec<Point2<f32>>;
}

/// Wraps a hand-landmark model and tracks one landmark per hand.
pub struct LandmarkFingertipDetector<F> {
    model: F,
    landmark: usize,
    min_confidence: f32,
}

impl<F> LandmarkFingertipDetector<F>
where
    F: FnMut(&RgbImage) -> Vec<HandLandmarks> + Send,
{
    /// Track the index fingertip of every hand with confidence >= 0.5.
    pub fn new(model: F) -> Self {
        Self {
            model,
            landmark: landmarks::INDEX_FINGER_TIP,
            min_confidence: 0.5,
        }
    }

    pub fn with_landmark(mut self, landmark: usize) -> Self {
        self.landmark = landmark;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }
}

impl<F> FingertipDetector for LandmarkFingertipDetector<F>
where
    F: FnMut(&RgbImage) -> Vec<HandLandmarks> + Send,
{
    fn detect(&mut self, color: &RgbImage) -> Vec<Point2<f32>> {
        let (w, h) = color.dimensions();
        (self.model)(color)
            .iter()
            .filter(|hand| hand.confidence >= self.min_confidence)
            .filter_map(|hand| hand.landmark_px(self.landmark, w, h))
            .collect()
    }
}

/// Replays a fixed list of fingertip positions, one entry per frame.
///
/// After the script runs out the last entry repeats.
#[derive(Clone, Debug, Default)]
pub struct ScriptedFingertips {
    frames: Vec<Vec<Point2<f32>>>,
    cursor: usize,
}

impl ScriptedFingertips {
    pub fn new(frames: Vec<Vec<Point2<f32>>>) -> Self {
        Self { frames, cursor: 0 }
    }

    /// Same fingertips on every frame.
    pub fn constant(points: Vec<Point2<f32>>) -> Self {
        Self::new(vec![points])
    }
}

impl FingertipDetector for ScriptedFingertips {
    fn detect(&mut self, _color: &RgbImage) -> Vec<Point2<f32>> {
        let Some(last) = self.frames.len().checked_sub(1) else {
            return Vec::new();
        };
        let out = self.frames[self.cursor.min(last)].clone();
        self.cursor = self.cursor.saturating_add(1);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(tip: (f32, f32), confidence: f32) -> HandLandmarks {
        let mut landmarks = [Landmark::default(); landmarks::COUNT];
        landmarks[landmarks::INDEX_FINGER_TIP] = Landmark {
            x: tip.0,
            y: tip.1,
            z: -0.02,
        };
        HandLandmarks {
            landmarks,
            confidence,
            handedness: Handedness::Right,
        }
    }

    #[test]
    fn landmark_model_reports_confident_index_tips() {
        let frame = RgbImage::new(640, 480);
        let mut det = LandmarkFingertipDetector::new(|_: &RgbImage| {
            vec![hand((0.25, 0.5), 0.9), hand((0.75, 0.875), 0.2)]
        });
        assert_eq!(det.detect(&frame), vec![Point2::new(160.0, 240.0)]);

        let mut lenient = LandmarkFingertipDetector::new(|_: &RgbImage| vec![hand((0.75, 0.875), 0.2)])
            .with_min_confidence(0.1);
        assert_eq!(lenient.detect(&frame), vec![Point2::new(480.0, 420.0)]);
    }

    #[test]
    fn other_landmarks_can_be_tracked() {
        let frame = RgbImage::new(100, 100);
        let mut det = LandmarkFingertipDetector::new(|_: &RgbImage| vec![hand((0.5, 0.5), 1.0)])
            .with_landmark(landmarks::WRIST);
        assert_eq!(det.detect(&frame), vec![Point2::new(0.0, 0.0)]);
    }

    #[test]
    fn script_repeats_last_entry() {
        let frame = RgbImage::new(4, 4);
        let mut det = ScriptedFingertips::new(vec![vec![], vec![Point2::new(1.0, 2.0)]]);
        assert!(det.detect(&frame).is_empty());
        assert_eq!(det.detect(&frame), vec![Point2::new(1.0, 2.0)]);
        assert_eq!(det.detect(&frame), vec![Point2::new(1.0, 2.0)]);
        assert!(ScriptedFingertips::default().detect(&frame).is_empty());
    }
}
