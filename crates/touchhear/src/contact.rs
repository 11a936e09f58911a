//! Fingertip contact classification against the sheet plane.

use crate::calibration::DepthRange;
use image::RgbImage;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use touchhear_core::{mean_u8, median_f32, DepthImageView, RegionMask};

/// Per-frame contact classification of one fingertip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactState {
    /// No plane estimate or no sheet mask yet.
    Unknown,
    /// Fingertip lies outside the sheet region.
    Outside,
    /// Too few usable pixels around the fingertip.
    NoData,
    Touch,
    Hover,
    Far,
}

impl ContactState {
    #[inline]
    pub fn is_touch(self) -> bool {
        self == Self::Touch
    }

    /// Display priority; `Touch` ranks highest.
    pub fn priority(self) -> u8 {
        match self {
            Self::Touch => 5,
            Self::Hover => 4,
            Self::Far => 3,
            Self::NoData => 2,
            Self::Outside => 1,
            Self::Unknown => 0,
        }
    }
}

/// Band a plane-to-finger depth difference.
///
/// Negative differences (finger reads behind the plane) count as touch.
pub fn classify_depth_difference(diff_mm: f32, touch_mm: f32, hover_mm: f32) -> ContactState {
    if diff_mm < touch_mm {
        ContactState::Touch
    } else if diff_mm < hover_mm {
        ContactState::Hover
    } else {
        ContactState::Far
    }
}

/// Result of classifying one fingertip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactReading {
    pub state: ContactState,
    /// Plane depth minus fingertip depth.
    pub distance_mm: Option<f32>,
    pub finger_depth_mm: Option<f32>,
    /// Mean in-mask gray level (shadow strategy).
    pub brightness: Option<f32>,
}

impl ContactReading {
    pub fn bare(state: ContactState) -> Self {
        Self {
            state,
            distance_mm: None,
            finger_depth_mm: None,
            brightness: None,
        }
    }
}

/// Everything a classifier may look at for one fingertip.
#[derive(Clone, Copy)]
pub struct ContactInput<'a> {
    pub fingertip: Point2<f32>,
    pub color: &'a RgbImage,
    pub depth: Option<DepthImageView<'a>>,
    pub mask: Option<&'a RegionMask>,
    pub plane_depth_mm: Option<f32>,
}

impl ContactInput<'_> {
    /// Integer fingertip pixel, `None` when it is outside the color frame.
    fn pixel(&self) -> Option<(i32, i32)> {
        let p = self.fingertip;
        if !p.x.is_finite() || !p.y.is_finite() || p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        let (x, y) = (p.x as i32, p.y as i32);
        (x < self.color.width() as i32 && y < self.color.height() as i32).then_some((x, y))
    }
}

/// Contact classification strategy.
pub trait ContactClassifier: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether classification is meaningful only with a calibrated plane.
    fn requires_plane(&self) -> bool;

    fn classify(&self, input: &ContactInput<'_>) -> ContactReading;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthContactParams {
    /// Half-size of the depth window around the fingertip.
    pub radius_px: i32,
    pub min_samples: usize,
    pub touch_threshold_mm: f32,
    pub hover_threshold_mm: f32,
    pub valid_depth: DepthRange,
}

impl Default for DepthContactParams {
    fn default() -> Self {
        Self {
            radius_px: 15,
            min_samples: 5,
            touch_threshold_mm: 30.0,
            hover_threshold_mm: 80.0,
            valid_depth: DepthRange::default(),
        }
    }
}

/// Compares the fingertip's median depth with the calibrated plane.
#[derive(Clone, Debug, Default)]
pub struct DepthContactClassifier {
    params: DepthContactParams,
}

impl DepthContactClassifier {
    pub fn new(params: DepthContactParams) -> Self {
        Self { params }
    }
}

impl ContactClassifier for DepthContactClassifier {
    fn name(&self) -> &'static str {
        "depth"
    }

    fn requires_plane(&self) -> bool {
        true
    }

    fn classify(&self, input: &ContactInput<'_>) -> ContactReading {
        let Some((px, py)) = input.pixel() else {
            return ContactReading::bare(ContactState::Unknown);
        };
        let (Some(mask), Some(plane)) = (input.mask, input.plane_depth_mm) else {
            return ContactReading::bare(ContactState::Unknown);
        };
        if !mask.contains(px, py) {
            return ContactReading::bare(ContactState::Outside);
        }
        let Some(depth) = input.depth else {
            return ContactReading::bare(ContactState::NoData);
        };

        let (cw, ch) = (input.color.width() as usize, input.color.height() as usize);
        let center = depth.from_color(input.fingertip, cw, ch);
        let (cx, cy) = (center.x as i32, center.y as i32);
        let r = self.params.radius_px.max(1);

        let mut samples = Vec::with_capacity((4 * r * r) as usize);
        for y in cy - r..cy + r {
            for x in cx - r..cx + r {
                let Some(d) = depth.depth_mm(x, y) else {
                    continue;
                };
                if !self.params.valid_depth.accepts(d) {
                    continue;
                }
                let c = depth.to_color(Point2::new(x as f32, y as f32), cw, ch);
                if mask.contains(c.x as i32, c.y as i32) {
                    samples.push(d);
                }
            }
        }
        if samples.len() < self.params.min_samples {
            return ContactReading::bare(ContactState::NoData);
        }
        let Some(finger) = median_f32(&samples) else {
            return ContactReading::bare(ContactState::NoData);
        };

        let diff = plane - finger;
        ContactReading {
            state: classify_depth_difference(
                diff,
                self.params.touch_threshold_mm,
                self.params.hover_threshold_mm,
            ),
            distance_mm: Some(diff),
            finger_depth_mm: Some(finger),
            brightness: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowContactParams {
    pub radius_px: i32,
    pub min_pixels: usize,
    /// Mean gray level below which the fingertip casts a contact shadow.
    pub brightness_threshold: f32,
}

impl Default for ShadowContactParams {
    fn default() -> Self {
        Self {
            radius_px: 30,
            min_pixels: 10,
            brightness_threshold: 180.0,
        }
    }
}

/// Camera-only fallback: a finger pressed on the sheet darkens the paper
/// around it.
///
/// Only two contact bands exist here: `Touch` when dark enough, `Hover`
/// otherwise.
#[derive(Clone, Debug, Default)]
pub struct ShadowContactClassifier {
    params: ShadowContactParams,
}

impl ShadowContactClassifier {
    pub fn new(params: ShadowContactParams) -> Self {
        Self { params }
    }
}

impl ContactClassifier for ShadowContactClassifier {
    fn name(&self) -> &'static str {
        "shadow"
    }

    fn requires_plane(&self) -> bool {
        false
    }

    fn classify(&self, input: &ContactInput<'_>) -> ContactReading {
        let Some((px, py)) = input.pixel() else {
            return ContactReading::bare(ContactState::Unknown);
        };
        let Some(mask) = input.mask else {
            return ContactReading::bare(ContactState::Unknown);
        };
        if !mask.contains(px, py) {
            return ContactReading::bare(ContactState::Outside);
        }

        let r = self.params.radius_px.max(1);
        let mut gray = Vec::with_capacity((4 * r * r) as usize);
        for y in py - r..py + r {
            for x in px - r..px + r {
                if !mask.contains(x, y) {
                    continue;
                }
                if let Some(rgb) = input.color.get_pixel_checked(x as u32, y as u32) {
                    let [red, green, blue] = rgb.0;
                    let v = 299 * red as u32 + 587 * green as u32 + 114 * blue as u32;
                    gray.push(((v + 500) / 1000) as u8);
                }
            }
        }
        if gray.len() < self.params.min_pixels {
            return ContactReading::bare(ContactState::NoData);
        }
        let Some(mean) = mean_u8(&gray) else {
            return ContactReading::bare(ContactState::NoData);
        };

        let state = if mean < self.params.brightness_threshold {
            ContactState::Touch
        } else {
            ContactState::Hover
        };
        ContactReading {
            state,
            distance_mm: None,
            finger_depth_mm: None,
            brightness: Some(mean),
        }
    }
}

/// Serializable choice of classifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum ContactStrategy {
    Depth(DepthContactParams),
    Shadow(ShadowContactParams),
}

impl Default for ContactStrategy {
    fn default() -> Self {
        Self::Depth(DepthContactParams::default())
    }
}

impl ContactStrategy {
    pub fn build(&self) -> Box<dyn ContactClassifier> {
        match self {
            Self::Depth(p) => Box::new(DepthContactClassifier::new(p.clone())),
            Self::Shadow(p) => Box::new(ShadowContactClassifier::new(p.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use touchhear_core::DepthImage;

    const W: u32 = 200;
    const H: u32 = 160;

    fn sheet_mask() -> RegionMask {
        let hull = [
            Point2::new(40.0_f32, 30.0),
            Point2::new(160.0, 30.0),
            Point2::new(160.0, 130.0),
            Point2::new(40.0, 130.0),
        ];
        RegionMask::from_convex_polygon(W as usize, H as usize, &hull).expect("mask")
    }

    fn depth_with_finger(plane: u16, finger: u16) -> DepthImage {
        let mut depth = DepthImage::filled(W as usize, H as usize, plane, 1.0);
        for y in 60..100 {
            for x in 80..120 {
                depth.set_raw(x, y, finger);
            }
        }
        depth
    }

    fn classify_depth(plane: f32, depth: &DepthImage, tip: Point2<f32>) -> ContactReading {
        let color = RgbImage::from_pixel(W, H, Rgb([255, 255, 255]));
        let mask = sheet_mask();
        DepthContactClassifier::default().classify(&ContactInput {
            fingertip: tip,
            color: &color,
            depth: Some(depth.view()),
            mask: Some(&mask),
            plane_depth_mm: Some(plane),
        })
    }

    #[test]
    fn bands_follow_depth_difference() {
        let tip = Point2::new(100.0, 80.0);
        for (finger, expected) in [
            (490u16, ContactState::Touch),
            (450, ContactState::Hover),
            (350, ContactState::Far),
        ] {
            let reading = classify_depth(500.0, &depth_with_finger(500, finger), tip);
            assert_eq!(reading.state, expected, "finger at {finger} mm");
            assert_eq!(reading.distance_mm, Some(500.0 - finger as f32));
            assert_eq!(reading.finger_depth_mm, Some(finger as f32));
        }
    }

    #[test]
    fn band_edges_are_exclusive() {
        assert_eq!(classify_depth_difference(29.9, 30.0, 80.0), ContactState::Touch);
        assert_eq!(classify_depth_difference(30.0, 30.0, 80.0), ContactState::Hover);
        assert_eq!(classify_depth_difference(80.0, 30.0, 80.0), ContactState::Far);
        assert_eq!(classify_depth_difference(-12.0, 30.0, 80.0), ContactState::Touch);
    }

    #[test]
    fn outside_hull_ignores_depth() {
        let depth = depth_with_finger(500, 490);
        let reading = classify_depth(500.0, &depth, Point2::new(20.0, 80.0));
        assert_eq!(reading, ContactReading::bare(ContactState::Outside));
    }

    #[test]
    fn holes_in_depth_give_no_data() {
        let mut depth = depth_with_finger(500, 490);
        for y in 50..110 {
            for x in 70..130 {
                depth.set_raw(x, y, 0);
            }
        }
        let reading = classify_depth(500.0, &depth, Point2::new(100.0, 80.0));
        assert_eq!(reading.state, ContactState::NoData);
    }

    #[test]
    fn missing_plane_or_mask_is_unknown() {
        let color = RgbImage::from_pixel(W, H, Rgb([255, 255, 255]));
        let depth = depth_with_finger(500, 490);
        let mask = sheet_mask();
        let classifier = DepthContactClassifier::default();
        let mut input = ContactInput {
            fingertip: Point2::new(100.0, 80.0),
            color: &color,
            depth: Some(depth.view()),
            mask: Some(&mask),
            plane_depth_mm: None,
        };
        assert_eq!(classifier.classify(&input).state, ContactState::Unknown);
        input.plane_depth_mm = Some(500.0);
        input.mask = None;
        assert_eq!(classifier.classify(&input).state, ContactState::Unknown);
        input.mask = Some(&mask);
        input.fingertip = Point2::new(-3.0, 80.0);
        assert_eq!(classifier.classify(&input).state, ContactState::Unknown);
    }

    #[test]
    fn shadow_darkness_decides_touch() {
        let mask = sheet_mask();
        let mut color = RgbImage::from_pixel(W, H, Rgb([240, 240, 240]));
        let classifier = ShadowContactClassifier::default();
        let tip = Point2::new(100.0, 80.0);

        let bright = classifier.classify(&ContactInput {
            fingertip: tip,
            color: &color,
            depth: None,
            mask: Some(&mask),
            plane_depth_mm: None,
        });
        assert_eq!(bright.state, ContactState::Hover);
        assert_eq!(bright.brightness, Some(240.0));

        for y in 40..120 {
            for x in 60..140 {
                color.put_pixel(x, y, Rgb([90, 90, 90]));
            }
        }
        let dark = classifier.classify(&ContactInput {
            fingertip: tip,
            color: &color,
            depth: None,
            mask: Some(&mask),
            plane_depth_mm: None,
        });
        assert_eq!(dark.state, ContactState::Touch);
        assert!(!classifier.requires_plane());
    }

    #[test]
    fn strategy_deserializes_by_tag() {
        let s: ContactStrategy =
            serde_json::from_str(r#"{"strategy": "shadow", "brightness_threshold": 150}"#)
                .expect("json");
        let ContactStrategy::Shadow(p) = &s else {
            panic!("expected shadow strategy, got {s:?}");
        };
        assert_eq!(p.brightness_threshold, 150.0);
        assert_eq!(p.radius_px, 30);
        assert_eq!(s.build().name(), "shadow");
        assert_eq!(ContactStrategy::default().build().name(), "depth");
    }
}
