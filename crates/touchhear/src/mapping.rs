//! Camera pixel -> sheet millimeter mapping.

use crate::sheet::PhysicalSheet;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use touchhear_core::{estimate_homography, AffineTransform, Homography};

/// Which transform model was active for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    Affine,
    Projective,
}

/// Image -> sheet transform, chosen by the number of visible corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaneTransform {
    Affine(AffineTransform),
    Projective(Homography),
}

impl PlaneTransform {
    /// Exactly 3 correspondences give an affine transform, 4 or more a
    /// homography. Fewer, or a degenerate layout, give `None`.
    pub fn from_correspondences(src: &[Point2<f32>], dst: &[Point2<f32>]) -> Option<Self> {
        if src.len() != dst.len() {
            return None;
        }
        match src.len() {
            0..=2 => None,
            3 => {
                let s: &[Point2<f32>; 3] = src.try_into().ok()?;
                let d: &[Point2<f32>; 3] = dst.try_into().ok()?;
                AffineTransform::from_3pt(s, d).map(Self::Affine)
            }
            _ => estimate_homography(src, dst).map(Self::Projective),
        }
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        match self {
            Self::Affine(a) => a.apply(p),
            Self::Projective(h) => h.apply(p),
        }
    }

    pub fn kind(&self) -> TransformKind {
        match self {
            Self::Affine(_) => TransformKind::Affine,
            Self::Projective(_) => TransformKind::Projective,
        }
    }
}

/// Maps camera pixels onto the physical sheet using the corner markers.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoordinateMapper {
    sheet: PhysicalSheet,
}

impl CoordinateMapper {
    pub fn new(sheet: PhysicalSheet) -> Self {
        Self { sheet }
    }

    pub fn sheet(&self) -> &PhysicalSheet {
        &self.sheet
    }

    /// Transform from the visible corner markers; ids without a reference
    /// point are ignored.
    pub fn transform(&self, markers: &BTreeMap<u32, Point2<f32>>) -> Option<PlaneTransform> {
        let (src, dst): (Vec<Point2<f32>>, Vec<Point2<f32>>) = markers
            .iter()
            .filter_map(|(&id, &px)| self.sheet.reference_for_id(id).map(|mm| (px, mm)))
            .unzip();
        PlaneTransform::from_correspondences(&src, &dst)
    }

    /// Apply a prepared transform; `None` if the point leaves the sheet.
    ///
    /// Accepted points are rounded to 0.1 mm.
    pub fn map_with(&self, transform: &PlaneTransform, pixel: Point2<f32>) -> Option<Point2<f32>> {
        let p = transform.apply(pixel);
        if !self.sheet.contains(p) {
            return None;
        }
        Some(Point2::new(round_tenth(p.x), round_tenth(p.y)))
    }

    pub fn map(
        &self,
        pixel: Point2<f32>,
        markers: &BTreeMap<u32, Point2<f32>>,
    ) -> Option<Point2<f32>> {
        let t = self.transform(markers)?;
        self.map_with(&t, pixel)
    }
}

#[inline]
fn round_tenth(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Corner markers of a sheet seen head-on at 2 px/mm horizontally and
    /// 1 px/mm vertically.
    fn head_on() -> BTreeMap<u32, Point2<f32>> {
        BTreeMap::from([
            (0, Point2::new(100.0, 40.0)),
            (1, Point2::new(480.0, 40.0)),
            (2, Point2::new(480.0, 317.0)),
            (3, Point2::new(100.0, 317.0)),
        ])
    }

    #[test]
    fn markers_map_onto_their_reference_points() {
        let mapper = CoordinateMapper::default();
        let markers = head_on();
        for (&id, &px) in &markers {
            let mm = mapper.map(px, &markers).expect("inside sheet");
            let expected = PhysicalSheet::A4.reference_for_id(id).expect("corner");
            assert_abs_diff_eq!(mm.x, expected.x, epsilon = 0.051);
            assert_abs_diff_eq!(mm.y, expected.y, epsilon = 0.051);
        }
    }

    #[test]
    fn any_three_markers_select_affine() {
        let mapper = CoordinateMapper::default();
        for missing in 0..4u32 {
            let mut markers = head_on();
            markers.remove(&missing);
            let t = mapper.transform(&markers).expect("three corners");
            assert_eq!(t.kind(), TransformKind::Affine);
            let mm = mapper.map_with(&t, Point2::new(180.0, 80.0)).expect("inside");
            assert_abs_diff_eq!(mm.x, 50.0, epsilon = 1e-4);
            assert_abs_diff_eq!(mm.y, 50.0, epsilon = 1e-4);
        }
        assert_eq!(
            mapper.transform(&head_on()).map(|t| t.kind()),
            Some(TransformKind::Projective)
        );
    }

    #[test]
    fn fewer_than_three_markers_give_no_mapping() {
        let mapper = CoordinateMapper::default();
        let mut markers = head_on();
        markers.retain(|&id, _| id == 0 || id == 2);
        assert!(mapper.map(Point2::new(200.0, 100.0), &markers).is_none());
    }

    #[test]
    fn points_off_the_sheet_are_rejected() {
        let mapper = CoordinateMapper::default();
        let markers = head_on();
        // left of x = 0 mm
        assert!(mapper.map(Point2::new(70.0, 100.0), &markers).is_none());
        // below y = 297 mm
        assert!(mapper.map(Point2::new(200.0, 330.0), &markers).is_none());
        // between the marker and the sheet edge is still on the sheet
        let mm = mapper.map(Point2::new(82.0, 32.0), &markers).expect("inside");
        assert_abs_diff_eq!(mm.x, 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(mm.y, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn mapped_values_are_rounded_to_a_tenth() {
        let mapper = CoordinateMapper::default();
        let mm = mapper
            .map(Point2::new(123.45, 67.89), &head_on())
            .expect("inside");
        assert_abs_diff_eq!(mm.x, 21.7, epsilon = 1e-4);
        assert_abs_diff_eq!(mm.y, 37.9, epsilon = 1e-4);
    }

    #[test]
    fn unknown_ids_do_not_count_as_correspondences() {
        let mapper = CoordinateMapper::default();
        let mut markers = head_on();
        markers.retain(|&id, _| id < 2);
        markers.insert(9, Point2::new(300.0, 300.0));
        assert!(mapper.transform(&markers).is_none());
    }
}
