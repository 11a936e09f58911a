//! The printed sheet and its fixed marker layout.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Marker slot on the sheet. The discriminant is the marker id printed there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SheetCorner {
    TopLeft = 0,
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
}

impl SheetCorner {
    pub const ALL: [SheetCorner; 4] = [
        SheetCorner::TopLeft,
        SheetCorner::TopRight,
        SheetCorner::BottomRight,
        SheetCorner::BottomLeft,
    ];

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    #[inline]
    pub fn id(self) -> u32 {
        self as u32
    }
}

/// Physical dimensions of the sheet, in millimeters.
///
/// Marker centers sit `marker_margin_mm` in from each edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalSheet {
    pub width_mm: f32,
    pub height_mm: f32,
    pub marker_margin_mm: f32,
}

impl Default for PhysicalSheet {
    fn default() -> Self {
        Self::A4
    }
}

impl PhysicalSheet {
    pub const A4: PhysicalSheet = PhysicalSheet {
        width_mm: 210.0,
        height_mm: 297.0,
        marker_margin_mm: 10.0,
    };

    /// Physical center of the marker printed at `corner`.
    pub fn reference_point(&self, corner: SheetCorner) -> Point2<f32> {
        let m = self.marker_margin_mm;
        let (w, h) = (self.width_mm, self.height_mm);
        match corner {
            SheetCorner::TopLeft => Point2::new(m, m),
            SheetCorner::TopRight => Point2::new(w - m, m),
            SheetCorner::BottomRight => Point2::new(w - m, h - m),
            SheetCorner::BottomLeft => Point2::new(m, h - m),
        }
    }

    /// Reference point for a marker id; `None` for ids that are not corners.
    pub fn reference_for_id(&self, id: u32) -> Option<Point2<f32>> {
        SheetCorner::from_id(id).map(|c| self.reference_point(c))
    }

    /// Inclusive bounds check against `[0, width] x [0, height]`.
    pub fn contains(&self, p: Point2<f32>) -> bool {
        p.x.is_finite()
            && p.y.is_finite()
            && (0.0..=self.width_mm).contains(&p.x)
            && (0.0..=self.height_mm).contains(&p.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_reference_points_are_inset_by_margin() {
        let sheet = PhysicalSheet::A4;
        assert_eq!(sheet.reference_for_id(0), Some(Point2::new(10.0, 10.0)));
        assert_eq!(sheet.reference_for_id(1), Some(Point2::new(200.0, 10.0)));
        assert_eq!(sheet.reference_for_id(2), Some(Point2::new(200.0, 287.0)));
        assert_eq!(sheet.reference_for_id(3), Some(Point2::new(10.0, 287.0)));
        assert_eq!(sheet.reference_for_id(4), None);
    }

    #[test]
    fn bounds_are_inclusive() {
        let sheet = PhysicalSheet::A4;
        assert!(sheet.contains(Point2::new(0.0, 297.0)));
        assert!(sheet.contains(Point2::new(210.0, 0.0)));
        assert!(!sheet.contains(Point2::new(210.1, 10.0)));
        assert!(!sheet.contains(Point2::new(-0.1, 10.0)));
        assert!(!sheet.contains(Point2::new(f32::NAN, 10.0)));
    }

    #[test]
    fn margin_deserializes_with_defaults() {
        let sheet: PhysicalSheet = serde_json::from_str(r#"{"marker_margin_mm": 3}"#).expect("json");
        assert_eq!(sheet.width_mm, 210.0);
        assert_eq!(sheet.reference_point(SheetCorner::BottomRight), Point2::new(207.0, 294.0));
    }
}
