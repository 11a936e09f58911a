use nalgebra::{Matrix2x3, Matrix3, Point2, Vector3};

/// 6-DoF planar transform, `dst = A * [x, y, 1]^T`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform {
    pub a: Matrix2x3<f64>,
}

impl AffineTransform {
    pub fn new(a: Matrix2x3<f64>) -> Self {
        Self { a }
    }

    /// Exact transform through three correspondences.
    ///
    /// Returns `None` when the source triangle is degenerate.
    pub fn from_3pt(src: &[Point2<f32>; 3], dst: &[Point2<f32>; 3]) -> Option<Self> {
        let (p0, p1, p2) = (src[0], src[1], src[2]);
        let twice_area = ((p1.x - p0.x) as f64) * ((p2.y - p0.y) as f64)
            - ((p2.x - p0.x) as f64) * ((p1.y - p0.y) as f64);
        if twice_area.abs() < 1e-6 {
            return None;
        }

        let m = Matrix3::new(
            src[0].x as f64, src[0].y as f64, 1.0, //
            src[1].x as f64, src[1].y as f64, 1.0, //
            src[2].x as f64, src[2].y as f64, 1.0,
        );
        let lu = m.lu();
        let us = Vector3::new(dst[0].x as f64, dst[1].x as f64, dst[2].x as f64);
        let vs = Vector3::new(dst[0].y as f64, dst[1].y as f64, dst[2].y as f64);
        let row_u = lu.solve(&us)?;
        let row_v = lu.solve(&vs)?;

        let a = Matrix2x3::new(
            row_u[0], row_u[1], row_u[2], //
            row_v[0], row_v[1], row_v[2],
        );
        if !a.iter().all(|v| v.is_finite()) {
            return None;
        }
        Some(Self::new(a))
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.a * Vector3::new(p.x as f64, p.y as f64, 1.0);
        Point2::new(v[0] as f32, v[1] as f32)
    }
}
