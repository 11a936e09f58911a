use nalgebra::{DMatrix, Matrix3, Point2, SMatrix, SVector, Vector3};

/// Planar projective transform, `dst ~ H * src`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

fn hartley_transform(pts: &[Point2<f32>]) -> Matrix3<f64> {
    // translate to centroid, scale so the mean distance becomes sqrt(2)
    let n = pts.len().max(1) as f64;
    let cx = pts.iter().map(|p| p.x as f64).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p.y as f64).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| (p.x as f64 - cx).hypot(p.y as f64 - cy))
        .sum::<f64>()
        / n;

    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

#[inline]
fn transform_point(t: &Matrix3<f64>, p: Point2<f32>) -> Point2<f64> {
    let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
    Point2::new(v[0], v[1])
}

fn hartley_normalization(pts: &[Point2<f32>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let t = hartley_transform(pts);
    (pts.map(|p| transform_point(&t, p)), t)
}

/// Bring a normalized-frame solution back to pixel units and fix `h33 = 1`.
fn denormalize(hn: Matrix3<f64>, t_src: Matrix3<f64>, t_dst: Matrix3<f64>) -> Option<Homography> {
    let h = t_dst.try_inverse()? * hn * t_src;
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    let h = h / s;
    if !h.iter().all(|v| v.is_finite()) || h.determinant().abs() < 1e-12 {
        return None;
    }
    Some(Homography::new(h))
}

/// Estimate H such that `dst ~ H * src` from `N >= 4` correspondences.
///
/// Four points are solved exactly with [`homography_from_4pt`]; more points
/// use the normalized DLT (least squares via SVD).
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "trace", skip_all, fields(points = src.len()))
)]
pub fn estimate_homography(src: &[Point2<f32>], dst: &[Point2<f32>]) -> Option<Homography> {
    if src.len() != dst.len() || src.len() < 4 {
        return None;
    }
    if let (Ok(s4), Ok(d4)) = (
        <&[Point2<f32>; 4]>::try_from(src),
        <&[Point2<f32>; 4]>::try_from(dst),
    ) {
        return homography_from_4pt(s4, d4);
    }

    let t_src = hartley_transform(src);
    let t_dst = hartley_transform(dst);

    let mut a = DMatrix::<f64>::zeros(2 * src.len(), 9);
    for (k, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
        let p = transform_point(&t_src, *s);
        let q = transform_point(&t_dst, *d);
        let (x, y, u, v) = (p.x, p.y, q.x, q.y);

        // [ -x -y -1   0  0  0   u*x u*y u ]
        a[(2 * k, 0)] = -x;
        a[(2 * k, 1)] = -y;
        a[(2 * k, 2)] = -1.0;
        a[(2 * k, 6)] = u * x;
        a[(2 * k, 7)] = u * y;
        a[(2 * k, 8)] = u;

        // [ 0  0  0  -x -y -1   v*x v*y v ]
        a[(2 * k + 1, 3)] = -x;
        a[(2 * k + 1, 4)] = -y;
        a[(2 * k + 1, 5)] = -1.0;
        a[(2 * k + 1, 6)] = v * x;
        a[(2 * k + 1, 7)] = v * y;
        a[(2 * k + 1, 8)] = v;
    }

    // h is the right singular vector of the smallest singular value
    let vt = a.svd(true, true).v_t?;
    let h = vt.row(vt.nrows().checked_sub(1)?);
    let hn = Matrix3::from_row_slice(&[h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]]);
    denormalize(hn, t_src, t_dst)
}

/// Compute H such that `dst ~ H * src` from four point correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// when the configuration is degenerate (three collinear points, repeated
/// points).
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let (src_n, t_src) = hartley_normalization(src);
    let (dst_n, t_dst) = hartley_normalization(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = r0 + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    if a.determinant().abs() < 1e-9 {
        return None;
    }
    let x = a.lu().solve(&b)?;
    let hn = Matrix3::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    denormalize(hn, t_src, t_dst)
}
