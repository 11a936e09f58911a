//! Convex hull and polygon area on image-plane points.

use nalgebra::Point2;

#[inline]
fn cross(o: Point2<f32>, a: Point2<f32>, b: Point2<f32>) -> f64 {
    ((a.x - o.x) as f64) * ((b.y - o.y) as f64) - ((a.y - o.y) as f64) * ((b.x - o.x) as f64)
}

/// Convex hull via Andrew's monotone chain.
///
/// Collinear points on hull edges are dropped. The result is ordered with
/// positive signed area (counter-clockwise in a y-up frame, which reads
/// clockwise on screen).
pub fn convex_hull(points: &[Point2<f32>]) -> Vec<Point2<f32>> {
    let mut pts: Vec<Point2<f32>> = points
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Point2<f32>> = Vec::with_capacity(2 * pts.len());
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Unsigned shoelace area.
pub fn polygon_area(poly: &[Point2<f32>]) -> f64 {
    if poly.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for (i, a) in poly.iter().enumerate() {
        let b = poly[(i + 1) % poly.len()];
        acc += (a.x as f64) * (b.y as f64) - (b.x as f64) * (a.y as f64);
    }
    0.5 * acc.abs()
}
