//! Four-corner fitting on candidate hulls.

use nalgebra::Point2;
use touchhear_core::polygon_area;

#[inline]
fn side(a: Point2<f32>, b: Point2<f32>, p: Point2<f32>) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

#[inline]
fn dist(a: Point2<f32>, b: Point2<f32>) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Approximate a convex hull by a quadrilateral.
///
/// The longest hull diagonal gives two opposite corners; the hull vertices
/// farthest from it on either side give the other two. The quad is rejected
/// when it covers less than `min_fill` of the hull area or one of its sides
/// is shorter than `min_side`.
///
/// Corners are returned clockwise on screen, starting at the corner closest
/// to the image origin.
pub(crate) fn fit_quad(hull: &[Point2<f32>], min_fill: f32, min_side: f32) -> Option<[Point2<f32>; 4]> {
    if hull.len() < 4 {
        return None;
    }

    let mut diag = (0usize, 0usize, 0.0f32);
    for i in 0..hull.len() {
        for j in i + 1..hull.len() {
            let d = dist(hull[i], hull[j]);
            if d > diag.2 {
                diag = (i, j, d);
            }
        }
    }
    let (a, c) = (hull[diag.0], hull[diag.1]);

    let mut pos: Option<(Point2<f32>, f32)> = None;
    let mut neg: Option<(Point2<f32>, f32)> = None;
    for &p in hull {
        let s = side(a, c, p);
        if s > 0.0 && pos.is_none_or(|(_, best)| s > best) {
            pos = Some((p, s));
        } else if s < 0.0 && neg.is_none_or(|(_, best)| s < best) {
            neg = Some((p, s));
        }
    }
    let (b, _) = pos?;
    let (d, _) = neg?;

    let quad = order_corners([a, b, c, d]);

    let hull_area = polygon_area(hull);
    if hull_area <= 0.0 || (polygon_area(&quad) / hull_area) < min_fill as f64 {
        return None;
    }
    for i in 0..4 {
        if dist(quad[i], quad[(i + 1) % 4]) < min_side {
            return None;
        }
    }
    Some(quad)
}

/// Sort corners by angle around their centroid (clockwise on screen, since
/// image y points down) and rotate so the first is nearest the origin.
pub(crate) fn order_corners(mut pts: [Point2<f32>; 4]) -> [Point2<f32>; 4] {
    let cx = pts.iter().map(|p| p.x).sum::<f32>() / 4.0;
    let cy = pts.iter().map(|p| p.y).sum::<f32>() / 4.0;
    pts.sort_by(|p, q| {
        let ap = (p.y - cy).atan2(p.x - cx);
        let aq = (q.y - cy).atan2(q.x - cx);
        ap.total_cmp(&aq)
    });
    let start = (0..4)
        .min_by(|&i, &j| (pts[i].x + pts[i].y).total_cmp(&(pts[j].x + pts[j].y)))
        .unwrap_or(0);
    pts.rotate_left(start);
    pts
}

/// Centroid of the four corners.
pub(crate) fn quad_center(q: &[Point2<f32>; 4]) -> Point2<f32> {
    Point2::new(
        q.iter().map(|p| p.x).sum::<f32>() / 4.0,
        q.iter().map(|p| p.y).sum::<f32>() / 4.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use touchhear_core::convex_hull;

    #[test]
    fn square_outline_fits_exact_corners() {
        let mut outline = Vec::new();
        for y in 10..40 {
            outline.extend([
                Point2::new(20.0_f32, y as f32),
                Point2::new(20.0, (y + 1) as f32),
                Point2::new(50.0, y as f32),
                Point2::new(50.0, (y + 1) as f32),
            ]);
        }
        let hull = convex_hull(&outline);
        let quad = fit_quad(&hull, 0.85, 8.0).expect("quad");
        assert_eq!(
            quad,
            [
                Point2::new(20.0, 10.0),
                Point2::new(50.0, 10.0),
                Point2::new(50.0, 40.0),
                Point2::new(20.0, 40.0),
            ]
        );
        assert_eq!(quad_center(&quad), Point2::new(35.0, 25.0));
    }

    #[test]
    fn rotated_square_is_recovered() {
        let hull = convex_hull(&[
            Point2::new(50.0_f32, 10.0),
            Point2::new(90.0, 50.0),
            Point2::new(50.0, 90.0),
            Point2::new(10.0, 50.0),
            Point2::new(70.0, 30.0),
        ]);
        let quad = fit_quad(&hull, 0.85, 8.0).expect("quad");
        assert_eq!(quad_center(&quad), Point2::new(50.0, 50.0));
        assert!(quad.contains(&Point2::new(90.0, 50.0)));
        assert!(quad.contains(&Point2::new(10.0, 50.0)));
    }

    #[test]
    fn disc_like_hull_is_rejected() {
        let pts: Vec<Point2<f32>> = (0..32)
            .map(|i| {
                let t = i as f32 / 32.0 * std::f32::consts::TAU;
                Point2::new(100.0 + 40.0 * t.cos(), 100.0 + 40.0 * t.sin())
            })
            .collect();
        let hull = convex_hull(&pts);
        assert!(fit_quad(&hull, 0.85, 8.0).is_none());
    }

    #[test]
    fn thin_sliver_is_rejected() {
        let hull = convex_hull(&[
            Point2::new(0.0_f32, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(100.0, 3.0),
            Point2::new(0.0, 3.0),
        ]);
        assert!(fit_quad(&hull, 0.85, 8.0).is_none());
    }
}
