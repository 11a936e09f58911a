use nalgebra::Point2;

/// Binary per-pixel mask, row-major, `1` inside.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionMask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RegionMask {
    /// Rasterize a convex polygon (e.g. the output of [`crate::convex_hull`]).
    ///
    /// A pixel `(x, y)` is set when the integer point lies inside the polygon
    /// or on its boundary. Returns `None` for fewer than three vertices.
    pub fn from_convex_polygon(width: usize, height: usize, poly: &[Point2<f32>]) -> Option<Self> {
        if poly.len() < 3 {
            return None;
        }
        let mut data = vec![0u8; width * height];

        for y in 0..height {
            let yf = y as f32;
            let mut lo = f32::INFINITY;
            let mut hi = f32::NEG_INFINITY;
            for (i, a) in poly.iter().enumerate() {
                let b = poly[(i + 1) % poly.len()];
                let (ymin, ymax) = (a.y.min(b.y), a.y.max(b.y));
                if yf < ymin || yf > ymax {
                    continue;
                }
                if (b.y - a.y).abs() < f32::EPSILON {
                    lo = lo.min(a.x.min(b.x));
                    hi = hi.max(a.x.max(b.x));
                } else {
                    let t = (yf - a.y) / (b.y - a.y);
                    let x = a.x + t * (b.x - a.x);
                    lo = lo.min(x);
                    hi = hi.max(x);
                }
            }
            if lo > hi {
                continue;
            }
            let x0 = lo.ceil().max(0.0) as usize;
            let x1 = hi.floor();
            if x1 < 0.0 {
                continue;
            }
            let x1 = (x1 as usize).min(width.saturating_sub(1));
            if x0 > x1 {
                continue;
            }
            data[y * width + x0..=y * width + x1].fill(1);
        }

        Some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        self.data[y as usize * self.width + x as usize] != 0
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}
