//! Bit sampling of candidate quads.

use crate::threshold::otsu_threshold_from_samples;
use nalgebra::Point2;
use touchhear_core::{homography_from_4pt, GrayImageView, Homography};

/// Side of the canonical square the quad is mapped from.
const CANONICAL_SIDE: f32 = 60.0;
const THRESH_SUBDIV: usize = 3;

#[derive(Clone, Copy, Debug)]
pub(crate) struct MarkerObservation {
    /// Inner bits, row-major, black = 1, in quad corner order.
    pub code: u64,
    pub border_score: f32,
    pub inverted: bool,
}

/// Samples a `(bits + 2·border)²` cell grid through the quad homography.
pub(crate) struct QuadDecoder {
    bits: usize,
    border: usize,
    cells: usize,
    min_border_score: f32,
    allow_inverted: bool,
    canonical: [Point2<f32>; 4],
    points: Vec<Point2<f32>>,
    threshold_points: Vec<Point2<f32>>,
    scratch_bits: Vec<u8>,
    scratch_thr: Vec<u8>,
}

impl QuadDecoder {
    pub fn new(
        bits: usize,
        border: usize,
        min_border_score: f32,
        allow_inverted: bool,
    ) -> Option<Self> {
        let cells = bits + 2 * border;
        if bits == 0 || bits * bits > 64 {
            return None;
        }

        let s = CANONICAL_SIDE;
        let step = s / cells as f32;
        let mut points = Vec::with_capacity(cells * cells);
        for cy in 0..cells {
            for cx in 0..cells {
                points.push(Point2::new(
                    (cx as f32 + 0.5) * step,
                    (cy as f32 + 0.5) * step,
                ));
            }
        }

        let grid = cells * THRESH_SUBDIV;
        let tstep = s / grid as f32;
        let mut threshold_points = Vec::with_capacity(grid * grid);
        for ty in 0..grid {
            for tx in 0..grid {
                threshold_points.push(Point2::new(
                    (tx as f32 + 0.5) * tstep,
                    (ty as f32 + 0.5) * tstep,
                ));
            }
        }

        Some(Self {
            bits,
            border,
            cells,
            min_border_score,
            allow_inverted,
            canonical: [
                Point2::new(0.0, 0.0),
                Point2::new(s, 0.0),
                Point2::new(s, s),
                Point2::new(0.0, s),
            ],
            scratch_bits: Vec::with_capacity(points.len()),
            scratch_thr: Vec::with_capacity(threshold_points.len()),
            points,
            threshold_points,
        })
    }

    pub fn decode(
        &mut self,
        img: &GrayImageView<'_>,
        corners: &[Point2<f32>; 4],
    ) -> Option<MarkerObservation> {
        let h = homography_from_4pt(&self.canonical, corners)?;
        self.sample(img, &h)?;
        self.classify()
    }

    fn sample(&mut self, img: &GrayImageView<'_>, h: &Homography) -> Option<()> {
        self.scratch_bits.clear();
        for p in &self.points {
            let q = h.apply(*p);
            self.scratch_bits.push(sample_mean_3x3(img, q.x, q.y)?);
        }

        self.scratch_thr.clear();
        for p in &self.threshold_points {
            let q = h.apply(*p);
            if let Some(v) = sample_mean_3x3(img, q.x, q.y) {
                self.scratch_thr.push(v);
            }
        }
        Some(())
    }

    fn classify(&self) -> Option<MarkerObservation> {
        let thr = if self.scratch_thr.is_empty() {
            otsu_threshold_from_samples(&self.scratch_bits)
        } else {
            otsu_threshold_from_samples(&self.scratch_thr)
        };

        let cells = self.cells;
        let mut best: Option<MarkerObservation> = None;

        let polarities: &[bool] = if self.allow_inverted {
            &[false, true]
        } else {
            &[false]
        };
        for &inverted in polarities {
            let mut border_ok = 0u32;
            let mut border_total = 0u32;
            let mut code = 0u64;

            for cy in 0..cells {
                for cx in 0..cells {
                    let is_black = (self.scratch_bits[cy * cells + cx] < thr) != inverted;
                    let is_border = self.border > 0
                        && (cx < self.border
                            || cy < self.border
                            || cx >= cells - self.border
                            || cy >= cells - self.border);
                    if is_border {
                        border_total += 1;
                        border_ok += is_black as u32;
                    } else if is_black {
                        let idx = (cy - self.border) * self.bits + (cx - self.border);
                        code |= 1u64 << idx;
                    }
                }
            }

            let border_score = if border_total > 0 {
                border_ok as f32 / border_total as f32
            } else {
                1.0
            };
            if border_score < self.min_border_score {
                continue;
            }
            if best.is_none_or(|b| border_score > b.border_score) {
                best = Some(MarkerObservation {
                    code,
                    border_score,
                    inverted,
                });
            }
        }

        best
    }
}

fn sample_mean_3x3(img: &GrayImageView<'_>, x: f32, y: f32) -> Option<u8> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let ix = x.floor() as i32;
    let iy = y.floor() as i32;
    if ix < 1 || iy < 1 || ix + 1 >= img.width as i32 || iy + 1 >= img.height as i32 {
        return None;
    }

    let mut sum = 0u32;
    for dy in -1..=1 {
        for dx in -1..=1 {
            sum += img.get_or_zero(ix + dx, iy + dy) as u32;
        }
    }
    Some((sum / 9) as u8)
}
