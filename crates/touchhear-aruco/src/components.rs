//! Connected dark regions of a binarized frame.

use nalgebra::Point2;

/// One 8-connected foreground component.
#[derive(Clone, Debug)]
pub(crate) struct DarkBlob {
    pub area: usize,
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
    /// Pixel-corner outline: for every covered row, the outer corners of its
    /// leftmost and rightmost pixels. The convex hull of these points is the
    /// hull of the component's pixel squares.
    pub outline: Vec<Point2<f32>>,
}

impl DarkBlob {
    #[inline]
    pub fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }
}

/// Label 8-connected components of `binary` (non-zero = foreground) whose
/// bounding box side lies in `[min_side, max_side]`.
pub(crate) fn dark_components(
    binary: &[u8],
    width: usize,
    height: usize,
    min_side: usize,
    max_side: usize,
) -> Vec<DarkBlob> {
    let mut visited = vec![false; width * height];
    let mut stack: Vec<usize> = Vec::new();
    let mut rows: Vec<(usize, usize, usize)> = Vec::new(); // (y, min_x, max_x)
    let mut out = Vec::new();

    for seed in 0..width * height {
        if binary[seed] == 0 || visited[seed] {
            continue;
        }
        visited[seed] = true;
        stack.push(seed);

        let mut area = 0usize;
        let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
        let (mut max_x, mut max_y) = (0usize, 0usize);
        let mut pixels: Vec<(usize, usize)> = Vec::new();

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % width, idx / width);
            area += 1;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            pixels.push((x, y));

            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                        continue;
                    }
                    let n = ny as usize * width + nx as usize;
                    if binary[n] != 0 && !visited[n] {
                        visited[n] = true;
                        stack.push(n);
                    }
                }
            }
        }

        let (bw, bh) = (max_x - min_x + 1, max_y - min_y + 1);
        if bw < min_side || bh < min_side || bw > max_side || bh > max_side {
            continue;
        }

        rows.clear();
        rows.resize(bh, (0, usize::MAX, 0));
        for &(x, y) in &pixels {
            let r = &mut rows[y - min_y];
            r.0 = y;
            r.1 = r.1.min(x);
            r.2 = r.2.max(x);
        }
        let mut outline = Vec::with_capacity(rows.len() * 4);
        for &(y, lo, hi) in rows.iter().filter(|r| r.1 != usize::MAX) {
            let (y0, y1) = (y as f32, (y + 1) as f32);
            let (x0, x1) = (lo as f32, (hi + 1) as f32);
            outline.extend([
                Point2::new(x0, y0),
                Point2::new(x0, y1),
                Point2::new(x1, y0),
                Point2::new(x1, y1),
            ]);
        }

        out.push(DarkBlob {
            area,
            min_x,
            min_y,
            max_x,
            max_y,
            outline,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paint(binary: &mut [u8], width: usize, x0: usize, y0: usize, x1: usize, y1: usize) {
        for y in y0..y1 {
            for x in x0..x1 {
                binary[y * width + x] = 1;
            }
        }
    }

    #[test]
    fn separate_blobs_are_labelled_independently() {
        let (w, h) = (30, 20);
        let mut bin = vec![0u8; w * h];
        paint(&mut bin, w, 2, 2, 8, 8);
        paint(&mut bin, w, 15, 5, 25, 15);
        let blobs = dark_components(&bin, w, h, 1, 100);
        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs[0].area, 36);
        assert_eq!((blobs[1].width(), blobs[1].height()), (10, 10));
    }

    #[test]
    fn diagonal_neighbours_connect() {
        let (w, h) = (4, 4);
        let mut bin = vec![0u8; w * h];
        bin[0] = 1;
        bin[w + 1] = 1;
        bin[2 * w + 2] = 1;
        let blobs = dark_components(&bin, w, h, 1, 10);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].area, 3);
    }

    #[test]
    fn size_filter_drops_specks() {
        let (w, h) = (20, 20);
        let mut bin = vec![0u8; w * h];
        paint(&mut bin, w, 1, 1, 3, 3);
        paint(&mut bin, w, 5, 5, 15, 15);
        let blobs = dark_components(&bin, w, h, 4, 20);
        assert_eq!(blobs.len(), 1);
        assert_eq!((blobs[0].min_x, blobs[0].min_y), (5, 5));
        assert_eq!(blobs[0].outline.len(), 40);
    }
}
