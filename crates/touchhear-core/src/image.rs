/// Borrowed 8-bit grayscale image, row-major.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // len = w*h
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize, fill: u8) -> Self {
        Self {
            width,
            height,
            data: vec![fill; width * height],
        }
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = v;
        }
    }
}

impl GrayImageView<'_> {
    /// Pixel value, or `None` outside the image.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.data[y as usize * self.width + x as usize])
    }

    /// Pixel value with zero padding outside the image.
    #[inline]
    pub fn get_or_zero(&self, x: i32, y: i32) -> u8 {
        self.get(x, y).unwrap_or(0)
    }
}

/// Convert an interleaved RGB8 buffer into grayscale using BT.601 luma weights.
///
/// Returns `None` if `rgb.len() != width * height * 3`.
pub fn rgb_to_gray(width: usize, height: usize, rgb: &[u8]) -> Option<GrayImage> {
    if rgb.len() != width * height * 3 {
        return None;
    }
    let data = rgb
        .chunks_exact(3)
        .map(|px| {
            let v = 299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32;
            ((v + 500) / 1000) as u8
        })
        .collect();
    Some(GrayImage {
        width,
        height,
        data,
    })
}
