//! Depth maps as delivered by RGB-D sensors.
//!
//! Raw values are unsigned integers; `scale_mm` converts them to millimeters
//! (a RealSense-style sensor reports 1 raw unit = 1 mm, others differ).

use nalgebra::Point2;

#[derive(Clone, Debug, PartialEq)]
pub struct DepthImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u16>,
    /// Millimeters per raw unit.
    pub scale_mm: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct DepthImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u16],
    pub scale_mm: f32,
}

impl DepthImage {
    /// Constant depth map, convenient for fixtures and replay placeholders.
    pub fn filled(width: usize, height: usize, raw: u16, scale_mm: f32) -> Self {
        Self {
            width,
            height,
            data: vec![raw; width * height],
            scale_mm,
        }
    }

    pub fn view(&self) -> DepthImageView<'_> {
        DepthImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
            scale_mm: self.scale_mm,
        }
    }

    #[inline]
    pub fn set_raw(&mut self, x: usize, y: usize, raw: u16) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = raw;
        }
    }
}

impl DepthImageView<'_> {
    /// Depth in millimeters at an integer pixel, `None` outside the map.
    #[inline]
    pub fn depth_mm(&self, x: i32, y: i32) -> Option<f32> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.data[y as usize * self.width + x as usize] as f32 * self.scale_mm)
    }

    /// Map a color-frame pixel into this depth map's pixel grid.
    ///
    /// Both frames are assumed to cover the same field of view, so the mapping
    /// is a per-axis rescale.
    pub fn from_color(&self, p: Point2<f32>, color_w: usize, color_h: usize) -> Point2<f32> {
        if color_w == 0 || color_h == 0 {
            return p;
        }
        Point2::new(
            p.x * self.width as f32 / color_w as f32,
            p.y * self.height as f32 / color_h as f32,
        )
    }

    /// Inverse of [`DepthImageView::from_color`].
    pub fn to_color(&self, p: Point2<f32>, color_w: usize, color_h: usize) -> Point2<f32> {
        if self.width == 0 || self.height == 0 {
            return p;
        }
        Point2::new(
            p.x * color_w as f32 / self.width as f32,
            p.y * color_h as f32 / self.height as f32,
        )
    }
}
