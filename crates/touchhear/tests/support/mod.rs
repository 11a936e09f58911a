#![allow(dead_code)]

//! Synthetic sheet scenes.
//!
//! The four corner markers sit so that the A4 mapping is 2 px/mm along x and
//! 1 px/mm along y: pixel `(180, 80)` lands on sheet `(50, 50)` mm.

use image::{Rgb, RgbImage};
use nalgebra::Point2;
use touchhear::aruco::builtins::DICT_4X4_50;
use touchhear::core::DepthImage;
use touchhear::SensorFrame;
use touchhear_aruco::test_support::paint_code;

pub const WIDTH: u32 = 640;
pub const HEIGHT: u32 = 480;
pub const CELL_PX: u32 = 8;
pub const MARKER_PX: u32 = 6 * CELL_PX;

/// Marker centers by id.
pub const MARKER_CENTERS: [(u32, u32); 4] = [(100, 40), (480, 40), (480, 317), (100, 317)];

pub const PLANE_MM: u16 = 500;
pub const FINGERTIP: (f32, f32) = (180.0, 80.0);

pub fn fingertip() -> Point2<f32> {
    Point2::new(FINGERTIP.0, FINGERTIP.1)
}

pub fn white_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
}

/// Paint dictionary marker `id`, top-left at `(x0, y0)`.
pub fn draw_marker_rgb(img: &mut RgbImage, id: u32, cell_px: u32, x0: u32, y0: u32) {
    let code = DICT_4X4_50.code(id).expect("marker id in dictionary");
    paint_code(code, DICT_4X4_50.marker_size, cell_px as usize, |x, y, v| {
        let (x, y) = (x0 + x as u32, y0 + y as u32);
        if x < img.width() && y < img.height() {
            img.put_pixel(x, y, Rgb([v, v, v]));
        }
    });
}

/// Color frame with the given corner markers drawn.
pub fn sheet_color(ids: &[u32]) -> RgbImage {
    let mut img = white_frame(WIDTH, HEIGHT);
    for &id in ids {
        let (cx, cy) = MARKER_CENTERS[id as usize];
        draw_marker_rgb(&mut img, id, CELL_PX, cx - MARKER_PX / 2, cy - MARKER_PX / 2);
    }
    img
}

/// Flat sheet at [`PLANE_MM`] with a fingertip-sized patch at `finger_mm`
/// around [`FINGERTIP`].
pub fn sheet_depth(finger_mm: u16) -> DepthImage {
    let mut depth = DepthImage::filled(WIDTH as usize, HEIGHT as usize, PLANE_MM, 1.0);
    for y in 50..110 {
        for x in 150..210 {
            depth.set_raw(x, y, finger_mm);
        }
    }
    depth
}

pub fn sheet_frame(ids: &[u32], finger_mm: Option<u16>) -> SensorFrame {
    SensorFrame {
        color: sheet_color(ids),
        depth: finger_mm.map(sheet_depth),
    }
}

pub fn full_sheet(finger_mm: u16) -> SensorFrame {
    sheet_frame(&[0, 1, 2, 3], Some(finger_mm))
}
