use image::{Rgb, RgbImage};
use touchhear_aruco::builtins::DICT_4X4_50;
use touchhear_aruco::test_support::paint_code;

pub(crate) fn white_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
}

/// Paint dictionary marker `id` with a one-cell black border, top-left at
/// `(x0, y0)`.
pub(crate) fn draw_marker_rgb(img: &mut RgbImage, id: u32, cell_px: u32, x0: u32, y0: u32) {
    let code = DICT_4X4_50.code(id).unwrap_or(0);
    paint_code(code, DICT_4X4_50.marker_size, cell_px as usize, |x, y, v| {
        let (x, y) = (x0 + x as u32, y0 + y as u32);
        if x < img.width() && y < img.height() {
            img.put_pixel(x, y, Rgb([v, v, v]));
        }
    });
}
