//! Synthetic markers for tests.
//!
//! Enabled for this crate's own tests and, through the `test-support`
//! feature, for downstream test code that needs printed-looking markers.

use touchhear_core::GrayImage;

/// Walk the cells of a bordered marker for `code`, calling `put(x, y, value)`
/// for every pixel relative to the marker's top-left corner. Black is `0`.
pub fn paint_code(code: u64, bits: usize, cell_px: usize, mut put: impl FnMut(usize, usize, u8)) {
    let cells = bits + 2;
    for cy in 0..cells {
        for cx in 0..cells {
            let border = cx == 0 || cy == 0 || cx + 1 == cells || cy + 1 == cells;
            let black = border || (code >> ((cy - 1) * bits + (cx - 1))) & 1 == 1;
            let v = if black { 0 } else { 255 };
            for yy in 0..cell_px {
                for xx in 0..cell_px {
                    put(cx * cell_px + xx, cy * cell_px + yy, v);
                }
            }
        }
    }
}

/// Paint a bordered marker with `cell_px` pixels per bit, top-left at `(x0, y0)`.
pub fn draw_marker(
    img: &mut GrayImage,
    code: u64,
    bits: usize,
    cell_px: usize,
    x0: usize,
    y0: usize,
) {
    paint_code(code, bits, cell_px, |x, y, v| {
        let (x, y) = (x0 + x, y0 + y);
        if x < img.width && y < img.height {
            img.set(x, y, v);
        }
    });
}
