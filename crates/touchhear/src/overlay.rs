//! Annotated preview frames for operators.

use crate::contact::ContactState;
use crate::sheet::SheetCorner;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut,
    draw_line_segment_mut,
};
use imageproc::rect::Rect;
use nalgebra::Point2;

const MARKER: Rgb<u8> = Rgb([0, 200, 255]);
const HULL: Rgb<u8> = Rgb([0, 255, 0]);
const PRESENT: Rgb<u8> = Rgb([0, 200, 0]);
const MISSING: Rgb<u8> = Rgb([200, 0, 0]);
const BAR_BG: Rgb<u8> = Rgb([60, 60, 60]);
const BAR_FG: Rgb<u8> = Rgb([255, 200, 0]);
const BAR_DONE: Rgb<u8> = Rgb([0, 220, 0]);
const TEXT: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT_BG: Rgb<u8> = Rgb([0, 0, 0]);

/// Status label origin, right of the presence boxes.
const LABEL_X: i32 = 84;
const LABEL_Y: i32 = 8;
const LABEL_SCALE: u32 = 2;

/// Everything the frame loop knows that is worth drawing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayData {
    /// Corner quads of detected sheet markers.
    pub marker_quads: Vec<[Point2<f32>; 4]>,
    pub marker_centers: Vec<Point2<f32>>,
    /// Convex hull of the marker centers (sheet region).
    pub sheet_hull: Vec<Point2<f32>>,
    pub fingertips: Vec<(Point2<f32>, ContactState)>,
    /// Detected flag per sheet corner, indexed by marker id.
    pub corners_present: [bool; 4],
    pub calibration_progress: f32,
    pub is_calibrated: bool,
}

impl OverlayData {
    /// One-line status shown next to the presence boxes.
    pub fn status_line(&self) -> String {
        let found = self.corners_present.iter().filter(|&&p| p).count();
        let mut line = if found < 3 {
            format!("NO BOARD {found}/4")
        } else if self.is_calibrated {
            "READY".to_string()
        } else {
            let pct = (self.calibration_progress.clamp(0.0, 1.0) * 100.0).round() as u32;
            format!("CALIBRATING {pct}%")
        };
        let touching = self.fingertips.iter().filter(|(_, s)| s.is_touch()).count();
        if touching > 0 {
            line.push_str(&format!(" TOUCH {touching}"));
        }
        line
    }
}

fn state_color(state: ContactState) -> Rgb<u8> {
    match state {
        ContactState::Touch => Rgb([255, 0, 0]),
        ContactState::Hover => Rgb([255, 165, 0]),
        ContactState::Far => Rgb([0, 160, 255]),
        ContactState::NoData => Rgb([160, 160, 160]),
        ContactState::Outside => Rgb([128, 0, 128]),
        ContactState::Unknown => Rgb([255, 255, 255]),
    }
}

fn draw_polyline_closed(img: &mut RgbImage, pts: &[Point2<f32>], color: Rgb<u8>) {
    if pts.len() < 2 {
        return;
    }
    for (i, a) in pts.iter().enumerate() {
        let b = pts[(i + 1) % pts.len()];
        draw_line_segment_mut(img, (a.x, a.y), (b.x, b.y), color);
    }
}

/// Draw the overlay onto a copy of `color`.
pub fn render(color: &RgbImage, overlay: &OverlayData) -> RgbImage {
    let mut img = color.clone();
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img;
    }

    draw_polyline_closed(&mut img, &overlay.sheet_hull, HULL);
    for quad in &overlay.marker_quads {
        draw_polyline_closed(&mut img, quad, MARKER);
    }
    for c in &overlay.marker_centers {
        draw_filled_circle_mut(&mut img, (c.x as i32, c.y as i32), 3, MARKER);
    }

    for &(p, state) in &overlay.fingertips {
        let center = (p.x as i32, p.y as i32);
        let radius = if state.is_touch() { 12 } else { 8 };
        draw_filled_circle_mut(&mut img, center, radius, state_color(state));
        draw_hollow_circle_mut(&mut img, center, radius + 2, Rgb([0, 0, 0]));
    }

    // marker presence boxes, top-left in id order
    let box_px = 14u32;
    for corner in SheetCorner::ALL {
        let i = corner.id() as usize;
        let x = 8 + i as i32 * (box_px as i32 + 4);
        let rect = Rect::at(x, 8).of_size(box_px, box_px);
        let fill = if overlay.corners_present[i] {
            PRESENT
        } else {
            MISSING
        };
        draw_filled_rect_mut(&mut img, rect, fill);
        draw_hollow_rect_mut(&mut img, rect, Rgb([0, 0, 0]));
    }

    draw_label(&mut img, LABEL_X, LABEL_Y, LABEL_SCALE, &overlay.status_line());

    // calibration progress along the bottom edge
    let bar_h = 8u32.min(h);
    let bar_y = (h - bar_h) as i32;
    draw_filled_rect_mut(&mut img, Rect::at(0, bar_y).of_size(w, bar_h), BAR_BG);
    let filled = (overlay.calibration_progress.clamp(0.0, 1.0) * w as f32) as u32;
    if filled > 0 {
        let fg = if overlay.is_calibrated {
            BAR_DONE
        } else {
            BAR_FG
        };
        draw_filled_rect_mut(&mut img, Rect::at(0, bar_y).of_size(filled, bar_h), fg);
    }

    img
}

/// 3x5 bitmap glyph, one row per byte, leftmost column in bit 2.
/// Lowercase maps to uppercase; anything without a glyph renders blank.
fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b110, 0b001, 0b010, 0b100, 0b111],
        '3' => [0b110, 0b001, 0b010, 0b001, 0b110],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b110, 0b001, 0b110],
        '6' => [0b011, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b110],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        _ => [0; 5],
    }
}

/// Draw `text` on a dark backing box; pixels past the frame are clipped.
fn draw_label(img: &mut RgbImage, x: i32, y: i32, scale: u32, text: &str) {
    let advance = 4 * scale;
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return;
    }
    let pad = scale as i32;
    let backing = Rect::at(x - pad, y - pad).of_size(chars * advance + scale, 5 * scale + 2 * scale);
    draw_filled_rect_mut(img, backing, TEXT_BG);
    for (i, c) in text.chars().enumerate() {
        let gx = x + (i as u32 * advance) as i32;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..3u32 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                let px = gx + (col * scale) as i32;
                let py = y + (row as u32 * scale) as i32;
                draw_filled_rect_mut(img, Rect::at(px, py).of_size(scale, scale), TEXT);
            }
        }
    }
}

/// Encode as baseline JPEG.
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode_image(img)?;
    Ok(out)
}
