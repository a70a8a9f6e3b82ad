//! Overlay renderer.
//!
//! Pure function from (frame, predictions) to a drawn composite: a stroked
//! rectangle per prediction plus a filled label tag above its top-left
//! corner. Color is assigned by prediction *index* with golden-angle hue
//! stepping, so adjacent indices are maximally distinguishable. The same
//! class can therefore receive different colors across frames when detection
//! order changes — intentional, documented behavior, not a bug.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::detect::{BBox, Prediction};

const GOLDEN_ANGLE_DEG: f32 = 137.508;
const SATURATION: f32 = 0.70;
const LIGHTNESS: f32 = 0.50;
const STROKE_PX: i32 = 3;

const GLYPH_W: i32 = 5;
const LABEL_SCALE: i32 = 2;
const GLYPH_ADVANCE: i32 = (GLYPH_W + 1) * LABEL_SCALE;
const TAG_HEIGHT: u32 = 24;
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Hue for prediction index `i`: `(i * 137.508) mod 360`. A pure function of
/// the index alone — independent of class and score.
pub fn hue_for_index(index: usize) -> f32 {
    (index as f32 * GOLDEN_ANGLE_DEG) % 360.0
}

/// Stroke/tag color for prediction index `i` at fixed saturation/lightness.
pub fn color_for_index(index: usize) -> Rgba<u8> {
    let [r, g, b] = hsl_to_rgb(hue_for_index(index), SATURATION, LIGHTNESS);
    Rgba([r, g, b, 255])
}

/// Label text: class name plus integer confidence percentage.
pub fn label_text(prediction: &Prediction) -> String {
    format!(
        "{} ({}%)",
        prediction.class_label,
        (prediction.score * 100.0).round() as i32
    )
}

/// Draw `predictions` over a copy of `base`, in input order.
pub fn render(base: &RgbaImage, predictions: &[Prediction]) -> RgbaImage {
    let mut out = base.clone();
    for (index, prediction) in predictions.iter().enumerate() {
        let color = color_for_index(index);
        draw_bbox(&mut out, &prediction.bbox, color);
        draw_label(&mut out, prediction, color);
    }
    out
}

fn draw_bbox(img: &mut RgbaImage, bbox: &BBox, color: Rgba<u8>) {
    let x = bbox.x.round() as i32;
    let y = bbox.y.round() as i32;
    let w = bbox.width.round() as i32;
    let h = bbox.height.round() as i32;
    for inset in 0..STROKE_PX {
        let rw = w - 2 * inset;
        let rh = h - 2 * inset;
        if rw <= 0 || rh <= 0 {
            break;
        }
        let rect = Rect::at(x + inset, y + inset).of_size(rw as u32, rh as u32);
        draw_hollow_rect_mut(img, rect, color);
    }
}

fn draw_label(img: &mut RgbaImage, prediction: &Prediction, color: Rgba<u8>) {
    let text = label_text(prediction);
    let x = prediction.bbox.x.round() as i32;
    let y = prediction.bbox.y.round() as i32;

    let text_w = text.chars().count() as i32 * GLYPH_ADVANCE;
    let tag_w = (text_w + 8).max(1) as u32;
    // Above the box; clamped inside the frame when the box touches the top.
    let tag_y = (y - TAG_HEIGHT as i32).max(0);

    draw_filled_rect_mut(img, Rect::at(x, tag_y).of_size(tag_w, TAG_HEIGHT), color);
    draw_text_5x7(img, &text, x + 4, tag_y + 5);
}

/// Render `text` with the built-in 5x7 face, scaled by `LABEL_SCALE`.
fn draw_text_5x7(img: &mut RgbaImage, text: &str, origin_x: i32, origin_y: i32) {
    let (width, height) = (img.width() as i32, img.height() as i32);
    let mut pen_x = origin_x;
    for ch in text.chars() {
        let rows = glyph_rows(ch);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                let px = pen_x + col * LABEL_SCALE;
                let py = origin_y + row as i32 * LABEL_SCALE;
                for dy in 0..LABEL_SCALE {
                    for dx in 0..LABEL_SCALE {
                        let (tx, ty) = (px + dx, py + dy);
                        if tx >= 0 && ty >= 0 && tx < width && ty < height {
                            img.put_pixel(tx as u32, ty as u32, WHITE);
                        }
                    }
                }
            }
        }
        pen_x += GLYPH_ADVANCE;
    }
}

/// 5x7 bitmap rows (top to bottom, bit 4 = leftmost column). Letters are
/// case-folded; anything without a glyph renders as a filled block.
fn glyph_rows(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x06, 0x08, 0x10, 0x1F],
        '3' => [0x0E, 0x11, 0x01, 0x06, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '%' => [0x19, 0x19, 0x02, 0x04, 0x08, 0x13, 0x13],
        '-' => [0x00, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        ' ' => [0x00; 7],
        _ => [0x1F; 7],
    }
}

fn hsl_to_rgb(hue_deg: f32, saturation: f32, lightness: f32) -> [u8; 3] {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let hp = (hue_deg / 60.0).clamp(0.0, 5.999);
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    [
        ((r1 + m) * 255.0).round() as u8,
        ((g1 + m) * 255.0).round() as u8,
        ((b1 + m) * 255.0).round() as u8,
    ]
}
