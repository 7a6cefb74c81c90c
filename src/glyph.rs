//! Built-in glyph and icon artwork.
//!
//! These drawings are the immediate placeholder rasterization for every shape:
//! they need no font or file, so the first frame already has real targets.
//! Refined masks decoded from disk replace them once loaded.

use glam::Vec2;

use crate::error::MaskError;
use crate::mask::AlphaMask;
use crate::shape::ShapeId;

const GLYPH_COLS: u32 = 5;
const GLYPH_ROWS: u32 = 7;

/// 5x7 bitmaps, one byte per row, bit 4 is the leftmost column.
fn glyph_rows(c: char) -> Option<[u8; GLYPH_ROWS as usize]> {
    let rows = match c {
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b11011, 0b10001],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        '<' => [0b00010, 0b00100, 0b01000, 0b10000, 0b01000, 0b00100, 0b00010],
        '/' => [0b00001, 0b00010, 0b00010, 0b00100, 0b01000, 0b01000, 0b10000],
        '>' => [0b01000, 0b00100, 0b00010, 0b00001, 0b00010, 0b00100, 0b01000],
        'i' => [0b00100, 0b00000, 0b01100, 0b00100, 0b00100, 0b00100, 0b01110],
        'n' => [0b00000, 0b00000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001],
        _ => return None,
    };
    Some(rows)
}

/// Draw `text` centered on `center` with glyph cells `height` pixels tall.
///
/// Characters without a bitmap advance the cursor but draw nothing.
pub fn draw_text(mask: &mut AlphaMask, text: &str, center: Vec2, height: f32) {
    let cell = height / GLYPH_ROWS as f32;
    let advance = (GLYPH_COLS + 1) as f32 * cell;
    let count = text.chars().count() as f32;
    let total_width = count * advance - cell;
    let origin = center - Vec2::new(total_width * 0.5, height * 0.5);
    // Slight overlap between cells gives heavier strokes.
    let dot = Vec2::splat(cell * 1.15);

    for (n, c) in text.chars().enumerate() {
        let Some(rows) = glyph_rows(c) else { continue };
        let left = origin.x + n as f32 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_COLS {
                if bits & (1 << (GLYPH_COLS - 1 - col)) != 0 {
                    let at = Vec2::new(left + col as f32 * cell, origin.y + row as f32 * cell);
                    mask.fill_rect(at, dot);
                }
            }
        }
    }
}

/// Text drawn for the lettering shapes.
pub fn shape_text(shape: ShapeId) -> Option<&'static str> {
    match shape {
        ShapeId::Monogram => Some("MB"),
        ShapeId::Developer => Some("WD"),
        ShapeId::Code => Some("</>"),
        _ => None,
    }
}

/// Rasterize a shape's placeholder artwork into a `width` x `height` mask.
///
/// The sphere has no artwork and yields an empty mask.
pub fn rasterize(shape: ShapeId, width: u32, height: u32) -> Result<AlphaMask, MaskError> {
    let mut mask = AlphaMask::new(width, height)?;
    let w = width as f32;
    let c = Vec2::new(w * 0.5, height as f32 * 0.5);

    if let Some(text) = shape_text(shape) {
        let font = (w * 0.5).min(120.0);
        draw_text(&mut mask, text, c, font * 0.75);
        return Ok(mask);
    }

    let s = (w * 0.4).min(100.0);
    let line = s * 0.1;
    match shape {
        ShapeId::Email => {
            let size = Vec2::new(s * 1.5, s);
            let tl = c - size * 0.5;
            mask.stroke_round_rect(tl, size, 0.0, line);
            mask.stroke_polyline(
                &[tl, Vec2::new(c.x, tl.y + size.y * 0.5), Vec2::new(tl.x + size.x, tl.y)],
                line,
            );
        }
        ShapeId::LinkedIn => {
            let side = s * 1.2;
            mask.stroke_round_rect(c - Vec2::splat(side * 0.5), Vec2::splat(side), side * 0.2, line);
            draw_text(&mut mask, "in", c + Vec2::new(0.0, side * 0.05), side * 0.45);
        }
        ShapeId::Bug => {
            mask.fill_ellipse(c, Vec2::new(s * 0.3, s * 0.4));
            mask.fill_circle(c + Vec2::new(0.0, -s * 0.45), s * 0.2);
            let leg = s * 0.08;
            for side in [-1.0f32, 1.0] {
                let legs = [
                    (Vec2::new(0.2, -0.2), Vec2::new(0.6, -0.3)),
                    (Vec2::new(0.3, 0.0), Vec2::new(0.7, 0.0)),
                    (Vec2::new(0.2, 0.2), Vec2::new(0.6, 0.3)),
                ];
                for (from, to) in legs {
                    let flip = Vec2::new(side, 1.0);
                    mask.stroke_segment(c + from * flip * s, c + to * flip * s, leg);
                }
            }
        }
        ShapeId::Music => {
            let heads = [Vec2::new(-0.35, 0.3), Vec2::new(0.35, 0.2)];
            let radii = Vec2::new(0.18, 0.13) * s;
            let mut tops = [Vec2::ZERO; 2];
            for (i, head) in heads.iter().enumerate() {
                let center = c + *head * s;
                mask.fill_ellipse(center, radii);
                let stem_x = center.x + radii.x * 0.85;
                let top = Vec2::new(stem_x, c.y - s * (0.4 + 0.1 * (1 - i) as f32));
                mask.stroke_segment(Vec2::new(stem_x, center.y), top, line * 0.8);
                tops[i] = top;
            }
            mask.stroke_segment(tops[0], tops[1], s * 0.12);
        }
        ShapeId::Camera => {
            let body = Vec2::new(s * 1.2, s * 0.8);
            let tl = c - Vec2::new(body.x * 0.5, s * 0.35);
            mask.stroke_round_rect(tl, body, s * 0.12, line);
            mask.stroke_circle(c + Vec2::new(0.0, s * 0.05), s * 0.22, line);
            mask.fill_rect(c + Vec2::new(-s * 0.2, -s * 0.5), Vec2::new(s * 0.4, s * 0.15));
            mask.fill_circle(c + Vec2::new(s * 0.4, -s * 0.2), s * 0.05);
        }
        ShapeId::Gamepad => {
            let body = Vec2::new(s * 1.4, s * 0.7);
            mask.stroke_round_rect(c - body * 0.5, body, s * 0.3, line);
            let pad = c + Vec2::new(-s * 0.35, 0.0);
            mask.stroke_segment(pad - Vec2::new(s * 0.15, 0.0), pad + Vec2::new(s * 0.15, 0.0), line);
            mask.stroke_segment(pad - Vec2::new(0.0, s * 0.15), pad + Vec2::new(0.0, s * 0.15), line);
            mask.fill_circle(c + Vec2::new(s * 0.3, -s * 0.08), s * 0.07);
            mask.fill_circle(c + Vec2::new(s * 0.45, s * 0.08), s * 0.07);
        }
        ShapeId::Sphere | ShapeId::Monogram | ShapeId::Developer | ShapeId::Code => {}
    }
    Ok(mask)
}
