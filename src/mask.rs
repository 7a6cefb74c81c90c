//! Alpha masks and a small coverage rasterizer.
//!
//! A mask is a grid of opacity values. Shapes are rasterized into masks either
//! procedurally (see [`crate::glyph`]) or by decoding an image prepared ahead of
//! time, and the point-set generator samples the opaque cells.

use std::path::Path;

use glam::Vec2;
use image::DynamicImage;

use crate::error::MaskError;

/// Opacity grid, row-major, one byte per cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl AlphaMask {
    /// Create a fully transparent mask.
    pub fn new(width: u32, height: u32) -> Result<Self, MaskError> {
        if width == 0 || height == 0 {
            return Err(MaskError::Degenerate { width, height });
        }
        Ok(Self {
            width,
            height,
            data: vec![0; (width * height) as usize],
        })
    }

    /// Convert a decoded image. Bright opaque pixels become opaque cells,
    /// so both white-on-black and white-on-transparent artwork work.
    pub fn from_image(img: &DynamicImage) -> Result<Self, MaskError> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut mask = Self::new(width, height)?;
        for (cell, px) in mask.data.iter_mut().zip(rgba.pixels()) {
            let [r, g, b, a] = px.0;
            let bright = r.max(g).max(b) as u32;
            *cell = (bright * a as u32 / 255) as u8;
        }
        Ok(mask)
    }

    /// Decode an image file into a mask.
    pub fn open(path: &Path) -> Result<Self, MaskError> {
        let bytes = std::fs::read(path)?;
        let img = image::load_from_memory(&bytes)?;
        Self::from_image(&img)
    }

    /// Resample to new dimensions with nearest-neighbour lookup.
    pub fn resized(&self, width: u32, height: u32) -> Result<Self, MaskError> {
        let mut out = Self::new(width, height)?;
        for y in 0..height {
            let sy = (y as u64 * self.height as u64 / height as u64) as u32;
            for x in 0..width {
                let sx = (x as u64 * self.width as u64 / width as u64) as u32;
                out.data[(y * width + x) as usize] = self.get(sx, sy);
            }
        }
        Ok(out)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Opacity at a cell; zero outside the mask.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize]
        } else {
            0
        }
    }

    /// Sample at normalized coordinates in `[0, 1]`.
    pub fn sample_uv(&self, u: f32, v: f32) -> u8 {
        let x = (u.clamp(0.0, 1.0) * (self.width - 1) as f32).round() as u32;
        let y = (v.clamp(0.0, 1.0) * (self.height - 1) as f32).round() as u32;
        self.get(x, y)
    }

    /// Number of cells strictly above `threshold`.
    pub fn count_above(&self, threshold: u8) -> usize {
        self.data.iter().filter(|&&a| a > threshold).count()
    }

    /// Iterate `(x, y, opacity)` for every cell.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, u8)> + '_ {
        let w = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, &a)| (i as u32 % w, i as u32 / w, a))
    }

    /// Mark every cell whose center satisfies `inside`, within a bounding box.
    fn paint_where(&mut self, min: Vec2, max: Vec2, inside: impl Fn(Vec2) -> bool) {
        let x0 = min.x.floor().max(0.0) as u32;
        let y0 = min.y.floor().max(0.0) as u32;
        let x1 = (max.x.ceil().max(0.0) as u32).min(self.width);
        let y1 = (max.y.ceil().max(0.0) as u32).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                if inside(Vec2::new(x as f32 + 0.5, y as f32 + 0.5)) {
                    self.data[(y * self.width + x) as usize] = 255;
                }
            }
        }
    }

    /// Fill an axis-aligned rectangle.
    pub fn fill_rect(&mut self, origin: Vec2, size: Vec2) {
        let max = origin + size;
        self.paint_where(origin, max, |p| {
            p.x >= origin.x && p.y >= origin.y && p.x < max.x && p.y < max.y
        });
    }

    /// Fill an axis-aligned ellipse.
    pub fn fill_ellipse(&mut self, center: Vec2, radii: Vec2) {
        if radii.x <= 0.0 || radii.y <= 0.0 {
            return;
        }
        self.paint_where(center - radii, center + radii, |p| {
            let d = (p - center) / radii;
            d.length_squared() <= 1.0
        });
    }

    /// Fill a circle.
    pub fn fill_circle(&mut self, center: Vec2, radius: f32) {
        self.fill_ellipse(center, Vec2::splat(radius));
    }

    /// Stroke a segment with round caps.
    pub fn stroke_segment(&mut self, a: Vec2, b: Vec2, width: f32) {
        let half = width * 0.5;
        let pad = Vec2::splat(half);
        self.paint_where(a.min(b) - pad, a.max(b) + pad, |p| {
            segment_distance(p, a, b) <= half
        });
    }

    /// Stroke connected segments through `points`.
    pub fn stroke_polyline(&mut self, points: &[Vec2], width: f32) {
        for pair in points.windows(2) {
            self.stroke_segment(pair[0], pair[1], width);
        }
    }

    /// Stroke the outline of a rectangle with rounded corners.
    ///
    /// A zero `radius` gives a plain rectangle outline.
    pub fn stroke_round_rect(&mut self, origin: Vec2, size: Vec2, radius: f32, width: f32) {
        let half_extent = size * 0.5;
        let center = origin + half_extent;
        let radius = radius.clamp(0.0, half_extent.min_element());
        let half_width = width * 0.5;
        let pad = Vec2::splat(half_width);
        self.paint_where(origin - pad, origin + size + pad, |p| {
            round_box_distance(p - center, half_extent, radius).abs() <= half_width
        });
    }

    /// Stroke a circle outline.
    pub fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32) {
        let half_width = width * 0.5;
        let pad = Vec2::splat(radius + half_width);
        self.paint_where(center - pad, center + pad, |p| {
            ((p - center).length() - radius).abs() <= half_width
        });
    }
}

/// Distance from `p` to the segment `a`-`b`.
fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Signed distance from `p` (relative to the box center) to a rounded box.
fn round_box_distance(p: Vec2, half_extent: Vec2, radius: f32) -> f32 {
    let q = p.abs() - (half_extent - Vec2::splat(radius));
    q.max(Vec2::ZERO).length() + q.x.max(q.y).min(0.0) - radius
}
