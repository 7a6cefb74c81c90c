//! CPU surface for headless snapshots.
//!
//! Pixels accumulate in linear floats so additive batches can stack, and
//! are quantized only when the frame is read back or written out.

use std::path::Path;

use glam::Vec3;
use image::{ImageFormat, Rgba, RgbaImage};
use tracing::info;

use crate::error::RenderError;
use crate::render::{Splat, Surface};
use crate::visuals::{BlendMode, FillStyle, Marker};

/// Peak coverage of the glow halo around a glowing splat.
const GLOW_PEAK: f32 = 0.35;
/// Splats smaller than this radius cover a single pixel by area.
const SUBPIXEL_RADIUS: f32 = 0.75;

/// Software surface backed by an RGB float buffer.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<Vec3>,
    frames: u64,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec3::ZERO; (width as usize) * (height as usize)],
            frames: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frames completed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Resize and clear to black.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![Vec3::ZERO; (width as usize) * (height as usize)];
    }

    /// Color at a pixel, `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec3> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    /// Quantize the current frame.
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let c = self.pixels[(y * self.width + x) as usize].clamp(Vec3::ZERO, Vec3::ONE);
            Rgba([
                (c.x * 255.0).round() as u8,
                (c.y * 255.0).round() as u8,
                (c.z * 255.0).round() as u8,
                255,
            ])
        })
    }

    /// Write the current frame as a PNG.
    pub fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        self.to_image().save_with_format(path, ImageFormat::Png)?;
        info!("wrote {}x{} snapshot to {}", self.width, self.height, path.display());
        Ok(())
    }

    fn blend(&mut self, x: u32, y: u32, style: &FillStyle, coverage: f32) {
        let a = (style.alpha * coverage).clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let px = &mut self.pixels[(y * self.width + x) as usize];
        match style.blend {
            BlendMode::Alpha => *px = px.lerp(style.color, a),
            BlendMode::Additive => *px += style.color * a,
        }
    }

    fn splat(&mut self, style: &FillStyle, marker: Marker, splat: &Splat) {
        let r = splat.radius;
        let c = splat.center;

        if r < SUBPIXEL_RADIUS && style.glow <= 0.0 {
            if c.x >= 0.0 && c.y >= 0.0 && c.x < self.width as f32 && c.y < self.height as f32 {
                let area = (std::f32::consts::PI * r * r).min(1.0);
                self.blend(c.x as u32, c.y as u32, style, area);
            }
            return;
        }

        let reach = r + style.glow.max(0.0);
        let x0 = (c.x - reach).floor().max(0.0) as i64;
        let y0 = (c.y - reach).floor().max(0.0) as i64;
        let x1 = ((c.x + reach).ceil() as i64).min(self.width as i64 - 1);
        let y1 = ((c.y + reach).ceil() as i64).min(self.height as i64 - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                let u = (x as f32 + 0.5 - c.x) / r;
                let v = (y as f32 + 0.5 - c.y) / r;
                let mut coverage = marker.coverage(u, v);
                if coverage <= 0.0 && style.glow > 0.0 {
                    let d = (u * u + v * v).sqrt() * r - r;
                    if d < style.glow {
                        let t = 1.0 - d.max(0.0) / style.glow;
                        coverage = GLOW_PEAK * t * t;
                    }
                }
                if coverage > 0.0 {
                    self.blend(x as u32, y as u32, style, coverage);
                }
            }
        }
    }
}

impl Surface for RasterSurface {
    fn begin_frame(&mut self, background: [f32; 4]) -> Result<(), RenderError> {
        let bg = Vec3::new(background[0], background[1], background[2]);
        self.pixels.fill(bg);
        Ok(())
    }

    fn fill_batch(&mut self, style: &FillStyle, marker: Marker, splats: &[Splat]) {
        for splat in splats {
            self.splat(style, marker, splat);
        }
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn disc(x: f32, y: f32, radius: f32) -> Splat {
        Splat {
            center: Vec2::new(x, y),
            radius,
        }
    }

    #[test]
    fn test_clear_to_background() {
        let mut surface = RasterSurface::new(8, 4);
        surface.begin_frame([0.2, 0.4, 0.6, 1.0]).unwrap();
        surface.end_frame().unwrap();
        assert_eq!(surface.pixel(7, 3), Some(Vec3::new(0.2, 0.4, 0.6)));
        assert_eq!(surface.pixel(8, 0), None);
        assert_eq!(surface.frames(), 1);
    }

    #[test]
    fn test_disc_covers_center_only() {
        let mut surface = RasterSurface::new(32, 32);
        surface.begin_frame([0.0, 0.0, 0.0, 1.0]).unwrap();
        let style = FillStyle::solid(Vec3::ONE, 1.0);
        surface.fill_batch(&style, Marker::Disc, &[disc(16.0, 16.0, 4.0)]);
        assert_eq!(surface.pixel(16, 16), Some(Vec3::ONE));
        assert_eq!(surface.pixel(2, 2), Some(Vec3::ZERO));
    }

    #[test]
    fn test_additive_stacks() {
        let mut surface = RasterSurface::new(16, 16);
        surface.begin_frame([0.0, 0.0, 0.0, 1.0]).unwrap();
        let style = FillStyle {
            color: Vec3::splat(0.3),
            alpha: 1.0,
            glow: 0.0,
            blend: BlendMode::Additive,
        };
        surface.fill_batch(&style, Marker::Square, &[disc(8.0, 8.0, 3.0), disc(8.0, 8.0, 3.0)]);
        let c = surface.pixel(8, 8).unwrap();
        assert!((c.x - 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_glow_reaches_past_radius() {
        let mut surface = RasterSurface::new(32, 32);
        surface.begin_frame([0.0, 0.0, 0.0, 1.0]).unwrap();
        let style = FillStyle::glowing(Vec3::ONE, 1.0, 6.0);
        surface.fill_batch(&style, Marker::Disc, &[disc(16.0, 16.0, 2.0)]);
        let halo = surface.pixel(20, 16).unwrap();
        assert!(halo.x > 0.0 && halo.x < 1.0);
        assert_eq!(surface.pixel(0, 0), Some(Vec3::ZERO));
    }

    #[test]
    fn test_offscreen_splat_is_clipped() {
        let mut surface = RasterSurface::new(8, 8);
        surface.begin_frame([0.0, 0.0, 0.0, 1.0]).unwrap();
        let style = FillStyle::solid(Vec3::ONE, 1.0);
        surface.fill_batch(&style, Marker::Disc, &[disc(-50.0, 4.0, 3.0), disc(4.0, 400.0, 0.5)]);
        assert!(surface.to_image().pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_save_png() {
        let mut surface = RasterSurface::new(4, 4);
        surface.begin_frame([1.0, 0.0, 0.0, 1.0]).unwrap();
        surface.end_frame().unwrap();
        let path = std::env::temp_dir().join(format!("orrery-raster-{}.png", std::process::id()));
        surface.save_png(&path).unwrap();
        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back.get_pixel(1, 1).0, [255, 0, 0, 255]);
        let _ = std::fs::remove_file(&path);
    }
}
