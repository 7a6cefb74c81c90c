//! Frame assembly: particles grouped into styled batches.
//!
//! The [`Renderer`] owns the smoothed class palette and turns the pool plus
//! one [`BatchKey`] per particle into a [`DrawList`]. Batches come out in
//! draw order (star, rings behind, shell classes, rings in front, shapes),
//! and a [`Surface`] fills them one at a time.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::config::{EngineConfig, HomeLayout, RenderConfig, StepMode};
use crate::error::RenderError;
use crate::particle::{ParticlePool, Role};
use crate::theme::Lighting;
use crate::visuals::{fill_style, BatchKey, ClassColors, FillStyle, GlowRadii, Marker};

/// One particle splat in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splat {
    pub center: Vec2,
    pub radius: f32,
}

/// Splats sharing one fill style.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub key: BatchKey,
    pub style: FillStyle,
    pub splats: Vec<Splat>,
}

/// A complete frame, ready to be filled.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    pub background: [f32; 4],
    pub batches: Vec<Batch>,
}

impl DrawList {
    pub fn new(background: [f32; 4]) -> Self {
        Self {
            background,
            batches: Vec::new(),
        }
    }

    /// Total number of splats over all batches.
    pub fn splat_count(&self) -> usize {
        self.batches.iter().map(|b| b.splats.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Something a frame can be drawn onto.
pub trait Surface {
    /// Start a frame cleared to `background`.
    fn begin_frame(&mut self, background: [f32; 4]) -> Result<(), RenderError>;

    /// Fill every splat with one style and marker.
    fn fill_batch(&mut self, style: &FillStyle, marker: Marker, splats: &[Splat]);

    /// Finish the frame (present, or keep for readback).
    fn end_frame(&mut self) -> Result<(), RenderError>;

    /// Draw a whole list in batch order.
    fn draw(&mut self, list: &DrawList) -> Result<(), RenderError> {
        self.begin_frame(list.background)?;
        for batch in &list.batches {
            self.fill_batch(&batch.style, batch.key.marker, &batch.splats);
        }
        self.end_frame()
    }
}

/// Frame assembler holding the smoothed palette.
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
    step: StepMode,
    drift: bool,
    colors: Option<ClassColors>,
}

impl Renderer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.render.clone(),
            step: config.projection.step,
            drift: config.pool.layout == HomeLayout::Drift,
            colors: None,
        }
    }

    /// Current palette; `None` before the first update.
    pub fn colors(&self) -> Option<&ClassColors> {
        self.colors.as_ref()
    }

    /// Step the palette toward the lighting's target. The first call snaps.
    pub fn update_palette(&mut self, lighting: &Lighting, dt: f32) {
        let target = ClassColors::for_lighting(lighting);
        match &mut self.colors {
            Some(colors) => colors.approach(&target, self.step.factor(self.config.color_rate, dt)),
            None => self.colors = Some(target),
        }
    }

    /// Clear color for a frame.
    pub fn background(&self, lighting: &Lighting) -> [f32; 4] {
        self.config.background.unwrap_or_else(|| {
            let bg = lighting.background;
            [bg.x, bg.y, bg.z, 1.0]
        })
    }

    fn radius(&self, role: Role, size: f32, scale: f32) -> f32 {
        if role == Role::Drift {
            size * self.config.drift_point_scale
        } else {
            size * self.config.point_scale * scale
        }
    }

    /// Group the pool by key into styled batches.
    ///
    /// `keys` holds one key per particle, as written by the integrator step.
    /// Splats with a vanishing radius are dropped.
    pub fn build(&self, pool: &ParticlePool, keys: &[BatchKey], morph: f32, lighting: &Lighting) -> DrawList {
        let colors = self
            .colors
            .unwrap_or_else(|| ClassColors::for_lighting(lighting));
        let glow = GlowRadii {
            hotspot: self.config.hotspot_glow,
            city: self.config.city_glow,
        };

        let mut groups: BTreeMap<BatchKey, Vec<Splat>> = BTreeMap::new();
        for (p, key) in pool.iter().zip(keys) {
            let radius = self.radius(p.role, p.size, p.scale);
            if radius <= 0.0 {
                continue;
            }
            groups.entry(*key).or_default().push(Splat {
                center: p.screen,
                radius,
            });
        }

        let mut list = DrawList::new(self.background(lighting));
        list.batches = groups
            .into_iter()
            .map(|(key, splats)| Batch {
                key,
                style: fill_style(&key, &colors, morph, glow, self.drift),
                splats,
            })
            .collect();
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{PointFlags, PointSet, TargetPoint};
    use crate::spawn::SpawnContext;
    use crate::theme::ThemeMode;
    use crate::visuals::DrawClass;
    use glam::Vec3;

    fn pool() -> ParticlePool {
        let home = PointSet::new(vec![
            TargetPoint::new(Vec3::new(20.0, 0.0, 0.0)),
            TargetPoint::with_flags(Vec3::new(40.0, 0.0, 0.0), PointFlags::RING),
            TargetPoint::with_flags(Vec3::new(0.0, 0.0, 150.0), PointFlags::STAR),
        ]);
        let mut pool = ParticlePool::from_home(&home, HomeLayout::Planet, 20.0, &mut SpawnContext::seeded(3));
        for p in pool.iter_mut() {
            p.scale = 1.0;
        }
        pool
    }

    #[test]
    fn test_batches_follow_draw_order() {
        let pool = pool();
        let keys = [
            BatchKey::new(DrawClass::RingFront, Marker::SoftDisc),
            BatchKey::new(DrawClass::Water, Marker::SoftDisc),
            BatchKey::new(DrawClass::Star, Marker::SoftDisc),
        ];
        let renderer = Renderer::new(&EngineConfig::default());
        let list = renderer.build(&pool, &keys, 0.0, &ThemeMode::Light.lighting(0.0));
        let classes: Vec<DrawClass> = list.batches.iter().map(|b| b.key.class).collect();
        assert_eq!(classes, vec![DrawClass::Star, DrawClass::Water, DrawClass::RingFront]);
        assert_eq!(list.splat_count(), 3);
    }

    #[test]
    fn test_vanishing_scale_is_dropped() {
        let mut pool = pool();
        for p in pool.iter_mut() {
            p.scale = 0.0;
        }
        let keys = [BatchKey::new(DrawClass::Water, Marker::SoftDisc); 3];
        let renderer = Renderer::new(&EngineConfig::default());
        let list = renderer.build(&pool, &keys, 0.0, &ThemeMode::Light.lighting(0.0));
        assert!(list.is_empty());
    }

    #[test]
    fn test_background_follows_theme_unless_fixed() {
        let lighting = ThemeMode::Dark.lighting(0.0);
        let renderer = Renderer::new(&EngineConfig::default());
        let bg = renderer.background(&lighting);
        assert_eq!(bg[3], 1.0);
        assert!((bg[0] - lighting.background.x).abs() < 1e-6);

        let mut config = EngineConfig::default();
        config.render.background = Some([1.0, 0.0, 0.0, 1.0]);
        assert_eq!(Renderer::new(&config).background(&lighting), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_first_palette_update_snaps() {
        let mut renderer = Renderer::new(&EngineConfig::default());
        assert!(renderer.colors().is_none());
        let night = ThemeMode::Dark.lighting(0.0);
        renderer.update_palette(&night, 1.0 / 60.0);
        assert_eq!(renderer.colors(), Some(&ClassColors::for_lighting(&night)));

        let day = ThemeMode::Light.lighting(0.0);
        renderer.update_palette(&day, 1.0 / 60.0);
        let colors = renderer.colors().copied().unwrap();
        assert_ne!(colors, ClassColors::for_lighting(&day));
        assert_ne!(colors, ClassColors::for_lighting(&night));
    }
}
