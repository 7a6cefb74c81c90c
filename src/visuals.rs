//! Visual classes, markers and class palettes.
//!
//! Every particle is drawn in exactly one [`DrawClass`] per frame. The class,
//! together with the shadow flag, marker and tone, forms the [`BatchKey`] that
//! the renderer groups by; each key maps to one [`FillStyle`].

use glam::Vec3;

use crate::theme::{rgb, Lighting};

/// Blend mode for a batch.
///
/// Controls how particle colors combine with the background and each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum BlendMode {
    /// Standard alpha blending (default).
    #[default]
    Alpha,

    /// Additive blending.
    ///
    /// Overlapping particles become brighter. Used for glowing classes.
    Additive,
}

/// Splat shape of one particle.
///
/// All markers use the UV coordinate system where (-1, -1) is bottom-left and
/// (1, 1) is top-right of the particle quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub enum Marker {
    /// Circle with a soft rim (default).
    #[default]
    SoftDisc,

    /// Hard-edged circle.
    Disc,

    /// Axis-aligned square.
    Square,
}

impl Marker {
    /// Coverage in `[0, 1]` at a quad coordinate.
    pub fn coverage(self, u: f32, v: f32) -> f32 {
        match self {
            Marker::SoftDisc => {
                let d = (u * u + v * v).sqrt();
                if d > 1.0 {
                    0.0
                } else {
                    1.0 - smoothstep(0.8, 1.0, d)
                }
            }
            Marker::Disc => {
                if u * u + v * v <= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Marker::Square => {
                if u.abs() <= 1.0 && v.abs() <= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Index passed to the point-sprite shader.
    #[inline]
    pub fn shader_index(self) -> u32 {
        match self {
            Marker::SoftDisc => 0,
            Marker::Disc => 1,
            Marker::Square => 2,
        }
    }
}

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Per-frame drawing class, listed in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrawClass {
    /// Backdrop star.
    Star,
    /// Ring particle behind the globe.
    RingBack,
    Water,
    Land,
    City,
    /// Noise-marked shell point drawn with a wide glow.
    Hotspot,
    /// Ring particle in front of the globe.
    RingFront,
    /// Any particle of a flat shape, and every drift particle.
    Shape,
    /// Companion shape filling excess slots.
    Companion,
}

impl DrawClass {
    /// All classes in draw order.
    pub const ORDER: [DrawClass; 9] = [
        DrawClass::Star,
        DrawClass::RingBack,
        DrawClass::Water,
        DrawClass::Land,
        DrawClass::City,
        DrawClass::Hotspot,
        DrawClass::RingFront,
        DrawClass::Shape,
        DrawClass::Companion,
    ];

    /// Whether the class belongs to the structural shell.
    #[inline]
    pub fn is_shell(self) -> bool {
        matches!(
            self,
            DrawClass::Water | DrawClass::Land | DrawClass::City | DrawClass::Hotspot
        )
    }
}

/// Grouping key: particles sharing a key share one fill style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchKey {
    pub class: DrawClass,
    /// On the shadow side of the terminator.
    pub dim: bool,
    /// Tone variant for two-tone classes.
    pub tone: u8,
    pub marker: Marker,
}

impl BatchKey {
    pub fn new(class: DrawClass, marker: Marker) -> Self {
        Self {
            class,
            dim: false,
            tone: 0,
            marker,
        }
    }

    pub fn dimmed(mut self, dim: bool) -> Self {
        self.dim = dim;
        self
    }

    pub fn toned(mut self, tone: u8) -> Self {
        self.tone = tone;
        self
    }
}

/// How one batch is filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillStyle {
    pub color: Vec3,
    pub alpha: f32,
    /// Glow (shadow blur) radius in pixels, zero for none.
    pub glow: f32,
    pub blend: BlendMode,
}

impl FillStyle {
    pub fn solid(color: Vec3, alpha: f32) -> Self {
        Self {
            color,
            alpha,
            glow: 0.0,
            blend: BlendMode::Alpha,
        }
    }

    pub fn glowing(color: Vec3, alpha: f32, glow: f32) -> Self {
        Self {
            color,
            alpha,
            glow,
            blend: BlendMode::Additive,
        }
    }
}

/// Colors of every planet class for one lighting condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassColors {
    pub core: Vec3,
    pub ring: Vec3,
    pub land: Vec3,
    pub city: Vec3,
    pub hotspot: Vec3,
    pub star: Vec3,
}

impl ClassColors {
    /// Daytime planet palette.
    pub const DAY: Self = Self {
        core: rgb(0xcbd5e1),
        ring: rgb(0x020617),
        land: rgb(0x94a3b8),
        city: rgb(0xf59e0b),
        hotspot: rgb(0x38bdf8),
        star: rgb(0x64748b),
    };

    /// Nighttime planet palette.
    pub const NIGHT: Self = Self {
        core: rgb(0x1e293b),
        ring: rgb(0xffffff),
        land: rgb(0x334155),
        city: rgb(0xfde68a),
        hotspot: rgb(0x818cf8),
        star: rgb(0xe2e8f0),
    };

    /// Target palette for a lighting descriptor, tinted by its particle color.
    pub fn for_lighting(lighting: &Lighting) -> Self {
        let base = if lighting.night { Self::NIGHT } else { Self::DAY };
        Self {
            land: base.land.lerp(lighting.particle, 0.35),
            hotspot: base.hotspot.lerp(lighting.particle, 0.5),
            ..base
        }
    }

    /// Component-wise exponential step toward `target`.
    pub fn approach(&mut self, target: &Self, factor: f32) {
        let step = |c: &mut Vec3, t: Vec3| *c += (t - *c) * factor;
        step(&mut self.core, target.core);
        step(&mut self.ring, target.ring);
        step(&mut self.land, target.land);
        step(&mut self.city, target.city);
        step(&mut self.hotspot, target.hotspot);
        step(&mut self.star, target.star);
    }

    /// Fill color of a planet class before morph whitening.
    pub fn class_color(&self, class: DrawClass) -> Vec3 {
        match class {
            DrawClass::Star => self.star,
            DrawClass::RingBack | DrawClass::RingFront => self.ring,
            DrawClass::Water | DrawClass::Shape | DrawClass::Companion => self.core,
            DrawClass::Land => self.land,
            DrawClass::City => self.city,
            DrawClass::Hotspot => self.hotspot,
        }
    }
}

/// The two drift tones.
pub const DRIFT_TONES: [Vec3; 2] = [rgb(0x52525b), rgb(0xa1a1aa)];
/// Alpha of every drift particle.
pub const DRIFT_ALPHA: f32 = 0.4;
/// Brightness kept on the shadow side of the terminator.
pub const SHADOW_BRIGHTNESS: f32 = 0.45;

/// Glow radii for the glowing classes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowRadii {
    pub hotspot: f32,
    pub city: f32,
}

/// Resolve the fill style of a batch.
///
/// `morph` whitens every planet-derived class; drift batches keep their tone.
pub fn fill_style(key: &BatchKey, colors: &ClassColors, morph: f32, glow: GlowRadii, drift: bool) -> FillStyle {
    if drift && matches!(key.class, DrawClass::Shape) {
        let tone = DRIFT_TONES[(key.tone as usize).min(DRIFT_TONES.len() - 1)];
        return FillStyle::solid(tone, DRIFT_ALPHA);
    }

    let mut color = colors.class_color(key.class);
    if key.dim && key.class.is_shell() {
        color *= SHADOW_BRIGHTNESS;
    }
    color = color.lerp(Vec3::ONE, morph.clamp(0.0, 1.0));

    match key.class {
        DrawClass::Hotspot => FillStyle::glowing(color, 1.0, glow.hotspot),
        // Cities light up on the night side.
        DrawClass::City if key.dim => FillStyle::glowing(colors.city, 1.0, glow.city),
        DrawClass::Star => FillStyle::solid(color, 0.7),
        _ => FillStyle::solid(color, 1.0),
    }
}
