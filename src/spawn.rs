//! Seeded sampling context for the home populations.
//!
//! Every random draw made while building the particle pool and the point sets
//! goes through one [`SpawnContext`], so a fixed seed reproduces the whole
//! population including shuffle order:
//!
//! ```ignore
//! let mut ctx = SpawnContext::new(Some(7));
//! let shell = golden_sphere_point(i, shell_count) * radius;
//! let (orbit_radius, angle) = ctx.ring_orbit(radius);
//! ctx.shuffle(&mut points);
//! ```

use glam::{Vec2, Vec3};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::f32::consts::{PI, TAU};

/// Golden angle in radians, `π(3 - √5)`.
pub const GOLDEN_ANGLE: f32 = PI * (3.0 - 2.236_068);

/// Point `i` of `n` on the unit sphere, by the golden-angle spiral.
///
/// Points run from the north pole (`y = 1`) to the south pole (`y = -1`) and
/// cover the surface with near-equal area per point.
pub fn golden_sphere_point(i: usize, n: usize) -> Vec3 {
    if n <= 1 {
        return Vec3::Y;
    }
    let y = 1.0 - (i as f32 / (n - 1) as f32) * 2.0;
    let radius_at_y = (1.0 - y * y).max(0.0).sqrt();
    let theta = i as f32 * GOLDEN_ANGLE;
    Vec3::new(theta.cos() * radius_at_y, y, theta.sin() * radius_at_y)
}

/// Random source for population and shuffle draws.
pub struct SpawnContext {
    rng: SmallRng,
}

impl SpawnContext {
    /// Create a context from an optional seed.
    ///
    /// Without a seed the context is seeded from the system clock, so every run
    /// looks different.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(42)
        });
        Self::seeded(seed)
    }

    /// Create a deterministic context.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    // ========== Random primitives ==========

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in the given range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    // ========== Population helpers ==========

    /// Random point on the surface of a sphere, uniform by area.
    pub fn random_on_sphere(&mut self, radius: f32) -> Vec3 {
        let y = self.rng.gen_range(-1.0f32..1.0);
        let theta = self.rng.gen_range(0.0..TAU);
        let r = (1.0 - y * y).max(0.0).sqrt();
        Vec3::new(r * theta.cos(), y, r * theta.sin()) * radius
    }

    /// Orbit radius and starting angle for one ring particle.
    ///
    /// Radii are uniform in the band `[1.8R, 4.3R)` around a globe of radius `R`.
    pub fn ring_orbit(&mut self, globe_radius: f32) -> (f32, f32) {
        let angle = self.rng.gen_range(0.0..TAU);
        let radius = globe_radius * (1.8 + self.rng.gen::<f32>() * 2.5);
        (radius, angle)
    }

    /// Position on the distant star shell, between `6R` and `10R`.
    ///
    /// Only the hemisphere behind the globe (positive z, away from the camera)
    /// is populated.
    pub fn star(&mut self, globe_radius: f32) -> Vec3 {
        let r = globe_radius * self.random_range(6.0, 10.0);
        let p = self.random_on_sphere(r);
        Vec3::new(p.x, p.y, p.z.abs())
    }

    /// Random point in a rectangle anchored at the origin.
    pub fn random_in_rect(&mut self, size: Vec2) -> Vec2 {
        Vec2::new(
            self.random_range(0.0, size.x.max(0.0)),
            self.random_range(0.0, size.y.max(0.0)),
        )
    }

    /// Symmetric jitter in `[-amount, amount)` on both axes.
    pub fn jitter(&mut self, amount: f32) -> Vec2 {
        Vec2::new(
            self.random_range(-amount, amount),
            self.random_range(-amount, amount),
        )
    }

    /// Uniform Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}
