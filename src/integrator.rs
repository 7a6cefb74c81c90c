//! The per-frame transform pipeline.
//!
//! For every particle, each tick:
//!
//! 1. home position: ring orbit with tilt, or the base rotated about Y
//! 2. morph: `lerp(home, target, morph)`
//! 3. scatter: coherent noise offset scaled by the explosion intensity
//! 4. projection: perspective scale `focal / (focal + z)`, blending to 1 for flat shapes
//! 5. convergence: single-pole step of the displayed position toward the target
//! 6. classification into a [`BatchKey`]
//!
//! The drift layout skips the perspective and ring stages and converges
//! directly toward either its origin or its shape point.

use glam::{Vec2, Vec3};

use crate::config::{EngineConfig, HomeLayout, SlotPolicy, StepMode};
use crate::generator::{PointSetLibrary, Viewport};
use crate::noise::{hash, rand01, scatter_direction};
use crate::particle::{slot_target, Orbit, Particle, ParticlePool, Role, SlotTarget};
use crate::shape::ShapeId;
use crate::visuals::{BatchKey, DrawClass, Marker};

/// Fixed ring tilt about X, then Z.
pub const RING_TILT_X: f32 = 0.45;
pub const RING_TILT_Z: f32 = 0.15;
/// Stars turn this much slower than the globe.
const STAR_PARALLAX: f32 = 0.05;
/// Morph progress above which particles draw as part of the shape.
const SHAPE_CLASS_MORPH: f32 = 0.5;

/// Light direction in view space, toward the upper left and the camera.
pub fn default_sun() -> Vec3 {
    Vec3::new(-0.6, 0.35, -0.72).normalize()
}

/// Rotate `p` about the vertical axis.
#[inline]
pub fn rotate_y(p: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(p.x * c - p.z * s, p.y, p.x * s + p.z * c)
}

/// Ring position for a globe rotation: differential orbit, then the tilt.
pub fn ring_position(orbit: &Orbit, rotation: f32) -> Vec3 {
    let angle = orbit.angle + rotation * 0.5 * orbit.speed;
    let ox = angle.cos() * orbit.radius;
    let oz = angle.sin() * orbit.radius;

    let (sx, cx) = RING_TILT_X.sin_cos();
    let (sz, cz) = RING_TILT_Z.sin_cos();
    let y1 = -oz * sx;
    let z1 = oz * cx;
    Vec3::new(ox * cz - y1 * sz, ox * sz + y1 * cz, z1)
}

/// Home position of a particle for a globe rotation.
pub fn home_position(p: &Particle, rotation: f32) -> Vec3 {
    match (p.role, &p.orbit) {
        (Role::Ring, Some(orbit)) => ring_position(orbit, rotation),
        (Role::Star, _) => rotate_y(p.base, rotation * STAR_PARALLAX),
        (Role::Drift, _) => p.base,
        _ => rotate_y(p.base, rotation),
    }
}

/// Perspective scale at depth `z` (positive away from the camera).
///
/// Points at or behind the eye plane get a vanishing scale instead of a
/// negative one.
#[inline]
pub fn perspective_scale(z: f32, focal: f32) -> f32 {
    let denom = focal + z;
    if denom <= focal * 0.05 {
        0.0
    } else {
        focal / denom
    }
}

/// Screen position of a world point around the viewport center, y up.
#[inline]
pub fn project(world: Vec3, scale: f32, center: Vec2, pixels_per_unit: f32) -> Vec2 {
    center + Vec2::new(world.x, -world.y) * pixels_per_unit * scale
}

/// Single-pole step from `display` toward `target`.
#[inline]
pub fn converge(display: Vec2, target: Vec2, factor: f32) -> Vec2 {
    display + (target - display) * factor
}

/// Everything the integrator reads for one tick.
#[derive(Debug, Clone, Copy)]
pub struct FrameParams {
    pub dt: f32,
    /// Globe rotation in radians.
    pub rotation: f32,
    /// Seconds since start, driving the noise and crawl animations.
    pub time: f32,
    pub frame: u64,
    pub morph: f32,
    pub intensity: f32,
    /// Shape the morph blends toward, if any.
    pub blend: Option<ShapeId>,
    /// The machine is currently targeting a shape (drift attraction on).
    pub attract: bool,
    pub viewport: Viewport,
    pub sun: Vec3,
}

/// Stateless per-frame pipeline configured once from [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct Integrator {
    layout: HomeLayout,
    policy: SlotPolicy,
    companion_offset: Vec2,
    scatter: f32,
    focal: f32,
    return_speed: f32,
    drift_return_speed: f32,
    drift_home_speed: f32,
    drift_jitter: f32,
    step: StepMode,
    pixels_per_unit: f32,
    camera_distance: f32,
    fov_degrees: f32,
}

impl Integrator {
    pub fn new(config: &EngineConfig) -> Self {
        let p = &config.projection;
        Self {
            layout: config.pool.layout,
            policy: config.morph.slot_policy,
            companion_offset: Vec2::from(config.morph.companion_offset),
            scatter: config.explosion.scatter,
            focal: p.focal,
            return_speed: p.return_speed,
            drift_return_speed: p.drift_return_speed,
            drift_home_speed: p.drift_home_speed,
            drift_jitter: p.drift_jitter,
            step: p.step,
            pixels_per_unit: 1.0,
            camera_distance: p.camera_distance,
            fov_degrees: p.fov_degrees,
        }
    }

    /// Screen pixels per world unit at depth zero for the last viewport.
    #[inline]
    pub fn pixels_per_unit(&self) -> f32 {
        self.pixels_per_unit
    }

    fn update_scale(&mut self, viewport: Viewport) {
        let half_fov = (self.fov_degrees * 0.5).to_radians();
        self.pixels_per_unit = viewport.height as f32 / (2.0 * self.camera_distance * half_fov.tan());
    }

    /// Target world position for a slot, and whether it belongs to the companion.
    fn slot_point(&self, slot: usize, library: &PointSetLibrary, blend: Option<ShapeId>) -> Option<(Vec3, bool)> {
        let shape = blend?;
        let main = library.get(shape);
        let companion = library.get(ShapeId::Bug);
        match slot_target(slot, main.len(), companion.len(), self.policy)? {
            SlotTarget::Main(i) => main.get(i).map(|p| (p.position, false)),
            SlotTarget::Origin => Some((Vec3::ZERO, false)),
            SlotTarget::Companion(i) => companion.get(i).map(|p| {
                let offset = self.companion_offset;
                (p.position + Vec3::new(offset.x, offset.y, 0.0), true)
            }),
        }
    }

    /// Place every particle at its current target without convergence.
    pub fn snap(&mut self, pool: &mut ParticlePool, library: &PointSetLibrary, params: &FrameParams) {
        self.update_scale(params.viewport);
        for (slot, p) in pool.iter_mut().enumerate() {
            let (screen, depth, scale, secondary) = self.target(slot, p, library, params);
            p.screen = screen;
            p.depth = depth;
            p.scale = scale;
            p.secondary = secondary;
        }
    }

    /// Screen target, depth, scale and companion flag for one particle.
    fn target(
        &self,
        slot: usize,
        p: &Particle,
        library: &PointSetLibrary,
        params: &FrameParams,
    ) -> (Vec2, f32, f32, bool) {
        let center = params.viewport.center();
        let home = home_position(p, params.rotation);
        let point = self.slot_point(slot, library, params.blend);
        let secondary = point.map(|(_, s)| s).unwrap_or(false);

        let mut world = if self.layout == HomeLayout::Drift {
            match point {
                Some((target, _)) if params.attract => target,
                _ => home,
            }
        } else {
            match point {
                Some((target, _)) => home.lerp(target, params.morph),
                None => home,
            }
        };

        if params.intensity > 0.0 {
            world += scatter_direction(p.base, params.time) * params.intensity * self.scatter;
        }

        if secondary && params.morph > 0.5 && params.intensity < 0.1 {
            world.x += (p.base.x * 2.0 + params.time * 8.0).sin();
            world.y += (params.time * 32.0).sin().abs() * 0.3;
        }

        let scale = if self.layout == HomeLayout::Drift {
            1.0
        } else {
            let perspective = perspective_scale(world.z, self.focal);
            perspective + (1.0 - perspective) * params.morph
        };
        (project(world, scale, center, self.pixels_per_unit), world.z, scale, secondary)
    }

    /// Run one tick over the pool, writing one batch key per particle into `keys`.
    pub fn step(
        &mut self,
        pool: &mut ParticlePool,
        library: &PointSetLibrary,
        params: &FrameParams,
        keys: &mut Vec<BatchKey>,
    ) {
        self.update_scale(params.viewport);
        keys.clear();
        keys.reserve(pool.len());

        let planet_factor = self.step.factor(self.return_speed, params.dt);
        let drift_factor = if params.attract {
            self.step.factor(self.drift_return_speed, params.dt)
        } else {
            self.step.factor(self.drift_home_speed, params.dt)
        };

        for (slot, p) in pool.iter_mut().enumerate() {
            let (target, depth, scale, secondary) = self.target(slot, p, library, params);
            p.depth = depth;
            p.scale = scale;
            p.secondary = secondary;

            if p.role == Role::Drift {
                p.screen = converge(p.screen, target, drift_factor);
                if !params.attract {
                    let h = hash(slot as u32 ^ hash(params.frame as u32));
                    let j = Vec2::new(rand01(h) - 0.5, rand01(h.wrapping_add(1)) - 0.5);
                    p.screen += j * 2.0 * self.drift_jitter;
                }
            } else {
                p.screen = converge(p.screen, target, planet_factor);
            }

            keys.push(classify(p, slot, params));
        }
    }
}

/// Drawing class of a particle after its update.
pub fn classify(p: &Particle, slot: usize, params: &FrameParams) -> BatchKey {
    if p.role == Role::Drift {
        let marker = if p.seed > 0.5 { Marker::Square } else { Marker::Disc };
        let class = if p.secondary { DrawClass::Companion } else { DrawClass::Shape };
        return BatchKey::new(class, marker).toned((slot % 2) as u8);
    }
    if p.secondary && params.morph > SHAPE_CLASS_MORPH {
        return BatchKey::new(DrawClass::Companion, Marker::SoftDisc);
    }
    if params.blend.is_some() && params.morph > SHAPE_CLASS_MORPH {
        return BatchKey::new(DrawClass::Shape, Marker::SoftDisc);
    }

    let class = match p.role {
        Role::Star => DrawClass::Star,
        Role::Ring if p.depth < 0.0 => DrawClass::RingFront,
        Role::Ring => DrawClass::RingBack,
        _ if p.flags.hotspot => DrawClass::Hotspot,
        _ if p.flags.city => DrawClass::City,
        _ if p.flags.land => DrawClass::Land,
        _ => DrawClass::Water,
    };
    let dim = class.is_shell() && {
        let normal = rotate_y(p.base, params.rotation).normalize_or_zero();
        normal.dot(params.sun) < 0.0
    };
    BatchKey::new(class, Marker::SoftDisc).dimmed(dim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{PointFlags, PointSet, TargetPoint};
    use crate::spawn::SpawnContext;
    use std::f32::consts::FRAC_PI_2;

    fn params(viewport: Viewport) -> FrameParams {
        FrameParams {
            dt: 1.0 / 60.0,
            rotation: 0.0,
            time: 0.0,
            frame: 0,
            morph: 0.0,
            intensity: 0.0,
            blend: None,
            attract: false,
            viewport,
            sun: default_sun(),
        }
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let p = rotate_y(Vec3::new(1.0, 2.0, 0.0), FRAC_PI_2);
        assert!((p - Vec3::new(0.0, 2.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_ring_tilt_preserves_radius() {
        let orbit = Orbit {
            angle: 0.3,
            radius: 50.0,
            speed: 0.4,
        };
        for i in 0..20 {
            let p = ring_position(&orbit, i as f32 * 0.5);
            assert!((p.length() - 50.0).abs() < 1e-3);
        }
        // Initial point on the x axis only picks up the Z tilt.
        let flat = ring_position(&Orbit { angle: 0.0, ..orbit }, 0.0);
        assert!((flat.y - 50.0 * RING_TILT_Z.sin()).abs() < 1e-3);
    }

    #[test]
    fn test_ring_speed_is_differential() {
        let near = Orbit { angle: 0.0, radius: 36.0, speed: 20.0 / 36.0 };
        let far = Orbit { angle: 0.0, radius: 80.0, speed: 20.0 / 80.0 };
        let rot = 1.0;
        let swept = |o: &Orbit| o.speed * rot * 0.5;
        assert!(swept(&near) > swept(&far));
    }

    #[test]
    fn test_perspective_scale() {
        assert_eq!(perspective_scale(0.0, 80.0), 1.0);
        assert!((perspective_scale(80.0, 80.0) - 0.5).abs() < 1e-6);
        assert!(perspective_scale(-20.0, 80.0) > 1.0);
        assert_eq!(perspective_scale(-80.0, 80.0), 0.0);
    }

    #[test]
    fn test_converge_never_overshoots() {
        let target = Vec2::new(100.0, -50.0);
        let mut d = Vec2::ZERO;
        for _ in 0..200 {
            let next = converge(d, target, 0.08);
            assert!(next.x >= d.x && next.x <= target.x);
            assert!(next.y <= d.y && next.y >= target.y);
            d = next;
        }
    }

    fn flat_library(points: &[Vec3]) -> PointSetLibrary {
        let mut library = PointSetLibrary::new(PointSet::default());
        library.insert(ShapeId::Monogram, PointSet::from_positions(points.iter().copied()));
        library
    }

    #[test]
    fn test_full_morph_lands_on_target_pixels() {
        let config = EngineConfig::default().with_particle_count(4);
        let mut integrator = Integrator::new(&config);
        let home = PointSet::from_positions([Vec3::new(20.0, 0.0, 0.0); 4]);
        let mut ctx = SpawnContext::seeded(1);
        let mut pool = ParticlePool::from_home(&home, HomeLayout::Planet, 20.0, &mut ctx);
        let library = flat_library(&[Vec3::ZERO]);
        let viewport = Viewport::new(800, 600);
        let mut p = params(viewport);
        p.morph = 1.0;
        p.blend = Some(ShapeId::Monogram);
        integrator.snap(&mut pool, &library, &p);
        for particle in pool.iter() {
            assert!((particle.screen - viewport.center()).length() < 1e-3);
            assert_eq!(particle.scale, 1.0);
        }
    }

    #[test]
    fn test_no_blend_stays_home() {
        let config = EngineConfig::default().with_particle_count(1);
        let mut integrator = Integrator::new(&config);
        let home = PointSet::from_positions([Vec3::new(10.0, 5.0, 0.0)]);
        let mut ctx = SpawnContext::seeded(1);
        let mut pool = ParticlePool::from_home(&home, HomeLayout::Planet, 20.0, &mut ctx);
        let library = PointSetLibrary::new(PointSet::default());
        let viewport = Viewport::new(800, 600);
        let mut keys = Vec::new();
        let p = params(viewport);
        integrator.snap(&mut pool, &library, &p);
        integrator.step(&mut pool, &library, &p, &mut keys);
        let ppu = integrator.pixels_per_unit();
        let expected = viewport.center() + Vec2::new(10.0, -5.0) * ppu;
        assert!((pool.as_slice()[0].screen - expected).length() < 1e-3);
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_ring_front_back_split() {
        let home = PointSet::new(vec![TargetPoint::with_flags(
            Vec3::new(50.0, 0.0, 0.0),
            PointFlags::RING,
        )]);
        let pool = ParticlePool::from_home(&home, HomeLayout::Planet, 20.0, &mut SpawnContext::seeded(2));
        let mut p = pool.as_slice()[0].clone();
        let fp = params(Viewport::new(800, 600));
        p.depth = -3.0;
        assert_eq!(classify(&p, 0, &fp).class, DrawClass::RingFront);
        p.depth = 3.0;
        assert_eq!(classify(&p, 0, &fp).class, DrawClass::RingBack);
    }

    #[test]
    fn test_shadow_side_is_dim() {
        let home = PointSet::from_positions([default_sun() * 20.0, -default_sun() * 20.0]);
        let pool = ParticlePool::from_home(&home, HomeLayout::Planet, 20.0, &mut SpawnContext::seeded(2));
        let fp = params(Viewport::new(800, 600));
        let lit = classify(&pool.as_slice()[0], 0, &fp);
        let shadow = classify(&pool.as_slice()[1], 1, &fp);
        assert!(!lit.dim);
        assert!(shadow.dim);
        assert!(lit.class.is_shell());
    }
}
