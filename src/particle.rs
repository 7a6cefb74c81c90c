//! The fixed particle pool.
//!
//! Particles are allocated once from the home point set and never destroyed.
//! Switching shapes re-targets slots by index; see [`slot_target`].

use glam::{Vec2, Vec3};

use crate::config::{HomeLayout, SlotPolicy};
use crate::generator::{PointFlags, PointSet, TargetPoint};
use crate::spawn::SpawnContext;

/// Population a particle belongs to while home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Golden-angle planet surface.
    Shell,
    /// Differentially rotating ring band.
    Ring,
    /// Distant backdrop star.
    Star,
    /// Flat jittering field particle.
    Drift,
}

/// Ring orbit parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    /// Starting angle in radians on the orbital plane.
    pub angle: f32,
    pub radius: f32,
    /// Angular speed relative to the globe rotation, `R / radius`.
    pub speed: f32,
}

impl Orbit {
    /// Recover the orbit that places a ring particle at `base` on the `y = 0` plane.
    pub fn from_base(base: Vec3, globe_radius: f32) -> Self {
        let radius = Vec2::new(base.x, base.z).length().max(f32::EPSILON);
        Self {
            angle: base.z.atan2(base.x),
            radius,
            speed: globe_radius / radius,
        }
    }
}

/// One pooled particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Home position in world units.
    pub base: Vec3,
    pub orbit: Option<Orbit>,
    pub role: Role,
    /// Classification of the home point (land, city, hotspot).
    pub flags: PointFlags,
    /// Per-particle random value used for jitter and tone selection.
    pub seed: f32,
    pub size: f32,
    /// Displayed position in viewport pixels.
    pub screen: Vec2,
    /// View-space depth of the last computed target, positive away from the camera.
    pub depth: f32,
    /// Perspective scale of the last computed target.
    pub scale: f32,
    /// Whether the slot currently targets the companion shape.
    pub secondary: bool,
}

impl Particle {
    fn new(base: Vec3, role: Role, flags: PointFlags, size: f32, seed: f32) -> Self {
        Self {
            base,
            orbit: None,
            role,
            flags,
            seed,
            size,
            screen: Vec2::ZERO,
            depth: 0.0,
            scale: 1.0,
            secondary: false,
        }
    }
}

/// Where one pool slot points for a given shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotTarget {
    /// Index into the main shape set.
    Main(usize),
    /// Excess slot collapsed onto the origin.
    Origin,
    /// Index into the companion set.
    Companion(usize),
}

fn role_for(point: &TargetPoint, layout: HomeLayout) -> Role {
    if layout == HomeLayout::Drift {
        Role::Drift
    } else if point.flags.ring {
        Role::Ring
    } else if point.flags.star {
        Role::Star
    } else {
        Role::Shell
    }
}

/// Build the home particle for one point; `u` picks the size within the role's range.
fn home_particle(point: &TargetPoint, role: Role, globe_radius: f32, seed: f32, u: f32) -> Particle {
    let size = match role {
        Role::Drift => u * 3.0 + 1.0,
        Role::Ring => u * 0.2 + 0.1,
        Role::Star => u * 0.15 + 0.05,
        Role::Shell => u * 0.3 + 0.1,
    };
    let mut p = Particle::new(point.position, role, point.flags, size, seed);
    if role == Role::Ring {
        p.orbit = Some(Orbit::from_base(point.position, globe_radius));
    }
    p
}

/// Wrapped index of `slot` into a set of `len` points.
#[inline]
pub fn target_index(slot: usize, len: usize) -> Option<usize> {
    (len > 0).then(|| slot % len)
}

/// Resolve a pool slot against a main set of `main_len` points.
///
/// Returns `None` when the main set is empty: the slot has no target and the
/// particle stays home. Slots past the main set follow `policy`; the companion
/// policy degrades to wrapping when the companion set is empty.
pub fn slot_target(
    slot: usize,
    main_len: usize,
    companion_len: usize,
    policy: SlotPolicy,
) -> Option<SlotTarget> {
    if main_len == 0 {
        return None;
    }
    if slot < main_len {
        return Some(SlotTarget::Main(slot));
    }
    Some(match policy {
        SlotPolicy::Wrap => SlotTarget::Main(slot % main_len),
        SlotPolicy::Collapse => SlotTarget::Origin,
        SlotPolicy::Companion => match target_index(slot - main_len, companion_len) {
            Some(i) => SlotTarget::Companion(i),
            None => SlotTarget::Main(slot % main_len),
        },
    })
}

/// The fixed-size particle pool.
#[derive(Debug, Clone, Default)]
pub struct ParticlePool {
    particles: Vec<Particle>,
}

impl ParticlePool {
    /// Allocate one particle per home point.
    pub fn from_home(
        home: &PointSet,
        layout: HomeLayout,
        globe_radius: f32,
        ctx: &mut SpawnContext,
    ) -> Self {
        let particles = home
            .points()
            .iter()
            .map(|point| {
                let role = role_for(point, layout);
                home_particle(point, role, globe_radius, ctx.random(), ctx.random())
            })
            .collect();
        Self { particles }
    }

    /// Retarget every slot's home to the matching point of a new home set.
    ///
    /// Role, orbit and flags are rebuilt from the new point. A slot that keeps
    /// its role keeps its seed and size; one that changes role draws new ones.
    /// Displayed positions are left alone so particles glide to their new homes.
    pub fn rehome(
        &mut self,
        home: &PointSet,
        layout: HomeLayout,
        globe_radius: f32,
        ctx: &mut SpawnContext,
    ) {
        for (slot, particle) in self.particles.iter_mut().enumerate() {
            let Some(point) = home.wrapped(slot) else {
                continue;
            };
            let role = role_for(point, layout);
            let mut fresh = if role == particle.role {
                let mut p = home_particle(point, role, globe_radius, particle.seed, 0.0);
                p.size = particle.size;
                p
            } else {
                home_particle(point, role, globe_radius, ctx.random(), ctx.random())
            };
            fresh.screen = particle.screen;
            fresh.depth = particle.depth;
            fresh.scale = particle.scale;
            fresh.secondary = particle.secondary;
            *particle = fresh;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle> {
        self.particles.iter_mut()
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<&Particle> {
        self.particles.get(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::generator::planet_set;

    #[test]
    fn test_ten_slots_over_three_points() {
        let expected = [0, 1, 2, 0, 1, 2, 0, 1, 2, 0];
        for (slot, want) in expected.into_iter().enumerate() {
            assert_eq!(target_index(slot, 3), Some(want));
            assert_eq!(
                slot_target(slot, 3, 0, SlotPolicy::Wrap),
                Some(SlotTarget::Main(want))
            );
        }
    }

    #[test]
    fn test_target_index_never_out_of_bounds() {
        for len in 1..40 {
            for slot in 0..200 {
                let i = target_index(slot, len).unwrap();
                assert!(i < len);
            }
        }
        assert_eq!(target_index(7, 0), None);
    }

    #[test]
    fn test_excess_slot_policies() {
        assert_eq!(slot_target(5, 3, 4, SlotPolicy::Collapse), Some(SlotTarget::Origin));
        assert_eq!(slot_target(1, 3, 4, SlotPolicy::Collapse), Some(SlotTarget::Main(1)));
        assert_eq!(
            slot_target(8, 3, 4, SlotPolicy::Companion),
            Some(SlotTarget::Companion(1))
        );
        assert_eq!(
            slot_target(8, 3, 0, SlotPolicy::Companion),
            Some(SlotTarget::Main(2))
        );
        assert_eq!(slot_target(0, 0, 4, SlotPolicy::Wrap), None);
    }

    #[test]
    fn test_pool_roles_and_orbits() {
        let config = EngineConfig::default().with_particle_count(500);
        let mut ctx = SpawnContext::seeded(8);
        let home = planet_set(&config, None, &mut ctx);
        let pool = ParticlePool::from_home(&home, HomeLayout::Planet, 20.0, &mut ctx);
        assert_eq!(pool.len(), 500);
        for p in pool.iter() {
            match p.role {
                Role::Ring => {
                    let orbit = p.orbit.unwrap();
                    assert!(orbit.radius >= 36.0 - 1e-3);
                    assert!((orbit.speed - 20.0 / orbit.radius).abs() < 1e-5);
                    assert!((0.1..=0.3).contains(&p.size));
                }
                Role::Shell => assert!((0.1..=0.4).contains(&p.size)),
                Role::Star => assert!(p.orbit.is_none()),
                Role::Drift => panic!("planet layout produced a drift particle"),
            }
        }
    }

    #[test]
    fn test_rehome_rebuilds_roles() {
        let config = EngineConfig::default().with_particle_count(300);
        let mut ctx = SpawnContext::seeded(8);
        let home = planet_set(&config, None, &mut ctx);
        let mut pool = ParticlePool::from_home(&home, HomeLayout::Planet, 20.0, &mut ctx);
        assert!(pool.iter().any(|p| p.role == Role::Ring));
        pool.iter_mut().for_each(|p| p.screen = Vec2::new(3.0, 4.0));

        let plain = PointSet::from_positions([Vec3::new(5.0, 0.0, 0.0)]);
        pool.rehome(&plain, HomeLayout::Planet, 20.0, &mut ctx);
        assert_eq!(pool.len(), 300);
        for p in pool.iter() {
            assert_eq!(p.role, Role::Shell);
            assert!(p.orbit.is_none());
            assert_eq!(p.flags, PointFlags::default());
            assert_eq!(p.base, Vec3::new(5.0, 0.0, 0.0));
            assert!((0.1..=0.4).contains(&p.size));
            assert_eq!(p.screen, Vec2::new(3.0, 4.0));
        }

        pool.rehome(&home, HomeLayout::Planet, 20.0, &mut ctx);
        for (p, point) in pool.iter().zip(home.points()) {
            assert_eq!(p.role == Role::Ring, point.flags.ring);
            assert_eq!(p.orbit.is_some(), point.flags.ring);
        }
    }

    #[test]
    fn test_rehome_keeps_drift_size() {
        let mut ctx = SpawnContext::seeded(2);
        let first = PointSet::from_positions([Vec3::ZERO, Vec3::X]);
        let mut pool = ParticlePool::from_home(&first, HomeLayout::Drift, 20.0, &mut ctx);
        let sizes: Vec<f32> = pool.iter().map(|p| p.size).collect();

        let moved = PointSet::from_positions([Vec3::Y, Vec3::Z]);
        pool.rehome(&moved, HomeLayout::Drift, 20.0, &mut ctx);
        let after: Vec<f32> = pool.iter().map(|p| p.size).collect();
        assert_eq!(sizes, after);
        assert_eq!(pool.get(1).unwrap().base, Vec3::Z);
    }

    #[test]
    fn test_orbit_from_base_roundtrip() {
        let base = Vec3::new(0.0, 0.0, 50.0);
        let orbit = Orbit::from_base(base, 20.0);
        assert!((orbit.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!((orbit.radius - 50.0).abs() < 1e-4);
        assert!((orbit.speed - 0.4).abs() < 1e-5);
    }
}
