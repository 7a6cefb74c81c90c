//! Named point sets and the library that owns them.
//!
//! Each [`ShapeId`] has one [`PointSet`]: an ordered, shuffled list of target
//! points. The home set is built by parametric sampling (golden-angle shell,
//! ring band, star shell, or the flat drift field); every other set is sampled
//! from an alpha mask. Sets are immutable between regenerations, which happen
//! on resize and when a refined mask for the current generation arrives.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use tracing::{debug, info, warn};

use crate::config::{AssetConfig, EngineConfig, HomeLayout};
use crate::glyph;
use crate::mask::AlphaMask;
use crate::noise::simplex3;
use crate::shape::{ShapeId, ShapeTable};
use crate::spawn::{golden_sphere_point, SpawnContext};

/// Fraction of the shell budget that a planet map may turn into city points.
const CITY_SHARE: f32 = 0.15;
const LAND_LUMINANCE: f32 = 0.35;
const CITY_LUMINANCE: f32 = 0.75;
const HOTSPOT_THRESHOLD: f32 = 0.45;

/// Logical viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A viewport with a zero dimension cannot be generated into.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Mask resolution for a raster scale, floored like the viewport pixels.
    pub fn raster_size(&self, scale: f32) -> (u32, u32) {
        (
            (self.width as f32 * scale).floor() as u32,
            (self.height as f32 * scale).floor() as u32,
        )
    }

    /// Center in pixels.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) * 0.5
    }
}

/// Classification flags carried by a target point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointFlags {
    pub land: bool,
    pub city: bool,
    pub hotspot: bool,
    pub ring: bool,
    pub star: bool,
}

impl PointFlags {
    pub const RING: Self = Self {
        land: false,
        city: false,
        hotspot: false,
        ring: true,
        star: false,
    };

    pub const STAR: Self = Self {
        land: false,
        city: false,
        hotspot: false,
        ring: false,
        star: true,
    };
}

/// One target point in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPoint {
    pub position: Vec3,
    pub flags: PointFlags,
}

impl TargetPoint {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            flags: PointFlags::default(),
        }
    }

    pub fn with_flags(position: Vec3, flags: PointFlags) -> Self {
        Self { position, flags }
    }
}

/// Ordered target points for one shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointSet {
    points: Vec<TargetPoint>,
}

impl PointSet {
    pub fn new(points: Vec<TargetPoint>) -> Self {
        Self { points }
    }

    /// A set of plain points without flags.
    pub fn from_positions(positions: impl IntoIterator<Item = Vec3>) -> Self {
        Self {
            points: positions.into_iter().map(TargetPoint::new).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[TargetPoint] {
        &self.points
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<&TargetPoint> {
        self.points.get(i)
    }

    /// Point targeted by pool slot `slot`: `slot % len`. `None` for an empty set.
    #[inline]
    pub fn wrapped(&self, slot: usize) -> Option<&TargetPoint> {
        if self.points.is_empty() {
            None
        } else {
            Some(&self.points[slot % self.points.len()])
        }
    }
}

/// Luminance in `[0, 1]` of an equirectangular map at a unit direction.
fn map_luminance(map: &AlphaMask, dir: Vec3) -> f32 {
    let lon = dir.z.atan2(dir.x);
    let lat = dir.y.clamp(-1.0, 1.0).asin();
    let u = lon / TAU + 0.5;
    let v = 0.5 - lat / PI;
    map.sample_uv(u, v) as f32 / 255.0
}

/// Unit direction for an equirectangular pixel center.
fn map_direction(map: &AlphaMask, x: u32, y: u32) -> Vec3 {
    let u = (x as f32 + 0.5) / map.width() as f32;
    let v = (y as f32 + 0.5) / map.height() as f32;
    let lon = (u - 0.5) * TAU;
    let lat = (0.5 - v) * PI;
    Vec3::new(lat.cos() * lon.cos(), lat.sin(), lat.cos() * lon.sin())
}

/// Shell flags for a surface point at `base` (world units).
fn classify_shell(base: Vec3, map: Option<&AlphaMask>) -> PointFlags {
    let dir = base.normalize_or_zero();
    let (land, city) = match map {
        Some(map) => {
            let lum = map_luminance(map, dir);
            (lum > LAND_LUMINANCE, lum > CITY_LUMINANCE)
        }
        None => {
            let land = simplex3(base * 0.08) > 0.05;
            let city = land && simplex3(base * 0.35 + Vec3::splat(7.0)) > 0.55;
            (land, city)
        }
    };
    PointFlags {
        land,
        city,
        hotspot: simplex3(base * 0.12) > HOTSPOT_THRESHOLD,
        ring: false,
        star: false,
    }
}

/// Build the planet home set: shell, map cities, stars, then rings.
///
/// The first `shell + stars` points are in fill order; ring points store their
/// starting orbit on the `y = 0` plane.
pub fn planet_set(config: &EngineConfig, map: Option<&AlphaMask>, ctx: &mut SpawnContext) -> PointSet {
    let pool = &config.pool;
    let radius = pool.globe_radius;
    let shell_budget = (pool.count as f32 * pool.shell_fraction).floor() as usize;
    let star_count = ((pool.count as f32 * pool.star_fraction).floor() as usize)
        .min(pool.count - shell_budget);

    let mut cities = Vec::new();
    if let Some(map) = map {
        let mut candidates: Vec<(u32, u32)> = map
            .cells()
            .filter(|&(_, _, lum)| lum as f32 / 255.0 > CITY_LUMINANCE)
            .map(|(x, y, _)| (x, y))
            .collect();
        ctx.shuffle(&mut candidates);
        let limit = (shell_budget as f32 * CITY_SHARE).floor() as usize;
        cities = candidates
            .into_iter()
            .take(limit)
            .map(|(x, y)| {
                let base = map_direction(map, x, y) * radius;
                let mut flags = classify_shell(base, Some(map));
                flags.land = true;
                flags.city = true;
                TargetPoint::with_flags(base, flags)
            })
            .collect();
    }

    let shell_count = shell_budget - cities.len();
    let mut points = Vec::with_capacity(pool.count);
    for i in 0..shell_count {
        let base = golden_sphere_point(i, shell_count) * radius;
        points.push(TargetPoint::with_flags(base, classify_shell(base, map)));
    }
    points.extend(cities);

    for _ in 0..star_count {
        points.push(TargetPoint::with_flags(ctx.star(radius), PointFlags::STAR));
    }

    while points.len() < pool.count {
        let (orbit, angle) = ctx.ring_orbit(radius);
        let base = Vec3::new(angle.cos() * orbit, 0.0, angle.sin() * orbit);
        points.push(TargetPoint::with_flags(base, PointFlags::RING));
    }

    let hotspots = points.iter().filter(|p| p.flags.hotspot).count();
    debug!(
        shell = shell_count,
        stars = star_count,
        hotspots,
        "generated planet set"
    );
    PointSet::new(points)
}

/// Build the drift home set: random flat origins spread over the visible area.
pub fn drift_set(count: usize, extent: Vec2, ctx: &mut SpawnContext) -> PointSet {
    let half = extent * 0.5;
    PointSet::from_positions((0..count).map(|_| {
        let p = ctx.random_in_rect(extent) - half;
        Vec3::new(p.x, p.y, 0.0)
    }))
}

/// Scale a mask uniformly so it fits within `width` x `height`.
pub fn fit_mask(mask: &AlphaMask, width: u32, height: u32) -> Option<AlphaMask> {
    if width == 0 || height == 0 {
        return None;
    }
    let k = (width as f32 / mask.width() as f32).min(height as f32 / mask.height() as f32);
    let w = ((mask.width() as f32 * k).round() as u32).max(1);
    let h = ((mask.height() as f32 * k).round() as u32).max(1);
    mask.resized(w, h).ok()
}

/// Sample the opaque cells of a mask into a shuffled, capped point set.
///
/// Mask pixels map to world units around the mask center with y flipped, so
/// the result is centered on the origin at z = 0.
pub fn mask_set(
    mask: &AlphaMask,
    viewport: Viewport,
    assets: &AssetConfig,
    budget: usize,
    ctx: &mut SpawnContext,
) -> PointSet {
    let step = assets.sample_step.max(1);
    let half_w = mask.width() as f32 * 0.5;
    let half_h = mask.height() as f32 * 0.5;
    let unit = assets.world_per_pixel / assets.raster_scale;
    let offset = if viewport.width > assets.wide_breakpoint {
        assets.wide_offset
    } else {
        0.0
    };

    let mut positions = Vec::new();
    for y in (0..mask.height()).step_by(step as usize) {
        for x in (0..mask.width()).step_by(step as usize) {
            if mask.get(x, y) > assets.mask_threshold {
                positions.push(Vec3::new(
                    (x as f32 - half_w) * unit + offset,
                    -(y as f32 - half_h) * unit,
                    0.0,
                ));
            }
        }
    }

    // Order is traversed in lockstep with particle index; raster order would
    // show as scanlines while morphing.
    ctx.shuffle(&mut positions);
    positions.truncate(budget);
    PointSet::from_positions(positions)
}

/// Owns one point set per shape plus the generation epoch.
#[derive(Debug)]
pub struct PointSetLibrary {
    sets: ShapeTable<PointSet>,
    refined: ShapeTable<Option<AlphaMask>>,
    viewport: Option<Viewport>,
    epoch: u64,
}

impl PointSetLibrary {
    /// Create a library with the given home set and every other set empty.
    pub fn new(home: PointSet) -> Self {
        let mut sets: ShapeTable<PointSet> = ShapeTable::default();
        sets[ShapeId::Sphere] = home;
        Self {
            sets,
            refined: ShapeTable::default(),
            viewport: None,
            epoch: 0,
        }
    }

    /// Current generation epoch. Incremented by every successful regeneration.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[inline]
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    #[inline]
    pub fn get(&self, shape: ShapeId) -> &PointSet {
        &self.sets[shape]
    }

    #[inline]
    pub fn home(&self) -> &PointSet {
        &self.sets[ShapeId::Sphere]
    }

    /// Whether a refined mask has replaced the placeholder for `shape`.
    pub fn is_refined(&self, shape: ShapeId) -> bool {
        self.refined[shape].is_some()
    }

    /// Shapes still drawn from placeholder artwork.
    pub fn unrefined(&self) -> Vec<ShapeId> {
        ShapeId::rasterized().filter(|s| !self.is_refined(*s)).collect()
    }

    /// Replace one set outright.
    pub fn insert(&mut self, shape: ShapeId, set: PointSet) {
        self.sets[shape] = set;
    }

    /// Replace the home set (drift layout follows the viewport).
    pub fn set_home(&mut self, home: PointSet) {
        self.sets[ShapeId::Sphere] = home;
    }

    /// Regenerate every shaped set for a new viewport.
    ///
    /// Returns the new epoch, or `None` when the viewport is degenerate, in
    /// which case the existing sets are kept and nothing changes.
    pub fn regenerate(
        &mut self,
        viewport: Viewport,
        config: &EngineConfig,
        ctx: &mut SpawnContext,
    ) -> Option<u64> {
        let (sw, sh) = viewport.raster_size(config.assets.raster_scale);
        if viewport.is_degenerate() || sw == 0 || sh == 0 {
            warn!(
                width = viewport.width,
                height = viewport.height,
                "viewport too small to generate point sets, waiting for next resize"
            );
            return None;
        }

        self.epoch += 1;
        self.viewport = Some(viewport);
        let budget = config.pool.count;

        for shape in ShapeId::rasterized() {
            let mask = match &self.refined[shape] {
                Some(refined) => fit_mask(refined, sw, sh),
                None => match glyph::rasterize(shape, sw, sh) {
                    Ok(mask) => Some(mask),
                    Err(err) => {
                        warn!("placeholder for {shape} failed: {err}");
                        None
                    }
                },
            };
            self.sets[shape] = match mask {
                Some(mask) => mask_set(&mask, viewport, &config.assets, budget, ctx),
                None => PointSet::default(),
            };
        }

        if config.pool.layout == HomeLayout::Drift {
            let ppu = config.projection.pixels_per_unit(viewport.height as f32);
            let extent = Vec2::new(viewport.width as f32, viewport.height as f32) / ppu;
            self.sets[ShapeId::Sphere] = drift_set(budget, extent, ctx);
        }

        info!(
            epoch = self.epoch,
            width = viewport.width,
            height = viewport.height,
            "generated point sets"
        );
        Some(self.epoch)
    }

    /// Apply a refined mask produced for generation `epoch`.
    ///
    /// Stale deliveries from a superseded generation are discarded. Returns
    /// `true` if the set was replaced.
    pub fn deliver(
        &mut self,
        epoch: u64,
        shape: ShapeId,
        mask: AlphaMask,
        config: &EngineConfig,
        ctx: &mut SpawnContext,
    ) -> bool {
        if epoch != self.epoch {
            warn!(
                %shape,
                epoch,
                current = self.epoch,
                "discarding mask from superseded generation"
            );
            return false;
        }
        if shape.is_home() {
            return false;
        }
        let Some(viewport) = self.viewport else {
            return false;
        };
        if mask.count_above(config.assets.mask_threshold) == 0 {
            warn!(%shape, "refined mask has no opaque pixels, keeping placeholder");
            return false;
        }

        let (sw, sh) = viewport.raster_size(config.assets.raster_scale);
        let Some(fitted) = fit_mask(&mask, sw, sh) else {
            return false;
        };
        let set = mask_set(&fitted, viewport, &config.assets, config.pool.count, ctx);
        if set.is_empty() {
            warn!(%shape, "refined mask sampled to nothing, keeping placeholder");
            return false;
        }
        debug!(%shape, points = set.len(), "applied refined mask");
        self.sets[shape] = set;
        self.refined[shape] = Some(mask);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(count: usize) -> EngineConfig {
        EngineConfig::default().with_particle_count(count).with_seed(1)
    }

    #[test]
    fn test_wrapped_index() {
        let set = PointSet::from_positions([Vec3::ZERO, Vec3::ONE, Vec3::splat(2.0)]);
        for slot in 0..10 {
            let p = set.wrapped(slot).unwrap();
            assert_eq!(p.position, Vec3::splat((slot % 3) as f32));
        }
        assert!(PointSet::default().wrapped(5).is_none());
    }

    #[test]
    fn test_planet_set_populations() {
        let config = config(1000);
        let mut ctx = SpawnContext::seeded(2);
        let set = planet_set(&config, None, &mut ctx);
        assert_eq!(set.len(), 1000);
        let rings = set.points().iter().filter(|p| p.flags.ring).count();
        let stars = set.points().iter().filter(|p| p.flags.star).count();
        assert_eq!(stars, 40);
        assert_eq!(rings, 1000 - 600 - 40);
        for p in &set.points()[..600] {
            assert!((p.position.length() - 20.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_planet_map_adds_cities() {
        let config = config(1000);
        let mut map = AlphaMask::new(64, 32).unwrap();
        map.fill_rect(Vec2::new(0.0, 0.0), Vec2::new(32.0, 32.0));
        let mut ctx = SpawnContext::seeded(2);
        let set = planet_set(&config, Some(&map), &mut ctx);
        assert_eq!(set.len(), 1000);
        let cities = set.points().iter().filter(|p| p.flags.city).count();
        // 15% of a 600 shell budget, plus shell points over bright pixels.
        assert!(cities >= 90, "only {cities} cities");
        let land = set.points().iter().filter(|p| p.flags.land).count();
        assert!(land > 0 && land < 600);
    }

    #[test]
    fn test_mask_set_centered_and_capped() {
        let mut mask = AlphaMask::new(100, 50).unwrap();
        mask.fill_rect(Vec2::new(40.0, 20.0), Vec2::new(20.0, 10.0));
        let assets = AssetConfig::default();
        let mut ctx = SpawnContext::seeded(9);
        let set = mask_set(&mask, Viewport::new(500, 250), &assets, 10_000, &mut ctx);
        assert_eq!(set.len(), 200);
        let mean = set.points().iter().map(|p| p.position).sum::<Vec3>() / set.len() as f32;
        assert!(mean.length() < 0.5, "mean {mean}");

        let capped = mask_set(&mask, Viewport::new(500, 250), &assets, 50, &mut ctx);
        assert_eq!(capped.len(), 50);
    }

    #[test]
    fn test_wide_viewport_offset() {
        let mut mask = AlphaMask::new(10, 10).unwrap();
        mask.fill_rect(Vec2::new(5.0, 5.0), Vec2::ONE);
        let assets = AssetConfig::default();
        let mut ctx = SpawnContext::seeded(9);
        let narrow = mask_set(&mask, Viewport::new(800, 600), &assets, 10, &mut ctx);
        let wide = mask_set(&mask, Viewport::new(1600, 600), &assets, 10, &mut ctx);
        let dx = wide.points()[0].position.x - narrow.points()[0].position.x;
        assert!((dx - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_regenerate_degenerate_viewport_is_noop() {
        let config = config(500);
        let mut ctx = SpawnContext::seeded(4);
        let mut library = PointSetLibrary::new(PointSet::default());
        assert_eq!(library.regenerate(Viewport::new(0, 600), &config, &mut ctx), None);
        assert_eq!(library.epoch(), 0);
        assert!(library.get(ShapeId::Monogram).is_empty());

        assert_eq!(library.regenerate(Viewport::new(800, 600), &config, &mut ctx), Some(1));
        for shape in ShapeId::rasterized() {
            assert!(!library.get(shape).is_empty(), "{shape} is empty");
            assert!(library.get(shape).len() <= 500);
        }
    }

    #[test]
    fn test_stale_delivery_is_discarded() {
        let config = config(500);
        let mut ctx = SpawnContext::seeded(4);
        let mut library = PointSetLibrary::new(PointSet::default());
        library.regenerate(Viewport::new(800, 600), &config, &mut ctx);
        library.regenerate(Viewport::new(1000, 700), &config, &mut ctx);

        let mut mask = AlphaMask::new(20, 20).unwrap();
        mask.fill_rect(Vec2::ZERO, Vec2::splat(20.0));
        assert!(!library.deliver(1, ShapeId::Music, mask.clone(), &config, &mut ctx));
        assert!(!library.is_refined(ShapeId::Music));
        assert!(library.deliver(2, ShapeId::Music, mask, &config, &mut ctx));
        assert!(library.is_refined(ShapeId::Music));
        assert!(!library.unrefined().contains(&ShapeId::Music));
    }
}
