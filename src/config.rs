//! Engine configuration loaded from TOML.
//!
//! Every field has a tuned default, and all sections use `#[serde(default)]`,
//! so a file only needs to name the values it overrides:
//!
//! ```toml
//! [pool]
//! count = 4000
//! layout = "drift"
//!
//! [projection.step]
//! mode = "normalized"
//! reference_hz = 60.0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

/// Arrangement of the particles while no shape is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeLayout {
    /// Rotating planet: structural shell, orbiting rings and a star shell.
    #[default]
    Planet,
    /// Flat field of jittering particles scattered over the viewport.
    Drift,
}

/// What particle slots beyond a shape's point count target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPolicy {
    /// Wrap around: slot `i` targets point `i % len`.
    #[default]
    Wrap,
    /// Excess slots collapse onto the origin.
    Collapse,
    /// Excess slots form the crawling companion bug.
    Companion,
}

/// How exponential smoothing steps relate to elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StepMode {
    /// Fixed fractional step per tick, independent of frame duration.
    #[default]
    PerFrame,
    /// Step scaled so the result matches `reference_hz` ticks per second.
    Normalized { reference_hz: f32 },
}

impl StepMode {
    /// Effective blend factor for a smoothing `rate` over `dt` seconds.
    #[inline]
    pub fn factor(self, rate: f32, dt: f32) -> f32 {
        match self {
            StepMode::PerFrame => rate,
            StepMode::Normalized { reference_hz } => {
                let ticks = (dt * reference_hz).max(0.0);
                1.0 - (1.0 - rate).powf(ticks)
            }
        }
    }

    /// Number of reference ticks represented by one update of `dt` seconds.
    #[inline]
    pub fn ticks(self, dt: f32) -> f32 {
        match self {
            StepMode::PerFrame => 1.0,
            StepMode::Normalized { reference_hz } => (dt * reference_hz).max(0.0),
        }
    }
}

/// Particle pool and home population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub count: usize,
    pub globe_radius: f32,
    pub shell_fraction: f32,
    pub star_fraction: f32,
    pub layout: HomeLayout,
    /// Seed for every random draw. `None` seeds from the clock.
    pub seed: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            count: 8000,
            globe_radius: 20.0,
            shell_fraction: 0.6,
            star_fraction: 0.04,
            layout: HomeLayout::Planet,
            seed: None,
        }
    }
}

/// Morph progress and slot assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphConfig {
    pub rate: f32,
    pub slot_policy: SlotPolicy,
    pub companion_offset: [f32; 2],
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            rate: 0.05,
            slot_policy: SlotPolicy::Wrap,
            companion_offset: [40.0, -30.0],
        }
    }
}

/// Explosion intensity and the shape-to-shape transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionConfig {
    pub setpoint: f32,
    pub rate: f32,
    pub hang_threshold: f32,
    pub hang_ticks: u32,
    pub implode_rate: f32,
    pub settle_threshold: f32,
    pub idle_decay: f32,
    pub hand_setpoint: f32,
    pub hand_rate: f32,
    pub scatter: f32,
    pub auto_cycle_secs: f32,
}

impl Default for ExplosionConfig {
    fn default() -> Self {
        Self {
            setpoint: 1.2,
            rate: 0.1,
            hang_threshold: 1.1,
            hang_ticks: 20,
            implode_rate: 0.03,
            settle_threshold: 0.01,
            idle_decay: 0.1,
            hand_setpoint: 2.0,
            hand_rate: 0.1,
            scatter: 15.0,
            auto_cycle_secs: 4.0,
        }
    }
}

/// Camera, perspective and displayed-position convergence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub camera_distance: f32,
    pub fov_degrees: f32,
    pub focal: f32,
    pub return_speed: f32,
    pub drift_return_speed: f32,
    pub drift_home_speed: f32,
    pub drift_jitter: f32,
    pub step: StepMode,
}

impl ProjectionConfig {
    /// Screen pixels per world unit at depth zero for a viewport height.
    pub fn pixels_per_unit(&self, viewport_height: f32) -> f32 {
        let half_fov = (self.fov_degrees * 0.5).to_radians();
        viewport_height / (2.0 * self.camera_distance * half_fov.tan())
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            camera_distance: 80.0,
            fov_degrees: 45.0,
            focal: 80.0,
            return_speed: 0.08,
            drift_return_speed: 0.1,
            drift_home_speed: 0.05,
            drift_jitter: 0.1,
            step: StepMode::PerFrame,
        }
    }
}

/// Drawing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Splat radius in pixels per unit of particle size (planet layout).
    pub point_scale: f32,
    /// Splat radius in pixels per unit of particle size (drift layout).
    pub drift_point_scale: f32,
    pub hotspot_glow: f32,
    pub city_glow: f32,
    pub color_rate: f32,
    /// Fixed clear color. `None` follows the theme background.
    pub background: Option<[f32; 4]>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            point_scale: 6.0,
            drift_point_scale: 1.0,
            hotspot_glow: 8.0,
            city_glow: 4.0,
            color_rate: 0.05,
            background: None,
        }
    }
}

/// Virtual day clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub day_seconds: f32,
    pub start_hours: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            day_seconds: 240.0,
            start_hours: 12.0,
        }
    }
}

/// Hand-gesture interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub hand_deadzone: f32,
    pub hand_speed: f32,
    pub hand_timeout_secs: f32,
    pub open_finger_ratio: f32,
    pub open_min_fingers: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            hand_deadzone: 0.2,
            hand_speed: 0.1,
            hand_timeout_secs: 3.0,
            open_finger_ratio: 1.5,
            open_min_fingers: 3,
        }
    }
}

/// Rasterization and external mask resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory holding refined `<shape>.png` masks.
    pub mask_dir: Option<PathBuf>,
    /// Equirectangular luminance map for the planet.
    pub planet_map: Option<PathBuf>,
    /// Mask resolution relative to the viewport.
    pub raster_scale: f32,
    /// World units per viewport pixel.
    pub world_per_pixel: f32,
    pub mask_threshold: u8,
    pub sample_step: u32,
    /// Extra x offset applied to shapes on wide viewports.
    pub wide_offset: f32,
    pub wide_breakpoint: u32,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            mask_dir: None,
            planet_map: None,
            raster_scale: 0.2,
            world_per_pixel: 0.08,
            mask_threshold: 50,
            sample_step: 1,
            wide_offset: 25.0,
            wide_breakpoint: 1024,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub pool: PoolConfig,
    pub morph: MorphConfig,
    pub explosion: ExplosionConfig,
    pub projection: ProjectionConfig,
    pub render: RenderConfig,
    pub clock: ClockConfig,
    pub input: InputConfig,
    pub assets: AssetConfig,
}

impl EngineConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Set the number of particles.
    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.pool.count = count;
        self
    }

    /// Set the home layout.
    pub fn with_layout(mut self, layout: HomeLayout) -> Self {
        self.pool.layout = layout;
        self
    }

    /// Fix the random seed for reproducible populations and shuffles.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.pool.seed = Some(seed);
        self
    }

    /// Set the excess-slot policy.
    pub fn with_slot_policy(mut self, policy: SlotPolicy) -> Self {
        self.morph.slot_policy = policy;
        self
    }

    /// Set how smoothing steps scale with frame duration.
    pub fn with_step_mode(mut self, step: StepMode) -> Self {
        self.projection.step = step;
        self
    }

    /// Set the directory searched for refined shape masks.
    pub fn with_mask_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets.mask_dir = Some(dir.into());
        self
    }

    /// Check every value against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("morph.rate", self.morph.rate),
            ("explosion.rate", self.explosion.rate),
            ("explosion.implode_rate", self.explosion.implode_rate),
            ("explosion.idle_decay", self.explosion.idle_decay),
            ("explosion.hand_rate", self.explosion.hand_rate),
            ("projection.return_speed", self.projection.return_speed),
            ("projection.drift_return_speed", self.projection.drift_return_speed),
            ("projection.drift_home_speed", self.projection.drift_home_speed),
            ("render.color_rate", self.render.color_rate),
        ];
        for (field, rate) in rates {
            if !(rate > 0.0 && rate <= 1.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{rate} is not in (0, 1]"),
                });
            }
        }

        if self.pool.count == 0 {
            return Err(invalid("pool.count", "must be at least 1"));
        }
        if !(self.pool.globe_radius > 0.0) {
            return Err(invalid("pool.globe_radius", "must be positive"));
        }
        let fractions = self.pool.shell_fraction + self.pool.star_fraction;
        if self.pool.shell_fraction < 0.0 || self.pool.star_fraction < 0.0 || fractions > 1.0 {
            return Err(invalid(
                "pool.shell_fraction",
                "shell and star fractions must be non-negative and sum to at most 1",
            ));
        }
        if self.explosion.hang_threshold >= self.explosion.setpoint {
            return Err(invalid(
                "explosion.hang_threshold",
                "must be below the explosion setpoint",
            ));
        }
        let e = &self.explosion;
        if !(e.settle_threshold > 0.0 && e.settle_threshold < e.hang_threshold) {
            return Err(invalid(
                "explosion.settle_threshold",
                "must be positive and below the hang threshold",
            ));
        }
        if e.hang_ticks == 0 {
            return Err(invalid("explosion.hang_ticks", "must be at least 1"));
        }
        if !(e.auto_cycle_secs > 0.0) {
            return Err(invalid("explosion.auto_cycle_secs", "must be positive"));
        }
        if !(self.projection.focal > 0.0) || !(self.projection.camera_distance > 0.0) {
            return Err(invalid("projection.focal", "focal and camera distance must be positive"));
        }
        if !(self.projection.fov_degrees > 0.0 && self.projection.fov_degrees < 180.0) {
            return Err(invalid("projection.fov_degrees", "must be in (0, 180)"));
        }
        if let StepMode::Normalized { reference_hz } = self.projection.step {
            if !(reference_hz > 0.0) {
                return Err(invalid("projection.step.reference_hz", "must be positive"));
            }
        }
        if !(self.clock.day_seconds > 0.0) {
            return Err(invalid("clock.day_seconds", "must be positive"));
        }
        if !(0.0..24.0).contains(&self.clock.start_hours) {
            return Err(invalid("clock.start_hours", "must be in [0, 24)"));
        }
        if !(self.assets.raster_scale > 0.0 && self.assets.raster_scale <= 1.0) {
            return Err(invalid("assets.raster_scale", "must be in (0, 1]"));
        }
        if self.assets.sample_step == 0 {
            return Err(invalid("assets.sample_step", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [pool]
            count = 1200
            layout = "drift"

            [morph]
            slot_policy = "companion"
            "#,
        )
        .unwrap();
        assert_eq!(config.pool.count, 1200);
        assert_eq!(config.pool.layout, HomeLayout::Drift);
        assert_eq!(config.morph.slot_policy, SlotPolicy::Companion);
        assert_eq!(config.explosion.hang_ticks, 20);
        assert_eq!(config.projection.step, StepMode::PerFrame);
    }

    #[test]
    fn test_step_mode_table() {
        let config = EngineConfig::from_toml_str(
            r#"
            [projection.step]
            mode = "normalized"
            reference_hz = 60.0
            "#,
        )
        .unwrap();
        assert_eq!(
            config.projection.step,
            StepMode::Normalized { reference_hz: 60.0 }
        );
    }

    #[test]
    fn test_rejects_bad_rate() {
        let err = EngineConfig::from_toml_str("[morph]\nrate = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "morph.rate", .. }));
    }

    #[test]
    fn test_normalized_factor_matches_per_frame_at_reference() {
        let step = StepMode::Normalized { reference_hz: 60.0 };
        let f = step.factor(0.1, 1.0 / 60.0);
        assert!((f - 0.1).abs() < 1e-5);
        // Two reference ticks in one update compound the step.
        let f2 = step.factor(0.1, 2.0 / 60.0);
        assert!((f2 - 0.19).abs() < 1e-5);
    }

    #[test]
    fn test_pixels_per_unit() {
        let projection = ProjectionConfig::default();
        let ppu = projection.pixels_per_unit(800.0);
        assert!(ppu > 12.0 && ppu < 12.2);
    }

    fn invalid_field(config: &EngineConfig) -> Option<&'static str> {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_settle_threshold_must_be_positive() {
        let mut config = EngineConfig::default();
        config.explosion.settle_threshold = 0.0;
        assert_eq!(invalid_field(&config), Some("explosion.settle_threshold"));
        config.explosion.settle_threshold = -0.5;
        assert_eq!(invalid_field(&config), Some("explosion.settle_threshold"));
    }

    #[test]
    fn test_settle_threshold_below_hang() {
        let mut config = EngineConfig::default();
        config.explosion.settle_threshold = config.explosion.hang_threshold;
        assert_eq!(invalid_field(&config), Some("explosion.settle_threshold"));
    }

    #[test]
    fn test_hang_ticks_nonzero() {
        let mut config = EngineConfig::default();
        config.explosion.hang_ticks = 0;
        assert_eq!(invalid_field(&config), Some("explosion.hang_ticks"));
    }

    #[test]
    fn test_auto_cycle_positive() {
        let mut config = EngineConfig::default();
        config.explosion.auto_cycle_secs = 0.0;
        assert_eq!(invalid_field(&config), Some("explosion.auto_cycle_secs"));
    }

    #[test]
    fn test_bundled_config_matches_defaults() {
        let config = EngineConfig::from_toml_str(include_str!("../orrery.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
