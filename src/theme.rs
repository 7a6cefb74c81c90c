//! Time-of-day theme stages and the lighting descriptor.
//!
//! Six stages sit at fixed hours. In [`ThemeMode::Auto`] colors interpolate
//! between the stage at or before the clock and the next one, wrapping at 24.
//! The locked modes pin the noon or midnight stage.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::UnknownTheme;
use crate::time::wrap_hours;

/// RGB color from a `0xRRGGBB` literal, channels in `[0, 1]`.
pub const fn rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Named stage of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageName {
    Midnight,
    Dawn,
    Morning,
    Noon,
    Evening,
    Night,
}

impl StageName {
    /// Night stages flip the planet palette.
    #[inline]
    pub fn is_night(self) -> bool {
        matches!(self, StageName::Midnight | StageName::Night)
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Colors of one stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    pub hour: f32,
    pub name: StageName,
    pub background: Vec3,
    pub text: Vec3,
    pub accent: Vec3,
    pub particle: Vec3,
}

const fn stage(hour: f32, name: StageName, bg: u32, text: u32, accent: u32, particle: u32) -> Stage {
    Stage {
        hour,
        name,
        background: rgb(bg),
        text: rgb(text),
        accent: rgb(accent),
        particle: rgb(particle),
    }
}

/// Stages in hour order.
pub const STAGES: [Stage; 6] = [
    stage(0.0, StageName::Midnight, 0x09090b, 0xfafafa, 0x71717a, 0xa1a1aa),
    stage(4.0, StageName::Dawn, 0x1e1b4b, 0xe2e8f0, 0x818cf8, 0xc7d2fe),
    stage(8.0, StageName::Morning, 0xfdf4ff, 0x4a044e, 0xf472b6, 0xfb923c),
    stage(12.0, StageName::Noon, 0xffffff, 0x09090b, 0x0ea5e9, 0x38bdf8),
    stage(16.0, StageName::Evening, 0xfff7ed, 0x431407, 0xf97316, 0xfb923c),
    stage(20.0, StageName::Night, 0x18181b, 0xe4e4e7, 0xa1a1aa, 0xd4d4d8),
];

/// Light/dark override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    /// Follow the virtual clock.
    #[default]
    Auto,
    /// Locked to the noon stage.
    Light,
    /// Locked to the midnight stage.
    Dark,
}

impl FromStr for ThemeMode {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ThemeMode::Auto),
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            _ => Err(UnknownTheme(s.to_string())),
        }
    }
}

/// Resolved colors for one moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    /// Stage at or before the clock; decides day versus night.
    pub stage: StageName,
    pub background: Vec3,
    pub accent: Vec3,
    /// Base particle color.
    pub particle: Vec3,
    pub night: bool,
}

fn stage_named(name: StageName) -> &'static Stage {
    STAGES
        .iter()
        .find(|s| s.name == name)
        .unwrap_or(&STAGES[0])
}

impl ThemeMode {
    /// Resolve the lighting for a clock value.
    pub fn lighting(self, hours: f32) -> Lighting {
        let fixed = match self {
            ThemeMode::Light => Some(stage_named(StageName::Noon)),
            ThemeMode::Dark => Some(stage_named(StageName::Midnight)),
            ThemeMode::Auto => None,
        };
        if let Some(s) = fixed {
            return Lighting {
                stage: s.name,
                background: s.background,
                accent: s.accent,
                particle: s.particle,
                night: s.name.is_night(),
            };
        }

        let hours = wrap_hours(hours);
        let start = STAGES
            .iter()
            .rposition(|s| s.hour <= hours)
            .unwrap_or(0);
        let from = &STAGES[start];
        let (to, end_hour) = match STAGES.get(start + 1) {
            Some(next) => (next, next.hour),
            None => (&STAGES[0], 24.0),
        };
        let t = ((hours - from.hour) / (end_hour - from.hour)).clamp(0.0, 1.0);
        Lighting {
            stage: from.name,
            background: from.background.lerp(to.background, t),
            accent: from.accent.lerp(to.accent, t),
            particle: from.particle.lerp(to.particle, t),
            night: from.name.is_night(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_literal() {
        assert_eq!(rgb(0xff0000), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(rgb(0x000000), Vec3::ZERO);
    }

    #[test]
    fn test_stage_boundaries() {
        assert_eq!(ThemeMode::Auto.lighting(0.0).stage, StageName::Midnight);
        assert_eq!(ThemeMode::Auto.lighting(3.99).stage, StageName::Midnight);
        assert_eq!(ThemeMode::Auto.lighting(4.0).stage, StageName::Dawn);
        assert_eq!(ThemeMode::Auto.lighting(12.5).stage, StageName::Noon);
        assert_eq!(ThemeMode::Auto.lighting(23.9).stage, StageName::Night);
    }

    #[test]
    fn test_night_flag() {
        assert!(ThemeMode::Auto.lighting(21.0).night);
        assert!(ThemeMode::Auto.lighting(1.0).night);
        assert!(!ThemeMode::Auto.lighting(13.0).night);
        assert!(ThemeMode::Dark.lighting(13.0).night);
        assert!(!ThemeMode::Light.lighting(1.0).night);
    }

    #[test]
    fn test_interpolation_halfway() {
        let l = ThemeMode::Auto.lighting(10.0);
        let expected = rgb(0xfb923c).lerp(rgb(0x38bdf8), 0.5);
        assert!((l.particle - expected).length() < 1e-5);
    }

    #[test]
    fn test_wraps_to_midnight() {
        let l = ThemeMode::Auto.lighting(22.0);
        let expected = rgb(0xd4d4d8).lerp(rgb(0xa1a1aa), 0.5);
        assert!((l.particle - expected).length() < 1e-5);
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("Dark".parse(), Ok(ThemeMode::Dark));
        let err = "sepia".parse::<ThemeMode>().unwrap_err();
        assert_eq!(err, UnknownTheme("sepia".to_string()));
        assert_eq!(err.to_string(), "unknown theme mode `sepia`");
    }
}
