//! # Orrery
//!
//! A particle planet that morphs into glyphs and icons.
//!
//! A fixed pool of particles idles as a rotating, day/night-lit globe with
//! tilted orbital rings and a star field. Requesting a shape sends the pool
//! through an explode → hang → implode transition and lands every particle
//! on a point sampled from a rasterized glyph or icon mask.
//!
//! ## Quick Start
//!
//! ```ignore
//! use orrery::prelude::*;
//!
//! let mut engine = Engine::new(EngineConfig::default().with_particle_count(4000))?;
//! engine.resize(1280, 720);
//! engine.request_shape(ShapeId::Monogram);
//!
//! let mut clock = VirtualClock::new(240.0, 12.0);
//! let mut surface = RasterSurface::new(1280, 720);
//! for _ in 0..180 {
//!     clock.tick(1.0 / 60.0);
//!     engine.update(1.0 / 60.0, clock.hours());
//! }
//! engine.render(&mut surface)?;
//! surface.save_png("monogram.png".as_ref())?;
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module |
//! |-------|--------|
//! | Mask production | [`glyph`], [`mask`], [`loader`] |
//! | Target generation | [`generator`], [`spawn`] |
//! | Transition | [`transition`] |
//! | Per-frame motion | [`integrator`], [`particle`] |
//! | Color and batching | [`theme`], [`visuals`], [`render`] |
//! | Surfaces | [`raster`], [`gpu`] |
//!
//! The engine itself ([`Engine`]) owns all of this state and is driven by
//! whoever owns the [`VirtualClock`], either the interactive [`Viewer`] or
//! a headless loop.

pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod glyph;
pub mod gpu;
pub mod input;
pub mod integrator;
pub mod loader;
pub mod mask;
pub mod noise;
pub mod particle;
pub mod raster;
pub mod render;
pub mod shader;
pub mod shape;
pub mod spawn;
pub mod theme;
pub mod time;
pub mod transition;
pub mod visuals;
pub mod window;

pub use config::{EngineConfig, HomeLayout, SlotPolicy, StepMode};
pub use engine::{Engine, EngineStatus};
pub use error::{ConfigError, GpuError, MaskError, RenderError, RunError, UnknownShape, UnknownTheme};
pub use generator::{PointSet, PointSetLibrary, Viewport};
pub use glam::{Vec2, Vec3};
pub use gpu::GpuSurface;
pub use raster::RasterSurface;
pub use render::{DrawList, Surface};
pub use shape::{ShapeGroup, ShapeId, ShapeRequest};
pub use theme::ThemeMode;
pub use time::{ClockControl, FrameTimer, VirtualClock};
pub use transition::{Phase, TransitionEvent};
pub use window::Viewer;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use orrery::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{EngineConfig, HomeLayout, SlotPolicy, StepMode};
    pub use crate::engine::{Engine, EngineStatus};
    pub use crate::raster::RasterSurface;
    pub use crate::render::Surface;
    pub use crate::shape::{ShapeGroup, ShapeId, ShapeRequest};
    pub use crate::theme::ThemeMode;
    pub use crate::time::{ClockControl, VirtualClock};
    pub use crate::transition::{Phase, TransitionEvent};
    pub use crate::window::Viewer;
    pub use crate::{Vec2, Vec3};
}
