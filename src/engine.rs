//! The owned simulation state.
//!
//! [`Engine`] ties the generator, pool, transition machine, integrator and
//! renderer together behind one per-frame entry point. The host owns the
//! virtual clock and the surface; the engine reads the clock value each
//! update and talks back only through [`ClockControl`].
//!
//! ```ignore
//! let mut engine = Engine::new(EngineConfig::default())?;
//! engine.resize(1280, 720);
//! engine.request_shape(ShapeId::Monogram);
//!
//! // every frame
//! engine.update(dt, clock.hours());
//! engine.render(&mut surface)?;
//! ```

use glam::{Vec2, Vec3};
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, HomeLayout};
use crate::error::{ConfigError, RenderError};
use crate::generator::{drift_set, planet_set, PointSet, PointSetLibrary, Viewport};
use crate::input::{GestureSignal, HandTracker, PointerDrag};
use crate::integrator::{default_sun, FrameParams, Integrator};
use crate::loader::MaskLoader;
use crate::mask::AlphaMask;
use crate::particle::ParticlePool;
use crate::render::{DrawList, Renderer, Surface};
use crate::shape::{ShapeId, ShapeRequest};
use crate::spawn::SpawnContext;
use crate::theme::{Lighting, ThemeMode};
use crate::time::{rotation_angle, wrap_hours, ClockControl};
use crate::transition::{Phase, TickInput, TransitionEvent, TransitionMachine};
use crate::visuals::BatchKey;

/// Drift origins are spread over this area until the first resize.
const INITIAL_DRIFT_EXTENT: Vec2 = Vec2::new(100.0, 75.0);

/// Snapshot of the engine for status lines and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineStatus {
    pub phase: Phase,
    pub morph: f32,
    pub intensity: f32,
    pub active: ShapeId,
    pub staged: Option<ShapeId>,
    pub epoch: u64,
    pub hours: f32,
    pub night: bool,
    pub frame: u64,
}

pub struct Engine {
    config: EngineConfig,
    ctx: SpawnContext,
    library: PointSetLibrary,
    pool: ParticlePool,
    machine: TransitionMachine,
    integrator: Integrator,
    renderer: Renderer,
    loader: Option<MaskLoader>,
    theme: ThemeMode,
    lighting: Lighting,
    drag: PointerDrag,
    hand: HandTracker,
    keys: Vec<BatchKey>,
    events: Vec<TransitionEvent>,
    viewport: Option<Viewport>,
    snapped: bool,
    time: f32,
    frame: u64,
    hours: f32,
}

impl Engine {
    /// Validate the configuration and build the home population.
    ///
    /// Point sets for shapes are generated on the first [`Engine::resize`].
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut ctx = SpawnContext::new(config.pool.seed);

        let home = match config.pool.layout {
            HomeLayout::Planet => {
                let map = config.assets.planet_map.as_deref().and_then(|path| {
                    match AlphaMask::open(path) {
                        Ok(map) => Some(map),
                        Err(err) => {
                            warn!("planet map {} unusable, using procedural land: {err}", path.display());
                            None
                        }
                    }
                });
                planet_set(&config, map.as_ref(), &mut ctx)
            }
            HomeLayout::Drift => drift_set(config.pool.count, INITIAL_DRIFT_EXTENT, &mut ctx),
        };
        let pool = ParticlePool::from_home(&home, config.pool.layout, config.pool.globe_radius, &mut ctx);
        info!(
            particles = pool.len(),
            layout = ?config.pool.layout,
            "engine initialized"
        );

        let hours = wrap_hours(config.clock.start_hours);
        let theme = ThemeMode::default();
        Ok(Self {
            library: PointSetLibrary::new(home),
            machine: TransitionMachine::new(&config),
            integrator: Integrator::new(&config),
            renderer: Renderer::new(&config),
            loader: config.assets.mask_dir.clone().map(MaskLoader::new),
            hand: HandTracker::new(&config.input),
            lighting: theme.lighting(hours),
            theme,
            drag: PointerDrag::new(),
            keys: Vec::new(),
            events: Vec::new(),
            viewport: None,
            snapped: false,
            time: 0.0,
            frame: 0,
            hours,
            pool,
            ctx,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn library(&self) -> &PointSetLibrary {
        &self.library
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn machine(&self) -> &TransitionMachine {
        &self.machine
    }

    pub fn lighting(&self) -> &Lighting {
        &self.lighting
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Batch key of every particle from the last update.
    pub fn batch_keys(&self) -> &[BatchKey] {
        &self.keys
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        if self.theme != theme {
            debug!(?theme, "theme mode changed");
            self.theme = theme;
        }
    }

    pub fn hand(&self) -> &HandTracker {
        &self.hand
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            phase: self.machine.phase(),
            morph: self.machine.morph(),
            intensity: self.machine.intensity(),
            active: self.machine.active(),
            staged: self.machine.staged(),
            epoch: self.library.epoch(),
            hours: self.hours,
            night: self.lighting.night,
            frame: self.frame,
        }
    }

    /// Transition events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<TransitionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Regenerate for a new viewport size.
    ///
    /// A zero-sized viewport keeps everything as it was. Returns whether a
    /// new generation started.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let viewport = Viewport::new(width, height);
        if self.viewport == Some(viewport) {
            return false;
        }
        let Some(epoch) = self.library.regenerate(viewport, &self.config, &mut self.ctx) else {
            return false;
        };
        self.viewport = Some(viewport);
        if self.config.pool.layout == HomeLayout::Drift {
            self.rehome();
        }
        if let Some(loader) = &mut self.loader {
            loader.request(epoch, &self.library.unrefined());
        }
        true
    }

    pub fn request_shape(&mut self, request: impl Into<ShapeRequest>) {
        let request = request.into();
        debug!(?request, "shape requested");
        self.machine.request_shape(request);
    }

    /// Replace the point set of a shape directly (embedding hosts, tests).
    pub fn set_point_set(&mut self, shape: ShapeId, set: PointSet) {
        if shape.is_home() {
            self.library.set_home(set);
            self.rehome();
        } else {
            self.library.insert(shape, set);
        }
    }

    fn rehome(&mut self) {
        let pool = &self.config.pool;
        self.pool
            .rehome(self.library.home(), pool.layout, pool.globe_radius, &mut self.ctx);
    }

    pub fn pointer_down(&mut self, x: f32, clock: &mut impl ClockControl) {
        self.drag.press(x, self.hours, clock);
    }

    pub fn pointer_move(&mut self, x: f32, clock: &mut impl ClockControl) {
        let width = self.viewport.map(|v| v.width).unwrap_or(0);
        if let Some(hours) = self.drag.moved(x, width, clock) {
            self.hours = hours;
        }
    }

    pub fn pointer_up(&mut self, clock: &mut impl ClockControl) {
        self.drag.release(clock);
    }

    /// Start hand control. The home shape is held until [`Engine::disengage_hand`].
    pub fn engage_hand(&mut self) {
        self.hand.engage(self.hours);
    }

    pub fn disengage_hand(&mut self, clock: &mut impl ClockControl) {
        self.hand.disengage(clock);
    }

    /// Feed one hand-tracker frame; `None` means no hand was detected.
    pub fn hand_frame(&mut self, landmarks: Option<&[Vec2]>, clock: &mut impl ClockControl) {
        let signal = landmarks.and_then(|hand| GestureSignal::from_landmarks(hand, &self.config.input));
        self.hand.observe(self.time, signal, clock);
        if signal.is_some() {
            self.hours = self.hand.hours();
        }
    }

    fn apply_deliveries(&mut self) {
        let Some(loader) = &mut self.loader else {
            return;
        };
        for delivery in loader.poll() {
            match delivery.result {
                Ok(mask) => {
                    if self.library.deliver(delivery.epoch, delivery.shape, mask, &self.config, &mut self.ctx) {
                        debug!(shape = %delivery.shape, "refined mask applied");
                    }
                }
                Err(err) => warn!(shape = %delivery.shape, "refined mask failed, keeping placeholder: {err}"),
            }
        }
    }

    /// Advance one frame of `dt` seconds with the clock at `hours`.
    pub fn update(&mut self, dt: f32, hours: f32) {
        self.apply_deliveries();

        self.time += dt;
        self.frame += 1;
        self.hours = wrap_hours(hours);
        self.lighting = self.theme.lighting(self.hours);
        self.renderer.update_palette(&self.lighting, dt);

        let active = self.machine.active();
        let target_available = active.is_home() || !self.library.get(active).is_empty();
        self.machine.tick(TickInput {
            dt,
            target_available,
            hand_engaged: self.hand.is_engaged(),
            hand_exploding: self.hand.is_exploding(),
        });
        self.events.extend(self.machine.drain_events());

        let Some(viewport) = self.viewport else {
            return;
        };

        // An empty set draws as home rather than indexing into nothing.
        let blend = self
            .machine
            .blend_shape()
            .filter(|shape| !self.library.get(*shape).is_empty());
        let active = self.machine.active();
        let attract = !active.is_home() && !self.library.get(active).is_empty() && !self.hand.is_engaged();

        let params = FrameParams {
            dt,
            rotation: rotation_angle(self.hours),
            time: self.time,
            frame: self.frame,
            morph: self.machine.morph(),
            intensity: self.machine.intensity(),
            blend,
            attract,
            viewport,
            sun: default_sun(),
        };

        if !self.snapped {
            self.integrator.snap(&mut self.pool, &self.library, &params);
            self.snapped = true;
        }
        self.integrator.step(&mut self.pool, &self.library, &params, &mut self.keys);
    }

    /// Assemble the current frame.
    pub fn draw_list(&self) -> DrawList {
        self.renderer
            .build(&self.pool, &self.keys, self.machine.morph(), &self.lighting)
    }

    /// Draw the current frame onto `surface`.
    pub fn render(&self, surface: &mut impl Surface) -> Result<(), RenderError> {
        surface.draw(&self.draw_list())
    }
}
