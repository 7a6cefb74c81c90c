//! The morph and explode transition state machine.
//!
//! ```text
//!            request B (A non-home)
//!   Idle ─────────────────────────▶ Exploding ──intensity > hang──▶ Hang
//!    ▲                                                              │
//!    │ intensity < settle                       dwell > hang_ticks, │
//!    └─────────────────────── Imploding ◀────── swap active ← B ────┘
//! ```
//!
//! Switching away from home, or back to it, is a direct morph: the active shape
//! changes at once and only the morph progress moves. Switching between two
//! non-home shapes scatters the cloud first and swaps the active shape while it
//! is scattered.

use std::fmt;

use tracing::debug;

use crate::config::{EngineConfig, ExplosionConfig, StepMode};
use crate::shape::{ShapeId, ShapeRequest};

/// Transition phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Exploding,
    Hang,
    Imploding,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle => "IDLE",
            Phase::Exploding => "EXPLODING",
            Phase::Hang => "HANG",
            Phase::Imploding => "IMPLODING",
        })
    }
}

/// Something observable the machine did during a call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionEvent {
    /// The phase changed.
    PhaseChanged { from: Phase, to: Phase },
    /// The active shape changed without an explosion.
    DirectMorph { from: ShapeId, to: ShapeId },
    /// A shape was staged for the swap at the next hang.
    Staged { shape: ShapeId },
    /// The staged shape became active.
    Swapped { from: ShapeId, to: ShapeId },
    /// An auto-cycling group advanced to its next member.
    Advanced { shape: ShapeId, cycle: usize },
}

/// Per-tick inputs from the rest of the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInput {
    /// Elapsed seconds since the previous tick.
    pub dt: f32,
    /// The active shape has a non-empty point set.
    pub target_available: bool,
    /// The hand controller is engaged, forcing the home shape.
    pub hand_engaged: bool,
    /// A closed fist is held, overriding the explosion intensity.
    pub hand_exploding: bool,
}

impl TickInput {
    /// A plain tick with the active set available and no hand.
    pub fn frame(dt: f32) -> Self {
        Self {
            dt,
            target_available: true,
            hand_engaged: false,
            hand_exploding: false,
        }
    }
}

/// Exponential step of `value` toward `target`.
#[inline]
fn approach(value: f32, target: f32, factor: f32) -> f32 {
    value + (target - value) * factor
}

/// Morph progress, explosion intensity and the active/staged shapes.
#[derive(Debug, Clone)]
pub struct TransitionMachine {
    phase: Phase,
    morph: f32,
    intensity: f32,
    active: ShapeId,
    staged: Option<ShapeId>,
    blend: Option<ShapeId>,
    request: ShapeRequest,
    cycle: usize,
    dwell_secs: f32,
    hang_elapsed: f32,
    explosion: ExplosionConfig,
    morph_rate: f32,
    step: StepMode,
    events: Vec<TransitionEvent>,
}

impl TransitionMachine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            phase: Phase::Idle,
            morph: 0.0,
            intensity: 0.0,
            active: ShapeId::Sphere,
            staged: None,
            blend: None,
            request: ShapeRequest::Home,
            cycle: 0,
            dwell_secs: 0.0,
            hang_elapsed: 0.0,
            explosion: config.explosion.clone(),
            morph_rate: config.morph.rate,
            step: config.projection.step,
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Morph progress in `[0, 1]`.
    #[inline]
    pub fn morph(&self) -> f32 {
        self.morph
    }

    /// Explosion intensity, never negative.
    #[inline]
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Shape whose point set the integrator targets.
    #[inline]
    pub fn active(&self) -> ShapeId {
        self.active
    }

    /// Shape waiting for the next hang.
    #[inline]
    pub fn staged(&self) -> Option<ShapeId> {
        self.staged
    }

    /// Non-home shape the morph blends toward.
    ///
    /// Stays on the last shown shape after a switch home, so the decaying
    /// morph eases particles back from where they were.
    #[inline]
    pub fn blend_shape(&self) -> Option<ShapeId> {
        self.blend
    }

    #[inline]
    pub fn request(&self) -> ShapeRequest {
        self.request
    }

    /// Position within the requested group.
    #[inline]
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Seconds spent idle and settled since the last deviation.
    #[inline]
    pub fn dwell(&self) -> f32 {
        self.dwell_secs
    }

    /// Take the events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<TransitionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ask for a new shape. Repeating the current request does nothing.
    pub fn request_shape(&mut self, request: ShapeRequest) {
        if request == self.request {
            return;
        }
        self.request = request;
        self.cycle = 0;
        self.dwell_secs = 0.0;
        self.switch_to(request.resolve(0));
    }

    fn set_phase(&mut self, to: Phase) {
        if self.phase != to {
            debug!(from = %self.phase, %to, "transition phase");
            self.events.push(TransitionEvent::PhaseChanged {
                from: self.phase,
                to,
            });
            self.phase = to;
        }
    }

    fn switch_to(&mut self, desired: ShapeId) {
        let previous = self.staged.unwrap_or(self.active);
        if desired == previous {
            return;
        }

        if desired.is_home() || previous.is_home() {
            let from = self.active;
            self.active = desired;
            self.staged = None;
            if !desired.is_home() {
                self.blend = Some(desired);
            }
            self.set_phase(Phase::Idle);
            debug!(%from, to = %desired, "direct morph");
            self.events.push(TransitionEvent::DirectMorph { from, to: desired });
        } else {
            self.staged = Some(desired);
            self.events.push(TransitionEvent::Staged { shape: desired });
            if self.phase != Phase::Hang {
                self.set_phase(Phase::Exploding);
            }
        }
    }

    /// Advance one animation tick.
    pub fn tick(&mut self, input: TickInput) {
        let ticks = self.step.ticks(input.dt);
        let e = &self.explosion;
        let (rate, implode_rate, idle_decay) = (
            self.step.factor(e.rate, input.dt),
            self.step.factor(e.implode_rate, input.dt),
            self.step.factor(e.idle_decay, input.dt),
        );

        match self.phase {
            Phase::Exploding => {
                self.intensity = approach(self.intensity, self.explosion.setpoint, rate);
                if self.intensity > self.explosion.hang_threshold {
                    self.hang_elapsed = 0.0;
                    self.set_phase(Phase::Hang);
                }
            }
            Phase::Hang => {
                self.hang_elapsed += ticks;
                if self.hang_elapsed > self.explosion.hang_ticks as f32 {
                    if let Some(next) = self.staged.take() {
                        let from = self.active;
                        self.active = next;
                        self.blend = Some(next);
                        debug!(%from, to = %next, "swapped active shape");
                        self.events.push(TransitionEvent::Swapped { from, to: next });
                    }
                    self.set_phase(Phase::Imploding);
                }
            }
            Phase::Imploding => {
                self.intensity = approach(self.intensity, 0.0, implode_rate);
                if self.intensity < self.explosion.settle_threshold {
                    self.intensity = 0.0;
                    self.set_phase(Phase::Idle);
                }
            }
            Phase::Idle if !input.hand_exploding => {
                self.intensity = approach(self.intensity, 0.0, idle_decay);
            }
            Phase::Idle => {}
        }

        if input.hand_exploding {
            let hand_rate = self.step.factor(self.explosion.hand_rate, input.dt);
            self.intensity = approach(self.intensity, self.explosion.hand_setpoint, hand_rate);
        }
        self.intensity = self.intensity.max(0.0);

        let morph_target = if !self.active.is_home() && input.target_available && !input.hand_engaged {
            1.0
        } else {
            0.0
        };
        let f = self.step.factor(self.morph_rate, input.dt);
        self.morph = approach(self.morph, morph_target, f).clamp(0.0, 1.0);

        self.advance_cycle(input.dt);
    }

    fn advance_cycle(&mut self, dt: f32) {
        let settled = self.phase == Phase::Idle && self.intensity < self.explosion.settle_threshold;
        if !settled {
            self.dwell_secs = 0.0;
            return;
        }
        let Some(group) = self.request.group() else {
            return;
        };
        self.dwell_secs += dt;
        if self.dwell_secs >= self.explosion.auto_cycle_secs {
            self.dwell_secs = 0.0;
            self.cycle = (self.cycle + 1) % group.members().len();
            let shape = group.member(self.cycle);
            self.events.push(TransitionEvent::Advanced {
                shape,
                cycle: self.cycle,
            });
            self.switch_to(shape);
        }
    }
}
