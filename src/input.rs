//! Input bridges: pointer drag, hand gestures and viewer hotkeys.
//!
//! Neither bridge touches the particles. A drag scrubs the virtual clock, and
//! a hand gesture scrubs it at a rate while also overriding the explosion.
//! Both talk to the clock only through [`ClockControl`].
//!
//! ```ignore
//! // pointer down/move/up from the window loop
//! drag.press(x, clock.hours(), &mut clock);
//! drag.moved(x, width, &mut clock);
//! drag.release(&mut clock);
//! ```

use glam::Vec2;
use tracing::info;
use winit::keyboard::KeyCode;

use crate::config::InputConfig;
use crate::shape::{ShapeGroup, ShapeId, ShapeRequest};
use crate::time::{wrap_hours, ClockControl, HOURS_PER_DAY};

/// Number of landmarks in one tracked hand.
pub const HAND_LANDMARKS: usize = 21;
const WRIST: usize = 0;
const MIDDLE_MCP: usize = 9;
const FINGER_TIPS: [usize; 4] = [8, 12, 16, 20];
const FINGER_MCPS: [usize; 4] = [5, 9, 13, 17];

/// Horizontal drag that scrubs the clock.
///
/// The clock is paused while the pointer is down and resumed on release.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PointerDrag {
    anchor: Option<(f32, f32)>,
}

impl PointerDrag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer down at `x` pixels with the clock at `hours`.
    pub fn press(&mut self, x: f32, hours: f32, clock: &mut impl ClockControl) {
        self.anchor = Some((x, hours));
        clock.pause();
    }

    /// Pointer moved to `x` over a viewport `width` pixels wide.
    ///
    /// A full-width drag is one day. Returns the new clock value while dragging.
    pub fn moved(&mut self, x: f32, width: u32, clock: &mut impl ClockControl) -> Option<f32> {
        let (start_x, start_hours) = self.anchor?;
        if width == 0 {
            return None;
        }
        let delta = (x - start_x) / width as f32 * HOURS_PER_DAY;
        let hours = wrap_hours(start_hours + delta);
        clock.set_hours(hours);
        Some(hours)
    }

    pub fn release(&mut self, clock: &mut impl ClockControl) {
        if self.anchor.take().is_some() {
            clock.resume();
        }
    }
}

/// One frame of hand-tracking output reduced to what the engine needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSignal {
    /// Hand tilt in radians, clamped to `[-π/2, π/2]`; zero is upright.
    pub angle: f32,
    /// At least the configured number of fingers extended.
    pub open: bool,
}

impl GestureSignal {
    /// Reduce 21 normalized image-space landmarks (y down) to a signal.
    ///
    /// Returns `None` when fewer landmarks are given.
    pub fn from_landmarks(hand: &[Vec2], config: &InputConfig) -> Option<Self> {
        if hand.len() < HAND_LANDMARKS {
            return None;
        }
        let wrist = hand[WRIST];
        let axis = hand[MIDDLE_MCP] - wrist;
        let limit = std::f32::consts::FRAC_PI_2;
        let angle = axis.x.atan2(-axis.y).clamp(-limit, limit);

        let extended = FINGER_TIPS
            .iter()
            .zip(FINGER_MCPS.iter())
            .filter(|&(&tip, &mcp)| {
                hand[tip].distance(wrist) > hand[mcp].distance(wrist) * config.open_finger_ratio
            })
            .count();

        Some(Self {
            angle,
            open: extended as u32 >= config.open_min_fingers,
        })
    }

    /// Clock hours added per detected frame for this tilt.
    pub fn hours_rate(&self, deadzone: f32, speed: f32) -> f32 {
        if self.angle > deadzone {
            (self.angle - deadzone) * speed
        } else if self.angle < -deadzone {
            (self.angle + deadzone) * speed
        } else {
            0.0
        }
    }
}

/// Hand-control session state.
///
/// While engaged the engine holds the home shape. Each detection pauses the
/// clock and scrubs it by the tilt rate; a closed hand holds the explosion.
/// After `hand_timeout_secs` without a detection the clock resumes and the
/// explosion override clears.
#[derive(Debug, Clone, PartialEq)]
pub struct HandTracker {
    config: InputConfig,
    engaged: bool,
    exploding: bool,
    hours: f32,
    last_detection: Option<f32>,
}

impl HandTracker {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            config: config.clone(),
            engaged: false,
            exploding: false,
            hours: 0.0,
            last_detection: None,
        }
    }

    #[inline]
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// A closed hand is currently holding the explosion.
    #[inline]
    pub fn is_exploding(&self) -> bool {
        self.engaged && self.exploding
    }

    /// Start a session with the clock at `hours`.
    pub fn engage(&mut self, hours: f32) {
        self.engaged = true;
        self.exploding = false;
        self.hours = hours;
        self.last_detection = None;
        info!("hand control engaged at {hours:.1}h");
    }

    /// End the session and hand the clock back.
    pub fn disengage(&mut self, clock: &mut impl ClockControl) {
        if !self.engaged {
            return;
        }
        self.engaged = false;
        self.exploding = false;
        clock.resume();
        info!("hand control disengaged");
    }

    /// Feed one tracker frame at `now` seconds.
    pub fn observe(&mut self, now: f32, signal: Option<GestureSignal>, clock: &mut impl ClockControl) {
        if !self.engaged {
            return;
        }
        match signal {
            Some(signal) => {
                self.last_detection = Some(now);
                clock.pause();

                self.hours += signal.hours_rate(self.config.hand_deadzone, self.config.hand_speed);
                clock.set_hours(wrap_hours(self.hours));

                // Closed hand explodes.
                self.exploding = !signal.open;
            }
            None => {
                let last = self.last_detection.unwrap_or(f32::NEG_INFINITY);
                if now - last > self.config.hand_timeout_secs {
                    clock.resume();
                    self.exploding = false;
                }
            }
        }
    }

    /// Clock value last set by the hand.
    pub fn hours(&self) -> f32 {
        wrap_hours(self.hours)
    }
}

/// Shape request bound to a number key in the viewer.
pub fn shape_for_key(key: KeyCode) -> Option<ShapeRequest> {
    let request = match key {
        KeyCode::Digit0 | KeyCode::Numpad0 => ShapeRequest::Home,
        KeyCode::Digit1 | KeyCode::Numpad1 => ShapeRequest::Shape(ShapeId::Monogram),
        KeyCode::Digit2 | KeyCode::Numpad2 => ShapeRequest::Shape(ShapeId::Developer),
        KeyCode::Digit3 | KeyCode::Numpad3 => ShapeRequest::Shape(ShapeId::Code),
        KeyCode::Digit4 | KeyCode::Numpad4 => ShapeRequest::Group(ShapeGroup::Contact),
        KeyCode::Digit5 | KeyCode::Numpad5 => ShapeRequest::Group(ShapeGroup::Hobbies),
        KeyCode::Digit6 | KeyCode::Numpad6 => ShapeRequest::Shape(ShapeId::Bug),
        _ => return None,
    };
    Some(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::VirtualClock;

    fn open_hand(tilt: Vec2) -> Vec<Vec2> {
        // Wrist at origin, fingers pointing along `tilt` (image y down).
        let mut hand = vec![Vec2::ZERO; HAND_LANDMARKS];
        for (&tip, &mcp) in FINGER_TIPS.iter().zip(FINGER_MCPS.iter()) {
            hand[mcp] = tilt * 0.1;
            hand[tip] = tilt * 0.3;
        }
        hand
    }

    fn fist(tilt: Vec2) -> Vec<Vec2> {
        let mut hand = open_hand(tilt);
        for &tip in &FINGER_TIPS {
            hand[tip] = tilt * 0.11;
        }
        hand
    }

    #[test]
    fn test_drag_scrubs_from_anchor() {
        let mut clock = VirtualClock::new(240.0, 12.0);
        let mut drag = PointerDrag::new();
        drag.press(100.0, clock.hours(), &mut clock);
        assert!(!clock.is_playing());

        // Half the width is half a day.
        assert_eq!(drag.moved(500.0, 800, &mut clock), Some(0.0));
        assert_eq!(clock.hours(), 0.0);
        drag.moved(0.0, 800, &mut clock);
        assert!((clock.hours() - 9.0).abs() < 1e-4);

        drag.release(&mut clock);
        assert!(clock.is_playing());
        assert_eq!(drag.moved(300.0, 800, &mut clock), None);
    }

    #[test]
    fn test_upright_open_hand() {
        let config = InputConfig::default();
        let signal = GestureSignal::from_landmarks(&open_hand(Vec2::new(0.0, -1.0)), &config).unwrap();
        assert!(signal.angle.abs() < 1e-6);
        assert!(signal.open);
        assert_eq!(signal.hours_rate(0.2, 0.1), 0.0);
    }

    #[test]
    fn test_fist_is_closed() {
        let config = InputConfig::default();
        let signal = GestureSignal::from_landmarks(&fist(Vec2::new(0.0, -1.0)), &config).unwrap();
        assert!(!signal.open);
    }

    #[test]
    fn test_tilt_is_clamped_and_rated() {
        let config = InputConfig::default();
        // Pointing down and right is past the clamp.
        let signal = GestureSignal::from_landmarks(&open_hand(Vec2::new(1.0, 1.0)), &config).unwrap();
        assert!((signal.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        let rate = signal.hours_rate(0.2, 0.1);
        assert!((rate - (std::f32::consts::FRAC_PI_2 - 0.2) * 0.1).abs() < 1e-6);

        let left = GestureSignal { angle: -0.5, open: true };
        assert!((left.hours_rate(0.2, 0.1) + 0.03).abs() < 1e-6);
    }

    #[test]
    fn test_too_few_landmarks() {
        assert!(GestureSignal::from_landmarks(&[Vec2::ZERO; 5], &InputConfig::default()).is_none());
    }

    #[test]
    fn test_hand_session_timeout() {
        let mut clock = VirtualClock::new(240.0, 6.0);
        let mut hand = HandTracker::new(&InputConfig::default());
        hand.engage(clock.hours());

        let fist = GestureSignal { angle: 1.2, open: false };
        hand.observe(0.0, Some(fist), &mut clock);
        assert!(!clock.is_playing());
        assert!(hand.is_exploding());
        assert!((clock.hours() - 6.1).abs() < 1e-4);

        hand.observe(2.0, None, &mut clock);
        assert!(!clock.is_playing());
        assert!(hand.is_exploding());

        hand.observe(3.5, None, &mut clock);
        assert!(clock.is_playing());
        assert!(!hand.is_exploding());
        assert!(hand.is_engaged());

        hand.disengage(&mut clock);
        assert!(!hand.is_engaged());
    }

    #[test]
    fn test_hotkeys() {
        assert_eq!(shape_for_key(KeyCode::Digit0), Some(ShapeRequest::Home));
        assert_eq!(
            shape_for_key(KeyCode::Digit5),
            Some(ShapeRequest::Group(ShapeGroup::Hobbies))
        );
        assert_eq!(shape_for_key(KeyCode::KeyQ), None);
    }
}
