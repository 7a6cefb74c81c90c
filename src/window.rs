//! Interactive viewer: a winit window drawing the engine through wgpu.
//!
//! Hotkeys: `0`-`6` pick shapes, `T` cycles the theme mode, `H` toggles
//! hand control (landmarks come from [`Viewer::hand_source`]), `Space`
//! pauses the clock. Dragging anywhere scrubs the time of day.

use std::sync::Arc;

use glam::Vec2;
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::engine::{Engine, EngineStatus};
use crate::error::RunError;
use crate::gpu::GpuSurface;
use crate::input::shape_for_key;
use crate::theme::ThemeMode;
use crate::time::{ClockControl, FrameTimer, VirtualClock};

/// Source of hand landmarks, polled once per frame while hand control is on.
pub type HandSource = Box<dyn FnMut() -> Option<Vec<Vec2>>>;

/// Options for the interactive viewer.
pub struct Viewer {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Hand-tracking landmarks; without one, hand control sees no hand.
    pub hand_source: Option<HandSource>,
}

impl Default for Viewer {
    fn default() -> Self {
        Self {
            title: "Orrery".to_string(),
            width: 1280,
            height: 720,
            hand_source: None,
        }
    }
}

impl Viewer {
    /// Run the viewer. This blocks until the window is closed.
    pub fn run(self, engine: Engine) -> Result<(), RunError> {
        let clock = VirtualClock::new(
            engine.config().clock.day_seconds,
            engine.config().clock.start_hours,
        );
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App {
            viewer: self,
            engine,
            clock,
            timer: FrameTimer::new(),
            shown_fps: 0.0,
            window: None,
            gpu: None,
            cursor_x: 0.0,
            failure: None,
        };
        event_loop.run_app(&mut app)?;
        match app.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct App {
    viewer: Viewer,
    engine: Engine,
    clock: VirtualClock,
    timer: FrameTimer,
    shown_fps: f32,
    window: Option<Arc<Window>>,
    gpu: Option<GpuSurface>,
    cursor_x: f32,
    failure: Option<RunError>,
}

impl App {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: RunError) {
        error!("{err}");
        self.failure = Some(err);
        event_loop.exit();
    }

    fn handle_key(&mut self, key: KeyCode) {
        if let Some(request) = shape_for_key(key) {
            self.engine.request_shape(request);
            return;
        }
        match key {
            KeyCode::KeyT => {
                let next = match self.engine.theme() {
                    ThemeMode::Auto => ThemeMode::Light,
                    ThemeMode::Light => ThemeMode::Dark,
                    ThemeMode::Dark => ThemeMode::Auto,
                };
                info!(?next, "theme mode");
                self.engine.set_theme(next);
            }
            KeyCode::KeyH => {
                if self.engine.hand().is_engaged() {
                    self.engine.disengage_hand(&mut self.clock);
                } else {
                    self.engine.engage_hand();
                }
            }
            KeyCode::Space => {
                if self.clock.is_playing() {
                    self.clock.pause();
                } else {
                    self.clock.resume();
                }
            }
            _ => {}
        }
    }

    fn frame(&mut self) -> Result<(), RunError> {
        let dt = self.timer.update();
        if self.engine.hand().is_engaged() {
            let landmarks = self.viewer.hand_source.as_mut().and_then(|source| source());
            self.engine.hand_frame(landmarks.as_deref(), &mut self.clock);
        }
        self.clock.tick(dt);
        self.engine.update(dt, self.clock.hours());
        if self.timer.fps() != self.shown_fps {
            self.shown_fps = self.timer.fps();
            if let Some(window) = &self.window {
                window.set_title(&window_title(&self.viewer.title, self.shown_fps, &self.engine.status()));
            }
        }
        if let Some(gpu) = &mut self.gpu {
            self.engine.render(gpu)?;
        }
        Ok(())
    }
}

/// Window title with the measured frame rate and the engine's phase.
fn window_title(base: &str, fps: f32, status: &EngineStatus) -> String {
    format!("{base} | {fps:.0} fps | {:?} | {}", status.phase, status.active)
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title(self.viewer.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(self.viewer.width, self.viewer.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => return self.fail(event_loop, err.into()),
        };
        let size = window.inner_size();
        self.window = Some(window.clone());

        match pollster::block_on(GpuSurface::new(window)) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(err) => return self.fail(event_loop, err.into()),
        }
        self.engine.resize(size.width, size.height);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(physical_size);
                }
                self.engine.resize(physical_size.width, physical_size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(key) = event.physical_key {
                        if key == KeyCode::Escape {
                            event_loop.exit();
                        } else {
                            self.handle_key(key);
                        }
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    match state {
                        ElementState::Pressed => self.engine.pointer_down(self.cursor_x, &mut self.clock),
                        ElementState::Released => self.engine.pointer_up(&mut self.clock),
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_x = position.x as f32;
                self.engine.pointer_move(self.cursor_x, &mut self.clock);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.frame() {
                    match err {
                        RunError::Render(crate::error::RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                            self.fail(event_loop, err)
                        }
                        other => warn!("frame skipped: {other}"),
                    }
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::shape::ShapeId;

    #[test]
    fn test_window_title_reports_fps_and_phase() {
        let mut engine = Engine::new(EngineConfig::default().with_particle_count(50)).unwrap();
        engine.resize(320, 240);
        engine.update(1.0 / 60.0, 12.0);
        engine.request_shape(ShapeId::Monogram);
        for _ in 0..10 {
            engine.update(1.0 / 60.0, 12.0);
        }

        let title = window_title("Orrery", 59.6, &engine.status());
        assert_eq!(title, format!("Orrery | 60 fps | Idle | {}", engine.status().active));

        engine.request_shape(ShapeId::Code);
        let title = window_title("Orrery", 30.0, &engine.status());
        assert!(title.contains("30 fps | Exploding"));
    }
}
