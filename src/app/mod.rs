mod input;
pub mod session;
mod timing;
pub mod tween;
pub mod views;

use crate::scene::layout::{load_layout_from_file, save_layout_to_file, ShowroomLayout};
use crate::scene::showroom::default_layout;
use input::{to_ndc, InputAction, InputState, PointerRelease, PointerState};
use session::{ClickOutcome, ShowroomSession};
use timing::FrameTiming;
use views::ViewEvent;

use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

/// Why an interaction had no effect. None of these are fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InteractionError {
    #[error("pointer is not over an interactive element")]
    UnknownElement,
    #[error("view request '{requested}' rejected: {reason}")]
    RejectedTransition {
        requested: String,
        reason: RejectReason,
    },
    #[error("unknown view '{0}'")]
    UnknownView(String),
    #[error("unknown toggle '{0}'")]
    UnknownToggle(String),
    #[error("session has been disposed")]
    SessionDisposed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Another transition is still running.
    InFlight { pending: String },
    AlreadyCurrent,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InFlight { pending } => write!(f, "transition to '{pending}' in flight"),
            Self::AlreadyCurrent => f.write_str("already the current view"),
        }
    }
}

const WINDOW_TITLE: &str = "Showroom";
const WHEEL_ZOOM_STEP: f32 = 0.8;
const KEY_ZOOM_STEP: f32 = 0.3;

pub struct App {
    window: Option<Arc<Window>>,
    layout: ShowroomLayout,
    session: Option<ShowroomSession>,
    input: InputState,
    pointer: PointerState,
    window_size: PhysicalSize<u32>,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,
}

impl App {
    fn new(layout: ShowroomLayout) -> Self {
        Self {
            window: None,
            layout,
            session: None,
            input: InputState::default(),
            pointer: PointerState::default(),
            window_size: PhysicalSize::new(1280, 720),
            timing: FrameTiming::new(WINDOW_TITLE.to_string()),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
        }
    }

    fn aspect(&self) -> f32 {
        self.window_size.width.max(1) as f32 / self.window_size.height.max(1) as f32
    }

    fn ndc(&self, position: Vec2) -> Vec2 {
        to_ndc(position, self.window_size.width, self.window_size.height)
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn handle_click(&mut self, position: Vec2) {
        let ndc = self.ndc(position);
        let Some(session) = &mut self.session else {
            return;
        };
        match session.on_click(ndc) {
            Ok(ClickOutcome::ViewRequested(view)) => log::info!("Flying to view '{}'", view),
            Ok(ClickOutcome::Toggled { id, active }) => {
                log::info!("Toggle '{}' is now {}", id, if active { "on" } else { "off" })
            }
            Err(err) => log::debug!("Click ignored: {}", err),
        }
    }

    fn frame(&mut self) {
        let now = Instant::now();
        let report = self.timing.update(now);
        let frame_dt = self.timing.frame_dt;
        let wall_dt = self.timing.wall_dt;
        let Some(session) = &mut self.session else {
            return;
        };

        if let Some((yaw, pitch)) = self.input.aim(frame_dt) {
            session.on_orbit(yaw, pitch);
        }
        session.tick(wall_dt);
        for event in session.drain_view_events() {
            match event {
                ViewEvent::Started { from, to } => log::debug!("Transition {} -> {}", from, to),
                ViewEvent::Settled { view } => log::debug!("Transition settled on {}", view),
            }
        }

        if report {
            if let Some(window) = &self.window {
                self.timing.report(window, &status_line(session));
            }
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(session) = &mut self.session {
            session.dispose();
        }
        event_loop.exit();
    }
}

/// Session summary for the window title.
fn status_line(session: &ShowroomSession) -> String {
    let views = session.views();
    let view = match (views.pending(), views.progress()) {
        (Some(pending), Some(progress)) => format!(
            "{} -> {} {:.0}%",
            views.current().name,
            pending.name,
            progress * 100.0
        ),
        _ => views.current().name.clone(),
    };
    let hovered = session
        .hover_state()
        .hovered_id
        .as_deref()
        .unwrap_or("-");
    let toggles: Vec<String> = session
        .toggles()
        .states()
        .map(|state| format!("{}={}", state.id, if state.active { "on" } else { "off" }))
        .collect();
    format!(
        "view {}{} | hover {} ({} meshes) | {} lights | {}",
        view,
        if session.input_enabled() { "" } else { " [locked]" },
        hovered,
        session.highlight().nodes().len(),
        session.scene().enabled_lights().len(),
        toggles.join(" ")
    )
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(1280u32, 720u32))
            .with_resizable(true);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );
        self.window_size = window.inner_size();

        match ShowroomSession::init(&self.layout, self.aspect()) {
            Ok(session) => self.session = Some(session),
            Err(err) => {
                log::error!("Failed to start showroom session: {}", err);
                event_loop.exit();
                return;
            }
        }

        self.update_target_frame_duration(&window);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    self.shutdown(event_loop);
                    return;
                }
                let pressed = event.state == ElementState::Pressed;
                let action = self.input.handle_key(event.physical_key, pressed);
                let Some(session) = &mut self.session else {
                    return;
                };
                let result = match action {
                    InputAction::ZoomIn => {
                        session.on_zoom(KEY_ZOOM_STEP);
                        Ok(())
                    }
                    InputAction::ZoomOut => {
                        session.on_zoom(-KEY_ZOOM_STEP);
                        Ok(())
                    }
                    InputAction::Back => {
                        let landing = self
                            .layout
                            .landing_view
                            .clone()
                            .unwrap_or_else(|| self.layout.initial_view.clone());
                        session.request_view(&landing)
                    }
                    InputAction::None => Ok(()),
                };
                if let Err(err) = result {
                    log::debug!("Key ignored: {}", err);
                }
            }
            WindowEvent::Resized(new_size) => {
                self.window_size = new_size;
                let aspect = self.aspect();
                if let Some(session) = &mut self.session {
                    session.resize(aspect);
                }
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::Moved(_) => {
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                let drag = self.pointer.moved(position);
                let ndc = self.ndc(position);
                if let Some(session) = &mut self.session {
                    session.on_pointer_move(ndc);
                    if let Some((yaw, pitch)) = drag {
                        session.on_orbit(yaw, pitch);
                    }
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.pointer.left();
                if let Some(session) = &mut self.session {
                    session.on_pointer_leave();
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => self.pointer.pressed(),
                ElementState::Released => {
                    if let PointerRelease::Click(position) = self.pointer.released() {
                        self.handle_click(position);
                    }
                }
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let wheel_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
                };
                if let Some(session) = &mut self.session {
                    session.on_zoom(wheel_y * WHEEL_ZOOM_STEP);
                }
            }
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

enum Command {
    Run(Option<PathBuf>),
    WriteDefaultLayout(PathBuf),
}

fn parse_args() -> Result<Command, String> {
    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(flag) if flag == "--write-default-layout" => args
            .next()
            .map(|path| Command::WriteDefaultLayout(PathBuf::from(path)))
            .ok_or_else(|| "--write-default-layout needs a path".to_string()),
        Some(flag) if flag.starts_with("--") => Err(format!("unknown option '{flag}'")),
        Some(path) => Ok(Command::Run(Some(PathBuf::from(path)))),
        None => Ok(Command::Run(
            std::env::var_os("SHOWROOM_LAYOUT").map(PathBuf::from),
        )),
    }
}

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let layout = match parse_args() {
        Ok(Command::WriteDefaultLayout(path)) => {
            match save_layout_to_file(&default_layout(), &path) {
                Ok(()) => log::info!("Default layout written to {:?}", path),
                Err(err) => log::error!("Failed to write layout {:?}: {}", path, err),
            }
            return;
        }
        Ok(Command::Run(Some(path))) => match load_layout_from_file(&path) {
            Ok(layout) => {
                log::info!("Layout loaded from {:?}", path);
                layout
            }
            Err(err) => {
                log::error!("Failed to load layout {:?}: {}", path, err);
                return;
            }
        },
        Ok(Command::Run(None)) => default_layout(),
        Err(message) => {
            log::error!("{}", message);
            log::info!("usage: showroom [LAYOUT.json] | --write-default-layout PATH");
            return;
        }
    };

    log::info!("Showroom starting");
    log::info!("   Click the panel button to fly in, Backspace to return, ESC to exit");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(layout);
    event_loop.run_app(&mut app).expect("Event loop error");

    log::info!("Goodbye!");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_reports_lock_and_toggles() {
        let mut session = ShowroomSession::init(&default_layout(), 1.0).unwrap();
        let locked = status_line(&session);
        assert!(locked.starts_with("view intro -> overview"));
        assert!(locked.contains("[locked]"));
        assert!(locked.contains("0 lights"));
        assert!(locked.contains("toggle[2]=off"));

        session.tick(5.0);
        let settled = status_line(&session);
        assert!(settled.starts_with("view overview |"));
        assert!(!settled.contains("[locked]"));
        assert!(settled.contains("4 lights"));
    }
}
