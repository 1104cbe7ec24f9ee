use glam::Vec2;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pixels the pointer may travel between press and release and still count
/// as a click rather than an orbit drag.
const CLICK_SLOP_PX: f32 = 4.0;
/// Radians of orbit per pixel of drag.
const DRAG_RADIANS_PER_PX: f32 = 0.005;

pub enum InputAction {
    None,
    ZoomIn,
    ZoomOut,
    Back,
}

#[derive(Default, Debug, Clone, Copy)]
pub struct InputState {
    pub aim_left: bool,
    pub aim_right: bool,
    pub aim_up: bool,
    pub aim_down: bool,
}

impl InputState {
    pub fn handle_key(&mut self, key: PhysicalKey, pressed: bool) -> InputAction {
        match key {
            PhysicalKey::Code(KeyCode::ArrowLeft) => self.aim_left = pressed,
            PhysicalKey::Code(KeyCode::ArrowRight) => self.aim_right = pressed,
            PhysicalKey::Code(KeyCode::ArrowUp) => self.aim_up = pressed,
            PhysicalKey::Code(KeyCode::ArrowDown) => self.aim_down = pressed,
            PhysicalKey::Code(KeyCode::Equal) if pressed => return InputAction::ZoomIn,
            PhysicalKey::Code(KeyCode::Minus) if pressed => return InputAction::ZoomOut,
            PhysicalKey::Code(KeyCode::Backspace) if pressed => return InputAction::Back,
            _ => {}
        }
        InputAction::None
    }

    /// Orbit deltas (yaw, pitch) from held arrow keys for this frame.
    pub fn aim(&self, frame_dt: f32) -> Option<(f32, f32)> {
        let speed = 1.8 * frame_dt;
        let mut yaw = 0.0;
        let mut pitch = 0.0;
        if self.aim_left {
            yaw -= speed;
        }
        if self.aim_right {
            yaw += speed;
        }
        if self.aim_up {
            pitch += speed;
        }
        if self.aim_down {
            pitch -= speed;
        }
        (yaw != 0.0 || pitch != 0.0).then_some((yaw, pitch))
    }
}

/// Primary-button pointer tracking that separates clicks from drags.
#[derive(Default, Debug, Clone, Copy)]
pub struct PointerState {
    position: Option<Vec2>,
    pressed_at: Option<Vec2>,
    dragging: bool,
}

pub enum PointerRelease {
    Click(Vec2),
    DragEnd,
    None,
}

impl PointerState {
    /// Record a move; returns the drag delta in orbit radians when dragging.
    pub fn moved(&mut self, position: Vec2) -> Option<(f32, f32)> {
        let previous = self.position.replace(position);
        let pressed_at = self.pressed_at?;
        if !self.dragging && position.distance(pressed_at) > CLICK_SLOP_PX {
            self.dragging = true;
        }
        if !self.dragging {
            return None;
        }
        let delta = position - previous.unwrap_or(position);
        Some((-delta.x * DRAG_RADIANS_PER_PX, delta.y * DRAG_RADIANS_PER_PX))
    }

    pub fn left(&mut self) {
        *self = Self::default();
    }

    pub fn pressed(&mut self) {
        self.pressed_at = self.position;
        self.dragging = false;
    }

    pub fn released(&mut self) -> PointerRelease {
        if self.pressed_at.take().is_none() {
            return PointerRelease::None;
        }
        if std::mem::take(&mut self.dragging) {
            return PointerRelease::DragEnd;
        }
        match self.position {
            Some(position) => PointerRelease::Click(position),
            None => PointerRelease::None,
        }
    }
}

/// Window pixel position (origin top-left) to normalized device coordinates
/// (origin center, y up).
pub fn to_ndc(position: Vec2, width: u32, height: u32) -> Vec2 {
    let width = width.max(1) as f32;
    let height = height.max(1) as f32;
    Vec2::new(
        position.x / width * 2.0 - 1.0,
        1.0 - position.y / height * 2.0,
    )
}
