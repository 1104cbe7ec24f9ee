use crate::render::pick::Ray;
use crate::scene::layout::ProjectionDesc;
use glam::{Mat4, Vec2, Vec3};

/// Camera position plus look-at target.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

impl CameraPose {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self { position, target }
    }

    #[cfg(test)]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    #[cfg(test)]
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }
}

/// Perspective camera. Only the pose is written by the interaction core; the
/// projection follows the window.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub pose: CameraPose,
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(pose: CameraPose, projection: ProjectionDesc, aspect: f32) -> Self {
        Self {
            pose,
            fov_y_deg: projection.fov_y_deg,
            aspect: sanitize_aspect(aspect),
            near: projection.near,
            far: projection.far,
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = sanitize_aspect(aspect);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.pose.position, self.pose.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
    }

    /// Ray from the eye through a normalized device coordinate
    /// (x right, y up, both in [-1, 1]).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = (self.projection_matrix() * self.view_matrix()).inverse();
        // perspective_rh maps depth to [0, 1]; z = 1 lands on the far plane.
        let far_point = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        let origin = self.pose.position;
        Ray::new(origin, far_point - origin)
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

/// Pointer-driven orbit around the pose target, with damping.
///
/// Input accumulates into velocities; `update` applies them to the pose and
/// decays them by the damping factor every tick.
#[derive(Debug, Clone, Copy)]
pub struct OrbitControls {
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
    zoom_velocity: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            damping: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 1.0,
            max_distance: 120.0,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            zoom_velocity: 0.0,
        }
    }
}

impl OrbitControls {
    /// Drag deltas in radians.
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw_velocity += yaw_delta * self.rotate_speed;
        self.pitch_velocity += pitch_delta * self.rotate_speed;
    }

    /// Positive zooms in.
    pub fn zoom(&mut self, delta: f32) {
        self.zoom_velocity += delta * self.zoom_speed;
    }

    /// Drop any pending momentum.
    pub fn halt(&mut self) {
        self.yaw_velocity = 0.0;
        self.pitch_velocity = 0.0;
        self.zoom_velocity = 0.0;
    }

    pub fn is_moving(&self) -> bool {
        self.yaw_velocity.abs() > 1e-5
            || self.pitch_velocity.abs() > 1e-5
            || self.zoom_velocity.abs() > 1e-5
    }

    pub fn update(&mut self, pose: &mut CameraPose) -> bool {
        if !self.is_moving() {
            self.halt();
            return false;
        }

        let offset = pose.position - pose.target;
        let distance = offset.length().max(0.05);
        let (mut yaw, mut pitch) = offset_to_yaw_pitch(offset);
        yaw += self.yaw_velocity;
        pitch += self.pitch_velocity;
        let limit = std::f32::consts::FRAC_PI_2 - 0.01;
        pitch = pitch.clamp(-limit, limit);
        wrap_yaw(&mut yaw);

        let distance =
            (distance - self.zoom_velocity).clamp(self.min_distance, self.max_distance);
        pose.position = pose.target + yaw_pitch_to_offset(yaw, pitch) * distance;

        let keep = 1.0 - self.damping.clamp(0.0, 1.0);
        self.yaw_velocity *= keep;
        self.pitch_velocity *= keep;
        self.zoom_velocity *= keep;
        true
    }
}

fn offset_to_yaw_pitch(offset: Vec3) -> (f32, f32) {
    let dir = offset.normalize_or_zero();
    let yaw = dir.x.atan2(dir.z);
    let pitch = dir.y.clamp(-1.0, 1.0).asin();
    (yaw, pitch)
}

fn yaw_pitch_to_offset(yaw: f32, pitch: f32) -> Vec3 {
    let cos_pitch = pitch.cos();
    Vec3::new(yaw.sin() * cos_pitch, pitch.sin(), yaw.cos() * cos_pitch)
}

fn wrap_yaw(yaw: &mut f32) {
    const TWO_PI: f32 = std::f32::consts::PI * 2.0;
    if yaw.is_finite() {
        *yaw = (*yaw + std::f32::consts::PI).rem_euclid(TWO_PI) - std::f32::consts::PI;
    }
}
