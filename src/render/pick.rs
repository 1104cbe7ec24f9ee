//! CPU ray picking
//!
//! Casts a ray from the camera through a pointer position and intersects it
//! with every visible, pickable node's shape. Hits come back nearest first.
//!
//! ## Shapes
//!
//! Nodes carry either an axis-aligned box or a sphere in node-local space,
//! offset by the node's accumulated world translation. Group nodes have no
//! geometry of their own. A shape that contains the ray origin is skipped,
//! mirroring front-face-only rasterized geometry seen from the inside.

use crate::render::Camera;
use crate::scene::{NodeId, Scene, Shape};
use glam::{Vec2, Vec3};

// ========================================================================
// Ray
// ========================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Slab test. Returns the entry distance, or `None` when the box is
    /// missed, behind the origin, or contains the origin.
    pub fn intersect_aabb(&self, min: Vec3, max: Vec3) -> Option<f32> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;
        for axis in 0..3 {
            let origin = self.origin[axis];
            let direction = self.direction[axis];
            if direction.abs() < 1e-8 {
                if origin < min[axis] || origin > max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction;
            let mut t0 = (min[axis] - origin) * inv;
            let mut t1 = (max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }
        (t_near >= 0.0).then_some(t_near)
    }

    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let to_origin = self.origin - center;
        let c = to_origin.length_squared() - radius * radius;
        if c <= 0.0 {
            return None;
        }
        let b = to_origin.dot(self.direction);
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let t = -b - discriminant.sqrt();
        (t >= 0.0).then_some(t)
    }
}

// ========================================================================
// PickHit
// ========================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub node: NodeId,
    pub distance: f32,
    pub point: Vec3,
}

// ========================================================================
// Picker
// ========================================================================

/// Stateless ray caster over a scene.
pub struct Picker;

impl Picker {
    /// Nearest-first hits under a pointer at `ndc`. Empty when nothing pickable
    /// lies under the pointer.
    pub fn pick(ndc: Vec2, camera: &Camera, scene: &Scene) -> Vec<PickHit> {
        if !ndc.is_finite() {
            return Vec::new();
        }
        Self::cast(&camera.ray_from_ndc(ndc), scene)
    }

    pub fn cast(ray: &Ray, scene: &Scene) -> Vec<PickHit> {
        if ray.direction == Vec3::ZERO {
            return Vec::new();
        }
        let mut hits: Vec<PickHit> = scene
            .nodes()
            .filter(|(_, node)| node.pickable)
            .filter_map(|(id, node)| {
                if matches!(node.shape, Shape::Group) || !scene.is_visible_in_world(id) {
                    return None;
                }
                let center = scene.world_translation(id);
                let distance = match node.shape {
                    Shape::Box { half_extents } => {
                        ray.intersect_aabb(center - half_extents, center + half_extents)?
                    }
                    Shape::Sphere { radius } => ray.intersect_sphere(center, radius)?,
                    Shape::Group => return None,
                };
                Some(PickHit {
                    node: id,
                    distance,
                    point: ray.at(distance),
                })
            })
            .collect();
        // Stable sort keeps arena order for coincident surfaces.
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

// ========================================================================
// Tests
// ========================================================================
