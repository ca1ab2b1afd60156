//! Zero-gravity rigid-body world
//!
//! Just enough physics for floating tiles: rectangle bodies integrate their
//! velocity once per tick and bounce elastically off each other and off
//! static bodies (walls, frozen tiles). Velocities are in units per tick.
//!
//! Bodies are kept sorted by handle so iteration order is stable.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque body identifier, never reused within one world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// A rectangle body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBody {
    pub handle: BodyHandle,
    /// Center of mass
    pub position: Vec2,
    pub velocity: Vec2,
    /// Rotation (radians)
    pub angle: f32,
    pub angular_velocity: f32,
    pub half_extents: Vec2,
    pub restitution: f32,
    pub friction: f32,
    /// Immovable; takes part in collisions as an obstacle only
    pub is_static: bool,
    /// Skips integration until woken
    pub sleeping: bool,
    /// Consecutive slow ticks spent in a corner
    pub stuck_frames: u32,
}

impl RigidBody {
    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.half_extents * 2.0
    }

    /// Top-left corner of the unrotated box (rendering origin)
    #[inline]
    pub fn top_left(&self) -> Vec2 {
        self.position - self.half_extents
    }

    /// Half extents of the axis-aligned box enclosing the rotated body
    pub fn bounds_half_extents(&self) -> Vec2 {
        let (sin, cos) = self.angle.sin_cos();
        let (sin, cos) = (sin.abs(), cos.abs());
        Vec2::new(
            self.half_extents.x * cos + self.half_extents.y * sin,
            self.half_extents.x * sin + self.half_extents.y * cos,
        )
    }

    fn inverse_mass(&self) -> f32 {
        if self.is_static {
            0.0
        } else {
            1.0 / (self.size().x * self.size().y).max(1.0)
        }
    }
}

/// Parameters for a new body
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub position: Vec2,
    pub size: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub restitution: f32,
    pub friction: f32,
    pub is_static: bool,
}

impl BodyDesc {
    /// Perfectly bouncy, frictionless rectangle at rest
    pub fn rectangle(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            restitution: 1.0,
            friction: 0.0,
            is_static: false,
        }
    }

    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2, angular_velocity: f32) -> Self {
        self.velocity = velocity;
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }
}

/// The simulated world
#[derive(Debug, Clone, Default)]
pub struct World {
    bodies: Vec<RigidBody>,
    next_id: u32,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        self.bodies.push(RigidBody {
            handle,
            position: desc.position,
            velocity: if desc.is_static { Vec2::ZERO } else { desc.velocity },
            angle: desc.angle,
            angular_velocity: if desc.is_static {
                0.0
            } else {
                desc.angular_velocity
            },
            half_extents: desc.size * 0.5,
            restitution: desc.restitution,
            friction: desc.friction,
            is_static: desc.is_static,
            sleeping: false,
            stuck_frames: 0,
        });
        handle
    }

    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let index = self.index_of(handle)?;
        Some(self.bodies.remove(index))
    }

    /// Remove every body (handles are not reused afterwards)
    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.index_of(handle).is_some()
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.index_of(handle).map(|i| &self.bodies[i])
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.index_of(handle).map(move |i| &mut self.bodies[i])
    }

    pub fn bodies(&self) -> impl Iterator<Item = &RigidBody> {
        self.bodies.iter()
    }

    /// Freeze or unfreeze a body. Freezing drops all motion.
    pub fn set_static(&mut self, handle: BodyHandle, is_static: bool) -> bool {
        let Some(body) = self.body_mut(handle) else {
            return false;
        };
        body.is_static = is_static;
        if is_static {
            body.velocity = Vec2::ZERO;
            body.angular_velocity = 0.0;
        }
        true
    }

    pub fn wake(&mut self, handle: BodyHandle) {
        if let Some(body) = self.body_mut(handle) {
            body.sleeping = false;
        }
    }

    fn index_of(&self, handle: BodyHandle) -> Option<usize> {
        self.bodies.binary_search_by_key(&handle, |b| b.handle).ok()
    }

    /// Advance one tick: integrate, then push overlapping bodies apart
    pub fn step(&mut self) {
        for body in &mut self.bodies {
            if body.is_static || body.sleeping {
                continue;
            }
            body.position += body.velocity;
            body.angle += body.angular_velocity;
        }

        let n = self.bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (head, tail) = self.bodies.split_at_mut(j);
                resolve_overlap(&mut head[i], &mut tail[0]);
            }
        }
    }
}

/// Separate two overlapping bodies along the axis of least penetration
/// and exchange momentum along it
fn resolve_overlap(a: &mut RigidBody, b: &mut RigidBody) {
    if a.is_static && b.is_static {
        return;
    }

    let delta = b.position - a.position;
    let reach = a.bounds_half_extents() + b.bounds_half_extents();
    let overlap = reach - delta.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return;
    }

    let side = |d: f32| if d < 0.0 { -1.0 } else { 1.0 };
    let (normal, penetration) = if overlap.x < overlap.y {
        (Vec2::new(side(delta.x), 0.0), overlap.x)
    } else {
        (Vec2::new(0.0, side(delta.y)), overlap.y)
    };

    let inv_a = a.inverse_mass();
    let inv_b = b.inverse_mass();
    let inv_total = inv_a + inv_b;
    if inv_total <= 0.0 {
        return;
    }

    // Position correction
    a.position -= normal * penetration * (inv_a / inv_total);
    b.position += normal * penetration * (inv_b / inv_total);

    // Only respond if approaching
    let approach = (b.velocity - a.velocity).dot(normal);
    if approach < 0.0 {
        let restitution = a.restitution.min(b.restitution);
        let impulse = -(1.0 + restitution) * approach / inv_total;
        a.velocity -= normal * impulse * inv_a;
        b.velocity += normal * impulse * inv_b;

        // Coulomb friction along the contact, bounded by the normal impulse
        let friction = a.friction.min(b.friction);
        if friction > 0.0 {
            let tangent = normal.perp();
            let slide = (b.velocity - a.velocity).dot(tangent);
            let limit = friction * impulse;
            let tangential = (-slide / inv_total).clamp(-limit, limit);
            a.velocity -= tangent * tangential * inv_a;
            b.velocity += tangent * tangential * inv_b;
        }
    }

    if !a.is_static {
        a.sleeping = false;
    }
    if !b.is_static {
        b.sleeping = false;
    }
}
