//! In-memory physics and navigation collaborator.
//!
//! A flat ground rectangle at `y = 0` with sphere bodies on it. Navigation
//! walks each agent straight toward its destination; there is no pathfinding.

use std::collections::BTreeMap;

use engine::{ActorId, LayerMask, PhysicsWorld, Quat, RayHit, Vec2, Vec3};

const NAV_ARRIVAL_THRESHOLD: f32 = 0.05;
const MIN_RAY_DIRECTION_Y: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub rotation: Quat,
    pub layer: LayerMask,
    pub radius: f32,
    pub nav_speed: f32,
    pub destination: Option<Vec3>,
}

#[derive(Debug, Clone)]
pub struct Arena {
    ground_min: Vec2,
    ground_max: Vec2,
    bodies: BTreeMap<ActorId, Body>,
    cursor: Option<Vec3>,
    next_id: u64,
}

impl Arena {
    /// Square ground centred on the origin.
    pub fn square(half_extent: f32) -> Self {
        let half_extent = half_extent.abs();
        Self {
            ground_min: Vec2::splat(-half_extent),
            ground_max: Vec2::splat(half_extent),
            bodies: BTreeMap::new(),
            cursor: None,
            next_id: 1,
        }
    }

    pub fn spawn_body(
        &mut self,
        layer: LayerMask,
        position: Vec3,
        radius: f32,
        nav_speed: f32,
    ) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.bodies.insert(
            id,
            Body {
                position,
                rotation: Quat::IDENTITY,
                layer,
                radius: radius.max(0.0),
                nav_speed: nav_speed.max(0.0),
                destination: None,
            },
        );
        id
    }

    pub fn remove_body(&mut self, id: ActorId) -> Option<Body> {
        self.bodies.remove(&id)
    }

    pub fn body(&self, id: ActorId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn set_position(&mut self, id: ActorId, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.position = position;
            body.destination = None;
        }
    }

    /// World point the cursor ray hits, or `None` when the cursor is off-screen.
    pub fn set_cursor(&mut self, cursor: Option<Vec3>) {
        self.cursor = cursor;
    }

    pub fn contains_ground(&self, x: f32, z: f32) -> bool {
        x >= self.ground_min.x && x <= self.ground_max.x && z >= self.ground_min.y && z <= self.ground_max.y
    }

    /// Moves every agent with a destination one step closer to it.
    pub fn step_navigation(&mut self, dt_seconds: f32) {
        for body in self.bodies.values_mut() {
            let Some(destination) = body.destination else {
                continue;
            };
            let (next, arrived) = step_toward(
                body.position,
                destination,
                body.nav_speed,
                dt_seconds,
                NAV_ARRIVAL_THRESHOLD,
            );
            body.position = next;
            if arrived {
                body.destination = None;
            }
        }
    }
}

impl PhysicsWorld for Arena {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<ActorId> {
        self.bodies
            .iter()
            .filter(|(_, body)| {
                body.layer.intersects(mask) && body.position.distance(center) <= radius + body.radius
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        if !mask.intersects(LayerMask::GROUND) {
            return None;
        }
        let direction = direction.normalize_or_zero();
        if direction.y.abs() < MIN_RAY_DIRECTION_Y {
            return None;
        }
        let distance = -origin.y / direction.y;
        if !(0.0..=max_distance).contains(&distance) {
            return None;
        }
        let point = origin + direction * distance;
        self.contains_ground(point.x, point.z)
            .then_some(RayHit { point, distance })
    }

    fn cursor_point_on_plane(&self, plane_point: Vec3) -> Option<Vec3> {
        self.cursor
            .map(|cursor| Vec3::new(cursor.x, plane_point.y, cursor.z))
    }

    fn actor_position(&self, actor: ActorId) -> Option<Vec3> {
        self.bodies.get(&actor).map(|body| body.position)
    }

    fn move_actor(&mut self, actor: ActorId, delta: Vec3) {
        if let Some(body) = self.bodies.get_mut(&actor) {
            body.position += delta;
        }
    }

    fn set_destination(&mut self, actor: ActorId, point: Vec3) {
        if let Some(body) = self.bodies.get_mut(&actor) {
            body.destination = Some(point);
        }
    }

    fn set_rotation(&mut self, actor: ActorId, rotation: Quat) {
        if let Some(body) = self.bodies.get_mut(&actor) {
            body.rotation = rotation;
        }
    }
}

fn step_toward(
    current: Vec3,
    target: Vec3,
    speed: f32,
    dt_seconds: f32,
    arrival_threshold: f32,
) -> (Vec3, bool) {
    let offset = target - current;
    let distance_sq = offset.length_squared();
    if distance_sq <= arrival_threshold * arrival_threshold {
        return (target, true);
    }

    let distance = distance_sq.sqrt();
    let max_step = speed * dt_seconds;
    if max_step >= distance {
        return (target, true);
    }
    (current + offset * (max_step / distance), false)
}
