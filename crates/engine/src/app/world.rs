use glam::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const GROUND: Self = Self(1 << 0);
    pub const PLAYER: Self = Self(1 << 1);
    pub const ENEMY: Self = Self(1 << 2);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
}

/// Query and command surface of the physics/navigation collaborator.
///
/// The simulation never owns transforms. It reads positions back at the start
/// of a tick and pushes movement and navigation requests through this trait.
pub trait PhysicsWorld {
    /// Actors on `mask` whose collider overlaps the sphere.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<ActorId>;

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit>;

    /// Intersection of the cursor ray with the horizontal plane through `plane_point`.
    fn cursor_point_on_plane(&self, plane_point: Vec3) -> Option<Vec3>;

    fn actor_position(&self, actor: ActorId) -> Option<Vec3>;

    fn move_actor(&mut self, actor: ActorId, delta: Vec3);

    fn set_destination(&mut self, actor: ActorId, point: Vec3);

    fn set_rotation(&mut self, _actor: ActorId, _rotation: Quat) {}
}
