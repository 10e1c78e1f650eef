use engine::{ActorId, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Health {
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Subtracts `amount`, saturating at zero. Returns the amount actually removed.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.current);
        self.current -= removed;
        removed
    }

    /// Adds `amount`, capped at `max`. Returns the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let restored = amount.min(self.max.saturating_sub(self.current));
        self.current += restored;
        restored
    }
}

/// State shared by every simulated body.
///
/// `position` mirrors the physics collaborator and is refreshed at the start
/// of each tick; `facing` and `speed` are owned by the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub position: Vec3,
    pub facing: Quat,
    pub speed: f32,
    pub health: Health,
}

impl Actor {
    pub fn new(id: ActorId, position: Vec3, max_health: u32) -> Self {
        Self {
            id,
            position,
            facing: Quat::IDENTITY,
            speed: 0.0,
            health: Health::full(max_health),
        }
    }

    pub fn forward(&self) -> Vec3 {
        engine::forward(self.facing)
    }
}
