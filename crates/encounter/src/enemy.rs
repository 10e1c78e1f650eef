//! Enemy behaviour loop: perception, mode selection and action dispatch.

use engine::{flat_look_rotation, ActorId, Countdown, LayerMask, PhysicsWorld, TickId, Vec3};
use rand::Rng;
use tracing::{debug, info};

use crate::actor::Actor;
use crate::config::EnemyTuning;
use crate::events::{AttackKind, EncounterEvent, EventBus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BehaviorMode {
    #[default]
    Patrol,
    Chase,
    Attack,
}

impl BehaviorMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Patrol => "patrol",
            Self::Chase => "chase",
            Self::Attack => "attack",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifeState {
    #[default]
    Alive,
    Dead,
}

/// Range checks recomputed every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Perception {
    pub player_in_sight_range: bool,
    pub player_in_attack_range: bool,
}

/// Attack range wins regardless of sight. Sight without attack range chases
/// unless an attack cooldown is still running, in which case the enemy patrols.
pub fn select_mode(perception: Perception, attack_cooling_down: bool) -> BehaviorMode {
    match (
        perception.player_in_sight_range,
        perception.player_in_attack_range,
    ) {
        (_, true) => BehaviorMode::Attack,
        (true, false) if !attack_cooling_down => BehaviorMode::Chase,
        _ => BehaviorMode::Patrol,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The enemy was already dead or the amount was zero.
    Ignored,
    Absorbed { remaining_health: u32 },
    Died { reward_drops: u32 },
}

#[derive(Debug, Clone)]
pub struct EnemyState {
    actor: Actor,
    tuning: EnemyTuning,
    mode: BehaviorMode,
    life: LifeState,
    walk_target: Option<Vec3>,
    attack_cooldown: Countdown,
}

impl EnemyState {
    pub fn new(id: ActorId, position: Vec3, tuning: &EnemyTuning) -> Self {
        Self {
            actor: Actor::new(id, position, tuning.starting_health),
            tuning: tuning.clone(),
            mode: BehaviorMode::Patrol,
            life: LifeState::Alive,
            walk_target: None,
            attack_cooldown: Countdown::default(),
        }
    }

    pub fn id(&self) -> ActorId {
        self.actor.id
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn mode(&self) -> BehaviorMode {
        self.mode
    }

    pub fn life(&self) -> LifeState {
        self.life
    }

    pub fn is_alive(&self) -> bool {
        self.life == LifeState::Alive
    }

    pub fn walk_target(&self) -> Option<Vec3> {
        self.walk_target
    }

    pub fn attack_cooldown_remaining(&self) -> f32 {
        self.attack_cooldown.remaining()
    }

    pub fn sight_range(&self) -> f32 {
        self.tuning.sight_range
    }

    pub fn attack_range(&self) -> f32 {
        self.tuning.attack_range
    }

    pub(crate) fn set_position(&mut self, position: Vec3) {
        self.actor.position = position;
    }

    pub fn advance_cooldown(&mut self, tick: TickId, dt_seconds: f32) {
        if self.attack_cooldown.advance(tick, dt_seconds) {
            debug!(enemy = self.actor.id.0, "attack_cooldown_ready");
        }
    }

    pub fn perceive(&self, world: &dyn PhysicsWorld) -> Perception {
        let position = self.actor.position;
        Perception {
            player_in_sight_range: !world
                .overlap_sphere(position, self.tuning.sight_range, LayerMask::PLAYER)
                .is_empty(),
            player_in_attack_range: !world
                .overlap_sphere(position, self.tuning.attack_range, LayerMask::PLAYER)
                .is_empty(),
        }
    }

    /// Runs one perception/decision/action step. Returns `true` when an attack fired.
    pub fn update<R: Rng>(
        &mut self,
        world: &mut dyn PhysicsWorld,
        player_position: Vec3,
        rng: &mut R,
        events: &mut EventBus,
    ) -> bool {
        if !self.is_alive() {
            return false;
        }

        let perception = self.perceive(world);
        let mode = select_mode(perception, self.attack_cooldown.is_running());
        if mode != self.mode {
            debug!(
                enemy = self.actor.id.0,
                from = self.mode.name(),
                to = mode.name(),
                "enemy_mode_changed"
            );
            self.mode = mode;
            events.emit(EncounterEvent::EnemyModeChanged {
                enemy: self.actor.id,
                mode,
            });
        }

        match mode {
            BehaviorMode::Patrol => {
                self.patrol(world, rng);
                false
            }
            BehaviorMode::Chase => {
                world.set_destination(self.actor.id, player_position);
                false
            }
            BehaviorMode::Attack => self.attack(world, player_position, events),
        }
    }

    fn patrol<R: Rng>(&mut self, world: &mut dyn PhysicsWorld, rng: &mut R) {
        if self.walk_target.is_none() {
            self.walk_target = self.search_walk_point(world, rng);
        }
        let Some(target) = self.walk_target else {
            return;
        };
        world.set_destination(self.actor.id, target);
        if self.actor.position.distance(target) < self.tuning.walk_point_arrival_distance {
            self.walk_target = None;
        }
    }

    /// One random sample per call. A miss is retried on a later tick.
    fn search_walk_point<R: Rng>(
        &self,
        world: &dyn PhysicsWorld,
        rng: &mut R,
    ) -> Option<Vec3> {
        let range = self.tuning.walk_point_range;
        if !(range.is_finite() && range > 0.0) {
            return None;
        }
        let candidate = self.actor.position
            + Vec3::new(rng.gen_range(-range..range), 0.0, rng.gen_range(-range..range));
        world
            .raycast(
                candidate,
                Vec3::NEG_Y,
                self.tuning.ground_probe_distance,
                LayerMask::GROUND,
            )
            .map(|_| candidate)
    }

    fn attack(
        &mut self,
        world: &mut dyn PhysicsWorld,
        player_position: Vec3,
        events: &mut EventBus,
    ) -> bool {
        world.set_destination(self.actor.id, self.actor.position);
        if let Some(facing) = flat_look_rotation(player_position - self.actor.position) {
            self.actor.facing = facing;
            world.set_rotation(self.actor.id, facing);
        }
        if self.attack_cooldown.is_running() {
            return false;
        }
        self.attack_cooldown
            .start(self.tuning.time_between_attacks_seconds);
        debug!(enemy = self.actor.id.0, "enemy_attack_triggered");
        events.emit(EncounterEvent::AttackTriggered {
            attacker: self.actor.id,
            kind: AttackKind::Claw,
        });
        true
    }

    /// Applies a hit and reports it as `DamageDealt`, followed by the death events on a killing blow.
    pub fn take_damage(
        &mut self,
        attacker: ActorId,
        amount: u32,
        events: &mut EventBus,
    ) -> DamageOutcome {
        if !self.is_alive() || amount == 0 {
            return DamageOutcome::Ignored;
        }
        self.actor.health.apply_damage(amount);
        events.emit(EncounterEvent::DamageDealt {
            attacker,
            target: self.actor.id,
            amount,
        });
        if !self.actor.health.is_depleted() {
            return DamageOutcome::Absorbed {
                remaining_health: self.actor.health.current,
            };
        }

        self.life = LifeState::Dead;
        self.walk_target = None;
        self.attack_cooldown.cancel();
        let reward_drops = self.reward_drop_count();
        info!(enemy = self.actor.id.0, reward_drops, "enemy_died");
        events.emit(EncounterEvent::ActorDied {
            actor: self.actor.id,
        });
        events.emit(EncounterEvent::LifeDropsSpawned {
            at: self.actor.position,
            count: reward_drops,
        });
        DamageOutcome::Died { reward_drops }
    }

    /// One drop per `health_per_reward_drop` points of starting health, rounded down.
    pub fn reward_drop_count(&self) -> u32 {
        self.tuning
            .starting_health
            .checked_div(self.tuning.health_per_reward_drop)
            .unwrap_or(0)
    }

    /// Brings a released record back to a fresh, living state under a new identity.
    fn respawn(&mut self, id: ActorId, position: Vec3, tuning: &EnemyTuning) {
        *self = Self::new(id, position, tuning);
    }
}

/// Keeps dead enemy records around so spawning can reuse them.
#[derive(Debug, Default)]
pub struct EnemyPool {
    released: Vec<EnemyState>,
    reused: u64,
}

impl EnemyPool {
    pub fn acquire(&mut self, id: ActorId, position: Vec3, tuning: &EnemyTuning) -> EnemyState {
        match self.released.pop() {
            Some(mut enemy) => {
                let previous = enemy.id();
                enemy.respawn(id, position, tuning);
                self.reused = self.reused.saturating_add(1);
                debug!(enemy = id.0, previous = previous.0, "enemy_reused_from_pool");
                enemy
            }
            None => EnemyState::new(id, position, tuning),
        }
    }

    pub fn release(&mut self, enemy: EnemyState) {
        self.released.push(enemy);
    }

    pub fn len(&self) -> usize {
        self.released.len()
    }

    pub fn is_empty(&self) -> bool {
        self.released.is_empty()
    }

    pub fn reused_count(&self) -> u64 {
        self.reused
    }
}
