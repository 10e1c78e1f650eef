//! Encounter tick driver.
//!
//! [`Encounter::tick`] is the single entry point. It runs a fixed list of
//! systems in order; pause suspends every system that advances gameplay time
//! or acts on the world while input keeps draining so the game can resume.

use std::collections::{BTreeMap, BTreeSet};

use engine::{ActorId, InputEvent, InputQueue, PhysicsWorld, Quat, TickId, Vec3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::EncounterConfig;
use crate::damage::{resolve_sweep, DamageEvent};
use crate::enemy::{DamageOutcome, EnemyPool, EnemyState};
use crate::events::{EncounterEvent, EncounterEventCounts, EventBus};
use crate::player::{AnimationParams, PlayerState, SkillSlot};
use crate::save::{validate_save_game, SaveError, SaveGame, SavedVec3, SAVE_VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterSystemId {
    SyncPositions,
    Timers,
    Input,
    Player,
    Enemies,
    Damage,
    Cleanup,
}

impl EncounterSystemId {
    pub fn name(self) -> &'static str {
        match self {
            Self::SyncPositions => "SyncPositions",
            Self::Timers => "Timers",
            Self::Input => "Input",
            Self::Player => "Player",
            Self::Enemies => "Enemies",
            Self::Damage => "Damage",
            Self::Cleanup => "Cleanup",
        }
    }

    fn runs_while_paused(self) -> bool {
        matches!(self, Self::SyncPositions | Self::Input | Self::Cleanup)
    }
}

pub const ENCOUNTER_SYSTEM_ORDER: [EncounterSystemId; 7] = [
    EncounterSystemId::SyncPositions,
    EncounterSystemId::Timers,
    EncounterSystemId::Input,
    EncounterSystemId::Player,
    EncounterSystemId::Enemies,
    EncounterSystemId::Damage,
    EncounterSystemId::Cleanup,
];

/// Everything a tick hands back to presentation collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: TickId,
    pub dt_seconds: f32,
    pub paused: bool,
    pub player_displacement: Vec3,
    pub player_facing: Quat,
    pub animation: AnimationParams,
    pub events: Vec<EncounterEvent>,
}

#[derive(Debug, Default)]
struct TickScratch {
    dt_seconds: f32,
    player_missing: bool,
    missing_enemies: BTreeSet<ActorId>,
    pending_strikes: u32,
    player_displacement: Vec3,
    died: Vec<ActorId>,
    events: Vec<EncounterEvent>,
}

pub struct Encounter {
    config: EncounterConfig,
    tick: TickId,
    sim_time_seconds: f64,
    paused: bool,
    player: PlayerState,
    enemies: BTreeMap<ActorId, EnemyState>,
    pool: Option<EnemyPool>,
    input: InputQueue,
    events: EventBus,
    rng: ChaCha8Rng,
    cursor_missing_reported: bool,
    last_tick_order: Vec<EncounterSystemId>,
}

impl Encounter {
    pub fn new(config: EncounterConfig, player_id: ActorId, player_position: Vec3) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.driver.rng_seed);
        let player = PlayerState::new(player_id, player_position, &config.player);
        info!(
            player = player_id.0,
            seed = config.driver.rng_seed,
            "encounter_created"
        );
        Self {
            config,
            tick: TickId::default(),
            sim_time_seconds: 0.0,
            paused: false,
            player,
            enemies: BTreeMap::new(),
            pool: Some(EnemyPool::default()),
            input: InputQueue::default(),
            events: EventBus::default(),
            rng,
            cursor_missing_reported: false,
            last_tick_order: Vec::with_capacity(ENCOUNTER_SYSTEM_ORDER.len()),
        }
    }

    /// Drops the enemy pool. Dead enemies then stay registered in the `Dead` state.
    pub fn without_pool(mut self) -> Self {
        self.pool = None;
        self
    }

    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    pub fn tick_id(&self) -> TickId {
        self.tick
    }

    /// Unpaused simulated time since the encounter was created.
    pub fn sim_time_seconds(&self) -> f64 {
        self.sim_time_seconds
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn enemy(&self, id: ActorId) -> Option<&EnemyState> {
        self.enemies.get(&id)
    }

    pub fn enemies(&self) -> impl Iterator<Item = &EnemyState> {
        self.enemies.values()
    }

    pub fn pool(&self) -> Option<&EnemyPool> {
        self.pool.as_ref()
    }

    pub fn last_tick_order(&self) -> &[EncounterSystemId] {
        &self.last_tick_order
    }

    pub fn last_tick_counts(&self) -> EncounterEventCounts {
        self.events.last_tick_counts()
    }

    pub fn queue_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    pub fn spawn_enemy(&mut self, id: ActorId, position: Vec3) -> bool {
        if id == self.player.id() || self.enemies.contains_key(&id) {
            warn!(enemy = id.0, "enemy_spawn_rejected");
            return false;
        }
        let tuning = &self.config.enemy;
        let enemy = match self.pool.as_mut() {
            Some(pool) => pool.acquire(id, position, tuning),
            None => EnemyState::new(id, position, tuning),
        };
        info!(enemy = id.0, x = position.x, z = position.z, "enemy_spawned");
        self.enemies.insert(id, enemy);
        true
    }

    /// Damage from a source outside the simulation, such as a hazard.
    pub fn damage_player(&mut self, amount: u32) -> bool {
        self.apply_player_damage(None, amount)
    }

    pub fn heal_player(&mut self, amount: u32) -> u32 {
        let restored = self.player.heal(amount);
        if restored > 0 {
            debug!(
                restored,
                health = self.player.actor().health.current,
                "player_healed"
            );
        }
        restored
    }

    /// Called by the pickup collaborator when the player touches a life drop.
    pub fn collect_life_drop(&mut self) -> u32 {
        self.heal_player(self.config.driver.life_drop_heal)
    }

    pub fn save_snapshot(&self) -> SaveGame {
        let actor = self.player.actor();
        SaveGame {
            save_version: SAVE_VERSION,
            player_position: SavedVec3::from_vec3(actor.position),
            player_health: actor.health.current,
            player_entropy: self.player.entropy(),
        }
    }

    pub fn apply_save(
        &mut self,
        save: &SaveGame,
        world: &mut dyn PhysicsWorld,
    ) -> Result<(), SaveError> {
        validate_save_game(save, &self.config.player)?;
        let target = save.player_position.to_vec3();
        let player_id = self.player.id();
        match world.actor_position(player_id) {
            Some(current) => world.move_actor(player_id, target - current),
            None => warn!(player = player_id.0, "player_body_missing"),
        }
        self.player
            .restore(target, save.player_health, save.player_entropy);
        info!(
            health = save.player_health,
            entropy = save.player_entropy,
            "save_applied"
        );
        Ok(())
    }

    pub fn tick(&mut self, dt_seconds: f32, world: &mut dyn PhysicsWorld) -> TickReport {
        self.tick = self.tick.next();
        let mut scratch = TickScratch {
            dt_seconds: self.sanitize_dt(dt_seconds),
            ..TickScratch::default()
        };

        self.last_tick_order.clear();
        for system_id in ENCOUNTER_SYSTEM_ORDER {
            if self.paused && !system_id.runs_while_paused() {
                continue;
            }
            self.last_tick_order.push(system_id);
            self.run_system(system_id, &mut scratch, world);
        }

        TickReport {
            tick: self.tick,
            dt_seconds: scratch.dt_seconds,
            paused: self.paused,
            player_displacement: scratch.player_displacement,
            player_facing: self.player.actor().facing,
            animation: self.player.animation_params(),
            events: scratch.events,
        }
    }

    fn sanitize_dt(&self, dt_seconds: f32) -> f32 {
        if !dt_seconds.is_finite() || dt_seconds < 0.0 {
            warn!(dt_seconds, "invalid_tick_dt");
            return 0.0;
        }
        let max_dt = self.config.driver.max_tick_dt_seconds;
        if dt_seconds > max_dt {
            warn!(dt_seconds, max_dt, "tick_dt_clamped");
            return max_dt;
        }
        dt_seconds
    }

    fn run_system(
        &mut self,
        system_id: EncounterSystemId,
        scratch: &mut TickScratch,
        world: &mut dyn PhysicsWorld,
    ) {
        match system_id {
            EncounterSystemId::SyncPositions => self.run_sync_positions_system(scratch, world),
            EncounterSystemId::Timers => self.run_timers_system(scratch),
            EncounterSystemId::Input => self.run_input_system(scratch),
            EncounterSystemId::Player => self.run_player_system(scratch, world),
            EncounterSystemId::Enemies => self.run_enemies_system(scratch, world),
            EncounterSystemId::Damage => self.run_damage_system(scratch, world),
            EncounterSystemId::Cleanup => self.run_cleanup_system(scratch),
        }
    }

    fn run_sync_positions_system(&mut self, scratch: &mut TickScratch, world: &dyn PhysicsWorld) {
        let player_id = self.player.id();
        match world.actor_position(player_id) {
            Some(position) => self.player.set_position(position),
            None => {
                warn!(player = player_id.0, "player_body_missing");
                scratch.player_missing = true;
            }
        }

        for (id, enemy) in self.enemies.iter_mut() {
            if !enemy.is_alive() {
                continue;
            }
            match world.actor_position(*id) {
                Some(position) => enemy.set_position(position),
                None => {
                    warn!(enemy = id.0, "enemy_body_missing");
                    scratch.missing_enemies.insert(*id);
                }
            }
        }
    }

    fn run_timers_system(&mut self, scratch: &mut TickScratch) {
        let dt = scratch.dt_seconds;
        self.sim_time_seconds += f64::from(dt);
        self.player
            .advance_timers(self.tick, dt, &mut self.events);
        for enemy in self.enemies.values_mut() {
            enemy.advance_cooldown(self.tick, dt);
        }
    }

    fn run_input_system(&mut self, scratch: &mut TickScratch) {
        for event in self.input.drain_current_tick() {
            match event {
                InputEvent::Pause => {
                    self.paused = !self.paused;
                    info!(paused = self.paused, "pause_toggled");
                    self.events.emit(EncounterEvent::PauseChanged {
                        paused: self.paused,
                    });
                }
                InputEvent::Move(input) => self.player.set_movement_input(input),
                _ if self.paused || self.player.is_dead() => {
                    debug!(input = event.name(), "input_ignored");
                }
                InputEvent::Dash => {
                    self.player.trigger_dash(&mut self.events);
                }
                InputEvent::Berserk => {
                    self.player.trigger_berserk(&mut self.events);
                }
                InputEvent::Skill1 => {
                    self.player.trigger_skill(SkillSlot::One, &mut self.events);
                }
                InputEvent::Skill2 => {
                    self.player.trigger_skill(SkillSlot::Two, &mut self.events);
                }
                InputEvent::Skill3 => {
                    self.player
                        .trigger_skill(SkillSlot::Three, &mut self.events);
                }
                InputEvent::Strike => {
                    scratch.pending_strikes = scratch.pending_strikes.saturating_add(1);
                }
            }
        }
    }

    fn run_player_system(&mut self, scratch: &mut TickScratch, world: &mut dyn PhysicsWorld) {
        if scratch.player_missing {
            return;
        }
        let player_id = self.player.id();
        let dt = scratch.dt_seconds;

        let displacement = self.player.movement_displacement(dt);
        if displacement != Vec3::ZERO {
            world.move_actor(player_id, displacement);
            self.player
                .set_position(self.player.actor().position + displacement);
        }
        scratch.player_displacement = displacement;

        match world.cursor_point_on_plane(self.player.actor().position) {
            Some(cursor) => {
                self.cursor_missing_reported = false;
                let facing = self.player.face_toward(cursor, dt);
                world.set_rotation(player_id, facing);
            }
            None if !self.cursor_missing_reported => {
                self.cursor_missing_reported = true;
                warn!(player = player_id.0, "cursor_point_missing");
            }
            None => {}
        }
    }

    fn run_enemies_system(&mut self, scratch: &mut TickScratch, world: &mut dyn PhysicsWorld) {
        if scratch.player_missing {
            return;
        }
        let player_position = self.player.actor().position;
        let claw_damage = self.config.claw.damage;
        let mut attackers = Vec::new();

        for (id, enemy) in self.enemies.iter_mut() {
            if scratch.missing_enemies.contains(id) {
                continue;
            }
            if enemy.update(world, player_position, &mut self.rng, &mut self.events) {
                attackers.push(*id);
            }
        }

        // Attacks only fire in Attack mode, so the player is inside attack range.
        for attacker in attackers {
            self.apply_player_damage(Some(attacker), claw_damage);
        }
    }

    fn run_damage_system(&mut self, scratch: &mut TickScratch, world: &mut dyn PhysicsWorld) {
        if scratch.pending_strikes == 0 || scratch.player_missing {
            return;
        }
        let actor = self.player.actor();
        let attacker = actor.id;
        let forward = actor.forward();
        let origin = actor.position + forward * self.config.weapon.attack_point_offset;
        let stage = self.player.skill_timer(SkillSlot::One).stage;

        for _ in 0..scratch.pending_strikes {
            let hits = resolve_sweep(world, attacker, origin, forward, stage, &self.config.weapon);
            debug!(attacker = attacker.0, stage, hits = hits.len(), "sweep_resolved");
            for hit in hits {
                self.apply_enemy_damage(hit, scratch);
            }
        }
    }

    fn apply_enemy_damage(&mut self, hit: DamageEvent, scratch: &mut TickScratch) {
        let Some(enemy) = self.enemies.get_mut(&hit.target) else {
            debug!(target = hit.target.0, "damage_target_unknown");
            return;
        };
        let outcome = enemy.take_damage(hit.attacker, hit.amount, &mut self.events);
        if matches!(outcome, DamageOutcome::Died { .. }) {
            scratch.died.push(hit.target);
        }
    }

    fn apply_player_damage(&mut self, attacker: Option<ActorId>, amount: u32) -> bool {
        if amount == 0 || self.player.is_dead() {
            return false;
        }
        let died = self.player.apply_damage(amount);
        let player_id = self.player.id();
        if let Some(attacker) = attacker {
            self.events.emit(EncounterEvent::DamageDealt {
                attacker,
                target: player_id,
                amount,
            });
        }
        if died {
            info!(player = player_id.0, "player_died");
            self.events
                .emit(EncounterEvent::PlayerDied { actor: player_id });
        }
        true
    }

    fn run_cleanup_system(&mut self, scratch: &mut TickScratch) {
        for id in scratch.died.drain(..) {
            match self.pool.as_mut() {
                Some(pool) => {
                    if let Some(enemy) = self.enemies.remove(&id) {
                        pool.release(enemy);
                        debug!(enemy = id.0, pooled = pool.len(), "enemy_released_to_pool");
                    }
                }
                None => warn!(enemy = id.0, "enemy_pool_unavailable"),
            }
        }
        scratch.events = self.events.finish_tick_rollover();
    }
}
