//! Scripted headless run used by the binary.
//!
//! A bot stands in for the input layer: it walks toward the nearest enemy,
//! points the cursor at it, chains skill 1 and strikes when in reach. The
//! arena plays the physics, navigation and pickup collaborators. Each time a
//! wave is cleared a new one spawns around the player.

use engine::{rotate_input, ActorId, InputEvent, LayerMask, PhysicsWorld, Simulation, Vec2, Vec3};
use tracing::{debug, info};

use crate::arena::Arena;
use crate::config::EncounterConfig;
use crate::encounter::Encounter;
use crate::events::EncounterEvent;
use crate::save::SaveGame;

const ARENA_HALF_EXTENT: f32 = 30.0;
const PLAYER_RADIUS: f32 = 0.5;
const ENEMY_RADIUS: f32 = 0.5;
const ENEMY_NAV_SPEED: f32 = 3.5;
const ENEMIES_PER_WAVE: u32 = 3;
const WAVE_SPAWN_DISTANCE: f32 = 7.0;
const STRIKE_REACH: f32 = 1.8;
const DASH_DISTANCE: f32 = 5.0;
const STRIKE_INTERVAL_SECONDS: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoSummary {
    pub ticks: u64,
    pub waves: u32,
    pub enemies_killed: u32,
    pub strikes: u32,
    pub damage_taken: u32,
    pub drops_collected: u32,
    pub player_health: u32,
    pub player_died: bool,
}

pub struct DemoRun {
    arena: Arena,
    encounter: Encounter,
    player: ActorId,
    max_ticks: u64,
    strike_cooldown_seconds: f32,
    summary: DemoSummary,
}

impl DemoRun {
    pub fn new(config: EncounterConfig, duration_seconds: f32, fixed_dt_seconds: f32) -> Self {
        let mut arena = Arena::square(ARENA_HALF_EXTENT);
        let player = arena.spawn_body(LayerMask::PLAYER, Vec3::ZERO, PLAYER_RADIUS, 0.0);
        let encounter = Encounter::new(config, player, Vec3::ZERO);
        let max_ticks = if fixed_dt_seconds > 0.0 {
            (duration_seconds / fixed_dt_seconds).ceil().max(0.0) as u64
        } else {
            0
        };
        let mut run = Self {
            arena,
            encounter,
            player,
            max_ticks,
            strike_cooldown_seconds: 0.0,
            summary: DemoSummary::default(),
        };
        run.spawn_wave();
        run
    }

    pub fn summary(&self) -> DemoSummary {
        DemoSummary {
            player_health: self.encounter.player().actor().health.current,
            ..self.summary
        }
    }

    pub fn save_snapshot(&self) -> SaveGame {
        self.encounter.save_snapshot()
    }

    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    fn spawn_wave(&mut self) {
        self.summary.waves = self.summary.waves.saturating_add(1);
        let center = self.encounter.player().actor().position;
        let phase = self.summary.waves as f32 * 0.7;
        for index in 0..ENEMIES_PER_WAVE {
            let angle = phase + index as f32 * std::f32::consts::TAU / ENEMIES_PER_WAVE as f32;
            let offset = Vec3::new(angle.cos(), 0.0, angle.sin()) * WAVE_SPAWN_DISTANCE;
            let position = clamp_to_arena(center + offset);
            let id = self
                .arena
                .spawn_body(LayerMask::ENEMY, position, ENEMY_RADIUS, ENEMY_NAV_SPEED);
            self.encounter.spawn_enemy(id, position);
        }
        info!(wave = self.summary.waves, "wave_spawned");
    }

    fn nearest_enemy_position(&self) -> Option<Vec3> {
        let player_position = self.encounter.player().actor().position;
        self.encounter
            .enemies()
            .filter(|enemy| enemy.is_alive())
            .filter_map(|enemy| self.arena.actor_position(enemy.id()))
            .min_by(|a, b| {
                a.distance_squared(player_position)
                    .total_cmp(&b.distance_squared(player_position))
            })
    }

    fn script_inputs(&mut self, dt_seconds: f32) {
        self.strike_cooldown_seconds = (self.strike_cooldown_seconds - dt_seconds).max(0.0);
        let Some(target) = self.nearest_enemy_position() else {
            self.encounter.queue_input(InputEvent::Move(Vec2::ZERO));
            return;
        };
        self.arena.set_cursor(Some(target));

        let player = self.encounter.player();
        let offset = target - player.actor().position;
        let dash_ready = player.dash_ready();
        let berserk = player.is_berserk();
        let distance = offset.length();
        if distance > STRIKE_REACH {
            let world = Vec2::new(offset.x, offset.z).normalize_or_zero();
            let rotation = self.encounter.config().player.input_rotation_degrees;
            self.encounter
                .queue_input(InputEvent::Move(rotate_input(world, -rotation)));
            if distance > DASH_DISTANCE && dash_ready {
                self.encounter.queue_input(InputEvent::Dash);
            }
            return;
        }

        self.encounter.queue_input(InputEvent::Move(Vec2::ZERO));
        if !berserk {
            self.encounter.queue_input(InputEvent::Berserk);
        }
        if self.strike_cooldown_seconds <= 0.0 {
            self.encounter.queue_input(InputEvent::Skill1);
            self.encounter.queue_input(InputEvent::Strike);
            self.strike_cooldown_seconds = STRIKE_INTERVAL_SECONDS;
            self.summary.strikes = self.summary.strikes.saturating_add(1);
        }
    }

    fn absorb_events(&mut self, events: &[EncounterEvent]) {
        for event in events {
            match *event {
                EncounterEvent::ActorDied { actor } if actor != self.player => {
                    self.arena.remove_body(actor);
                    self.summary.enemies_killed = self.summary.enemies_killed.saturating_add(1);
                }
                EncounterEvent::LifeDropsSpawned { count, .. } => {
                    for _ in 0..count {
                        self.encounter.collect_life_drop();
                    }
                    self.summary.drops_collected =
                        self.summary.drops_collected.saturating_add(count);
                }
                EncounterEvent::DamageDealt { target, amount, .. } if target == self.player => {
                    self.summary.damage_taken = self.summary.damage_taken.saturating_add(amount);
                }
                EncounterEvent::PlayerDied { .. } => {
                    info!("player_died_demo_stopping");
                    self.summary.player_died = true;
                }
                _ => {}
            }
        }
    }
}

fn clamp_to_arena(position: Vec3) -> Vec3 {
    let limit = ARENA_HALF_EXTENT - 1.0;
    Vec3::new(
        position.x.clamp(-limit, limit),
        position.y,
        position.z.clamp(-limit, limit),
    )
}

impl Simulation for DemoRun {
    fn tick(&mut self, fixed_dt_seconds: f32) {
        self.script_inputs(fixed_dt_seconds);
        let report = self.encounter.tick(fixed_dt_seconds, &mut self.arena);
        self.arena.step_navigation(report.dt_seconds);
        self.absorb_events(&report.events);
        self.summary.ticks = self.summary.ticks.saturating_add(1);

        if self.encounter.enemies().all(|enemy| !enemy.is_alive()) {
            debug!(tick = report.tick.0, "wave_cleared");
            self.spawn_wave();
        }
    }

    fn finished(&self) -> bool {
        self.summary.player_died || self.summary.ticks >= self.max_ticks
    }
}
