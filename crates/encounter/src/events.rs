use engine::{ActorId, Vec3};

use crate::enemy::BehaviorMode;
use crate::player::SkillSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackKind {
    Skill { slot: SkillSlot, stage: u8 },
    Claw,
}

/// Outbound signals consumed by animation, audio, spawning and UI collaborators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncounterEvent {
    AttackTriggered {
        attacker: ActorId,
        kind: AttackKind,
    },
    DamageDealt {
        attacker: ActorId,
        target: ActorId,
        amount: u32,
    },
    ActorDied {
        actor: ActorId,
    },
    LifeDropsSpawned {
        at: Vec3,
        count: u32,
    },
    PlayerDied {
        actor: ActorId,
    },
    DashStarted {
        actor: ActorId,
    },
    BerserkStarted {
        actor: ActorId,
    },
    BerserkEnded {
        actor: ActorId,
    },
    SkillStageChanged {
        slot: SkillSlot,
        stage: u8,
    },
    EnemyModeChanged {
        enemy: ActorId,
        mode: BehaviorMode,
    },
    PauseChanged {
        paused: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterEventKind {
    AttackTriggered,
    DamageDealt,
    ActorDied,
    LifeDropsSpawned,
    PlayerDied,
    DashStarted,
    BerserkStarted,
    BerserkEnded,
    SkillStageChanged,
    EnemyModeChanged,
    PauseChanged,
}

impl EncounterEvent {
    pub fn kind(&self) -> EncounterEventKind {
        match self {
            Self::AttackTriggered { .. } => EncounterEventKind::AttackTriggered,
            Self::DamageDealt { .. } => EncounterEventKind::DamageDealt,
            Self::ActorDied { .. } => EncounterEventKind::ActorDied,
            Self::LifeDropsSpawned { .. } => EncounterEventKind::LifeDropsSpawned,
            Self::PlayerDied { .. } => EncounterEventKind::PlayerDied,
            Self::DashStarted { .. } => EncounterEventKind::DashStarted,
            Self::BerserkStarted { .. } => EncounterEventKind::BerserkStarted,
            Self::BerserkEnded { .. } => EncounterEventKind::BerserkEnded,
            Self::SkillStageChanged { .. } => EncounterEventKind::SkillStageChanged,
            Self::EnemyModeChanged { .. } => EncounterEventKind::EnemyModeChanged,
            Self::PauseChanged { .. } => EncounterEventKind::PauseChanged,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncounterEventCounts {
    pub total: u32,
    pub attack_triggered: u32,
    pub damage_dealt: u32,
    pub actor_died: u32,
    pub life_drops_spawned: u32,
    pub player_died: u32,
    pub dash_started: u32,
    pub berserk_started: u32,
    pub berserk_ended: u32,
    pub skill_stage_changed: u32,
    pub enemy_mode_changed: u32,
    pub pause_changed: u32,
}

impl EncounterEventCounts {
    fn record(&mut self, kind: EncounterEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            EncounterEventKind::AttackTriggered => &mut self.attack_triggered,
            EncounterEventKind::DamageDealt => &mut self.damage_dealt,
            EncounterEventKind::ActorDied => &mut self.actor_died,
            EncounterEventKind::LifeDropsSpawned => &mut self.life_drops_spawned,
            EncounterEventKind::PlayerDied => &mut self.player_died,
            EncounterEventKind::DashStarted => &mut self.dash_started,
            EncounterEventKind::BerserkStarted => &mut self.berserk_started,
            EncounterEventKind::BerserkEnded => &mut self.berserk_ended,
            EncounterEventKind::SkillStageChanged => &mut self.skill_stage_changed,
            EncounterEventKind::EnemyModeChanged => &mut self.enemy_mode_changed,
            EncounterEventKind::PauseChanged => &mut self.pause_changed,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Collects events raised during one tick and hands them out at rollover.
#[derive(Debug, Default)]
pub struct EventBus {
    current_tick_events: Vec<EncounterEvent>,
    last_tick_counts: EncounterEventCounts,
}

impl EventBus {
    pub fn emit(&mut self, event: EncounterEvent) {
        self.current_tick_events.push(event);
    }

    pub fn iter_emitted_so_far(&self) -> impl Iterator<Item = &EncounterEvent> {
        self.current_tick_events.iter()
    }

    pub fn finish_tick_rollover(&mut self) -> Vec<EncounterEvent> {
        let mut counts = EncounterEventCounts::default();
        for event in &self.current_tick_events {
            counts.record(event.kind());
        }
        self.last_tick_counts = counts;
        std::mem::take(&mut self.current_tick_events)
    }

    pub fn last_tick_counts(&self) -> EncounterEventCounts {
        self.last_tick_counts
    }
}
