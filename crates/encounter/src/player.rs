//! Player action state machine.
//!
//! Every timed behaviour (dash, dash cooldown, berserk, the three skill stage
//! windows and the skill-1 re-trigger lockout) lives in one [`TimerBank`] that
//! the driver advances once per unpaused tick.

use engine::{
    flat_look_rotation, planar, rotate_input, slerp_clamped, world_to_local_direction, ActorId,
    Quat, TickId, TimerBank, Vec2, Vec3,
};
use tracing::debug;

use crate::actor::Actor;
use crate::config::{PlayerTuning, MAX_SKILL_STAGE};
use crate::events::{AttackKind, EncounterEvent, EventBus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkillSlot {
    One,
    Two,
    Three,
}

impl SkillSlot {
    pub const ALL: [SkillSlot; 3] = [SkillSlot::One, SkillSlot::Two, SkillSlot::Three];

    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
            Self::Three => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::One => "skill1",
            Self::Two => "skill2",
            Self::Three => "skill3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PlayerTimer {
    Dash,
    DashCooldown,
    SkillWindow(SkillSlot),
    Skill1Lockout,
    Berserk,
}

/// Read-only view of one skill chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillTimer {
    pub stage: u8,
    pub time_left: f32,
}

/// Values pushed to the animation parameter binder every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationParams {
    pub move_x: f32,
    pub move_z: f32,
    pub skill_stages: [u8; 3],
    pub berserk: bool,
}

#[derive(Debug, Clone)]
pub struct PlayerState {
    actor: Actor,
    tuning: PlayerTuning,
    movement_input: Vec2,
    timers: TimerBank<PlayerTimer>,
    skill_stages: [u8; 3],
    is_berserk: bool,
    entropy: u32,
    dead: bool,
}

impl PlayerState {
    pub fn new(id: ActorId, position: Vec3, tuning: &PlayerTuning) -> Self {
        let mut actor = Actor::new(id, position, tuning.max_health);
        actor.speed = tuning.normal_speed;
        let timers = TimerBank::with_keys(
            [
                PlayerTimer::Dash,
                PlayerTimer::DashCooldown,
                PlayerTimer::Skill1Lockout,
                PlayerTimer::Berserk,
            ]
                .into_iter()
                .chain(SkillSlot::ALL.map(PlayerTimer::SkillWindow)),
        );
        Self {
            actor,
            tuning: tuning.clone(),
            movement_input: Vec2::ZERO,
            timers,
            skill_stages: [0; 3],
            is_berserk: false,
            entropy: tuning.max_entropy,
            dead: false,
        }
    }

    pub fn id(&self) -> ActorId {
        self.actor.id
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub(crate) fn set_position(&mut self, position: Vec3) {
        self.actor.position = position;
    }

    pub fn movement_input(&self) -> Vec2 {
        self.movement_input
    }

    pub fn current_speed(&self) -> f32 {
        self.actor.speed
    }

    pub fn is_berserk(&self) -> bool {
        self.is_berserk
    }

    pub fn berserk_time_left(&self) -> f32 {
        self.timers.remaining(PlayerTimer::Berserk)
    }

    pub fn is_dashing(&self) -> bool {
        self.timers.is_running(PlayerTimer::Dash)
    }

    pub fn dash_ready(&self) -> bool {
        !self.timers.is_running(PlayerTimer::DashCooldown)
    }

    pub fn timer_remaining(&self, timer: PlayerTimer) -> f32 {
        self.timers.remaining(timer)
    }

    pub fn skill_timer(&self, slot: SkillSlot) -> SkillTimer {
        SkillTimer {
            stage: self.skill_stages[slot.index()],
            time_left: self.timers.remaining(PlayerTimer::SkillWindow(slot)),
        }
    }

    pub fn entropy(&self) -> u32 {
        self.entropy
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Latest movement vector from the input layer. Non-finite input reads as no input.
    pub fn set_movement_input(&mut self, input: Vec2) {
        self.movement_input = if input.is_finite() { input } else { Vec2::ZERO };
    }

    pub fn trigger_dash(&mut self, events: &mut EventBus) -> bool {
        if !self.dash_ready() {
            return false;
        }
        let cooldown = if self.is_berserk {
            self.tuning.berserk_dash_cooldown_seconds
        } else {
            self.tuning.dash_cooldown_seconds
        };
        self.actor.speed = self.tuning.dash_speed;
        self.timers
            .start(PlayerTimer::Dash, self.tuning.dash_duration_seconds);
        self.timers.start(PlayerTimer::DashCooldown, cooldown);
        debug!(player = self.actor.id.0, cooldown, "dash_started");
        events.emit(EncounterEvent::DashStarted {
            actor: self.actor.id,
        });
        true
    }

    pub fn trigger_berserk(&mut self, events: &mut EventBus) -> bool {
        if self.is_berserk {
            return false;
        }
        self.is_berserk = true;
        self.timers
            .start(PlayerTimer::Berserk, self.tuning.berserk_duration_seconds);
        if !self.is_dashing() {
            self.actor.speed = self.tuning.normal_speed * self.tuning.berserk_speed_multiplier;
        }
        debug!(
            player = self.actor.id.0,
            duration = self.tuning.berserk_duration_seconds,
            "berserk_started"
        );
        events.emit(EncounterEvent::BerserkStarted {
            actor: self.actor.id,
        });
        true
    }

    /// Advances the chain for `slot`. The caller is responsible for dropping triggers while paused.
    pub fn trigger_skill(&mut self, slot: SkillSlot, events: &mut EventBus) -> bool {
        if slot == SkillSlot::One && self.timers.is_running(PlayerTimer::Skill1Lockout) {
            return false;
        }
        let index = slot.index();
        let previous = self.skill_stages[index];
        let cap = self.tuning.max_skill_stage.min(MAX_SKILL_STAGE);
        let stage = previous.saturating_add(1).min(cap);
        self.skill_stages[index] = stage;
        self.timers.start(
            PlayerTimer::SkillWindow(slot),
            self.tuning.skill_stage_window_seconds,
        );
        if slot == SkillSlot::One {
            self.timers
                .start(PlayerTimer::Skill1Lockout, self.tuning.skill1_lockout_seconds);
        }

        if stage != previous {
            debug!(skill = slot.name(), stage, "skill_stage_changed");
            events.emit(EncounterEvent::SkillStageChanged { slot, stage });
        }
        events.emit(EncounterEvent::AttackTriggered {
            attacker: self.actor.id,
            kind: AttackKind::Skill { slot, stage },
        });
        true
    }

    /// Advances every player timer by `dt` and applies the expiry effects.
    pub fn advance_timers(&mut self, tick: TickId, dt_seconds: f32, events: &mut EventBus) {
        for expired in self.timers.advance(tick, dt_seconds) {
            match expired {
                PlayerTimer::Dash => {
                    self.actor.speed = self.post_dash_speed();
                    debug!(speed = self.actor.speed, "dash_ended");
                }
                PlayerTimer::SkillWindow(slot) => {
                    self.skill_stages[slot.index()] = 0;
                    debug!(skill = slot.name(), stage = 0, "skill_stage_changed");
                    events.emit(EncounterEvent::SkillStageChanged { slot, stage: 0 });
                }
                PlayerTimer::Berserk => self.end_berserk(events),
                PlayerTimer::DashCooldown | PlayerTimer::Skill1Lockout => {}
            }
        }
    }

    fn end_berserk(&mut self, events: &mut EventBus) {
        if !self.is_berserk {
            return;
        }
        self.is_berserk = false;
        if !self.is_dashing() {
            self.actor.speed = self.tuning.normal_speed;
        }
        debug!(player = self.actor.id.0, "berserk_ended");
        events.emit(EncounterEvent::BerserkEnded {
            actor: self.actor.id,
        });
    }

    fn post_dash_speed(&self) -> f32 {
        if self.is_berserk {
            self.tuning.normal_speed * self.tuning.post_dash_berserk_multiplier
        } else {
            self.tuning.normal_speed
        }
    }

    fn world_move_direction(&self) -> Vec3 {
        planar(rotate_input(
            self.movement_input,
            self.tuning.input_rotation_degrees,
        ))
    }

    /// World-space X/Z displacement for this tick.
    pub fn movement_displacement(&self, dt_seconds: f32) -> Vec3 {
        self.world_move_direction() * self.actor.speed * dt_seconds
    }

    /// Turns toward `cursor_point` at the configured turn rate and returns the new facing.
    pub fn face_toward(&mut self, cursor_point: Vec3, dt_seconds: f32) -> Quat {
        if let Some(target) = flat_look_rotation(cursor_point - self.actor.position) {
            self.actor.facing =
                slerp_clamped(self.actor.facing, target, self.tuning.turn_rate * dt_seconds);
        }
        self.actor.facing
    }

    pub fn animation_params(&self) -> AnimationParams {
        let local = world_to_local_direction(self.actor.facing, self.world_move_direction());
        AnimationParams {
            move_x: local.x,
            move_z: local.z,
            skill_stages: self.skill_stages,
            berserk: self.is_berserk,
        }
    }

    /// Returns `true` on the call that takes health to zero.
    pub fn apply_damage(&mut self, amount: u32) -> bool {
        if self.dead {
            return false;
        }
        self.actor.health.apply_damage(amount);
        self.dead = self.actor.health.is_depleted();
        self.dead
    }

    pub fn heal(&mut self, amount: u32) -> u32 {
        if self.dead {
            return 0;
        }
        self.actor.health.heal(amount)
    }

    /// Overwrites persisted vitals. Values are clamped to their maxima.
    pub(crate) fn restore(&mut self, position: Vec3, health: u32, entropy: u32) {
        self.actor.position = position;
        self.actor.health.current = health.min(self.actor.health.max);
        self.entropy = entropy.min(self.tuning.max_entropy);
        self.dead = self.actor.health.is_depleted();
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn player() -> PlayerState {
        PlayerState::new(ActorId(1), Vec3::ZERO, &PlayerTuning::default())
    }

    fn run(player: &mut PlayerState, tick: &mut TickId, dt: f32, events: &mut EventBus) {
        *tick = tick.next();
        player.advance_timers(*tick, dt, events);
    }

    #[test]
    fn dash_swaps_speed_then_reverts_to_normal() {
        let mut player = player();
        let mut events = EventBus::default();
        let mut tick = TickId(0);

        assert!(player.trigger_dash(&mut events));
        assert_eq!(player.current_speed(), 100.0);
        run(&mut player, &mut tick, 0.05, &mut events);
        assert_eq!(player.current_speed(), 4.5);
        assert!(!player.dash_ready(), "cooldown still running after dash ends");
    }

    #[test]
    fn dash_is_rejected_until_cooldown_expires() {
        let mut player = player();
        let mut events = EventBus::default();
        let mut tick = TickId(0);

        assert!(player.trigger_dash(&mut events));
        for _ in 0..5 {
            run(&mut player, &mut tick, 0.25, &mut events);
            assert!(!player.trigger_dash(&mut events));
        }
        run(&mut player, &mut tick, 0.25, &mut events);
        assert!(player.trigger_dash(&mut events));
    }

    #[test]
    fn berserk_shortens_dash_cooldown_and_scales_speed() {
        let mut player = player();
        let mut events = EventBus::default();
        let mut tick = TickId(0);

        assert!(player.trigger_berserk(&mut events));
        assert!((player.current_speed() - 4.5 * 1.9).abs() < 1e-5);
        assert!(!player.trigger_berserk(&mut events), "already active");

        assert!(player.trigger_dash(&mut events));
        assert!((player.timer_remaining(PlayerTimer::DashCooldown) - 0.5).abs() < 1e-6);
        run(&mut player, &mut tick, 0.05, &mut events);
        assert!((player.current_speed() - 4.5 * 1.5).abs() < 1e-5);
    }

    #[test]
    fn berserk_expires_once_its_duration_has_elapsed() {
        let mut player = player();
        let mut events = EventBus::default();
        let mut tick = TickId(0);
        player.trigger_berserk(&mut events);

        for _ in 0..39 {
            run(&mut player, &mut tick, 0.25, &mut events);
        }
        assert!(player.is_berserk());
        assert!((player.berserk_time_left() - 0.25).abs() < 1e-6);

        run(&mut player, &mut tick, 0.25, &mut events);
        assert!(!player.is_berserk());
        assert_eq!(player.current_speed(), 4.5);
        let ended = events
            .iter_emitted_so_far()
            .filter(|event| matches!(event, EncounterEvent::BerserkEnded { .. }))
            .count();
        assert_eq!(ended, 1);
        assert!(player.trigger_berserk(&mut events));
    }

    #[test]
    fn skill_stage_clamps_at_three_and_resets_after_window() {
        let mut player = player();
        let mut events = EventBus::default();
        let mut tick = TickId(0);

        for _ in 0..5 {
            assert!(player.trigger_skill(SkillSlot::Two, &mut events));
        }
        assert_eq!(player.skill_timer(SkillSlot::Two).stage, 3);

        run(&mut player, &mut tick, 1.0, &mut events);
        assert_eq!(player.skill_timer(SkillSlot::Two).stage, 3);
        run(&mut player, &mut tick, 0.5, &mut events);
        assert_eq!(player.skill_timer(SkillSlot::Two).stage, 0);
        assert_eq!(player.skill_timer(SkillSlot::Two).time_left, 0.0);
    }

    #[test]
    fn skill_stage_never_exceeds_three_even_with_a_larger_tuned_cap() {
        let tuning = PlayerTuning {
            max_skill_stage: 7,
            ..PlayerTuning::default()
        };
        let mut player = PlayerState::new(ActorId(1), Vec3::ZERO, &tuning);
        let mut events = EventBus::default();

        for _ in 0..6 {
            player.trigger_skill(SkillSlot::Two, &mut events);
        }
        assert_eq!(player.skill_timer(SkillSlot::Two).stage, 3);
    }

    #[test]
    fn skill_one_lockout_swallows_rapid_retrigger() {
        let mut player = player();
        let mut events = EventBus::default();
        let mut tick = TickId(0);

        assert!(player.trigger_skill(SkillSlot::One, &mut events));
        assert!(!player.trigger_skill(SkillSlot::One, &mut events));
        assert_eq!(player.skill_timer(SkillSlot::One).stage, 1);

        run(&mut player, &mut tick, 0.4, &mut events);
        assert!(player.trigger_skill(SkillSlot::One, &mut events));
        assert_eq!(player.skill_timer(SkillSlot::One).stage, 2);
    }

    #[test]
    fn skill_chains_are_independent() {
        let mut player = player();
        let mut events = EventBus::default();
        player.trigger_skill(SkillSlot::Two, &mut events);
        player.trigger_skill(SkillSlot::Two, &mut events);
        player.trigger_skill(SkillSlot::Three, &mut events);

        assert_eq!(player.skill_timer(SkillSlot::One).stage, 0);
        assert_eq!(player.skill_timer(SkillSlot::Two).stage, 2);
        assert_eq!(player.skill_timer(SkillSlot::Three).stage, 1);
    }

    #[test]
    fn movement_is_rotated_onto_isometric_axes() {
        let mut player = player();
        player.set_movement_input(Vec2::new(0.0, 1.0));
        let displacement = player.movement_displacement(1.0);
        let expected = 4.5 * std::f32::consts::FRAC_1_SQRT_2;
        assert!((displacement.x - expected).abs() < 1e-4);
        assert!((displacement.z - expected).abs() < 1e-4);
        assert_eq!(displacement.y, 0.0);
    }

    #[test]
    fn raw_input_magnitude_scales_displacement() {
        let mut player = player();
        player.set_movement_input(Vec2::new(1.0, 1.0));
        let displacement = player.movement_displacement(1.0);
        assert!((displacement.length() - 4.5 * std::f32::consts::SQRT_2).abs() < 1e-4);
    }

    #[test]
    fn non_finite_movement_input_reads_as_idle() {
        let mut player = player();
        player.set_movement_input(Vec2::new(f32::NAN, 1.0));
        assert_eq!(player.movement_displacement(0.1), Vec3::ZERO);
    }

    #[test]
    fn facing_converges_on_cursor() {
        let mut player = player();
        for _ in 0..30 {
            player.face_toward(Vec3::new(5.0, 0.0, 0.0), 1.0 / 60.0);
        }
        assert!((player.actor().forward() - Vec3::X).length() < 1e-2);
    }

    #[test]
    fn animation_params_follow_local_frame() {
        let mut player = player();
        player.set_movement_input(Vec2::new(0.0, 1.0));
        let world = player.movement_displacement(1.0).normalize();
        player.face_toward(world * 10.0, 1.0);
        let params = player.animation_params();
        assert!(params.move_x.abs() < 1e-4);
        assert!((params.move_z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn damage_reports_death_once() {
        let mut player = player();
        assert!(!player.apply_damage(60));
        assert!(player.apply_damage(60));
        assert!(!player.apply_damage(60));
        assert_eq!(player.heal(5), 0, "no healing after death");
    }

    proptest! {
        #[test]
        fn skill_stage_stays_bounded_and_resets_within_window(
            steps in proptest::collection::vec((any::<bool>(), 0.0f32..0.6), 1..80)
        ) {
            let mut player = player();
            let mut events = EventBus::default();
            let mut tick = TickId(0);
            let mut since_trigger: Option<f32> = None;

            for (trigger, dt) in steps {
                let before = player.skill_timer(SkillSlot::Two).stage;
                if trigger {
                    player.trigger_skill(SkillSlot::Two, &mut events);
                    since_trigger = Some(0.0);
                    prop_assert!(player.skill_timer(SkillSlot::Two).stage >= before);
                }
                let mid = player.skill_timer(SkillSlot::Two).stage;
                run(&mut player, &mut tick, dt, &mut events);
                let after = player.skill_timer(SkillSlot::Two).stage;
                prop_assert!(after == mid || after == 0);
                prop_assert!(after <= 3);

                if let Some(elapsed) = since_trigger.as_mut() {
                    *elapsed += dt;
                    if *elapsed >= 1.5 + 1e-3 {
                        prop_assert_eq!(after, 0);
                    }
                }
            }
        }

        #[test]
        fn dash_never_fires_twice_within_cooldown(
            steps in proptest::collection::vec(0.0f32..0.3, 1..80),
            berserk in any::<bool>()
        ) {
            let mut player = player();
            let mut events = EventBus::default();
            let mut tick = TickId(0);
            let mut now = 0.0f32;
            if berserk {
                player.trigger_berserk(&mut events);
            }
            let cooldown = if berserk { 0.5 } else { 1.5 };
            let mut last_dash: Option<f32> = None;

            for dt in steps {
                if player.trigger_dash(&mut events) {
                    if let Some(previous) = last_dash {
                        prop_assert!(now - previous >= cooldown - 1e-3);
                    }
                    last_dash = Some(now);
                }
                run(&mut player, &mut tick, dt, &mut events);
                now += dt;
            }
        }
    }
}
