//! Melee damage sweep.
//!
//! A strike is resolved as a row of overlapping sphere probes laid along the
//! attacker's forward axis. Every probe queries the enemy layer on its own, so
//! a target standing inside two probes is hit twice.

use engine::{ActorId, LayerMask, PhysicsWorld, Vec3};
use tracing::warn;

use crate::config::WeaponTuning;

/// One application of damage, produced and consumed within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    pub attacker: ActorId,
    pub target: ActorId,
    pub amount: u32,
}

/// Damage for the attacker's active skill-1 stage. Stages other than 2 and 3 use base damage.
pub fn damage_for_stage(weapon: &WeaponTuning, stage: u8) -> u32 {
    let scaled = |multiplier: f32| (weapon.base_damage as f32 * multiplier).round().max(0.0) as u32;
    match stage {
        2 => scaled(weapon.stage2_multiplier),
        3 => scaled(weapon.stage3_multiplier),
        _ => weapon.base_damage,
    }
}

pub fn sweep_probe_count(weapon: &WeaponTuning) -> u32 {
    if !(weapon.probe_radius > 0.0 && weapon.attack_range.is_finite()) {
        return 0;
    }
    (weapon.attack_range / weapon.probe_radius).ceil().max(0.0) as u32
}

/// Probe centres at `origin + forward * radius * i` for each probe index.
pub fn sweep_probe_centers(origin: Vec3, forward: Vec3, weapon: &WeaponTuning) -> Vec<Vec3> {
    let direction = forward.normalize_or_zero();
    if direction == Vec3::ZERO {
        return Vec::new();
    }
    (0..sweep_probe_count(weapon))
        .map(|index| origin + direction * (weapon.probe_radius * index as f32))
        .collect()
}

pub fn resolve_sweep(
    world: &dyn PhysicsWorld,
    attacker: ActorId,
    origin: Vec3,
    forward: Vec3,
    skill1_stage: u8,
    weapon: &WeaponTuning,
) -> Vec<DamageEvent> {
    let amount = damage_for_stage(weapon, skill1_stage);
    if amount == 0 {
        return Vec::new();
    }
    let centers = sweep_probe_centers(origin, forward, weapon);
    if centers.is_empty() {
        warn!(attacker = attacker.0, "sweep_without_direction");
        return Vec::new();
    }

    let mut hits = Vec::new();
    for center in centers {
        for target in world.overlap_sphere(center, weapon.probe_radius, LayerMask::ENEMY) {
            if target == attacker {
                continue;
            }
            hits.push(DamageEvent {
                attacker,
                target,
                amount,
            });
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use engine::RayHit;

    use super::*;

    struct PointTargets {
        targets: Vec<(ActorId, Vec3, LayerMask)>,
    }

    impl PhysicsWorld for PointTargets {
        fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<ActorId> {
            self.targets
                .iter()
                .filter(|(_, position, layer)| {
                    layer.intersects(mask) && position.distance(center) <= radius
                })
                .map(|(id, _, _)| *id)
                .collect()
        }

        fn raycast(&self, _: Vec3, _: Vec3, _: f32, _: LayerMask) -> Option<RayHit> {
            None
        }

        fn cursor_point_on_plane(&self, _: Vec3) -> Option<Vec3> {
            None
        }

        fn actor_position(&self, _: ActorId) -> Option<Vec3> {
            None
        }

        fn move_actor(&mut self, _: ActorId, _: Vec3) {}

        fn set_destination(&mut self, _: ActorId, _: Vec3) {}
    }

    #[test]
    fn damage_tiers_follow_skill_one_stage() {
        let weapon = WeaponTuning::default();
        assert_eq!(damage_for_stage(&weapon, 0), 10);
        assert_eq!(damage_for_stage(&weapon, 1), 10);
        assert_eq!(damage_for_stage(&weapon, 2), 15);
        assert_eq!(damage_for_stage(&weapon, 3), 25);
    }

    #[test]
    fn tier_multipliers_round_to_nearest() {
        let weapon = WeaponTuning {
            base_damage: 7,
            ..WeaponTuning::default()
        };
        assert_eq!(damage_for_stage(&weapon, 2), 11);
        assert_eq!(damage_for_stage(&weapon, 3), 18);
    }

    #[test]
    fn probe_count_is_range_over_radius_rounded_up() {
        let weapon = WeaponTuning::default();
        assert_eq!(sweep_probe_count(&weapon), 4);
        let uneven = WeaponTuning {
            attack_range: 2.2,
            ..WeaponTuning::default()
        };
        assert_eq!(sweep_probe_count(&uneven), 5);
    }

    #[test]
    fn probes_start_at_origin_and_step_by_radius() {
        let centers = sweep_probe_centers(Vec3::ZERO, Vec3::new(0.0, 0.0, 3.0), &WeaponTuning::default());
        assert_eq!(
            centers,
            vec![
                Vec3::ZERO,
                Vec3::new(0.0, 0.0, 0.5),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.5),
            ]
        );
    }

    #[test]
    fn overlapping_probes_hit_the_same_enemy_repeatedly() {
        let world = PointTargets {
            targets: vec![(ActorId(5), Vec3::new(0.0, 0.0, 0.75), LayerMask::ENEMY)],
        };
        let hits = resolve_sweep(
            &world,
            ActorId(1),
            Vec3::ZERO,
            Vec3::Z,
            3,
            &WeaponTuning::default(),
        );
        assert_eq!(hits.len(), 2, "probes at 0.5 and 1.0 both contain the target");
        assert!(hits.iter().all(|hit| hit.amount == 25 && hit.target == ActorId(5)));
    }

    #[test]
    fn sweep_ignores_other_layers_and_out_of_range_targets() {
        let world = PointTargets {
            targets: vec![
                (ActorId(2), Vec3::new(0.0, 0.0, 1.0), LayerMask::PLAYER),
                (ActorId(3), Vec3::new(0.0, 0.0, 4.0), LayerMask::ENEMY),
                (ActorId(4), Vec3::new(0.0, 0.0, -1.0), LayerMask::ENEMY),
            ],
        };
        let hits = resolve_sweep(
            &world,
            ActorId(1),
            Vec3::ZERO,
            Vec3::Z,
            1,
            &WeaponTuning::default(),
        );
        assert!(hits.is_empty(), "unexpected hits: {hits:?}");
    }

    #[test]
    fn zero_forward_produces_no_probes() {
        let world = PointTargets {
            targets: vec![(ActorId(5), Vec3::ZERO, LayerMask::ENEMY)],
        };
        let hits = resolve_sweep(
            &world,
            ActorId(1),
            Vec3::ZERO,
            Vec3::ZERO,
            1,
            &WeaponTuning::default(),
        );
        assert!(hits.is_empty());
    }
}
