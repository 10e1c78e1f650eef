//! Encounter simulation for a top-down action game: player actions, enemy
//! behavior, the damage sweep and the per-tick driver that orders them.

pub mod actor;
pub mod arena;
pub mod bootstrap;
pub mod config;
pub mod damage;
pub mod demo;
pub mod encounter;
pub mod enemy;
pub mod events;
pub mod player;
pub mod save;

pub use actor::{Actor, Health};
pub use arena::Arena;
pub use config::{ConfigError, EncounterConfig};
pub use damage::{resolve_sweep, DamageEvent};
pub use demo::{DemoRun, DemoSummary};
pub use encounter::{Encounter, EncounterSystemId, TickReport, ENCOUNTER_SYSTEM_ORDER};
pub use enemy::{BehaviorMode, EnemyPool, EnemyState, LifeState};
pub use events::{AttackKind, EncounterEvent, EncounterEventKind, EventBus};
pub use player::{PlayerState, SkillSlot};
pub use save::{SaveError, SaveGame};
