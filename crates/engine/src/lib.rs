//! Simulation plumbing shared by gameplay crates: tick-scoped timers, the
//! inbound input vocabulary, the physics/navigation collaborator surface and
//! a fixed-step loop runner.

pub mod app;
pub mod timers;

pub use app::{
    flat_look_rotation, forward, planar, rotate_input, run_frames, run_realtime,
    slerp_clamped, world_to_local_direction, ActorId, FixedStepClock, InputEvent, InputQueue,
    LayerMask, LoopConfig, LoopMetricsSnapshot, LoopSummary, PhysicsWorld, RayHit, Simulation,
    StepPlan,
};
pub use timers::{Countdown, TickId, TimerBank};

pub use glam::{Quat, Vec2, Vec3};
