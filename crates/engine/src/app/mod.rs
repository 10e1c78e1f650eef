mod input;
mod loop_runner;
mod metrics;
mod transform;
mod world;

pub use input::{InputEvent, InputQueue};
pub use loop_runner::{
    run_frames, run_realtime, FixedStepClock, LoopConfig, LoopSummary, Simulation, StepPlan,
};
pub use metrics::LoopMetricsSnapshot;
pub use transform::{
    flat_look_rotation, forward, planar, rotate_input, slerp_clamped, world_to_local_direction,
};
pub use world::{ActorId, LayerMask, PhysicsWorld, RayHit};
