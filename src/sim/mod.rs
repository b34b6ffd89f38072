//! Deterministic simulation module
//!
//! All physics and effect logic lives here. This module must be pure and
//! deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (per-item generators for batched work)
//! - Stable iteration order (effects in force order, balls by insertion)
//! - No rendering or platform dependencies

pub mod effects;
pub mod history;
pub mod integrate;
pub mod pool;
pub mod state;
pub mod tick;

pub use effects::{Effect, EffectKind, FrameContext, GlowPoint, GlyphColumn, TunnelView, VisualState};
pub use history::{History, Snapshot};
pub use integrate::{StepParams, apply_space_warp, shatter, step_ball, step_particle};
pub use pool::{BatchReport, WorkerPool};
pub use state::{Ball, Bounds, DEFAULT_BALL_COLOR, Entities, EntityId, MIN_BALL_RADIUS, Particle, Rgba};
pub use tick::{Command, EffectView, FrameReport, Simulation};
