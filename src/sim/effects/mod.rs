//! Reality-distorting effects
//!
//! Every effect follows the same contract: it is toggled with an optional
//! origin, advances its own cosmetic state in `update` (optionally on the
//! worker pool), and bends the live entities in `apply_force`. Only the
//! orchestrator can lend `&mut Entities`, and it does so to one effect at
//! a time.

mod black_hole;
mod explosion;
mod gravity_wave;
mod magnet;
mod matrix;
mod quantum_tunnel;
mod rainbow;
mod slow_motion;
mod split;
mod teleport;
mod time_freeze;
mod time_reversal;
mod time_vortex;

pub use black_hole::BlackHole;
pub use explosion::Explosion;
pub use gravity_wave::GravityWave;
pub use magnet::Magnet;
pub use matrix::Matrix;
pub use quantum_tunnel::QuantumTunnel;
pub use rainbow::Rainbow;
pub use slow_motion::SlowMotion;
pub use split::Split;
pub use teleport::Teleport;
pub use time_freeze::TimeFreeze;
pub use time_reversal::TimeReversal;
pub use time_vortex::TimeVortex;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::pool::{BatchReport, WorkerPool};
use super::state::{Bounds, Entities, Rgba};
use crate::error::{Result, SimError};
use crate::settings::GlobalParams;

/// Identifies one of the built-in effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    BlackHole,
    TimeVortex,
    Matrix,
    GravityWave,
    Rainbow,
    QuantumTunnel,
    Teleport,
    Split,
    Magnet,
    SlowMotion,
    TimeReversal,
    Explosion,
    TimeFreeze,
}

impl EffectKind {
    /// Force application order used by the orchestrator
    pub const ALL: [EffectKind; 13] = [
        EffectKind::BlackHole,
        EffectKind::TimeVortex,
        EffectKind::Matrix,
        EffectKind::GravityWave,
        EffectKind::Rainbow,
        EffectKind::QuantumTunnel,
        EffectKind::Teleport,
        EffectKind::Split,
        EffectKind::Magnet,
        EffectKind::SlowMotion,
        EffectKind::TimeReversal,
        EffectKind::Explosion,
        EffectKind::TimeFreeze,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::BlackHole => "black_hole",
            EffectKind::TimeVortex => "time_vortex",
            EffectKind::Matrix => "matrix",
            EffectKind::GravityWave => "gravity_wave",
            EffectKind::Rainbow => "rainbow",
            EffectKind::QuantumTunnel => "quantum_tunnel",
            EffectKind::Teleport => "teleport",
            EffectKind::Split => "split",
            EffectKind::Magnet => "magnet",
            EffectKind::SlowMotion => "slow_motion",
            EffectKind::TimeReversal => "time_reversal",
            EffectKind::Explosion => "explosion",
            EffectKind::TimeFreeze => "time_freeze",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let key = s.to_lowercase().replace(['-', ' '], "_");
        EffectKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == key || kind.as_str().replace('_', "") == key)
            .ok_or_else(|| SimError::UnknownEffect(s.to_string()))
    }

    /// Position in [`EffectKind::ALL`]; variants are declared in force order
    pub fn index(self) -> usize {
        self as usize
    }

    /// Offset mixed into the config seed so each effect draws its own stream
    fn seed_offset(self) -> u64 {
        (self.index() as u64 + 1) * 0x9e37_79b9
    }
}

/// Per-frame read-only inputs shared by every effect
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    pub bounds: Bounds,
    pub params: GlobalParams,
    /// Last known pointer position
    pub pointer: Vec2,
    /// Forward frame counter
    pub frame: u64,
    /// Simulation seed, for per-item generators in batched work
    pub seed: u64,
}

impl FrameContext {
    /// Same frame, with the seed moved onto `kind`'s own stream
    pub fn for_effect(&self, kind: EffectKind) -> Self {
        Self {
            seed: self.seed.wrapping_add(kind.seed_offset()),
            ..*self
        }
    }

    /// Generator for one item of a batch; independent of batch layout
    pub fn item_rng(&self, index: usize) -> Pcg32 {
        item_rng(self.seed, self.frame, index)
    }
}

pub(crate) fn item_rng(seed: u64, frame: u64, index: usize) -> Pcg32 {
    Pcg32::new(
        seed ^ frame.wrapping_mul(0x2545_f491_4f6c_dd1d),
        index as u64 * 2 + 1,
    )
}

/// A soft glowing point used by most effect visuals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlowPoint {
    pub pos: Vec2,
    pub size: f32,
    pub color: Rgba,
}

/// One column of falling glyphs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphColumn {
    pub x: f32,
    /// (y, glyph), head first
    pub glyphs: Vec<(f32, char)>,
}

/// An in-flight tunnel as seen by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TunnelView {
    pub start: Vec2,
    pub end: Vec2,
    pub progress: f32,
}

/// Render-only snapshot of an effect's cosmetic state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VisualState {
    /// Nothing to draw
    None,
    BlackHole {
        center: Vec2,
        horizon: f32,
        disk: Vec<GlowPoint>,
        lensing: Vec<Vec<Vec2>>,
    },
    /// Circular field with decorative motes (vortex, magnet, slow motion, teleport)
    Field {
        center: Vec2,
        radius: f32,
        motes: Vec<GlowPoint>,
    },
    Rings {
        center: Vec2,
        /// (radius, strength)
        rings: Vec<(f32, f32)>,
    },
    Tunnels {
        tunnels: Vec<TunnelView>,
        motes: Vec<GlowPoint>,
    },
    Rainbow {
        motes: Vec<GlowPoint>,
        blobs: Vec<GlowPoint>,
    },
    Matrix {
        columns: Vec<GlyphColumn>,
    },
    Frost {
        sparkles: Vec<GlowPoint>,
    },
}

/// Uniform effect contract
pub trait Effect: Send {
    fn kind(&self) -> EffectKind;

    /// Toggle the effect. `origin` anchors effects that have a position.
    fn set_active(&mut self, active: bool, origin: Option<Vec2>);

    fn is_active(&self) -> bool;

    /// Advance cosmetic state. Runs even on frozen frames.
    fn update(&mut self, _ctx: &FrameContext, _pool: &WorkerPool) -> BatchReport {
        BatchReport::default()
    }

    /// Bend the live entities. Only called while active.
    fn apply_force(&mut self, ctx: &FrameContext, entities: &mut Entities);

    /// False while the effect suspends integration
    fn should_update_physics(&self) -> bool {
        true
    }

    /// Act on a point immediately (explosion clicks). Returns false if ignored.
    fn trigger(&mut self, _at: Vec2, _entities: &mut Entities) -> bool {
        false
    }

    /// Cosmetic state for the rendering collaborator
    fn visual(&self) -> VisualState;
}

/// Build every effect in force-application order
pub fn build_all(bounds: Bounds, seed: u64) -> Vec<Box<dyn Effect>> {
    EffectKind::ALL
        .into_iter()
        .map(|kind| build(kind, bounds, seed))
        .collect()
}

pub fn build(kind: EffectKind, bounds: Bounds, seed: u64) -> Box<dyn Effect> {
    let rng = Pcg32::seed_from_u64(seed.wrapping_add(kind.seed_offset()));
    match kind {
        EffectKind::BlackHole => Box::new(BlackHole::new(bounds, rng)),
        EffectKind::TimeVortex => Box::new(TimeVortex::new(rng)),
        EffectKind::Matrix => Box::new(Matrix::new(bounds, rng)),
        EffectKind::GravityWave => Box::new(GravityWave::new(bounds)),
        EffectKind::Rainbow => Box::new(Rainbow::new(bounds, rng)),
        EffectKind::QuantumTunnel => Box::new(QuantumTunnel::new(rng)),
        EffectKind::Teleport => Box::new(Teleport::new(bounds, rng)),
        EffectKind::Split => Box::new(Split::new(rng)),
        EffectKind::Magnet => Box::new(Magnet::new(bounds, rng)),
        EffectKind::SlowMotion => Box::new(SlowMotion::new(bounds, rng)),
        EffectKind::TimeReversal => Box::new(TimeReversal::new(rng)),
        EffectKind::Explosion => Box::new(Explosion::new(rng)),
        EffectKind::TimeFreeze => Box::new(TimeFreeze::new(bounds, rng)),
    }
}

/// Shared log line for toggles
pub(crate) fn log_toggle(kind: EffectKind, active: bool) {
    log::info!(
        "Effect {} {}",
        kind.as_str(),
        if active { "activated" } else { "deactivated" }
    );
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn ctx(bounds: Bounds) -> FrameContext {
        FrameContext {
            bounds,
            params: GlobalParams::default(),
            pointer: bounds.center(),
            frame: 1,
            seed: 99,
        }
    }

    pub fn pool() -> WorkerPool {
        WorkerPool::new(2).unwrap()
    }
}
