//! Read-only per-frame view for a rendering collaborator
//!
//! The simulation never draws. Once per frame a renderer pulls a
//! [`FrameView`] and, if it uploads to a GPU, packs balls and particles
//! into [`CircleInstance`] buffers.

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

use crate::error::Result;
use crate::settings::GlobalParams;
use crate::sim::{Ball, Bounds, EffectView, Particle, Simulation, VisualState};

/// One filled circle, laid out for direct upload as instance data
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CircleInstance {
    pub center: [f32; 2],
    pub radius: f32,
    pub color: [f32; 4],
}

impl CircleInstance {
    pub fn from_ball(ball: &Ball) -> Self {
        Self {
            center: ball.pos.to_array(),
            radius: ball.radius,
            color: ball.color.to_f32(),
        }
    }

    /// Particles fade out over their last 50 frames
    pub fn from_particle(particle: &Particle) -> Self {
        let fade = (particle.lifetime as f32 / 50.0).min(1.0);
        let mut color = particle.color.to_f32();
        color[3] *= fade;
        Self {
            center: particle.pos.to_array(),
            radius: particle.size / 2.0,
            color,
        }
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameView<'a> {
    pub frame: u64,
    pub bounds: Bounds,
    pub params: GlobalParams,
    pub reversing: bool,
    pub frozen: bool,
    pub balls: &'a [Ball],
    pub particles: &'a [Particle],
    pub effects: Vec<EffectSummary>,
}

/// Serializable form of an [`EffectView`]
#[derive(Debug, Clone, Serialize)]
pub struct EffectSummary {
    pub name: &'static str,
    pub active: bool,
    pub visual: VisualState,
}

impl From<EffectView> for EffectSummary {
    fn from(view: EffectView) -> Self {
        Self {
            name: view.kind.as_str(),
            active: view.active,
            visual: view.visual,
        }
    }
}

impl<'a> FrameView<'a> {
    pub fn capture(sim: &'a Simulation) -> Self {
        Self {
            frame: sim.frame(),
            bounds: sim.bounds(),
            params: sim.params(),
            reversing: sim.is_reversing(),
            frozen: sim.is_frozen(),
            balls: sim.balls(),
            particles: sim.particles(),
            effects: sim.effect_views().into_iter().map(EffectSummary::from).collect(),
        }
    }

    /// Balls first, then live particles
    pub fn instances(&self) -> Vec<CircleInstance> {
        self.balls
            .iter()
            .map(CircleInstance::from_ball)
            .chain(
                self.particles
                    .iter()
                    .filter(|p| p.is_alive())
                    .map(CircleInstance::from_particle),
            )
            .collect()
    }

    pub fn active_effects(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.effects.iter().filter(|e| e.active).map(|e| e.name)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Raw bytes of an instance buffer
pub fn as_bytes(instances: &[CircleInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}
