//! Bubble of thick time: velocities are damped toward the center

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Effect, EffectKind, FrameContext, GlowPoint, VisualState, log_toggle};
use crate::sim::pool::{BatchReport, WorkerPool};
use crate::sim::state::{Bounds, Entities, Rgba};

const RADIUS: f32 = 150.0;
const SLOW_FACTOR: f32 = 0.2;
const MOTES: usize = 100;
const MOTE_DRIFT: f32 = 0.2;
const MOTE_COLOR: Rgba = Rgba::rgb(100, 255, 200);

#[derive(Debug, Clone, Copy)]
struct Mote {
    pos: Vec2,
    vel: Vec2,
    alpha: f32,
}

impl Mote {
    fn spawn(center: Vec2, rng: &mut impl Rng) -> Self {
        let dir = Vec2::from_angle(rng.random::<f32>() * TAU);
        Self {
            pos: center + dir * rng.random::<f32>() * RADIUS,
            vel: dir * rng.random_range(0.5..1.5),
            alpha: rng.random_range(0.3..1.0),
        }
    }
}

/// Velocity multiplier at a distance: the slow factor at the center, 1 at the edge
pub fn damping(distance: f32) -> f32 {
    1.0 - crate::falloff(distance, RADIUS) * (1.0 - SLOW_FACTOR)
}

pub struct SlowMotion {
    active: bool,
    center: Vec2,
    motes: Vec<Mote>,
    rng: Pcg32,
}

impl SlowMotion {
    pub fn new(bounds: Bounds, rng: Pcg32) -> Self {
        Self {
            active: false,
            center: bounds.center(),
            motes: Vec::new(),
            rng,
        }
    }
}

impl Effect for SlowMotion {
    fn kind(&self) -> EffectKind {
        EffectKind::SlowMotion
    }

    fn set_active(&mut self, active: bool, origin: Option<Vec2>) {
        if active && !self.active {
            if let Some(origin) = origin {
                self.center = origin;
            }
            let center = self.center;
            self.motes = (0..MOTES).map(|_| Mote::spawn(center, &mut self.rng)).collect();
        }
        if active != self.active {
            log_toggle(self.kind(), active);
        }
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn update(&mut self, _ctx: &FrameContext, _pool: &WorkerPool) -> BatchReport {
        if !self.active {
            return BatchReport::default();
        }
        let center = self.center;
        for mote in &mut self.motes {
            mote.pos += mote.vel * MOTE_DRIFT;
            if mote.pos.distance(center) > RADIUS || mote.alpha < 0.1 {
                *mote = Mote::spawn(center, &mut self.rng);
            } else {
                mote.alpha *= 0.99;
            }
        }
        BatchReport::default()
    }

    fn apply_force(&mut self, _ctx: &FrameContext, entities: &mut Entities) {
        for ball in &mut entities.balls {
            let distance = ball.pos.distance(self.center);
            if distance < RADIUS {
                ball.vel *= damping(distance);
            }
        }
        for particle in &mut entities.particles {
            let distance = particle.pos.distance(self.center);
            if distance < RADIUS {
                particle.vel *= damping(distance);
            }
        }
    }

    fn visual(&self) -> VisualState {
        if !self.active {
            return VisualState::None;
        }
        VisualState::Field {
            center: self.center,
            radius: RADIUS,
            motes: self
                .motes
                .iter()
                .map(|m| GlowPoint {
                    pos: m.pos,
                    size: 3.0,
                    color: MOTE_COLOR.with_alpha(m.alpha),
                })
                .collect(),
        }
    }
}
