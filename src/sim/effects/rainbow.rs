//! Drifting hue field that recolors balls and jostles them now and then

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Effect, EffectKind, FrameContext, GlowPoint, VisualState, log_toggle};
use crate::sim::pool::{BatchReport, WorkerPool};
use crate::sim::state::{Bounds, Entities, Rgba};

const PHASE_SPEED: f32 = 0.01;
const MOTES: usize = 150;
const BLOBS: usize = 5;
const BLOB_MIN: f32 = 50.0;
const BLOB_MAX: f32 = 300.0;
const KICK_CHANCE: f32 = 0.05;
const KICK: f32 = 0.5;
const MOTE_MAX_SPEED: f32 = 3.0;

#[derive(Debug, Clone, Copy)]
struct Mote {
    pos: Vec2,
    vel: Vec2,
    size: f32,
    hue: f32,
    alpha: f32,
}

impl Mote {
    fn spawn(bounds: Bounds, rng: &mut impl Rng) -> Self {
        let angle = rng.random::<f32>() * TAU;
        Self {
            pos: Vec2::new(rng.random::<f32>() * bounds.width, rng.random::<f32>() * bounds.height),
            vel: Vec2::from_angle(angle) * rng.random_range(1.0..3.0),
            size: rng.random_range(5.0..20.0),
            hue: rng.random(),
            alpha: rng.random_range(0.4..0.8),
        }
    }

    fn advance(&mut self, bounds: Bounds, rng: &mut impl Rng) {
        self.pos += self.vel;
        self.hue = (self.hue + 0.005) % 1.0;
        for (p, v, hi) in [
            (&mut self.pos.x, &mut self.vel.x, bounds.width),
            (&mut self.pos.y, &mut self.vel.y, bounds.height),
        ] {
            if *p < 0.0 {
                *p = 0.0;
                *v *= -0.8;
            } else if *p > hi {
                *p = hi;
                *v *= -0.8;
            }
        }
        if rng.random::<f32>() < 0.02 {
            self.vel += Vec2::from_angle(rng.random::<f32>() * TAU) * KICK;
        }
        self.vel = self.vel.clamp_length_max(MOTE_MAX_SPEED);
    }
}

/// Large soft circle easing toward a random target position and size
#[derive(Debug, Clone, Copy)]
struct Blob {
    center: Vec2,
    target: Vec2,
    radius: f32,
    target_radius: f32,
    hue: f32,
    alpha: f32,
}

impl Blob {
    fn spawn(bounds: Bounds, rng: &mut impl Rng) -> Self {
        let mut point = || Vec2::new(rng.random::<f32>() * bounds.width, rng.random::<f32>() * bounds.height);
        let (center, target) = (point(), point());
        Self {
            center,
            target,
            radius: rng.random_range(BLOB_MIN..BLOB_MAX),
            target_radius: rng.random_range(BLOB_MIN..BLOB_MAX),
            hue: rng.random(),
            alpha: rng.random_range(0.2..0.5),
        }
    }

    fn advance(&mut self, bounds: Bounds, rng: &mut impl Rng) {
        let to_target = self.target - self.center;
        if to_target.length() < 1.0 {
            self.target = Vec2::new(rng.random::<f32>() * bounds.width, rng.random::<f32>() * bounds.height);
        } else {
            self.center += to_target * 0.02;
        }
        let dr = self.target_radius - self.radius;
        if dr.abs() < 1.0 {
            self.target_radius = rng.random_range(BLOB_MIN..BLOB_MAX);
        } else {
            self.radius += dr * 0.02;
        }
        self.hue = (self.hue + 0.002) % 1.0;
    }
}

pub struct Rainbow {
    active: bool,
    phase: f32,
    bounds: Bounds,
    motes: Vec<Mote>,
    blobs: Vec<Blob>,
    rng: Pcg32,
}

impl Rainbow {
    pub fn new(bounds: Bounds, rng: Pcg32) -> Self {
        Self {
            active: false,
            phase: 0.0,
            bounds,
            motes: Vec::new(),
            blobs: Vec::new(),
            rng,
        }
    }

    /// Hue of the field at a point
    fn hue_at(&self, pos: Vec2) -> f32 {
        ((self.phase % 1.0) + (pos.x + pos.y) / 1000.0).rem_euclid(1.0)
    }
}

impl Effect for Rainbow {
    fn kind(&self) -> EffectKind {
        EffectKind::Rainbow
    }

    fn set_active(&mut self, active: bool, _origin: Option<Vec2>) {
        if active && !self.active {
            let bounds = self.bounds;
            self.motes = (0..MOTES).map(|_| Mote::spawn(bounds, &mut self.rng)).collect();
            self.blobs = (0..BLOBS).map(|_| Blob::spawn(bounds, &mut self.rng)).collect();
        }
        if active != self.active {
            log_toggle(self.kind(), active);
        }
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn update(&mut self, ctx: &FrameContext, _pool: &WorkerPool) -> BatchReport {
        if !self.active {
            return BatchReport::default();
        }
        self.bounds = ctx.bounds;
        self.phase += PHASE_SPEED;
        for mote in &mut self.motes {
            mote.advance(self.bounds, &mut self.rng);
        }
        for blob in &mut self.blobs {
            blob.advance(self.bounds, &mut self.rng);
        }
        BatchReport::default()
    }

    fn apply_force(&mut self, _ctx: &FrameContext, entities: &mut Entities) {
        for ball in &mut entities.balls {
            ball.color = Rgba::from_hsb(self.hue_at(ball.pos), 0.8, 1.0);
            if self.rng.random::<f32>() < KICK_CHANCE {
                ball.add_force(Vec2::from_angle(self.rng.random::<f32>() * TAU) * KICK);
            }
        }
    }

    fn visual(&self) -> VisualState {
        if !self.active {
            return VisualState::None;
        }
        VisualState::Rainbow {
            motes: self
                .motes
                .iter()
                .map(|m| GlowPoint {
                    pos: m.pos,
                    size: m.size,
                    color: Rgba::from_hsb(m.hue, 0.8, 1.0).with_alpha(m.alpha),
                })
                .collect(),
            blobs: self
                .blobs
                .iter()
                .map(|b| GlowPoint {
                    pos: b.center,
                    size: b.radius,
                    color: Rgba::from_hsb(b.hue, 0.8, 1.0).with_alpha(b.alpha),
                })
                .collect(),
        }
    }
}
