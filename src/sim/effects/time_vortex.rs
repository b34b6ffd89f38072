//! Pointer-centred vortex that bends ball headings while keeping speed

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Effect, EffectKind, FrameContext, GlowPoint, VisualState, log_toggle};
use crate::sim::pool::{BatchReport, WorkerPool};
use crate::sim::state::{Entities, Rgba};

const RADIUS: f32 = 200.0;
const TURN: f32 = 0.1;
const MOTES: usize = 200;
const PHASE_SPEED: f32 = 0.02;

/// Mote spiralling outward from a field center, angle in degrees.
/// Shared with the force-reversal field, which draws the same spiral.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct SpiralMote {
    angle: f32,
    radius: f32,
    speed: f32,
    alpha: f32,
    hue: f32,
}

impl SpiralMote {
    pub(super) fn spawn(rng: &mut impl Rng, max_radius: f32) -> Self {
        Self {
            angle: rng.random::<f32>() * 360.0,
            radius: rng.random::<f32>() * max_radius,
            speed: 2.0 + rng.random::<f32>() * 2.0,
            alpha: 0.7 + rng.random::<f32>() * 0.3,
            hue: 0.0,
        }
    }

    /// Advance one frame; re-enters at the center once past `max_radius`
    pub(super) fn advance(&mut self, rng: &mut impl Rng, max_radius: f32, hue: (f32, f32)) {
        self.radius += self.speed;
        self.angle += self.speed * 2.0;
        if self.radius > max_radius {
            *self = Self::spawn(rng, max_radius);
            self.radius = 0.0;
        }
        self.hue = hue.0 + rng.random::<f32>() * hue.1;
    }

    pub(super) fn glow(&self, center: Vec2, phase: f32) -> GlowPoint {
        GlowPoint {
            pos: center + crate::polar_to_cartesian(self.radius, self.angle.to_radians()),
            size: 4.0 + ((phase + self.angle * 0.1).sin() + 1.0) * 2.0,
            color: Rgba::from_hsb(self.hue, 0.8, 1.0).with_alpha(self.alpha),
        }
    }
}

pub struct TimeVortex {
    active: bool,
    center: Vec2,
    phase: f32,
    motes: Vec<SpiralMote>,
    rng: Pcg32,
}

impl TimeVortex {
    pub fn new(rng: Pcg32) -> Self {
        Self {
            active: false,
            center: Vec2::ZERO,
            phase: 0.0,
            motes: Vec::new(),
            rng,
        }
    }
}

impl Effect for TimeVortex {
    fn kind(&self) -> EffectKind {
        EffectKind::TimeVortex
    }

    fn set_active(&mut self, active: bool, origin: Option<Vec2>) {
        if active && !self.active {
            self.motes = (0..MOTES)
                .map(|_| SpiralMote::spawn(&mut self.rng, RADIUS))
                .collect();
            if let Some(origin) = origin {
                self.center = origin;
            }
        }
        if active != self.active {
            log_toggle(self.kind(), active);
        }
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn update(&mut self, ctx: &FrameContext, pool: &WorkerPool) -> BatchReport {
        if !self.active {
            return BatchReport::default();
        }
        self.phase += PHASE_SPEED;
        self.center = ctx.pointer;
        // Blue while the warp pushes outward, red while it pulls
        let hue = if ctx.params.space_warp > 0.0 { (0.6, 0.2) } else { (0.0, 0.2) };
        pool.run_batches(&mut self.motes, 32, |start, batch| {
            for (i, mote) in batch.iter_mut().enumerate() {
                mote.advance(&mut ctx.item_rng(start + i), RADIUS, hue);
            }
        })
    }

    fn apply_force(&mut self, ctx: &FrameContext, entities: &mut Entities) {
        let center = ctx.pointer;
        for ball in &mut entities.balls {
            let offset = ball.pos - center;
            let distance = offset.length();
            if distance >= RADIUS {
                continue;
            }
            let factor = crate::falloff(distance, RADIUS);
            let (speed, _) = crate::cartesian_to_polar(ball.vel);
            let angle = crate::normalize_angle(offset.y.atan2(offset.x) + factor * ctx.params.space_warp * TURN);
            ball.vel = crate::polar_to_cartesian(speed, angle);
        }
    }

    fn visual(&self) -> VisualState {
        if !self.active {
            return VisualState::None;
        }
        VisualState::Field {
            center: self.center,
            radius: RADIUS,
            motes: self.motes.iter().map(|m| m.glow(self.center, self.phase)).collect(),
        }
    }
}
