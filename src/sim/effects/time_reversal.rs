//! Pointer-centred field that flips ball velocities with a slight curl
//!
//! Unrelated to the snapshot undo in `history`; this one only pushes.

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use rand_pcg::Pcg32;

use super::time_vortex::SpiralMote;
use super::{Effect, EffectKind, FrameContext, VisualState, log_toggle};
use crate::sim::pool::{BatchReport, WorkerPool};
use crate::sim::state::Entities;

const RADIUS: f32 = 300.0;
const CURL: f32 = 0.1;
const MOTES: usize = 200;
const PHASE_SPEED: f32 = 0.02;
/// Violet
const MOTE_HUE: (f32, f32) = (0.8, 0.2);

pub struct TimeReversal {
    active: bool,
    center: Vec2,
    phase: f32,
    motes: Vec<SpiralMote>,
    rng: Pcg32,
}

impl TimeReversal {
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

impl Effect for TimeReversal {
    fn kind(&self) -> EffectKind {
        EffectKind::TimeReversal
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
        pool.run_batches(&mut self.motes, 32, |start, batch| {
            for (i, mote) in batch.iter_mut().enumerate() {
                mote.advance(&mut ctx.item_rng(start + i), RADIUS, MOTE_HUE);
            }
        })
    }

    fn apply_force(&mut self, ctx: &FrameContext, entities: &mut Entities) {
        for ball in &mut entities.balls {
            let offset = ball.pos - ctx.pointer;
            let distance = offset.length();
            if distance >= RADIUS {
                continue;
            }
            let angle = offset.y.atan2(offset.x) + FRAC_PI_2;
            ball.vel = -ball.vel + Vec2::from_angle(angle) * CURL * crate::falloff(distance, RADIUS);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::test_support::ctx;
    use crate::sim::state::Bounds;
    use rand::SeedableRng;

    #[test]
    fn test_inverts_velocity_with_curl() {
        let frame = ctx(Bounds::new(800.0, 600.0));
        let mut reversal = TimeReversal::new(Pcg32::seed_from_u64(2));
        reversal.set_active(true, None);

        let mut entities = Entities::new();
        entities.spawn_ball(frame.pointer + Vec2::new(150.0, 0.0), 10.0);
        entities.balls[0].vel = Vec2::new(3.0, -2.0);
        reversal.apply_force(&frame, &mut entities);

        let vel = entities.balls[0].vel;
        assert!((vel.x - -3.0).abs() < 1e-5);
        // Curl points along +y for a ball right of the pointer
        assert!((vel.y - (2.0 + 0.05)).abs() < 1e-5);
    }

    #[test]
    fn test_far_ball_untouched() {
        let frame = ctx(Bounds::new(2000.0, 2000.0));
        let mut reversal = TimeReversal::new(Pcg32::seed_from_u64(2));
        reversal.set_active(true, None);
        let mut entities = Entities::new();
        entities.spawn_ball(frame.pointer + Vec2::new(0.0, 301.0), 10.0);
        entities.balls[0].vel = Vec2::new(1.0, 1.0);
        reversal.apply_force(&frame, &mut entities);
        assert_eq!(entities.balls[0].vel, Vec2::new(1.0, 1.0));
    }
}
