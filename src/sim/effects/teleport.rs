//! Scatter anything near the origin to a random nearby point
//!
//! Stays active only as long as its sparkle trail is visible.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Effect, EffectKind, FrameContext, GlowPoint, VisualState, log_toggle};
use crate::sim::pool::{BatchReport, WorkerPool};
use crate::sim::state::{Bounds, Entities, Rgba};

const RADIUS: f32 = 100.0;
const TRAIL: usize = 50;
const TRAIL_DECAY: f32 = 0.95;
const TRAIL_DEAD: f32 = 0.05;
const TRAIL_COLOR: Rgba = Rgba::rgb(100, 200, 255);

#[derive(Debug, Clone, Copy)]
struct Spark {
    pos: Vec2,
    vel: Vec2,
    alpha: f32,
}

pub struct Teleport {
    active: bool,
    origin: Vec2,
    trail: Vec<Spark>,
    rng: Pcg32,
}

impl Teleport {
    pub fn new(bounds: Bounds, rng: Pcg32) -> Self {
        Self {
            active: false,
            origin: bounds.center(),
            trail: Vec::new(),
            rng,
        }
    }

    /// Landing point within twice the capture radius of the origin
    fn landing(&mut self) -> Vec2 {
        let angle = self.rng.random::<f32>() * TAU;
        let distance = self.rng.random::<f32>() * RADIUS * 2.0;
        self.origin + Vec2::from_angle(angle) * distance
    }

    fn impulse(&mut self) -> Vec2 {
        let angle = self.rng.random::<f32>() * TAU;
        Vec2::from_angle(angle) * self.rng.random_range(5.0..10.0)
    }
}

impl Effect for Teleport {
    fn kind(&self) -> EffectKind {
        EffectKind::Teleport
    }

    fn set_active(&mut self, active: bool, origin: Option<Vec2>) {
        if active && !self.active {
            if let Some(origin) = origin {
                self.origin = origin;
            }
            let origin = self.origin;
            self.trail = (0..TRAIL)
                .map(|_| Spark {
                    pos: origin,
                    vel: Vec2::from_angle(self.rng.random::<f32>() * TAU) * self.rng.random_range(1.0..3.0),
                    alpha: 1.0,
                })
                .collect();
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
        self.trail.retain(|spark| spark.alpha >= TRAIL_DEAD);
        for spark in &mut self.trail {
            spark.pos += spark.vel;
            spark.alpha *= TRAIL_DECAY;
        }
        if self.trail.is_empty() {
            log::debug!("Teleport trail faded");
            self.set_active(false, None);
        }
        BatchReport::default()
    }

    fn apply_force(&mut self, _ctx: &FrameContext, entities: &mut Entities) {
        for ball in &mut entities.balls {
            if ball.pos.distance(self.origin) < RADIUS {
                ball.pos = self.landing();
                let kick = self.impulse();
                ball.add_force(kick);
            }
        }
        for particle in &mut entities.particles {
            if particle.pos.distance(self.origin) < RADIUS {
                particle.pos = self.landing();
                let kick = self.impulse();
                particle.add_force(kick);
            }
        }
    }

    fn visual(&self) -> VisualState {
        if !self.active {
            return VisualState::None;
        }
        VisualState::Field {
            center: self.origin,
            radius: RADIUS,
            motes: self
                .trail
                .iter()
                .map(|s| GlowPoint {
                    pos: s.pos,
                    size: 4.0,
                    color: TRAIL_COLOR.with_alpha(s.alpha),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::test_support::{ctx, pool};
    use crate::sim::state::Particle;
    use rand::SeedableRng;

    #[test]
    fn test_scatters_nearby_entities() {
        let bounds = Bounds::new(800.0, 600.0);
        let mut teleport = Teleport::new(bounds, Pcg32::seed_from_u64(7));
        let origin = Vec2::new(300.0, 300.0);
        teleport.set_active(true, Some(origin));

        let mut entities = Entities::new();
        entities.spawn_ball(origin + Vec2::new(10.0, 0.0), 10.0);
        entities.spawn_ball(origin + Vec2::new(150.0, 0.0), 10.0);
        entities
            .particles
            .push(Particle::new(origin, Vec2::ZERO, 20, Rgba::rgb(1, 1, 1), 2.0));
        teleport.apply_force(&ctx(bounds), &mut entities);

        let moved = &entities.balls[0];
        assert!(moved.pos.distance(origin) <= RADIUS * 2.0 + 1e-3);
        let speed = moved.vel.length();
        assert!((5.0 - 1e-3..=10.0 + 1e-3).contains(&speed));
        assert_eq!(entities.balls[1].pos, origin + Vec2::new(150.0, 0.0));
        assert_eq!(entities.balls[1].vel, Vec2::ZERO);
        assert!(entities.particles[0].vel.length() >= 5.0 - 1e-3);
    }

    #[test]
    fn test_deactivates_when_trail_fades() {
        let bounds = Bounds::new(800.0, 600.0);
        let mut teleport = Teleport::new(bounds, Pcg32::seed_from_u64(7));
        teleport.set_active(true, None);
        let (frame, pool) = (ctx(bounds), pool());
        let mut frames = 0;
        while teleport.is_active() && frames < 200 {
            teleport.update(&frame, &pool);
            frames += 1;
        }
        assert!(!teleport.is_active());
        // 0.95^n drops under 0.05 after 59 decays, then one more pass prunes
        assert!((59..=61).contains(&frames), "faded after {frames}");
        assert_eq!(teleport.visual(), VisualState::None);
    }
}
