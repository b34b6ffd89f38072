//! Orbital field: pushes at right angles to the radius so things circle

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Effect, EffectKind, FrameContext, GlowPoint, VisualState, log_toggle};
use crate::sim::pool::{BatchReport, WorkerPool};
use crate::sim::state::{Bounds, Entities, Rgba};

const RADIUS: f32 = 200.0;
const FORCE: f32 = 10.0;
const PARTICLE_SCALE: f32 = 0.5;
const MOTES: usize = 100;
const MOTE_COLOR: Rgba = Rgba::rgb(255, 100, 255);

#[derive(Debug, Clone, Copy)]
struct Mote {
    angle: f32,
    radius: f32,
    alpha: f32,
}

impl Mote {
    fn spawn(rng: &mut impl Rng) -> Self {
        Self {
            angle: rng.random::<f32>() * TAU,
            radius: rng.random::<f32>() * RADIUS,
            alpha: rng.random_range(0.3..1.0),
        }
    }
}

pub struct Magnet {
    active: bool,
    center: Vec2,
    motes: Vec<Mote>,
    rng: Pcg32,
}

impl Magnet {
    pub fn new(bounds: Bounds, rng: Pcg32) -> Self {
        Self {
            active: false,
            center: bounds.center(),
            motes: Vec::new(),
            rng,
        }
    }

    fn force_at(&self, pos: Vec2) -> Option<Vec2> {
        let offset = pos - self.center;
        let distance = offset.length();
        if distance >= RADIUS {
            return None;
        }
        let angle = offset.y.atan2(offset.x) + FRAC_PI_2;
        Some(Vec2::from_angle(angle) * crate::falloff(distance, RADIUS) * FORCE)
    }
}

impl Effect for Magnet {
    fn kind(&self) -> EffectKind {
        EffectKind::Magnet
    }

    fn set_active(&mut self, active: bool, origin: Option<Vec2>) {
        if active && !self.active {
            if let Some(origin) = origin {
                self.center = origin;
            }
            self.motes = (0..MOTES).map(|_| Mote::spawn(&mut self.rng)).collect();
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
        for mote in &mut self.motes {
            mote.angle += 0.05;
            mote.alpha *= 0.99;
            if mote.alpha < 0.1 {
                *mote = Mote::spawn(&mut self.rng);
            }
        }
        BatchReport::default()
    }

    fn apply_force(&mut self, _ctx: &FrameContext, entities: &mut Entities) {
        for ball in &mut entities.balls {
            if let Some(force) = self.force_at(ball.pos) {
                ball.add_force(force);
            }
        }
        for particle in &mut entities.particles {
            if let Some(force) = self.force_at(particle.pos) {
                particle.add_force(force * PARTICLE_SCALE);
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
                    pos: self.center + crate::polar_to_cartesian(m.radius, m.angle),
                    size: 3.0,
                    color: MOTE_COLOR.with_alpha(m.alpha),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::test_support::ctx;
    use crate::sim::state::Particle;
    use rand::SeedableRng;

    #[test]
    fn test_force_is_perpendicular() {
        let bounds = Bounds::new(800.0, 600.0);
        let mut magnet = Magnet::new(bounds, Pcg32::seed_from_u64(9));
        let center = Vec2::new(400.0, 300.0);
        magnet.set_active(true, Some(center));

        let mut entities = Entities::new();
        for offset in [Vec2::new(50.0, 0.0), Vec2::new(-30.0, 80.0), Vec2::new(0.0, -120.0)] {
            entities.spawn_ball(center + offset, 10.0);
        }
        magnet.apply_force(&ctx(bounds), &mut entities);

        for ball in &entities.balls {
            let radial = (ball.pos - center).normalize();
            assert!(ball.vel.length() > 0.0);
            assert!(ball.vel.normalize().dot(radial).abs() < 1e-4);
        }
        // Falloff: 10 * (1 - 50/200)
        assert!((entities.balls[0].vel.length() - 7.5).abs() < 1e-4);
    }

    #[test]
    fn test_particles_get_half_force() {
        let bounds = Bounds::new(800.0, 600.0);
        let mut magnet = Magnet::new(bounds, Pcg32::seed_from_u64(9));
        magnet.set_active(true, None);
        let mut entities = Entities::new();
        let pos = bounds.center() + Vec2::new(100.0, 0.0);
        entities.spawn_ball(pos, 10.0);
        entities
            .particles
            .push(Particle::new(pos, Vec2::ZERO, 5, Rgba::rgb(0, 0, 0), 1.0));
        magnet.apply_force(&ctx(bounds), &mut entities);
        let (ball, particle) = (entities.balls[0].vel, entities.particles[0].vel);
        assert!((particle.length() * 2.0 - ball.length()).abs() < 1e-4);
    }
}
