//! Expanding rings of outward push from the field center
//!
//! Each ring carries a strength that fades linearly with radius and pulses
//! over time. Rings that fade out are pruned and a new one is launched
//! whenever the newest has travelled far enough.

use glam::Vec2;

use super::{Effect, EffectKind, FrameContext, VisualState, log_toggle};
use crate::sim::pool::{BatchReport, WorkerPool};
use crate::sim::state::{Bounds, Entities};

const WAVE_SPEED: f32 = 4.0;
const MAX_RADIUS: f32 = 800.0;
const INITIAL_RADIUS: f32 = 50.0;
const WAVE_WIDTH: f32 = 100.0;
const FORCE: f32 = 15.0;
const PHASE_SPEED: f32 = 0.05;
/// Launch the next ring once the newest passes this radius
const SPAWN_RADIUS: f32 = MAX_RADIUS * 0.3;
const PARTICLE_SCALE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Ring {
    radius: f32,
    strength: f32,
    initial_phase: f32,
}

impl Ring {
    fn new(phase: f32) -> Self {
        Self {
            radius: INITIAL_RADIUS,
            strength: 1.0,
            initial_phase: phase,
        }
    }

    fn advance(&mut self, phase: f32) {
        self.radius += WAVE_SPEED;
        let fade = (1.0 - self.radius / MAX_RADIUS).max(0.0);
        self.strength = fade * (0.5 + 0.5 * (phase * 5.0 + self.initial_phase).sin());
    }

    /// Push on something at `offset` from the center, if it rides the ring
    fn push(&self, offset: Vec2, phase: f32) -> Option<Vec2> {
        let distance = offset.length();
        let gap = (distance - self.radius).abs();
        if gap >= WAVE_WIDTH {
            return None;
        }
        let factor = (1.0 - gap / WAVE_WIDTH) * self.strength;
        let angle = offset.y.atan2(offset.x) + (phase * 3.0).sin() * 0.2;
        Some(Vec2::from_angle(angle) * factor * FORCE)
    }
}

pub struct GravityWave {
    active: bool,
    center: Vec2,
    phase: f32,
    rings: Vec<Ring>,
}

impl GravityWave {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            active: false,
            center: bounds.center(),
            phase: 0.0,
            rings: Vec::new(),
        }
    }
}

impl Effect for GravityWave {
    fn kind(&self) -> EffectKind {
        EffectKind::GravityWave
    }

    fn set_active(&mut self, active: bool, _origin: Option<Vec2>) {
        if active && !self.active {
            self.rings.clear();
            self.rings.push(Ring::new(self.phase));
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
        self.center = ctx.bounds.center();
        self.phase += PHASE_SPEED;

        self.rings.retain(|ring| ring.strength > 0.0);
        let phase = self.phase;
        for ring in &mut self.rings {
            ring.advance(phase);
        }
        if self.rings.last().is_none_or(|newest| newest.radius > SPAWN_RADIUS) {
            self.rings.push(Ring::new(phase));
        }
        BatchReport::default()
    }

    fn apply_force(&mut self, _ctx: &FrameContext, entities: &mut Entities) {
        for ring in &self.rings {
            for ball in &mut entities.balls {
                if let Some(force) = ring.push(ball.pos - self.center, self.phase) {
                    ball.add_force(force);
                }
            }
            for particle in &mut entities.particles {
                if let Some(force) = ring.push(particle.pos - self.center, self.phase) {
                    particle.add_force(force * PARTICLE_SCALE);
                }
            }
        }
    }

    fn visual(&self) -> VisualState {
        if !self.active {
            return VisualState::None;
        }
        VisualState::Rings {
            center: self.center,
            rings: self.rings.iter().map(|r| (r.radius, r.strength)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::test_support::{ctx, pool};
    use crate::sim::state::{Particle, Rgba};

    #[test]
    fn test_activation_starts_one_ring() {
        let mut wave = GravityWave::new(Bounds::new(800.0, 600.0));
        wave.set_active(true, None);
        assert_eq!(wave.rings.len(), 1);
        assert_eq!(wave.rings[0].radius, INITIAL_RADIUS);
    }

    #[test]
    fn test_spawns_when_newest_passes_threshold() {
        let bounds = Bounds::new(800.0, 600.0);
        let mut wave = GravityWave::new(bounds);
        wave.set_active(true, None);
        let (frame, pool) = (ctx(bounds), pool());
        // 50 + 4 * 47 = 238, still inside the threshold
        for _ in 0..47 {
            wave.update(&frame, &pool);
        }
        assert_eq!(wave.rings.len(), 1);
        wave.update(&frame, &pool);
        assert_eq!(wave.rings.len(), 2);
    }

    #[test]
    fn test_faded_rings_are_pruned() {
        let bounds = Bounds::new(800.0, 600.0);
        let mut wave = GravityWave::new(bounds);
        wave.set_active(true, None);
        let (frame, pool) = (ctx(bounds), pool());
        for _ in 0..400 {
            wave.update(&frame, &pool);
            assert!(wave.rings.iter().all(|r| r.radius <= MAX_RADIUS + WAVE_SPEED));
        }
        assert!(!wave.rings.is_empty());
        assert!(wave.rings.len() <= 5);
    }

    #[test]
    fn test_pushes_outward_on_the_ring() {
        let bounds = Bounds::new(800.0, 600.0);
        let mut wave = GravityWave::new(bounds);
        wave.set_active(true, None);
        let frame = ctx(bounds);
        let mut entities = Entities::new();
        // Right on the fresh ring, and far outside it
        entities.spawn_ball(bounds.center() + Vec2::new(INITIAL_RADIUS, 0.0), 5.0);
        entities.spawn_ball(bounds.center() + Vec2::new(0.0, 250.0), 5.0);
        entities.particles.push(Particle::new(
            bounds.center() + Vec2::new(INITIAL_RADIUS, 0.0),
            Vec2::ZERO,
            10,
            Rgba::rgb(0, 0, 0),
            1.0,
        ));
        wave.apply_force(&frame, &mut entities);
        assert!((entities.balls[0].vel.x - FORCE).abs() < 1e-4);
        assert_eq!(entities.balls[1].vel, Vec2::ZERO);
        assert!((entities.particles[0].vel.x - FORCE * PARTICLE_SCALE).abs() < 1e-4);
    }
}
