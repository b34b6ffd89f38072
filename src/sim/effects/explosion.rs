//! Click-triggered radial blasts
//!
//! While armed, each trigger detonates immediately, even on frozen or
//! reversing frames. Stays armed until toggled off.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Effect, EffectKind, FrameContext, VisualState, log_toggle};
use crate::sim::state::{Entities, Particle, Rgba};

const RADIUS: f32 = 300.0;
const FORCE: f32 = 10.0;
const DEBRIS: usize = 30;
const DEBRIS_LIFETIME: u32 = 100;
const DEBRIS_SIZE: f32 = 5.0;

pub struct Explosion {
    active: bool,
    rng: Pcg32,
}

impl Explosion {
    pub fn new(rng: Pcg32) -> Self {
        Self { active: false, rng }
    }

    fn detonate(&mut self, at: Vec2, entities: &mut Entities) {
        for _ in 0..DEBRIS {
            let angle = self.rng.random::<f32>() * TAU;
            let speed = self.rng.random_range(5.0..15.0);
            let red = (self.rng.random::<f32>() * 255.0) as u8;
            entities.particles.push(Particle::new(
                at,
                Vec2::from_angle(angle) * speed,
                DEBRIS_LIFETIME,
                Rgba::rgb(red, 100, 50),
                DEBRIS_SIZE,
            ));
        }
        for ball in &mut entities.balls {
            let offset = ball.pos - at;
            let distance = offset.length();
            if distance < RADIUS && distance > f32::EPSILON {
                ball.add_force(offset / distance * crate::falloff(distance, RADIUS) * FORCE);
            }
        }
    }
}

impl Effect for Explosion {
    fn kind(&self) -> EffectKind {
        EffectKind::Explosion
    }

    fn set_active(&mut self, active: bool, _origin: Option<Vec2>) {
        if active != self.active {
            log_toggle(self.kind(), active);
        }
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn trigger(&mut self, at: Vec2, entities: &mut Entities) -> bool {
        if !self.active {
            return false;
        }
        log::debug!("Explosion at ({:.0}, {:.0})", at.x, at.y);
        self.detonate(at, entities);
        true
    }

    fn apply_force(&mut self, _ctx: &FrameContext, _entities: &mut Entities) {}

    fn visual(&self) -> VisualState {
        VisualState::None
    }
}
