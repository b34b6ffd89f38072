//! Per-entity integration: gravity, wall reflection, shatter detection
//!
//! Semi-implicit Euler on a per-frame timestep. Balls bounce off all four
//! walls; particles die on contact instead.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::state::{Ball, Bounds, Particle};
use crate::consts::*;

/// Global inputs to one integration step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    /// Multiplier on gravity and displacement (1.0 = real time)
    pub time_scale: f32,
    /// Downward acceleration per frame
    pub gravity: f32,
    /// Velocity retained on a wall bounce (the energy field)
    pub restitution: f32,
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            gravity: 0.3,
            restitution: 1.0,
        }
    }
}

/// Reflect one axis against a `[lo, hi]` interval.
/// `Some(true)` for the high wall, `Some(false)` for the low wall.
#[inline]
fn reflect_axis(pos: &mut f32, vel: &mut f32, lo: f32, hi: f32, restitution: f32) -> Option<bool> {
    if *pos < lo {
        *pos = lo;
        *vel = -*vel * restitution;
        Some(false)
    } else if *pos > hi {
        *pos = hi;
        *vel = -*vel * restitution;
        Some(true)
    } else {
        None
    }
}

/// Advance a ball one frame.
///
/// Returns true when the ball hit the floor hard enough to shatter; the
/// caller removes it and spawns [`shatter`] particles in its place.
pub fn step_ball(ball: &mut Ball, bounds: Bounds, params: &StepParams) -> bool {
    let ts = params.time_scale;
    ball.vel.y += params.gravity * ts;
    ball.pos += ball.vel * ts;

    let r = ball.radius;
    // A ball wider than the field pins to the center of that axis
    let (x_lo, x_hi) = (r.min(bounds.width / 2.0), (bounds.width - r).max(bounds.width / 2.0));
    let (y_lo, y_hi) = (r.min(bounds.height / 2.0), (bounds.height - r).max(bounds.height / 2.0));

    reflect_axis(&mut ball.pos.x, &mut ball.vel.x, x_lo, x_hi, params.restitution);
    match reflect_axis(&mut ball.pos.y, &mut ball.vel.y, y_lo, y_hi, params.restitution) {
        Some(true) => ball.vel.y.abs() > DESTRUCTIVE_SPEED,
        _ => false,
    }
}

/// Advance a particle one frame. Inert particles are left untouched.
pub fn step_particle(particle: &mut Particle, bounds: Bounds, params: &StepParams) {
    if !particle.is_alive() {
        return;
    }
    let ts = params.time_scale;
    particle.vel.y += params.gravity * ts;
    particle.pos += particle.vel * ts;
    particle.lifetime -= 1;

    if !bounds.contains(particle.pos) {
        particle.lifetime = 0;
    }
}

/// Burst of particles left behind by a shattered ball
pub fn shatter(ball: &Ball, rng: &mut impl Rng) -> Vec<Particle> {
    (0..SHATTER_PARTICLES)
        .map(|_| {
            let angle = rng.random::<f32>() * TAU;
            let speed = rng.random_range(SHATTER_MIN_SPEED..SHATTER_MAX_SPEED);
            Particle::new(
                ball.pos,
                Vec2::from_angle(angle) * speed,
                SHATTER_LIFETIME,
                ball.color,
                SHATTER_SIZE,
            )
        })
        .collect()
}

/// Radial push/pull around the pointer while space warp differs from 1.0
pub fn apply_space_warp(vel: &mut Vec2, pos: Vec2, pointer: Vec2, warp: f32, factor: f32) {
    if warp == 1.0 {
        return;
    }
    let offset = pos - pointer;
    let distance = offset.length();
    if distance < WARP_RADIUS && distance > f32::EPSILON {
        let force = crate::falloff(distance, WARP_RADIUS) * (warp - 1.0) * factor;
        *vel += offset / distance * force;
    }
}
