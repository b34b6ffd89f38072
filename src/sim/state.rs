//! Entity state and core simulation types
//!
//! Balls and particles are plain `Copy` records. Everything a snapshot
//! needs to restore a frame lives here.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// 8-bit RGBA color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with alpha from a 0-1 factor
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0) as u8,
            ..self
        }
    }

    /// Color from hue/saturation/brightness, hue wrapping in [0, 1)
    pub fn from_hsb(hue: f32, saturation: f32, brightness: f32) -> Self {
        let s = saturation.clamp(0.0, 1.0);
        let v = brightness.clamp(0.0, 1.0);
        let h = (hue - hue.floor()) * 6.0;
        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        let (r, g, b) = match sector as u32 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Self::rgb(
            (r * 255.0 + 0.5) as u8,
            (g * 255.0 + 0.5) as u8,
            (b * 255.0 + 0.5) as u8,
        )
    }

    /// Normalized [r, g, b, a] for GPU upload
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

/// Color of a freshly spawned ball
pub const DEFAULT_BALL_COLOR: Rgba = Rgba::rgb(200, 100, 100);

/// Stable handle for a ball (never reused within a simulation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// A ball entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub color: Rgba,
}

impl Ball {
    pub fn new(id: EntityId, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius: radius.max(MIN_BALL_RADIUS),
            color: DEFAULT_BALL_COLOR,
        }
    }

    /// Accumulate an impulse into velocity
    #[inline]
    pub fn add_force(&mut self, force: Vec2) {
        self.vel += force;
    }
}

/// Smallest radius a ball may have
pub const MIN_BALL_RADIUS: f32 = 0.5;

/// A short-lived visual particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Frames remaining; 0 means inert and awaiting purge
    pub lifetime: u32,
    pub size: f32,
    pub color: Rgba,
}

impl Particle {
    pub fn new(pos: Vec2, vel: Vec2, lifetime: u32, color: Rgba, size: f32) -> Self {
        Self {
            pos,
            vel,
            lifetime,
            size,
            color,
        }
    }

    #[inline]
    pub fn add_force(&mut self, force: Vec2) {
        self.vel += force;
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.lifetime > 0
    }
}

/// Axis-aligned playfield, origin at the top-left, y grows downward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// True if a point lies inside the field (edges inclusive)
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

/// The live entity collections, owned by the orchestrator.
///
/// Effects only ever see `&mut Entities` inside their force phase, one
/// effect at a time.
#[derive(Debug, Clone, Default)]
pub struct Entities {
    pub balls: Vec<Ball>,
    pub particles: Vec<Particle>,
    next_id: u32,
}

impl Entities {
    pub fn new() -> Self {
        Self {
            balls: Vec::with_capacity(100),
            particles: Vec::with_capacity(500),
            next_id: 1,
        }
    }

    /// Allocate a new ball handle
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    /// Spawn a resting ball and return its handle
    pub fn spawn_ball(&mut self, pos: Vec2, radius: f32) -> EntityId {
        let id = self.next_entity_id();
        self.balls.push(Ball::new(id, pos, radius));
        id
    }

    pub fn ball(&self, id: EntityId) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    /// Drop inert particles. Returns how many were removed.
    pub fn purge_particles(&mut self) -> usize {
        let before = self.particles.len();
        self.particles.retain(Particle::is_alive);
        before - self.particles.len()
    }

    /// Replace both collections at once (ids stay monotonic)
    pub fn replace(&mut self, balls: Vec<Ball>, particles: Vec<Particle>) {
        self.balls = balls;
        self.particles = particles;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_monotonic() {
        let mut entities = Entities::new();
        let a = entities.spawn_ball(Vec2::new(10.0, 10.0), 20.0);
        let b = entities.spawn_ball(Vec2::new(20.0, 10.0), 20.0);
        assert!(b > a);
        entities.replace(Vec::new(), Vec::new());
        let c = entities.next_entity_id();
        assert!(c > b);
    }

    #[test]
    fn test_purge_particles() {
        let mut entities = Entities::new();
        let color = Rgba::rgb(1, 2, 3);
        entities.particles.push(Particle::new(Vec2::ZERO, Vec2::ZERO, 0, color, 1.0));
        entities.particles.push(Particle::new(Vec2::ZERO, Vec2::ZERO, 3, color, 1.0));
        assert_eq!(entities.purge_particles(), 1);
        assert_eq!(entities.particles.len(), 1);
    }

    #[test]
    fn test_hsb_primaries() {
        assert_eq!(Rgba::from_hsb(0.0, 1.0, 1.0), Rgba::rgb(255, 0, 0));
        assert_eq!(Rgba::from_hsb(1.0 / 3.0, 1.0, 1.0), Rgba::rgb(0, 255, 0));
        assert_eq!(Rgba::from_hsb(2.0 / 3.0, 1.0, 1.0), Rgba::rgb(0, 0, 255));
        // Hue wraps
        assert_eq!(Rgba::from_hsb(1.0, 1.0, 1.0), Rgba::from_hsb(0.0, 1.0, 1.0));
        assert_eq!(Rgba::from_hsb(0.5, 0.0, 1.0), Rgba::rgb(255, 255, 255));
    }

    #[test]
    fn test_ball_radius_positive() {
        let ball = Ball::new(EntityId(1), Vec2::ZERO, -3.0);
        assert!(ball.radius > 0.0);
    }
}
