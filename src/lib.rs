//! Warpfield - a bounded 2D ball field bent by reality-distorting effects
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, integrator, effects, history)
//! - `settings`: Configuration and global parameter ranges
//! - `render`: Read-only per-frame view for a rendering collaborator
//! - `error`: Construction-time errors

pub mod error;
pub mod render;
pub mod settings;
pub mod sim;

pub use error::SimError;
pub use settings::{GlobalParam, SimConfig};
pub use sim::{Command, EffectKind, Simulation};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Target frame rate of the driving tick
    pub const TARGET_FPS: u32 = 120;

    /// Default field dimensions
    pub const DEFAULT_WIDTH: f32 = 1280.0;
    pub const DEFAULT_HEIGHT: f32 = 720.0;

    /// Radius of a ball spawned by a left click
    pub const DEFAULT_BALL_RADIUS: f32 = 20.0;

    /// Reflected vertical speed above which a floor bounce shatters a ball
    pub const DESTRUCTIVE_SPEED: f32 = 15.0;
    /// Shatter burst shape
    pub const SHATTER_PARTICLES: usize = 20;
    pub const SHATTER_LIFETIME: u32 = 50;
    pub const SHATTER_SIZE: f32 = 4.0;
    pub const SHATTER_MIN_SPEED: f32 = 2.0;
    pub const SHATTER_MAX_SPEED: f32 = 7.0;

    /// Space warp field around the pointer
    pub const WARP_RADIUS: f32 = 150.0;
    pub const WARP_BALL_FACTOR: f32 = 0.5;
    pub const WARP_PARTICLE_FACTOR: f32 = 0.3;

    /// Default snapshot window (seconds of undo)
    pub const MAX_REVERSAL_SECONDS: f32 = 2.5;
    /// Largest snapshot history a config may request
    pub const MAX_HISTORY_FRAMES: usize = 36_000;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}

/// Linear falloff inside a radius: 1 at the center, 0 at the edge and beyond
#[inline]
pub fn falloff(distance: f32, radius: f32) -> f32 {
    (1.0 - distance / radius).max(0.0)
}
