//! Screen-fixed black hole with an accretion disk and gravitational lensing
//!
//! The disk and the lensing paths are recomputed on the worker pool; the
//! force phase only reads the phase counter, so a stale batch never touches
//! ball motion.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Effect, EffectKind, FrameContext, GlowPoint, VisualState, log_toggle};
use crate::sim::pool::{BatchReport, WorkerPool};
use crate::sim::state::{Bounds, Entities, Rgba};

const DISK_PARTICLES: usize = 500;
const CORE_RADIUS: f32 = 30.0;
const HORIZON_RADIUS: f32 = 100.0;
const INFLUENCE_RADIUS: f32 = 400.0;
const FORCE: f32 = 3.0;
const PHASE_SPEED: f32 = 0.03;
const DISK_ROTATION_SPEED: f32 = 0.01;
const LENSING_PATHS: usize = 120;
const LENSING_STEP: f32 = 4.0;
/// Balls this close are pulled with triple force
const INNER_PULL_RADIUS: f32 = HORIZON_RADIUS * 1.2;
const MIN_BATCH: usize = 32;

#[derive(Debug, Clone, Copy, Default)]
struct DiskParticle {
    angle: f32,
    radius: f32,
    speed: f32,
    hue: f32,
    alpha: f32,
    distortion: f32,
    vertical_offset: f32,
}

impl DiskParticle {
    fn spawn(rng: &mut impl Rng) -> Self {
        Self {
            angle: rng.random::<f32>() * TAU,
            radius: rng.random_range(HORIZON_RADIUS..INFLUENCE_RADIUS),
            speed: 0.02 + rng.random::<f32>() * 0.03,
            hue: 0.6 + rng.random::<f32>() * 0.4,
            alpha: 0.3 + rng.random::<f32>() * 0.4,
            distortion: 0.0,
            vertical_offset: 0.0,
        }
    }

    /// 1 at the core, 0 at the edge of influence
    fn closeness(&self) -> f32 {
        1.0 - ((self.radius - CORE_RADIUS) / (INFLUENCE_RADIUS - CORE_RADIUS)).clamp(0.0, 1.0)
    }

    fn advance(&mut self, phase: f32, rng: &mut impl Rng) {
        self.angle = (self.angle + self.speed + DISK_ROTATION_SPEED) % TAU;

        let near = self.closeness();
        self.speed = 0.02 + near * 0.3;
        self.distortion =
            (self.angle * 3.0 + phase).sin() * near * 40.0 + (self.angle * 2.0 - phase).cos() * near * 20.0;
        self.vertical_offset = (self.angle * 2.0 + phase).sin() * near * 30.0
            + (self.angle * 3.0 - phase * 0.5).cos() * near * 15.0;
        self.alpha = 0.4 + near * 0.6;
        self.hue = (0.6 + near * 0.4 + (phase * 0.7 + self.angle * 2.0).sin() * 0.2).rem_euclid(1.0);

        // Spiral inward, faster near the core
        self.radius -= 0.3 * near.max(0.05);
        if self.radius < CORE_RADIUS {
            *self = Self::spawn(rng);
        }
    }

    fn screen_pos(&self, center: Vec2, phase: f32) -> Vec2 {
        let near = self.closeness();
        let angle = self.angle + (self.angle * 2.0 + phase).sin() * 0.3 * near;
        let r = self.radius + self.distortion;
        Vec2::new(
            center.x + angle.cos() * r,
            center.y + angle.sin() * r * (0.7 + self.angle.cos() * 0.3) + self.vertical_offset,
        )
    }
}

/// Polyline bent around the horizon
#[derive(Debug, Clone, Default)]
struct LensPath {
    points: Vec<Vec2>,
}

fn trace_lens_path(index: usize, center: Vec2, rotation: f32, phase: f32) -> Vec<Vec2> {
    let base = (index as f32 * 3.0).to_radians() + rotation;
    let steps = ((INFLUENCE_RADIUS - HORIZON_RADIUS) / LENSING_STEP) as usize;
    (0..=steps)
        .map(|s| {
            let r = HORIZON_RADIUS + s as f32 * LENSING_STEP;
            let warp = 1.0 - (r - HORIZON_RADIUS) / (INFLUENCE_RADIUS - HORIZON_RADIUS);
            let angle = base
                + (r * 0.03 + phase).sin() * warp
                + (r * 0.02 - phase * 0.7).cos() * 0.5 * warp;
            center + Vec2::from_angle(angle) * r
        })
        .collect()
}

pub struct BlackHole {
    active: bool,
    center: Vec2,
    phase: f32,
    disk_rotation: f32,
    disk: Vec<DiskParticle>,
    lensing: Vec<LensPath>,
    updates: u64,
    rng: Pcg32,
}

impl BlackHole {
    pub fn new(bounds: Bounds, rng: Pcg32) -> Self {
        Self {
            active: false,
            center: bounds.center(),
            phase: 0.0,
            disk_rotation: 0.0,
            disk: Vec::new(),
            lensing: Vec::new(),
            updates: 0,
            rng,
        }
    }

    fn populate(&mut self) {
        self.disk = (0..DISK_PARTICLES)
            .map(|_| DiskParticle::spawn(&mut self.rng))
            .collect();
        self.lensing = vec![LensPath::default(); LENSING_PATHS];
    }

    /// Combined pull and swirl on one entity at `offset` from the center
    fn force_at(&self, offset: Vec2) -> Option<Vec2> {
        let distance = offset.length();
        if distance >= INFLUENCE_RADIUS || distance <= f32::EPSILON {
            return None;
        }
        let base = crate::falloff(distance, INFLUENCE_RADIUS) * FORCE;
        let tangential = base * (0.5 + self.phase.sin() * 0.2);
        let radial = base * (1.0 + (self.phase * 0.5).sin() * 0.2);

        let inward = -offset / distance;
        let angle = offset.y.atan2(offset.x);
        let swirl = Vec2::new(-angle.sin(), angle.cos()) * tangential;
        let mut force = inward * radial + swirl;
        if distance < INNER_PULL_RADIUS {
            force += inward * radial * 2.0;
        }
        Some(force)
    }
}

impl Effect for BlackHole {
    fn kind(&self) -> EffectKind {
        EffectKind::BlackHole
    }

    fn set_active(&mut self, active: bool, _origin: Option<Vec2>) {
        if active && self.disk.is_empty() {
            self.populate();
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
        self.center = ctx.bounds.center();
        self.phase += PHASE_SPEED;
        self.disk_rotation += DISK_ROTATION_SPEED;
        self.updates += 1;

        let phase = self.phase;
        let mut report = pool.run_batches(&mut self.disk, MIN_BATCH, |start, batch| {
            for (i, particle) in batch.iter_mut().enumerate() {
                particle.advance(phase, &mut ctx.item_rng(start + i));
            }
        });

        // Lensing is the expensive part; every other frame is enough
        if self.updates % 2 == 1 {
            let (center, rotation) = (self.center, self.disk_rotation);
            report.merge(pool.run_batches(&mut self.lensing, 8, |start, batch| {
                for (i, path) in batch.iter_mut().enumerate() {
                    path.points = trace_lens_path(start + i, center, rotation, phase);
                }
            }));
        }
        report
    }

    fn apply_force(&mut self, _ctx: &FrameContext, entities: &mut Entities) {
        for ball in &mut entities.balls {
            if let Some(force) = self.force_at(ball.pos - self.center) {
                ball.add_force(force);
            }
        }
    }

    fn visual(&self) -> VisualState {
        if !self.active {
            return VisualState::None;
        }
        let disk = self
            .disk
            .iter()
            .map(|p| {
                let size = (8.0 + ((self.phase + p.angle).sin() + 1.0) * 3.0) * p.closeness() * 1.5;
                GlowPoint {
                    pos: p.screen_pos(self.center, self.phase),
                    size,
                    color: Rgba::from_hsb(p.hue, 0.8, 1.0).with_alpha(p.alpha),
                }
            })
            .collect();
        VisualState::BlackHole {
            center: self.center,
            horizon: HORIZON_RADIUS,
            disk,
            lensing: self.lensing.iter().map(|p| p.points.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::test_support::{ctx, pool};
    use rand::SeedableRng;

    fn black_hole(bounds: Bounds) -> BlackHole {
        let mut bh = BlackHole::new(bounds, Pcg32::seed_from_u64(3));
        bh.set_active(true, None);
        bh
    }

    #[test]
    fn test_pull_toward_center_never_removes() {
        let bounds = Bounds::new(800.0, 600.0);
        let mut bh = black_hole(bounds);
        let mut entities = Entities::new();
        entities.spawn_ball(Vec2::new(400.0, 300.0), 10.0); // dead center
        entities.spawn_ball(Vec2::new(600.0, 300.0), 10.0);
        entities.spawn_ball(Vec2::new(410.0, 300.0), 10.0);
        let frame = ctx(bounds);
        for _ in 0..200 {
            bh.apply_force(&frame, &mut entities);
        }
        assert_eq!(entities.balls.len(), 3);

        let mut entities = Entities::new();
        entities.spawn_ball(Vec2::new(600.0, 300.0), 10.0);
        bh.apply_force(&frame, &mut entities);
        // Right of center: pulled left, swirled downward
        assert!(entities.balls[0].vel.x < 0.0);
        assert!(entities.balls[0].vel.y > 0.0);
    }

    #[test]
    fn test_no_force_outside_influence() {
        let bounds = Bounds::new(2000.0, 2000.0);
        let mut bh = black_hole(bounds);
        let mut entities = Entities::new();
        entities.spawn_ball(Vec2::new(1000.0 + INFLUENCE_RADIUS + 1.0, 1000.0), 10.0);
        bh.apply_force(&ctx(bounds), &mut entities);
        assert_eq!(entities.balls[0].vel, Vec2::ZERO);
    }

    #[test]
    fn test_inner_pull_is_stronger() {
        let bh = black_hole(Bounds::new(800.0, 600.0));
        let inside = bh.force_at(Vec2::new(INNER_PULL_RADIUS - 1.0, 0.0)).unwrap();
        let outside = bh.force_at(Vec2::new(INNER_PULL_RADIUS + 1.0, 0.0)).unwrap();
        assert!(inside.x.abs() > outside.x.abs() * 2.0);
    }

    #[test]
    fn test_disk_stays_in_band() {
        let bounds = Bounds::new(800.0, 600.0);
        let mut bh = black_hole(bounds);
        let pool = pool();
        let mut frame = ctx(bounds);
        for f in 0..400 {
            frame.frame = f;
            assert!(bh.update(&frame, &pool).is_clean());
        }
        assert_eq!(bh.disk.len(), DISK_PARTICLES);
        assert!(bh
            .disk
            .iter()
            .all(|p| p.radius >= CORE_RADIUS && p.radius <= INFLUENCE_RADIUS));
    }

    #[test]
    fn test_lensing_paths_traced() {
        let bounds = Bounds::new(800.0, 600.0);
        let mut bh = black_hole(bounds);
        bh.update(&ctx(bounds), &pool());
        match bh.visual() {
            VisualState::BlackHole { lensing, disk, .. } => {
                assert_eq!(lensing.len(), LENSING_PATHS);
                assert!(lensing.iter().all(|p| p.len() == 76));
                assert_eq!(disk.len(), DISK_PARTICLES);
                // Paths start on the horizon
                let start = lensing[0][0];
                assert!((start.distance(bounds.center()) - HORIZON_RADIUS).abs() < 1e-3);
            }
            other => panic!("unexpected visual {other:?}"),
        }
    }
}
