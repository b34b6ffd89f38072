//! Balls randomly tunnel across the field along a straight path
//!
//! Tunnels are keyed by [`EntityId`], so a ball that shatters or is
//! restored away simply drops its tunnel on the next frame.

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Effect, EffectKind, FrameContext, GlowPoint, TunnelView, VisualState, log_toggle};
use crate::sim::pool::{BatchReport, WorkerPool};
use crate::sim::state::{Entities, EntityId, Rgba};

const TUNNEL_CHANCE: f32 = 0.1;
const PROGRESS_STEP: f32 = 0.02;
const MOTES_PER_TUNNEL: usize = 20;
const PHASE_SPEED: f32 = 0.03;

#[derive(Debug, Clone, Copy)]
struct Mote {
    pos: Vec2,
    vel: Vec2,
    hue: f32,
    alpha: f32,
    size: f32,
}

impl Mote {
    fn advance(&mut self, phase: f32) {
        self.pos += self.vel;
        self.hue = (self.hue + 0.02) % 1.0;
        self.alpha = 0.3 + ((phase * 2.0 + self.pos.x * 0.01).sin() + 1.0) * 0.3;
        self.size = 2.0 + ((phase * 3.0 + self.pos.y * 0.01).sin() + 1.0) * 2.0;
    }
}

#[derive(Debug, Clone)]
struct Tunnel {
    start: Vec2,
    end: Vec2,
    progress: f32,
    motes: Vec<Mote>,
}

impl Tunnel {
    fn open(start: Vec2, end: Vec2, rng: &mut impl Rng) -> Self {
        let motes = (0..MOTES_PER_TUNNEL)
            .map(|i| {
                let t = i as f32 / (MOTES_PER_TUNNEL - 1) as f32;
                Mote {
                    pos: start.lerp(end, t),
                    vel: Vec2::from_angle(rng.random::<f32>() * TAU) * rng.random_range(1.0..3.0),
                    hue: rng.random(),
                    alpha: rng.random_range(0.3..0.7),
                    size: rng.random_range(2.0..5.0),
                }
            })
            .collect();
        Self {
            start,
            end,
            progress: 0.0,
            motes,
        }
    }

    fn position(&self) -> Vec2 {
        self.start + (self.end - self.start) * self.progress
    }
}

pub struct QuantumTunnel {
    active: bool,
    phase: f32,
    tunnels: BTreeMap<EntityId, Tunnel>,
    rng: Pcg32,
}

impl QuantumTunnel {
    pub fn new(rng: Pcg32) -> Self {
        Self {
            active: false,
            phase: 0.0,
            tunnels: BTreeMap::new(),
            rng,
        }
    }

    /// Number of balls currently in transit
    pub fn in_flight(&self) -> usize {
        self.tunnels.len()
    }
}

impl Effect for QuantumTunnel {
    fn kind(&self) -> EffectKind {
        EffectKind::QuantumTunnel
    }

    fn set_active(&mut self, active: bool, _origin: Option<Vec2>) {
        if !active {
            self.tunnels.clear();
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
        self.phase += PHASE_SPEED;
        let phase = self.phase;
        for mote in self.tunnels.values_mut().flat_map(|t| t.motes.iter_mut()) {
            mote.advance(phase);
        }
        BatchReport::default()
    }

    fn apply_force(&mut self, ctx: &FrameContext, entities: &mut Entities) {
        // Progress lives here so frozen frames do not move tunnels along
        self.tunnels.retain(|id, tunnel| {
            tunnel.progress += PROGRESS_STEP;
            tunnel.progress < 1.0 && entities.balls.iter().any(|b| b.id == *id)
        });

        for ball in &mut entities.balls {
            if !self.tunnels.contains_key(&ball.id) && self.rng.random::<f32>() < TUNNEL_CHANCE {
                let end = Vec2::new(
                    self.rng.random::<f32>() * ctx.bounds.width,
                    self.rng.random::<f32>() * ctx.bounds.height,
                );
                let tunnel = Tunnel::open(ball.pos, end, &mut self.rng);
                log::debug!("Ball {:?} tunnelling to ({:.0}, {:.0})", ball.id, end.x, end.y);
                self.tunnels.insert(ball.id, tunnel);
            }
            if let Some(tunnel) = self.tunnels.get(&ball.id) {
                ball.pos = tunnel.position();
            }
        }
    }

    fn visual(&self) -> VisualState {
        if !self.active {
            return VisualState::None;
        }
        VisualState::Tunnels {
            tunnels: self
                .tunnels
                .values()
                .map(|t| TunnelView {
                    start: t.start,
                    end: t.end,
                    progress: t.progress,
                })
                .collect(),
            motes: self
                .tunnels
                .values()
                .flat_map(|t| t.motes.iter())
                .map(|m| GlowPoint {
                    pos: m.pos,
                    size: m.size,
                    color: Rgba::from_hsb(m.hue, 0.8, 1.0).with_alpha(m.alpha),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::test_support::ctx;
    use crate::sim::state::Bounds;
    use rand::SeedableRng;

    fn tunnel_effect() -> QuantumTunnel {
        let mut qt = QuantumTunnel::new(Pcg32::seed_from_u64(6));
        qt.set_active(true, None);
        qt
    }

    #[test]
    fn test_ball_follows_linear_path() {
        let frame = ctx(Bounds::new(800.0, 600.0));
        let mut qt = tunnel_effect();
        let mut entities = Entities::new();
        let id = entities.spawn_ball(Vec2::new(100.0, 100.0), 10.0);
        let (start, end) = (Vec2::new(100.0, 100.0), Vec2::new(600.0, 400.0));
        qt.tunnels.insert(id, Tunnel::open(start, end, &mut Pcg32::seed_from_u64(1)));

        for step in 1..=10 {
            qt.apply_force(&frame, &mut entities);
            let expected = start + (end - start) * (step as f32 * PROGRESS_STEP);
            assert!(entities.balls[0].pos.distance(expected) < 1e-2);
        }
    }

    #[test]
    fn test_tunnel_completes_after_fifty_frames() {
        let frame = ctx(Bounds::new(800.0, 600.0));
        let mut qt = tunnel_effect();
        let mut entities = Entities::new();
        let id = entities.spawn_ball(Vec2::new(100.0, 100.0), 10.0);
        qt.tunnels.insert(
            id,
            Tunnel::open(Vec2::ZERO, Vec2::new(500.0, 0.0), &mut Pcg32::seed_from_u64(1)),
        );
        let mut finished_at = None;
        for frame_no in 1..=60 {
            qt.apply_force(&frame, &mut entities);
            // A fresh tunnel may reopen at once; it starts away from the origin
            let first_open = qt.tunnels.get(&id).is_some_and(|t| t.start == Vec2::ZERO);
            if finished_at.is_none() && !first_open {
                finished_at = Some(frame_no);
            }
        }
        // Float accumulation lands the 50th step at or just past 1.0
        let done = finished_at.unwrap();
        assert!((49..=51).contains(&done), "finished at {done}");
    }

    #[test]
    fn test_at_most_one_tunnel_per_ball() {
        let bounds = Bounds::new(800.0, 600.0);
        let frame = ctx(bounds);
        let mut qt = tunnel_effect();
        let mut entities = Entities::new();
        for i in 0..5 {
            entities.spawn_ball(Vec2::new(100.0 + i as f32 * 50.0, 100.0), 10.0);
        }
        let mut ever_tunneled = false;
        for _ in 0..300 {
            qt.apply_force(&frame, &mut entities);
            assert!(qt.in_flight() <= entities.balls.len());
            ever_tunneled |= qt.in_flight() > 0;
        }
        assert!(ever_tunneled);
    }

    #[test]
    fn test_dropped_ball_loses_tunnel_and_deactivate_clears() {
        let frame = ctx(Bounds::new(800.0, 600.0));
        let mut qt = tunnel_effect();
        let mut entities = Entities::new();
        let id = entities.spawn_ball(Vec2::new(100.0, 100.0), 10.0);
        qt.tunnels.insert(
            id,
            Tunnel::open(Vec2::ZERO, Vec2::ONE, &mut Pcg32::seed_from_u64(1)),
        );
        entities.balls.clear();
        qt.apply_force(&frame, &mut entities);
        assert_eq!(qt.in_flight(), 0);

        qt.tunnels.insert(
            id,
            Tunnel::open(Vec2::ZERO, Vec2::ONE, &mut Pcg32::seed_from_u64(1)),
        );
        qt.set_active(false, None);
        assert_eq!(qt.in_flight(), 0);
        assert_eq!(qt.visual(), VisualState::None);
    }
}
