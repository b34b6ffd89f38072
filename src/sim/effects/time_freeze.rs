//! Stops the clock: integration is suspended while active

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Effect, EffectKind, FrameContext, GlowPoint, VisualState, log_toggle};
use crate::sim::pool::{BatchReport, WorkerPool};
use crate::sim::state::{Bounds, Entities, Rgba};

const SPARKLES: usize = 20;
const FROST: Rgba = Rgba::rgba(200, 200, 255, 30);

pub struct TimeFreeze {
    active: bool,
    bounds: Bounds,
    sparkles: Vec<GlowPoint>,
    rng: Pcg32,
}

impl TimeFreeze {
    pub fn new(bounds: Bounds, rng: Pcg32) -> Self {
        Self {
            active: false,
            bounds,
            sparkles: Vec::new(),
            rng,
        }
    }
}

impl Effect for TimeFreeze {
    fn kind(&self) -> EffectKind {
        EffectKind::TimeFreeze
    }

    fn set_active(&mut self, active: bool, _origin: Option<Vec2>) {
        if !active {
            self.sparkles.clear();
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
        self.bounds = ctx.bounds;
        let bounds = self.bounds;
        self.sparkles = (0..SPARKLES)
            .map(|_| GlowPoint {
                pos: Vec2::new(
                    self.rng.random::<f32>() * bounds.width,
                    self.rng.random::<f32>() * bounds.height,
                ),
                size: self.rng.random_range(2.0..6.0),
                color: FROST,
            })
            .collect();
        BatchReport::default()
    }

    fn apply_force(&mut self, _ctx: &FrameContext, _entities: &mut Entities) {}

    fn should_update_physics(&self) -> bool {
        !self.active
    }

    fn visual(&self) -> VisualState {
        if !self.active {
            return VisualState::None;
        }
        VisualState::Frost {
            sparkles: self.sparkles.clone(),
        }
    }
}
