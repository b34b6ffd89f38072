//! One-shot mitosis: every large ball becomes two smaller ones

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::{Effect, EffectKind, FrameContext, VisualState, log_toggle};
use crate::sim::state::{Ball, Entities, Particle, Rgba};

const MIN_RADIUS: f32 = 10.0;
const SHRINK: f32 = 1.4;
const OFFSET: f32 = 1.2;
const SPREAD: f32 = 2.0;
const SPARKS: usize = 10;
const SPARK_LIFETIME: u32 = 100;
const SPARK_SIZE: f32 = 3.0;
const SPARK_COLOR: Rgba = Rgba::rgb(255, 200, 100);

pub struct Split {
    active: bool,
    rng: Pcg32,
}

impl Split {
    pub fn new(rng: Pcg32) -> Self {
        Self { active: false, rng }
    }
}

impl Effect for Split {
    fn kind(&self) -> EffectKind {
        EffectKind::Split
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

    fn apply_force(&mut self, _ctx: &FrameContext, entities: &mut Entities) {
        if !self.active {
            return;
        }
        let parents = std::mem::take(&mut entities.balls);
        let mut balls = Vec::with_capacity(parents.len() * 2);
        let mut splits = 0;

        for parent in parents {
            if parent.radius <= MIN_RADIUS {
                balls.push(parent);
                continue;
            }
            let radius = parent.radius / SHRINK;
            let offset = Vec2::new(radius * OFFSET, 0.0);
            for side in [-1.0f32, 1.0] {
                let mut child = Ball::new(entities.next_entity_id(), parent.pos + offset * side, radius);
                child.vel = parent.vel + Vec2::new(SPREAD * side, 0.0);
                child.color = parent.color;
                balls.push(child);
            }
            for _ in 0..SPARKS {
                let angle = self.rng.random::<f32>() * TAU;
                let speed = self.rng.random_range(2.0..5.0);
                entities.particles.push(Particle::new(
                    parent.pos,
                    Vec2::from_angle(angle) * speed,
                    SPARK_LIFETIME,
                    SPARK_COLOR,
                    SPARK_SIZE,
                ));
            }
            splits += 1;
        }

        entities.balls = balls;
        log::debug!("Split {} balls", splits);
        self.set_active(false, None);
    }

    fn visual(&self) -> VisualState {
        VisualState::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::test_support::ctx;
    use crate::sim::state::Bounds;
    use rand::SeedableRng;

    #[test]
    fn test_split_children() {
        let frame = ctx(Bounds::new(800.0, 600.0));
        let mut split = Split::new(Pcg32::seed_from_u64(8));
        let mut entities = Entities::new();
        let parent_id = entities.spawn_ball(Vec2::new(400.0, 300.0), 28.0);
        entities.balls[0].vel = Vec2::new(1.0, -1.0);
        entities.balls[0].color = Rgba::rgb(1, 2, 3);
        entities.spawn_ball(Vec2::new(100.0, 100.0), 8.0);

        split.set_active(true, None);
        split.apply_force(&frame, &mut entities);

        assert_eq!(entities.balls.len(), 3);
        let (left, right, small) = (entities.balls[0], entities.balls[1], entities.balls[2]);
        assert!((left.radius - 20.0).abs() < 1e-4);
        assert!(left.pos.distance(Vec2::new(400.0 - 24.0, 300.0)) < 1e-3);
        assert!(right.pos.distance(Vec2::new(400.0 + 24.0, 300.0)) < 1e-3);
        assert_eq!(left.vel, Vec2::new(-1.0, -1.0));
        assert_eq!(right.vel, Vec2::new(3.0, -1.0));
        assert_eq!(left.color, Rgba::rgb(1, 2, 3));
        assert!(left.id != parent_id && right.id != parent_id && left.id != right.id);
        assert_eq!(small.radius, 8.0);
        assert_eq!(entities.particles.len(), SPARKS);
        assert!(entities.particles.iter().all(|p| p.lifetime == 100 && p.color == SPARK_COLOR));
    }

    #[test]
    fn test_split_is_one_shot() {
        let frame = ctx(Bounds::new(800.0, 600.0));
        let mut split = Split::new(Pcg32::seed_from_u64(8));
        let mut entities = Entities::new();
        entities.spawn_ball(Vec2::new(400.0, 300.0), 40.0);

        split.set_active(true, None);
        for _ in 0..2 {
            if split.is_active() {
                split.apply_force(&frame, &mut entities);
            }
        }
        assert!(!split.is_active());
        assert_eq!(entities.balls.len(), 2);

        // A direct second call is also a no-op
        split.apply_force(&frame, &mut entities);
        assert_eq!(entities.balls.len(), 2);
    }
}
