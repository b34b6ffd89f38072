//! Snapshot history for time reversal
//!
//! A bounded stack of full entity copies. Forward frames push, reversing
//! frames pop. Pushing past capacity evicts the oldest frame.

use std::collections::VecDeque;

use super::state::{Ball, Entities, Particle};

/// Value copy of every entity at one frame boundary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub balls: Vec<Ball>,
    pub particles: Vec<Particle>,
}

impl Snapshot {
    pub fn capture(entities: &Entities) -> Self {
        Self {
            balls: entities.balls.clone(),
            particles: entities.particles.clone(),
        }
    }
}

/// Bounded undo stack plus the reversing flag
#[derive(Debug, Clone)]
pub struct History {
    frames: VecDeque<Snapshot>,
    capacity: usize,
    reversing: bool,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::new(),
            capacity,
            reversing: false,
        }
    }

    pub fn is_reversing(&self) -> bool {
        self.reversing
    }

    pub fn set_reversing(&mut self, reversing: bool) {
        if reversing != self.reversing {
            log::info!(
                "Time reversal {} ({} frames stored)",
                if reversing { "engaged" } else { "released" },
                self.frames.len()
            );
        }
        self.reversing = reversing;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Push a snapshot, evicting the oldest when full
    pub fn push(&mut self, snapshot: Snapshot) {
        while self.frames.len() >= self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(snapshot);
    }

    /// Remove and return the most recent snapshot
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.frames.pop_back()
    }

    /// Most recent snapshot without removing it
    pub fn latest(&self) -> Option<&Snapshot> {
        self.frames.back()
    }

    /// Oldest snapshot still retained
    pub fn oldest(&self) -> Option<&Snapshot> {
        self.frames.front()
    }

    /// Capture the live entities. Ignored while reversing.
    pub fn save_state(&mut self, entities: &Entities) {
        if self.reversing {
            return;
        }
        self.push(Snapshot::capture(entities));
    }

    /// Replace the live entities with the previous frame.
    ///
    /// Returns false (leaving the entities untouched) when not reversing or
    /// when there is nothing left to restore.
    pub fn apply_reversal(&mut self, entities: &mut Entities) -> bool {
        if !self.reversing {
            return false;
        }
        match self.pop() {
            Some(snapshot) => {
                entities.replace(snapshot.balls, snapshot.particles);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Rgba;
    use glam::Vec2;
    use proptest::prelude::*;

    /// Snapshot holding one ball whose x position records `n`
    fn marker(n: usize) -> Snapshot {
        let mut entities = Entities::new();
        entities.spawn_ball(Vec2::new(n as f32, 0.0), 5.0);
        Snapshot::capture(&entities)
    }

    fn tag(snapshot: &Snapshot) -> usize {
        snapshot.balls[0].pos.x as usize
    }

    #[test]
    fn test_round_trip_restores_exact_state() {
        let mut entities = Entities::new();
        let id = entities.spawn_ball(Vec2::new(100.0, 120.0), 20.0);
        entities.balls[0].vel = Vec2::new(3.0, -1.5);
        entities.balls[0].color = Rgba::rgb(10, 20, 30);
        entities
            .particles
            .push(Particle::new(Vec2::new(5.0, 6.0), Vec2::new(1.0, 1.0), 40, Rgba::rgb(1, 2, 3), 4.0));
        let captured = Snapshot::capture(&entities);

        let mut history = History::new(10);
        history.save_state(&entities);

        // Mutating the live state must not reach the stored snapshot
        entities.balls[0].pos = Vec2::new(700.0, 700.0);
        entities.balls[0].radius = 3.0;
        entities.particles.clear();

        history.set_reversing(true);
        assert!(history.apply_reversal(&mut entities));
        assert_eq!(entities.balls, captured.balls);
        assert_eq!(entities.particles, captured.particles);
        assert_eq!(entities.balls[0].id, id);
    }

    #[test]
    fn test_empty_restore_is_noop() {
        let mut entities = Entities::new();
        entities.spawn_ball(Vec2::new(1.0, 2.0), 5.0);
        let before = entities.balls.clone();
        let mut history = History::new(4);
        history.set_reversing(true);
        assert!(!history.apply_reversal(&mut entities));
        assert_eq!(entities.balls, before);
    }

    #[test]
    fn test_no_capture_while_reversing() {
        let entities = Entities::new();
        let mut history = History::new(4);
        history.set_reversing(true);
        history.save_state(&entities);
        assert!(history.is_empty());
        history.set_reversing(false);
        history.save_state(&entities);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_restore_pops_newest_first() {
        let mut history = History::new(8);
        for n in 1..=3 {
            history.push(marker(n));
        }
        assert_eq!(tag(&history.pop().unwrap()), 3);
        assert_eq!(tag(&history.pop().unwrap()), 2);
        assert_eq!(tag(&history.pop().unwrap()), 1);
        assert!(history.pop().is_none());
    }

    #[test]
    fn test_capacity_plus_five_evicts_oldest() {
        let capacity = 300;
        let mut history = History::new(capacity);
        for n in 0..capacity + 5 {
            history.push(marker(n));
        }
        assert_eq!(history.len(), capacity);
        // Frames 0..5 were evicted, frame 5 is now the oldest
        assert_eq!(tag(history.oldest().unwrap()), 5);
        assert_eq!(tag(history.latest().unwrap()), capacity + 4);
    }

    proptest! {
        #[test]
        fn prop_history_never_exceeds_capacity(capacity in 1usize..40, pushes in 0usize..120) {
            let mut history = History::new(capacity);
            for n in 0..pushes {
                history.push(marker(n % 3));
            }
            prop_assert_eq!(history.len(), pushes.min(capacity));
        }
    }
}
