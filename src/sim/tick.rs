//! Fixed timestep simulation tick
//!
//! [`Simulation`] owns every entity, the snapshot history, the worker pool
//! and the effect set. Input arrives as [`Command`]s between ticks; each
//! [`Simulation::tick`] advances exactly one frame and never fails.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::effects::{self, Effect, EffectKind, FrameContext, VisualState};
use super::history::History;
use super::integrate::{StepParams, apply_space_warp, shatter, step_ball, step_particle};
use super::pool::WorkerPool;
use super::state::{Ball, Bounds, Entities, EntityId, Particle};
use crate::consts::*;
use crate::error::Result;
use crate::settings::{GlobalParam, GlobalParams, SimConfig};

/// Input from the interaction layer, applied between ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Drop a resting ball
    SpawnBall { pos: Vec2, radius: f32 },
    /// Detonate at a point (only while explosions are armed)
    TriggerExplosion(Vec2),
    /// Flip an effect on or off, optionally anchored at a point
    ToggleEffect { kind: EffectKind, origin: Option<Vec2> },
    /// Nudge a global parameter; the result is clamped
    AdjustParam { param: GlobalParam, delta: f32 },
    /// Hold or release time reversal
    SetReversing(bool),
    /// Track the pointer for pointer-centred effects and space warp
    SetPointer(Vec2),
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    /// A snapshot was restored (reversing frame)
    pub restored: bool,
    /// Integration was suspended by a freeze
    pub frozen: bool,
    pub destroyed_balls: usize,
    pub spawned_particles: usize,
    pub purged_particles: usize,
    /// Worker batches that failed and left stale effect data
    pub failed_batches: usize,
}

/// Read-only per-effect state for the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct EffectView {
    pub kind: EffectKind,
    pub active: bool,
    pub visual: VisualState,
}

/// The simulation orchestrator
pub struct Simulation {
    config: SimConfig,
    bounds: Bounds,
    params: GlobalParams,
    entities: Entities,
    history: History,
    pool: WorkerPool,
    effects: Vec<Box<dyn Effect>>,
    pointer: Vec2,
    frame: u64,
    rng: Pcg32,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self> {
        let config = config.validated()?;
        let bounds = Bounds::new(config.width, config.height);
        let pool = WorkerPool::new(config.resolved_worker_threads())?;
        let history = History::new(config.history_capacity());
        log::info!(
            "Simulation ready: {}x{} field, {} fps, {} frames of history, seed {:#x}",
            bounds.width,
            bounds.height,
            config.fps,
            history.capacity(),
            config.seed
        );
        Ok(Self {
            bounds,
            params: config.params,
            entities: Entities::new(),
            history,
            pool,
            effects: effects::build_all(bounds, config.seed),
            pointer: bounds.center(),
            frame: 0,
            rng: Pcg32::seed_from_u64(config.seed),
            config,
        })
    }

    /// Apply one input command
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::SpawnBall { pos, radius } => {
                self.spawn_ball(pos, radius);
            }
            Command::TriggerExplosion(pos) => {
                self.trigger_explosion(pos);
            }
            Command::ToggleEffect { kind, origin } => {
                self.toggle_effect(kind, origin);
            }
            Command::AdjustParam { param, delta } => {
                self.adjust_param(param, delta);
            }
            Command::SetReversing(reversing) => self.set_reversing(reversing),
            Command::SetPointer(pos) => self.set_pointer(pos),
        }
    }

    pub fn spawn_ball(&mut self, pos: Vec2, radius: f32) -> EntityId {
        let id = self.entities.spawn_ball(pos, radius);
        log::debug!("Spawned ball {:?} at ({:.0}, {:.0})", id, pos.x, pos.y);
        id
    }

    /// Detonate at a point. Returns false when explosions are not armed.
    pub fn trigger_explosion(&mut self, pos: Vec2) -> bool {
        let explosion = &mut self.effects[EffectKind::Explosion.index()];
        let detonated = explosion.trigger(pos, &mut self.entities);
        if !detonated {
            log::debug!("Explosion ignored: not armed");
        }
        detonated
    }

    /// Flip an effect. Returns its new state.
    pub fn toggle_effect(&mut self, kind: EffectKind, origin: Option<Vec2>) -> bool {
        let origin = origin.unwrap_or(match kind {
            EffectKind::TimeVortex | EffectKind::TimeReversal => self.pointer,
            _ => self.bounds.center(),
        });
        let effect = self.effect_mut(kind);
        let active = !effect.is_active();
        effect.set_active(active, Some(origin));
        active
    }

    /// Toggle by name, as typed by a user or read from a script
    pub fn toggle_effect_named(&mut self, name: &str, origin: Option<Vec2>) -> Result<bool> {
        let kind = EffectKind::parse(name)?;
        Ok(self.toggle_effect(kind, origin))
    }

    /// Nudge a global parameter. Returns the stored (clamped) value.
    ///
    /// Time scale is locked while reversing.
    pub fn adjust_param(&mut self, param: GlobalParam, delta: f32) -> f32 {
        if param == GlobalParam::TimeScale && self.history.is_reversing() {
            log::debug!("Time scale locked during reversal");
            return self.params.time_scale;
        }
        let value = self.params.adjust(param, delta);
        log::info!("{} = {:.2}", param.as_str(), value);
        value
    }

    pub fn set_reversing(&mut self, reversing: bool) {
        self.history.set_reversing(reversing);
    }

    pub fn set_pointer(&mut self, pos: Vec2) {
        self.pointer = pos;
    }

    /// Advance one frame
    pub fn tick(&mut self) -> FrameReport {
        self.frame += 1;
        let mut report = FrameReport {
            frame: self.frame,
            ..Default::default()
        };

        // Reversing frames only rewind
        if self.history.is_reversing() {
            report.restored = self.history.apply_reversal(&mut self.entities);
            return report;
        }

        let ctx = FrameContext {
            bounds: self.bounds,
            params: self.params,
            pointer: self.pointer,
            frame: self.frame,
            seed: self.config.seed,
        };
        let frozen = self
            .effects
            .iter()
            .any(|e| e.is_active() && !e.should_update_physics());

        if !frozen {
            self.history.save_state(&self.entities);
        }

        // Cosmetic state advances even while frozen
        for effect in self.effects.iter_mut().filter(|e| e.is_active()) {
            let effect_ctx = ctx.for_effect(effect.kind());
            report.failed_batches += effect.update(&effect_ctx, &self.pool).failed.len();
        }

        if frozen {
            report.frozen = true;
            return report;
        }

        let particles_before = self.entities.particles.len();

        // Force phase: one effect at a time, in fixed order
        for effect in self.effects.iter_mut() {
            if effect.is_active() {
                effect.apply_force(&ctx.for_effect(effect.kind()), &mut self.entities);
            }
        }

        self.integrate(&ctx, &mut report);

        report.spawned_particles = self.entities.particles.len().saturating_sub(particles_before);
        report.purged_particles = self.entities.purge_particles();
        report
    }

    fn integrate(&mut self, ctx: &FrameContext, report: &mut FrameReport) {
        let warp = ctx.params.space_warp;
        for ball in &mut self.entities.balls {
            apply_space_warp(&mut ball.vel, ball.pos, ctx.pointer, warp, WARP_BALL_FACTOR);
        }
        for particle in &mut self.entities.particles {
            apply_space_warp(&mut particle.vel, particle.pos, ctx.pointer, warp, WARP_PARTICLE_FACTOR);
        }

        let step = StepParams {
            time_scale: ctx.params.time_scale,
            gravity: ctx.params.gravity,
            restitution: ctx.params.energy_field,
        };
        let bounds = self.bounds;

        for particle in &mut self.entities.particles {
            step_particle(particle, bounds, &step);
        }

        let mut shattered = Vec::new();
        self.entities.balls.retain_mut(|ball| {
            if step_ball(ball, bounds, &step) {
                shattered.push(*ball);
                false
            } else {
                true
            }
        });
        for ball in &shattered {
            log::debug!("Ball {:?} shattered at speed {:.1}", ball.id, ball.vel.y.abs());
            let burst = shatter(ball, &mut self.rng);
            self.entities.particles.extend(burst);
        }
        report.destroyed_balls = shattered.len();
    }

    fn effect_mut(&mut self, kind: EffectKind) -> &mut Box<dyn Effect> {
        &mut self.effects[kind.index()]
    }

    fn effect(&self, kind: EffectKind) -> &dyn Effect {
        self.effects[kind.index()].as_ref()
    }

    pub fn balls(&self) -> &[Ball] {
        &self.entities.balls
    }

    pub fn particles(&self) -> &[Particle] {
        &self.entities.particles
    }

    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    pub fn params(&self) -> GlobalParams {
        self.params
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn is_reversing(&self) -> bool {
        self.history.is_reversing()
    }

    /// Frames available to rewind
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn is_frozen(&self) -> bool {
        self.effects
            .iter()
            .any(|e| e.is_active() && !e.should_update_physics())
    }

    pub fn is_effect_active(&self, kind: EffectKind) -> bool {
        self.effect(kind).is_active()
    }

    /// Per-effect state for the renderer, in force order
    pub fn effect_views(&self) -> Vec<EffectView> {
        self.effects
            .iter()
            .map(|e| EffectView {
                kind: e.kind(),
                active: e.is_active(),
                visual: e.visual(),
            })
            .collect()
    }
}
