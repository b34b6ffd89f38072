//! Warpfield headless driver
//!
//! Runs a short scripted session against the simulation and logs what each
//! phase did. Set `WARPFIELD_CONFIG` to a JSON config file to override the
//! defaults, and `WARPFIELD_DUMP=1` to print the final frame as JSON.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Warpfield (native) starting...");

    let config = native::load_config();
    let mut sim = match warpfield::Simulation::new(config) {
        Ok(sim) => sim,
        Err(e) => {
            log::error!("Failed to start simulation: {e}");
            std::process::exit(1);
        }
    };

    native::run_script(&mut sim);

    let view = warpfield::render::FrameView::capture(&sim);
    let instances = view.instances();
    log::info!(
        "Final frame {}: {} balls, {} particles, {} instance bytes",
        view.frame,
        view.balls.len(),
        view.particles.len(),
        warpfield::render::as_bytes(&instances).len()
    );
    if std::env::var("WARPFIELD_DUMP").is_ok_and(|v| v == "1") {
        match view.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Failed to serialize frame: {e}"),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use glam::Vec2;
    use warpfield::consts::DEFAULT_BALL_RADIUS;
    use warpfield::{Command, EffectKind, GlobalParam, SimConfig, Simulation};

    pub fn load_config() -> SimConfig {
        let Ok(path) = std::env::var("WARPFIELD_CONFIG") else {
            return SimConfig::default();
        };
        let loaded = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| SimConfig::from_json(&json).map_err(|e| e.to_string()));
        match loaded {
            Ok(config) => {
                log::info!("Loaded config from {path}");
                config
            }
            Err(e) => {
                log::error!("Ignoring config {path}: {e}");
                SimConfig::default()
            }
        }
    }

    /// Advance `frames` ticks and log the totals
    fn run(sim: &mut Simulation, label: &str, frames: u32) {
        let mut destroyed = 0;
        let mut spawned = 0;
        let mut failed = 0;
        for _ in 0..frames {
            let report = sim.tick();
            destroyed += report.destroyed_balls;
            spawned += report.spawned_particles;
            failed += report.failed_batches;
        }
        log::info!(
            "{label}: frame {}, {} balls, {} particles (+{spawned} spawned, {destroyed} shattered, {failed} failed batches)",
            sim.frame(),
            sim.balls().len(),
            sim.particles().len()
        );
    }

    pub fn run_script(sim: &mut Simulation) {
        let bounds = sim.bounds();
        let center = bounds.center();

        for i in 0..8 {
            let x = bounds.width * (i as f32 + 1.0) / 9.0;
            sim.apply(Command::SpawnBall {
                pos: Vec2::new(x, bounds.height * 0.25),
                radius: DEFAULT_BALL_RADIUS,
            });
        }
        run(sim, "Free fall", 120);

        sim.apply(Command::SetPointer(center));
        sim.apply(Command::ToggleEffect {
            kind: EffectKind::BlackHole,
            origin: None,
        });
        sim.apply(Command::ToggleEffect {
            kind: EffectKind::Rainbow,
            origin: None,
        });
        run(sim, "Black hole", 180);

        sim.apply(Command::ToggleEffect {
            kind: EffectKind::BlackHole,
            origin: None,
        });
        sim.apply(Command::ToggleEffect {
            kind: EffectKind::Explosion,
            origin: None,
        });
        sim.apply(Command::TriggerExplosion(center));
        sim.apply(Command::AdjustParam {
            param: GlobalParam::Gravity,
            delta: 0.5,
        });
        run(sim, "Explosion", 120);

        sim.apply(Command::ToggleEffect {
            kind: EffectKind::Split,
            origin: None,
        });
        sim.apply(Command::ToggleEffect {
            kind: EffectKind::TimeFreeze,
            origin: None,
        });
        run(sim, "Frozen", 60);
        sim.apply(Command::ToggleEffect {
            kind: EffectKind::TimeFreeze,
            origin: None,
        });

        sim.apply(Command::SetReversing(true));
        run(sim, "Reversing", 240);
        sim.apply(Command::SetReversing(false));
        log::info!("History after reversal: {} snapshots", sim.history_len());

        run(sim, "Settle", 120);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
