//! Simulation configuration and global parameters
//!
//! Configuration is plain serde data; the global parameters are the four
//! knobs the input collaborator nudges at runtime, each with a fixed range.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Result, SimError};

/// Runtime-adjustable global parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalParam {
    /// Integration speed multiplier
    TimeScale,
    /// Downward acceleration per frame (negative pulls up)
    Gravity,
    /// Strength of the radial warp field around the pointer (1.0 = off)
    SpaceWarp,
    /// Restitution applied on wall bounces
    EnergyField,
}

impl GlobalParam {
    pub const ALL: [GlobalParam; 4] = [
        GlobalParam::TimeScale,
        GlobalParam::Gravity,
        GlobalParam::SpaceWarp,
        GlobalParam::EnergyField,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalParam::TimeScale => "time_scale",
            GlobalParam::Gravity => "gravity",
            GlobalParam::SpaceWarp => "space_warp",
            GlobalParam::EnergyField => "energy_field",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "time_scale" | "time" => Ok(GlobalParam::TimeScale),
            "gravity" => Ok(GlobalParam::Gravity),
            "space_warp" | "warp" => Ok(GlobalParam::SpaceWarp),
            "energy_field" | "energy" => Ok(GlobalParam::EnergyField),
            _ => Err(SimError::UnknownParam(s.to_string())),
        }
    }

    /// Inclusive (min, max) range
    pub fn range(&self) -> (f32, f32) {
        match self {
            GlobalParam::TimeScale => (0.01, 10.0),
            GlobalParam::Gravity => (-5.0, 5.0),
            GlobalParam::SpaceWarp => (-5.0, 5.0),
            GlobalParam::EnergyField => (0.1, 5.0),
        }
    }

    /// Increment used by a single key press
    pub fn step(&self) -> f32 {
        0.1
    }

    pub fn clamp(&self, value: f32) -> f32 {
        let (min, max) = self.range();
        if value.is_nan() {
            return self.default_value().clamp(min, max);
        }
        value.clamp(min, max)
    }

    pub fn default_value(&self) -> f32 {
        match self {
            GlobalParam::TimeScale => 1.0,
            GlobalParam::Gravity => 0.3,
            GlobalParam::SpaceWarp => 1.0,
            GlobalParam::EnergyField => 1.0,
        }
    }
}

/// Current values of the global parameters (always within range)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalParams {
    pub time_scale: f32,
    pub gravity: f32,
    pub space_warp: f32,
    pub energy_field: f32,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            time_scale: GlobalParam::TimeScale.default_value(),
            gravity: GlobalParam::Gravity.default_value(),
            space_warp: GlobalParam::SpaceWarp.default_value(),
            energy_field: GlobalParam::EnergyField.default_value(),
        }
    }
}

impl GlobalParams {
    pub fn get(&self, param: GlobalParam) -> f32 {
        match param {
            GlobalParam::TimeScale => self.time_scale,
            GlobalParam::Gravity => self.gravity,
            GlobalParam::SpaceWarp => self.space_warp,
            GlobalParam::EnergyField => self.energy_field,
        }
    }

    /// Set a parameter, clamped to its range. Returns the stored value.
    pub fn set(&mut self, param: GlobalParam, value: f32) -> f32 {
        let value = param.clamp(value);
        match param {
            GlobalParam::TimeScale => self.time_scale = value,
            GlobalParam::Gravity => self.gravity = value,
            GlobalParam::SpaceWarp => self.space_warp = value,
            GlobalParam::EnergyField => self.energy_field = value,
        }
        value
    }

    /// Nudge a parameter by `delta`, clamped to its range
    pub fn adjust(&mut self, param: GlobalParam, delta: f32) -> f32 {
        self.set(param, self.get(param) + delta)
    }

    /// Re-clamp every field (after deserializing untrusted values)
    pub fn clamped(mut self) -> Self {
        for param in GlobalParam::ALL {
            self.set(param, self.get(param));
        }
        self
    }
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Playfield width
    pub width: f32,
    /// Playfield height
    pub height: f32,
    /// Frame rate the tick is driven at
    pub fps: u32,
    /// Seconds of history kept for time reversal
    pub max_reversal_seconds: f32,
    /// Seed for every random stream in the simulation
    pub seed: u64,
    /// Worker threads for batched effect work (0 = hardware concurrency)
    pub worker_threads: usize,
    /// Starting global parameters
    pub params: GlobalParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: TARGET_FPS,
            max_reversal_seconds: MAX_REVERSAL_SECONDS,
            seed: 0x5eed_ba11,
            worker_threads: 0,
            params: GlobalParams::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validated()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configs the simulation cannot run with; clamp the rest
    pub fn validated(mut self) -> Result<Self> {
        if !(self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0)
        {
            return Err(SimError::InvalidConfig(format!(
                "field must have positive size, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(SimError::InvalidConfig("fps must be positive".into()));
        }
        if !(self.max_reversal_seconds.is_finite() && self.max_reversal_seconds > 0.0) {
            return Err(SimError::InvalidConfig(
                "max_reversal_seconds must be positive and finite".into(),
            ));
        }
        let frames = self.fps as f64 * self.max_reversal_seconds as f64;
        if frames.round() > MAX_HISTORY_FRAMES as f64 {
            return Err(SimError::InvalidConfig(format!(
                "reversal window of {frames:.0} frames exceeds {MAX_HISTORY_FRAMES}"
            )));
        }
        let clamped = self.params.clamped();
        if clamped != self.params {
            log::warn!("Global parameters out of range, clamped to {:?}", clamped);
        }
        self.params = clamped;
        Ok(self)
    }

    /// Snapshot history capacity: one entry per frame of the reversal window
    pub fn history_capacity(&self) -> usize {
        ((self.fps as f32 * self.max_reversal_seconds).round() as usize).max(1)
    }

    /// Resolved worker thread count
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_history_capacity() {
        let config = SimConfig::default();
        assert_eq!(config.history_capacity(), 300);
    }

    #[test]
    fn test_params_clamp_on_adjust() {
        let mut params = GlobalParams::default();
        assert_eq!(params.adjust(GlobalParam::EnergyField, -10.0), 0.1);
        assert_eq!(params.adjust(GlobalParam::Gravity, 100.0), 5.0);
        assert_eq!(params.set(GlobalParam::TimeScale, 0.0), 0.01);
        assert_eq!(params.set(GlobalParam::SpaceWarp, f32::NAN), 1.0);
    }

    #[test]
    fn test_param_parse() {
        assert_eq!(GlobalParam::parse("Gravity").unwrap(), GlobalParam::Gravity);
        assert_eq!(
            GlobalParam::parse("space-warp").unwrap(),
            GlobalParam::SpaceWarp
        );
        assert!(GlobalParam::parse("density").is_err());
        for param in GlobalParam::ALL {
            assert_eq!(GlobalParam::parse(param.as_str()).unwrap(), param);
        }
    }

    #[test]
    fn test_config_json_partial() {
        let config = SimConfig::from_json(r#"{ "width": 800, "height": 600, "params": { "gravity": 9.0 } }"#)
            .unwrap();
        assert_eq!(config.width, 800.0);
        assert_eq!(config.fps, 120);
        assert_eq!(config.params.gravity, 5.0);
        assert_eq!(config.params.energy_field, 1.0);
    }

    #[test]
    fn test_config_rejects_zero_fps() {
        let err = SimConfig::from_json(r#"{ "fps": 0 }"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
        assert!(matches!(
            SimConfig::from_json("not json").unwrap_err(),
            SimError::ConfigParse(_)
        ));
    }

    #[test]
    fn test_config_rejects_oversized_history() {
        for json in [
            r#"{ "max_reversal_seconds": 1e20, "worker_threads": 1 }"#,
            r#"{ "max_reversal_seconds": 1000000.0 }"#,
        ] {
            assert!(matches!(
                SimConfig::from_json(json).unwrap_err(),
                SimError::InvalidConfig(_)
            ));
        }
        // Exactly at the ceiling is still accepted
        let at_limit = SimConfig {
            fps: 120,
            max_reversal_seconds: 300.0,
            ..Default::default()
        };
        assert_eq!(at_limit.validated().unwrap().history_capacity(), MAX_HISTORY_FRAMES);
    }

    #[test]
    fn test_config_rejects_non_finite_values() {
        for config in [
            SimConfig {
                width: f32::INFINITY,
                ..Default::default()
            },
            SimConfig {
                height: f32::NAN,
                ..Default::default()
            },
            SimConfig {
                max_reversal_seconds: f32::INFINITY,
                ..Default::default()
            },
        ] {
            assert!(matches!(config.validated(), Err(SimError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_config_round_trip() {
        let config = SimConfig {
            seed: 42,
            worker_threads: 3,
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        let back = SimConfig::from_json(&json).unwrap();
        assert_eq!(back.seed, 42);
        assert_eq!(back.worker_threads, 3);
        assert_eq!(back.resolved_worker_threads(), 3);
    }
}
