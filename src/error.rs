//! Errors raised while constructing a simulation
//!
//! Frame ticks never fail: parameters clamp, empty history is a no-op and
//! worker failures are logged. Only setup paths return `SimError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid config json: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown effect `{0}`")]
    UnknownEffect(String),

    #[error("unknown parameter `{0}`")]
    UnknownParam(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
