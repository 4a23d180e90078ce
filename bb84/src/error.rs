use thiserror::Error;

pub type Result<T> = std::result::Result<T, Bb84Error>;

/// Input rejected at the request boundary.
///
/// The simulator itself never fails; these errors come from validating
/// requests and configuration before a run is started.
#[derive(Debug, Error)]
pub enum Bb84Error {
    #[error("{name} must lie in [0, 1], got {value}")]
    InvalidProbability { name: String, value: f64 },
    #[error("runs per level must be at least 1, got {0}")]
    InvalidRunCount(usize),
    #[error("invalid sweep: {0}")]
    InvalidSweep(String),
    #[error("invalid request: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
