/// Error types for the driver and config layers.
/// The simulation itself is infallible: intents that don't apply
/// to the current phase are ignored, not reported.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    /// Terminal or log-file I/O.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The OS random source could not seed the game RNG.
    /// Gameplay cannot proceed without randomness.
    #[error("random source unavailable: {0}")]
    Entropy(#[from] rand::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0}")]
    Invalid(&'static str),
}
