use std::fmt::{Display, Formatter};

use cadence_lib::{BackendError, ConfigError, EngineError};

/// Failure of a CLI command. Mapped to exit code `-1` by `main`.
#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Engine(EngineError),
    Backend(BackendError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "config: {}", err),
            Self::Engine(err) => write!(f, "engine: {}", err),
            Self::Backend(err) => write!(f, "audio output: {}", err),
            Self::Io(err) => write!(f, "io: {}", err),
            Self::Json(err) => write!(f, "json: {}", err),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl From<BackendError> for CliError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
