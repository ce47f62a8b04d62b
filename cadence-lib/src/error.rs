use std::fmt::{Display, Formatter};

/// Error raised by a native playback backend.
#[derive(Debug)]
pub enum BackendError {
    /// No output device or stream could be opened.
    OutputUnavailable(String),
    /// A source location could not be opened or decoded.
    Source { source: String, reason: String },
    /// The platform refused to start playback.
    Rejected(String),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutputUnavailable(err) => write!(f, "output unavailable: {}", err),
            Self::Source { source, reason } => {
                write!(f, "cannot load source {}: {}", source, reason)
            }
            Self::Rejected(err) => write!(f, "playback rejected: {}", err),
        }
    }
}

impl std::error::Error for BackendError {}

/// Error type for engine construction and misuse.
///
/// Running out of voices is not an error: `play` reports it as `Ok(None)`.
#[derive(Debug)]
pub enum EngineError {
    /// The type id was never registered. This is a caller bug.
    UnknownType(String),
    /// Two configurations share the same type id.
    DuplicateType(String),
    /// A configuration cannot be registered as given.
    InvalidConfig { type_id: String, reason: String },
    Backend(BackendError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownType(id) => write!(f, "unknown audio type: {}", id),
            Self::DuplicateType(id) => write!(f, "duplicate audio type: {}", id),
            Self::InvalidConfig { type_id, reason } => {
                write!(f, "invalid audio type {}: {}", type_id, reason)
            }
            Self::Backend(err) => write!(f, "backend error: {}", err),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BackendError> for EngineError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

/// Error type for reading engine configuration files.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Parse(err) => write!(f, "invalid config json: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}
