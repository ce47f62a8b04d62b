//! Serialized configuration for sound types and engine files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mixer::DEFAULT_TRANSITION_DURATION_MS;

fn default_one() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_transition_ms() -> f64 {
    DEFAULT_TRANSITION_DURATION_MS
}

/// What to do when a type has no idle instance left and its cap is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StealingStrategy {
    /// Reuse the instance that started playing first.
    #[default]
    Oldest,
    /// Reuse the instance whose native volume is currently lowest.
    Quietest,
    /// Reject the new sound until an instance ends.
    None,
}

/// One or more source locations for a sound type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceList {
    One(String),
    Many(Vec<String>),
}

impl SourceList {
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(url) => std::slice::from_ref(url),
            Self::Many(urls) => urls,
        }
    }
}

impl From<&str> for SourceList {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<Vec<String>> for SourceList {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value)
    }
}

/// Random spread applied around the base volume and pitch on every play.
///
/// A range `r` yields `base - r / 2 + uniform(0, r)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Randomize {
    pub volume: f32,
    pub pitch: f32,
}

/// Static configuration of one sound type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundTypeConfig {
    /// Unique type id.
    pub id: String,
    /// If several sources are given, a random variant is picked each time the type is played.
    pub url: SourceList,
    #[serde(rename = "loop", default)]
    pub looping: bool,
    #[serde(default = "default_one")]
    pub volume: f32,
    #[serde(default = "default_one")]
    pub pitch: f32,
    #[serde(default)]
    pub randomize: Randomize,
    /// Number of pre-warmed instances and the concurrency cap. `0` means unlimited.
    #[serde(default)]
    pub max_instances: usize,
    #[serde(default)]
    pub stealing_strategy: StealingStrategy,
    /// Ramp the volume up when started by the mixer.
    #[serde(default = "default_true")]
    pub fade_in: bool,
    /// Ramp the volume down when replaced by the mixer.
    #[serde(default = "default_true")]
    pub fade_out: bool,
}

impl SoundTypeConfig {
    /// Create a type config with default playback settings.
    pub fn new(id: &str, url: impl Into<SourceList>) -> Self {
        Self {
            id: id.to_string(),
            url: url.into(),
            looping: false,
            volume: 1.0,
            pitch: 1.0,
            randomize: Randomize::default(),
            max_instances: 0,
            stealing_strategy: StealingStrategy::default(),
            fade_in: true,
            fade_out: true,
        }
    }

    pub fn with_max_instances(mut self, max_instances: usize) -> Self {
        self.max_instances = max_instances;
        self
    }

    pub fn with_stealing_strategy(mut self, strategy: StealingStrategy) -> Self {
        self.stealing_strategy = strategy;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_randomize(mut self, volume: f32, pitch: f32) -> Self {
        self.randomize = Randomize { volume, pitch };
        self
    }

    pub fn with_fades(mut self, fade_in: bool, fade_out: bool) -> Self {
        self.fade_in = fade_in;
        self.fade_out = fade_out;
        self
    }

    /// Source locations in declaration order.
    pub fn sources(&self) -> &[String] {
        self.url.as_slice()
    }
}

/// Per-call options for `play`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayOptions {
    /// Volume multiplier for this instance (default 1).
    pub volume: f32,
    /// Start offset in milliseconds (default 0).
    pub time_ms: f64,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            time_ms: 0.0,
        }
    }
}

impl PlayOptions {
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn starting_at(mut self, time_ms: f64) -> Self {
        self.time_ms = time_ms;
        self
    }
}

/// On-disk engine configuration consumed by the CLI and player binaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Overlapping sound effects served by the pooling engine.
    #[serde(default)]
    pub sounds: Vec<SoundTypeConfig>,
    /// Background tracks served by the single-track mixer.
    #[serde(default)]
    pub tracks: Vec<SoundTypeConfig>,
    #[serde(default = "default_one")]
    pub volume: f32,
    #[serde(default = "default_transition_ms")]
    pub transition_duration_ms: f64,
    /// Hold playback until the first user interaction.
    #[serde(default = "default_true")]
    pub require_consent: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sounds: Vec::new(),
            tracks: Vec::new(),
            volume: 1.0,
            transition_duration_ms: DEFAULT_TRANSITION_DURATION_MS,
            require_consent: true,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a JSON string.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] when the payload is not a valid configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a configuration file.
    ///
    /// Relative source paths are resolved against the directory holding the file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&raw)?;
        if let Some(base) = path.parent() {
            config.resolve_sources(base);
        }
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Template payload printed by `cadence create config-json`.
    pub fn template() -> Self {
        Self {
            sounds: vec![
                SoundTypeConfig::new(
                    "click",
                    vec!["sfx/click_a.wav".to_string(), "sfx/click_b.wav".to_string()],
                )
                .with_max_instances(4)
                .with_randomize(0.2, 0.1),
                SoundTypeConfig::new("alarm", "sfx/alarm.wav")
                    .with_max_instances(2)
                    .with_stealing_strategy(StealingStrategy::None),
            ],
            tracks: vec![
                SoundTypeConfig::new("menu", "music/menu.ogg")
                    .with_max_instances(1)
                    .with_looping(true),
                SoundTypeConfig::new("battle", "music/battle.ogg")
                    .with_max_instances(1)
                    .with_looping(true)
                    .with_fades(false, true),
            ],
            ..Self::default()
        }
    }

    fn resolve_sources(&mut self, base: &Path) {
        for sound in self.sounds.iter_mut().chain(self.tracks.iter_mut()) {
            let resolved = sound
                .sources()
                .iter()
                .map(|source| {
                    let candidate = Path::new(source);
                    if candidate.is_relative() {
                        base.join(candidate).to_string_lossy().into_owned()
                    } else {
                        source.clone()
                    }
                })
                .collect::<Vec<_>>();
            sound.url = match sound.url {
                SourceList::One(_) if resolved.len() == 1 => SourceList::One(resolved[0].clone()),
                _ => SourceList::Many(resolved),
            };
        }
    }
}
