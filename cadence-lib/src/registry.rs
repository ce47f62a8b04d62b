//! Registered sound types, keyed by id.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::SoundTypeConfig;
use crate::error::EngineError;

/// A validated sound type.
#[derive(Debug, Clone)]
pub struct SoundType {
    pub id: Arc<str>,
    pub config: SoundTypeConfig,
}

/// Immutable-after-registration store of sound types, iterated in registration order.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    order: Vec<Arc<str>>,
    types: HashMap<Arc<str>, SoundType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a type.
    ///
    /// # Errors
    /// Fails on an empty or duplicate id, a type without sources, or playback numbers that
    /// cannot be sampled or played.
    pub fn register(&mut self, config: SoundTypeConfig) -> Result<Arc<str>, EngineError> {
        if config.id.is_empty() {
            return Err(EngineError::InvalidConfig {
                type_id: config.id,
                reason: "id must not be empty".to_string(),
            });
        }
        if self.types.contains_key(config.id.as_str()) {
            return Err(EngineError::DuplicateType(config.id));
        }
        if config.sources().is_empty() {
            return Err(EngineError::InvalidConfig {
                type_id: config.id,
                reason: "at least one source url is required".to_string(),
            });
        }
        if let Err(reason) = check_numbers(&config) {
            return Err(EngineError::InvalidConfig {
                type_id: config.id,
                reason,
            });
        }
        let id: Arc<str> = Arc::from(config.id.as_str());
        self.order.push(id.clone());
        self.types.insert(
            id.clone(),
            SoundType {
                id: id.clone(),
                config,
            },
        );
        Ok(id)
    }

    pub fn get(&self, type_id: &str) -> Option<&SoundType> {
        self.types.get(type_id)
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.types.contains_key(type_id)
    }

    /// Type ids in registration order.
    pub fn ids(&self) -> &[Arc<str>] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Volume and pitch must stay finite, and the lowest pitch a play can draw must be positive.
fn check_numbers(config: &SoundTypeConfig) -> Result<(), String> {
    let randomize = config.randomize;
    if !config.volume.is_finite() {
        return Err(format!("volume must be finite, got {}", config.volume));
    }
    if !config.pitch.is_finite() || config.pitch <= 0.0 {
        return Err(format!("pitch must be above 0, got {}", config.pitch));
    }
    if !randomize.volume.is_finite() || randomize.volume < 0.0 {
        return Err(format!(
            "randomize.volume must be finite and at least 0, got {}",
            randomize.volume
        ));
    }
    if !randomize.pitch.is_finite() || randomize.pitch < 0.0 {
        return Err(format!(
            "randomize.pitch must be finite and at least 0, got {}",
            randomize.pitch
        ));
    }
    if config.pitch - randomize.pitch / 2.0 <= 0.0 {
        return Err(format!(
            "pitch {} with randomize.pitch {} can reach a rate of 0 or below",
            config.pitch, randomize.pitch
        ));
    }
    Ok(())
}
