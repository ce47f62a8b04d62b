//! Instance resolution: idle reuse, on-demand creation, and voice stealing.

use log::debug;

use crate::config::StealingStrategy;
use crate::error::EngineError;
use crate::instance::InstanceId;

use super::Engine;

/// Pick the candidate with the lowest volume. Ties go to the earliest candidate.
pub(crate) fn pick_quietest(
    candidates: impl IntoIterator<Item = (InstanceId, f32)>,
) -> Option<InstanceId> {
    let mut quietest: Option<(InstanceId, f32)> = None;
    for (id, volume) in candidates {
        match quietest {
            Some((_, lowest)) if volume >= lowest => {}
            _ => quietest = Some((id, volume)),
        }
    }
    quietest.map(|(id, _)| id)
}

impl Engine {
    /// Find the instance that should serve the next play of `type_id`.
    ///
    /// `Ok(None)` means the type is at capacity and its policy forbids stealing. A stolen
    /// instance leaves the active set here but keeps sounding until the caller drives it.
    pub(super) fn resolve(&mut self, type_id: &str) -> Result<Option<InstanceId>, EngineError> {
        if let Some(id) = self.pools.get_mut(type_id).and_then(|pool| pool.pop_idle()) {
            if self.debug {
                debug!("reusing idle instance {} of {}", id, type_id);
            }
            return Ok(Some(id));
        }

        let (max_instances, strategy) = match self.registry.get(type_id) {
            Some(sound) => (
                sound.config.max_instances,
                sound.config.stealing_strategy,
            ),
            None => return Err(EngineError::UnknownType(type_id.to_string())),
        };

        if max_instances == 0 {
            self.prepare_instance(type_id)?;
            return Ok(self.pools.get_mut(type_id).and_then(|pool| pool.pop_idle()));
        }

        let Some(pool) = self.pools.get_mut(type_id) else {
            return Ok(None);
        };
        let victim = match strategy {
            StealingStrategy::Oldest => pool.active().first().copied(),
            StealingStrategy::Quietest => pick_quietest(pool.active().iter().map(|id| {
                let volume = self
                    .instances
                    .get(id)
                    .and_then(|instance| instance.native_volume())
                    .unwrap_or(0.0);
                (*id, volume)
            })),
            StealingStrategy::None => None,
        };

        if let Some(id) = victim {
            pool.remove_active(id);
            if self.debug {
                debug!("stealing instance {} of {} ({:?})", id, type_id, strategy);
            }
        }
        Ok(victim)
    }
}
