//! Instance pooling and voice stealing.
//!
//! An [`Engine`] owns every instance it creates. Each registered type has an idle cache and an
//! insertion-ordered active set; `play` resolves a request into an instance by reusing an idle
//! one, creating one on demand for unlimited types, or stealing an active one according to the
//! type's [`StealingStrategy`](crate::config::StealingStrategy).

mod pool;
mod steal;
mod volume;

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::backend::{PlaybackBackend, UnitSignal};
use crate::config::{PlayOptions, SoundTypeConfig};
use crate::error::EngineError;
use crate::events::{AudioEvent, AudioEventKind, EventBus, ListenerToken};
use crate::host::{ConsentState, HostSignal};
use crate::instance::{InstanceId, PlaybackHandle};
use crate::registry::TypeRegistry;

use pool::TypePool;
use volume::GlobalVolume;

pub use volume::perceptual_factor;

/// Construction options for an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    /// Defer playback until the first [`HostSignal::UserInteraction`].
    pub require_consent: bool,
    /// Initial global volume setting in `[0, 1]`.
    pub volume: f32,
    /// Verbose pool tracing through `log::debug!`.
    pub debug: bool,
    /// Seed for volume, pitch, and variant draws. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            require_consent: true,
            volume: 1.0,
            debug: false,
            seed: None,
        }
    }
}

impl EngineOptions {
    pub fn without_consent(mut self) -> Self {
        self.require_consent = false;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Pooling engine for a set of sound types.
pub struct Engine {
    registry: TypeRegistry,
    pools: HashMap<Arc<str>, TypePool>,
    instances: HashMap<InstanceId, PlaybackHandle>,
    backend: Box<dyn PlaybackBackend>,
    bus: EventBus,
    rng: StdRng,
    next_id: u64,
    consent: ConsentState,
    volume: GlobalVolume,
    debug: bool,
    disposed: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("types", &self.registry.len())
            .field("instances", &self.instances.len())
            .field("consent", &self.consent)
            .field("volume", &self.volume.setting())
            .field("visible", &self.volume.visible())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl Engine {
    /// Register `configs` and pre-warm `max_instances` idle instances for every capped type.
    ///
    /// # Errors
    /// Fails on invalid or duplicate type configs, or when the backend cannot create a unit.
    pub fn new<B>(
        configs: impl IntoIterator<Item = SoundTypeConfig>,
        backend: B,
        options: EngineOptions,
    ) -> Result<Self, EngineError>
    where
        B: PlaybackBackend + 'static,
    {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let consent = if options.require_consent {
            ConsentState::Pending
        } else {
            ConsentState::Granted
        };

        let mut engine = Self {
            registry: TypeRegistry::new(),
            pools: HashMap::new(),
            instances: HashMap::new(),
            backend: Box::new(backend),
            bus: EventBus::new(),
            rng,
            next_id: 0,
            consent,
            volume: GlobalVolume::new(options.volume),
            debug: options.debug,
            disposed: false,
        };

        for config in configs {
            let id = engine.registry.register(config)?;
            engine.pools.insert(id, TypePool::default());
        }

        let prewarm: Vec<(Arc<str>, usize)> = engine
            .registry
            .ids()
            .iter()
            .filter_map(|id| {
                engine
                    .registry
                    .get(id)
                    .map(|sound| (id.clone(), sound.config.max_instances))
            })
            .collect();
        for (type_id, count) in prewarm {
            for _ in 0..count {
                engine.prepare_instance(&type_id)?;
            }
        }

        Ok(engine)
    }

    /// Create an idle instance of `type_id` with one native unit per source.
    ///
    /// # Errors
    /// [`EngineError::UnknownType`] for unregistered ids, or a backend error if a unit cannot
    /// be created.
    pub fn prepare_instance(&mut self, type_id: &str) -> Result<InstanceId, EngineError> {
        let Some(sound) = self.registry.get(type_id) else {
            error!("cannot prepare instance of unknown audio type {}", type_id);
            return Err(EngineError::UnknownType(type_id.to_string()));
        };
        let type_arc = sound.id.clone();
        let looping = sound.config.looping;
        let sources = sound.config.sources().to_vec();

        let mut units = Vec::with_capacity(sources.len());
        for source in &sources {
            match self.backend.create_unit(source, looping) {
                Ok(unit) => units.push(unit),
                Err(err) => {
                    error!("failed to create unit for {}: {}", type_id, err);
                    for unit in units.iter_mut() {
                        unit.remove();
                    }
                    return Err(err.into());
                }
            }
        }

        self.next_id += 1;
        let id = InstanceId::new(self.next_id);
        let variant = self.rng.gen_range(0..units.len());
        self.instances
            .insert(id, PlaybackHandle::new(id, type_arc.clone(), variant, units));
        self.pools.entry(type_arc).or_default().push_idle(id);

        if self.debug {
            debug!("prepared instance {} of {}", id, type_id);
        }
        Ok(id)
    }

    /// Play a sound of `type_id`.
    ///
    /// Returns `Ok(None)` when the type is at capacity and its policy forbids stealing.
    ///
    /// # Errors
    /// [`EngineError::UnknownType`] for unregistered ids.
    pub fn play(
        &mut self,
        type_id: &str,
        options: PlayOptions,
    ) -> Result<Option<InstanceId>, EngineError> {
        let Some(id) = self.resolve(type_id)? else {
            if self.debug {
                debug!(
                    "cannot play another instance of {}: max instances reached",
                    type_id
                );
            }
            return Ok(None);
        };

        let (base_volume, pitch, randomize, variant_count) = match self.registry.get(type_id) {
            Some(sound) => (
                sound.config.volume,
                sound.config.pitch,
                sound.config.randomize,
                sound.config.sources().len(),
            ),
            None => return Err(EngineError::UnknownType(type_id.to_string())),
        };

        let base_volume = base_volume + self.spread(randomize.volume);
        let pitch = pitch + self.spread(randomize.pitch);
        let variant = self.rng.gen_range(0..variant_count.max(1));
        let factor = self.volume.factor();
        let consent = self.consent.is_granted();

        if let Some(pool) = self.pools.get_mut(type_id) {
            pool.push_active(id);
        }

        let Some(instance) = self.instances.get_mut(&id) else {
            warn!("instance {} vanished while resolving {}", id, type_id);
            return Ok(None);
        };

        instance.set_base_volume(base_volume);
        instance.set_volume_multiplier(options.volume);
        instance.set_pitch(pitch);
        let native_volume = instance.effective_volume() * factor;
        for unit in instance.units_mut() {
            unit.set_volume(native_volume);
            unit.set_playback_rate(pitch);
        }

        if let Some(previous) = instance.active_index() {
            if previous != variant {
                if let Some(unit) = instance.unit_mut(previous) {
                    unit.pause();
                }
            }
        }
        instance.set_variant(variant);
        instance.activate_variant();

        if let Some(unit) = instance.active_unit_mut() {
            unit.set_current_time(options.time_ms.max(0.0) / 1000.0);
            if consent {
                if let Err(err) = unit.play() {
                    error!("playback of {} was rejected: {}", id, err);
                }
            }
        }
        instance.set_playing(true);

        let type_id = instance.type_id_arc();
        if self.debug {
            debug!(
                "playing {} of {} (variant {}, volume {:.3}, pitch {:.3})",
                id, type_id, variant, native_volume, pitch
            );
        }
        self.emit(AudioEvent::Played {
            instance: id,
            type_id,
        });
        Ok(Some(id))
    }

    /// Set the volume multiplier of an instance.
    pub fn set_volume(&mut self, instance: InstanceId, volume: f32) {
        let factor = self.volume.factor();
        let Some(handle) = self.instances.get_mut(&instance) else {
            warn!("set_volume on unknown instance {}", instance);
            return;
        };
        handle.set_volume_multiplier(volume);
        let native_volume = handle.effective_volume() * factor;
        if let Some(unit) = handle.active_unit_mut() {
            unit.set_volume(native_volume);
        }
        let type_id = handle.type_id_arc();
        self.emit(AudioEvent::VolumeChanged {
            instance,
            type_id,
            volume,
        });
    }

    /// Pause an instance. `None` and unknown ids are ignored.
    pub fn pause(&mut self, instance: impl Into<Option<InstanceId>>) {
        let Some(id) = instance.into() else {
            return;
        };
        let Some(handle) = self.instances.get_mut(&id) else {
            return;
        };
        if let Some(unit) = handle.active_unit_mut() {
            unit.pause();
        }
        let type_id = handle.type_id_arc();
        self.emit(AudioEvent::Paused {
            instance: id,
            type_id,
        });
    }

    /// Tear down an instance and forget it. Releasing twice is a no-op.
    pub fn release(&mut self, instance: InstanceId) {
        let Some(mut handle) = self.instances.remove(&instance) else {
            if self.debug {
                debug!("release of unknown instance {}", instance);
            }
            return;
        };
        if self.debug {
            debug!(
                "releasing {} of {} (volume {:?})",
                instance,
                handle.type_id(),
                handle.native_volume()
            );
        }
        handle.teardown();
        if let Some(pool) = self.pools.get_mut(handle.type_id()) {
            pool.remove_active(instance);
            pool.remove_idle(instance);
        }
        self.emit(AudioEvent::Released {
            instance,
            type_id: handle.type_id_arc(),
        });
    }

    /// Current global volume setting.
    pub fn volume(&self) -> f32 {
        self.volume.setting()
    }

    /// Set the global volume (clamped to `[0, 1]`) and re-apply it to every active instance.
    pub fn set_volume_global(&mut self, volume: f32) {
        self.volume.set_setting(volume);
        self.apply_global_volume();
    }

    /// Multiplier currently applied on top of effective volumes.
    pub fn volume_factor(&self) -> f32 {
        self.volume.factor()
    }

    pub fn is_visible(&self) -> bool {
        self.volume.visible()
    }

    /// Deliver a host signal. Ignored after [`dispose`](Self::dispose).
    pub fn handle_host_signal(&mut self, signal: HostSignal) {
        if self.disposed {
            return;
        }
        match signal {
            HostSignal::UserInteraction => self.grant_consent(),
            HostSignal::VisibilityChanged { visible } => {
                if self.debug {
                    debug!("host visibility changed: visible={}", visible);
                }
                self.volume.set_visible(visible);
                self.set_volume_global(self.volume.setting());
            }
        }
    }

    pub fn consent_state(&self) -> ConsentState {
        self.consent
    }

    pub fn consent_received(&self) -> bool {
        self.consent.is_granted()
    }

    /// Drain pending unit notifications of every active instance and handle them.
    pub fn poll(&mut self) {
        let mut signals = Vec::new();
        for id in self.active_ids() {
            let Some(instance) = self.instances.get_mut(&id) else {
                continue;
            };
            let active = instance.active_index();
            for (index, unit) in instance.units_mut().enumerate() {
                while let Some(signal) = unit.poll() {
                    if Some(index) == active {
                        signals.push((id, signal));
                    }
                }
            }
        }
        for (id, signal) in signals {
            self.notify(id, signal);
        }
    }

    /// Handle a notification raised by the driven unit of `instance`.
    pub fn notify(&mut self, instance: InstanceId, signal: UnitSignal) {
        match signal {
            UnitSignal::TimeUpdate { seconds } => {
                let Some(handle) = self.instances.get(&instance) else {
                    return;
                };
                let type_id = handle.type_id_arc();
                self.emit(AudioEvent::TimeUpdate {
                    instance,
                    type_id,
                    time_ms: seconds * 1000.0,
                });
            }
            UnitSignal::Ended => self.handle_ended(instance),
        }
    }

    /// Tear down every instance. The engine ignores host signals afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for instance in self.instances.values_mut() {
            instance.teardown();
        }
        self.instances.clear();
        self.pools.clear();
        info!("audio engine disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn get_type(&self, type_id: &str) -> Option<&SoundTypeConfig> {
        self.registry.get(type_id).map(|sound| &sound.config)
    }

    /// Registered type ids in registration order.
    pub fn type_ids(&self) -> impl Iterator<Item = &str> {
        self.registry.ids().iter().map(|id| id.as_ref())
    }

    pub fn instance(&self, id: InstanceId) -> Option<&PlaybackHandle> {
        self.instances.get(&id)
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn idle_count(&self, type_id: &str) -> usize {
        self.pools.get(type_id).map_or(0, |pool| pool.idle_len())
    }

    pub fn active_count(&self, type_id: &str) -> usize {
        self.pools.get(type_id).map_or(0, |pool| pool.active().len())
    }

    /// Active instances of a type, oldest first.
    pub fn active_instances(&self, type_id: &str) -> Vec<InstanceId> {
        self.pools
            .get(type_id)
            .map(|pool| pool.active().to_vec())
            .unwrap_or_default()
    }

    pub fn idle_instances(&self, type_id: &str) -> Vec<InstanceId> {
        self.pools
            .get(type_id)
            .map(|pool| pool.idle().collect())
            .unwrap_or_default()
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&AudioEvent) + 'static) -> ListenerToken {
        self.bus.subscribe(listener)
    }

    pub fn subscribe_kind(
        &mut self,
        kind: AudioEventKind,
        listener: impl FnMut(&AudioEvent) + 'static,
    ) -> ListenerToken {
        self.bus.subscribe_kind(kind, listener)
    }

    pub fn unsubscribe(&mut self, token: ListenerToken) -> bool {
        self.bus.unsubscribe(token)
    }

    fn grant_consent(&mut self) {
        if self.consent.is_granted() {
            return;
        }
        self.consent = ConsentState::Granted;
        info!("audio consent received");
        for id in self.active_ids() {
            let Some(instance) = self.instances.get_mut(&id) else {
                continue;
            };
            if !instance.is_playing() {
                continue;
            }
            if let Some(unit) = instance.active_unit_mut() {
                if let Err(err) = unit.play() {
                    error!("deferred playback of {} was rejected: {}", id, err);
                }
            }
        }
    }

    fn handle_ended(&mut self, id: InstanceId) {
        let Some(instance) = self.instances.get_mut(&id) else {
            return;
        };
        instance.set_playing(false);
        let type_id = instance.type_id_arc();
        match self.pools.get_mut(&type_id) {
            Some(pool) => pool.push_idle(id),
            None => self.release(id),
        }
        if self.debug {
            debug!("instance {} of {} ended", id, type_id);
        }
        self.emit(AudioEvent::Ended {
            instance: id,
            type_id,
        });
    }

    fn apply_global_volume(&mut self) {
        let factor = self.volume.factor();
        for id in self.active_ids() {
            let Some(instance) = self.instances.get_mut(&id) else {
                continue;
            };
            let native_volume = instance.effective_volume() * factor;
            if let Some(unit) = instance.active_unit_mut() {
                unit.set_volume(native_volume);
            }
        }
    }

    /// Active ids of every type, types in registration order.
    fn active_ids(&self) -> Vec<InstanceId> {
        self.registry
            .ids()
            .iter()
            .filter_map(|type_id| self.pools.get(type_id))
            .flat_map(|pool| pool.active().iter().copied())
            .collect()
    }

    /// `uniform(0, range) - range / 2`.
    fn spread(&mut self, range: f32) -> f32 {
        if range > 0.0 {
            self.rng.gen_range(0.0..range) - range / 2.0
        } else {
            0.0
        }
    }

    fn emit(&mut self, event: AudioEvent) {
        self.bus.emit(&event);
    }
}
