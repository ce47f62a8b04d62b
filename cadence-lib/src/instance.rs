//! Runtime sound instances.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::backend::PlaybackUnit;

/// Opaque id of a pooled instance, unique for the lifetime of its engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One logical sound, backed by one native unit per source of its type.
///
/// Only the unit at [`variant`](Self::variant) is driven once the instance has been played.
pub struct PlaybackHandle {
    id: InstanceId,
    type_id: Arc<str>,
    variant: usize,
    units: Vec<Box<dyn PlaybackUnit>>,
    active: Option<usize>,
    base_volume: f32,
    volume_multiplier: f32,
    pitch: f32,
    playing: bool,
}

impl std::fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("id", &self.id)
            .field("type_id", &self.type_id)
            .field("variant", &self.variant)
            .field("units", &self.units.len())
            .field("active", &self.active)
            .field("base_volume", &self.base_volume)
            .field("volume_multiplier", &self.volume_multiplier)
            .field("pitch", &self.pitch)
            .field("playing", &self.playing)
            .finish()
    }
}

impl PlaybackHandle {
    pub(crate) fn new(
        id: InstanceId,
        type_id: Arc<str>,
        variant: usize,
        units: Vec<Box<dyn PlaybackUnit>>,
    ) -> Self {
        Self {
            id,
            type_id,
            variant,
            units,
            active: None,
            base_volume: 1.0,
            volume_multiplier: 1.0,
            pitch: 1.0,
            playing: false,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub(crate) fn type_id_arc(&self) -> Arc<str> {
        self.type_id.clone()
    }

    /// Index of the source variant this instance plays.
    pub fn variant(&self) -> usize {
        self.variant
    }

    pub fn base_volume(&self) -> f32 {
        self.base_volume
    }

    pub fn volume_multiplier(&self) -> f32 {
        self.volume_multiplier
    }

    /// `base_volume * volume_multiplier`.
    pub fn effective_volume(&self) -> f32 {
        self.base_volume * self.volume_multiplier
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// True from a successful `play` until the native unit reports the end of playback.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Volume currently applied by the driven native unit.
    pub fn native_volume(&self) -> Option<f32> {
        self.active_unit().map(|unit| unit.volume())
    }

    /// Elapsed playback time of the driven unit, in milliseconds.
    pub fn current_time_ms(&self) -> Option<f64> {
        self.active_unit().map(|unit| unit.current_time() * 1000.0)
    }

    pub(crate) fn set_variant(&mut self, variant: usize) {
        self.variant = variant;
    }

    pub(crate) fn set_base_volume(&mut self, volume: f32) {
        self.base_volume = volume;
    }

    pub(crate) fn set_volume_multiplier(&mut self, volume: f32) {
        self.volume_multiplier = volume;
    }

    pub(crate) fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
    }

    pub(crate) fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub(crate) fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Drive the unit at the stored variant from now on.
    pub(crate) fn activate_variant(&mut self) {
        self.active = Some(self.variant);
    }

    pub(crate) fn active_unit(&self) -> Option<&dyn PlaybackUnit> {
        self.active
            .and_then(|index| self.units.get(index))
            .map(|unit| &**unit)
    }

    pub(crate) fn active_unit_mut(&mut self) -> Option<&mut Box<dyn PlaybackUnit>> {
        match self.active {
            Some(index) => self.units.get_mut(index),
            None => None,
        }
    }

    pub(crate) fn unit_mut(&mut self, index: usize) -> Option<&mut Box<dyn PlaybackUnit>> {
        self.units.get_mut(index)
    }

    pub(crate) fn units_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn PlaybackUnit>> {
        self.units.iter_mut()
    }

    /// Pause the driven unit and tear down every unit.
    pub(crate) fn teardown(&mut self) {
        if let Some(unit) = self.active_unit_mut() {
            unit.pause();
        }
        for unit in self.units.iter_mut() {
            unit.remove();
        }
        self.playing = false;
    }
}
