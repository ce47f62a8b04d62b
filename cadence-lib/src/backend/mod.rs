//! Native playback seam.
//!
//! The engine never renders audio itself. Each pooled instance owns one [`PlaybackUnit`] per
//! source location, created through a [`PlaybackBackend`]. Units report end-of-playback and
//! time progress through [`PlaybackUnit::poll`].

pub mod mock;
#[cfg(feature = "rodio-backend")]
pub mod sink;

pub use mock::{MockBackend, MockUnitSnapshot};
#[cfg(feature = "rodio-backend")]
pub use sink::{RodioBackend, RodioUnit};

use crate::error::BackendError;

/// Notification raised by a native unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitSignal {
    /// The unit finished a play-through.
    Ended,
    /// Periodic progress report, in seconds.
    TimeUpdate { seconds: f64 },
}

/// One native playback unit bound to a single source.
pub trait PlaybackUnit {
    /// Linear volume applied by the platform.
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn set_playback_rate(&mut self, rate: f32);
    /// Start or resume playback. The platform may refuse.
    fn play(&mut self) -> Result<(), BackendError>;
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    /// Current position in seconds.
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    /// Tear the unit down. It must not be driven afterwards.
    fn remove(&mut self);
    /// Take the next pending notification, if any.
    fn poll(&mut self) -> Option<UnitSignal>;
}

/// Factory for native playback units.
pub trait PlaybackBackend {
    fn create_unit(
        &mut self,
        source: &str,
        looping: bool,
    ) -> Result<Box<dyn PlaybackUnit>, BackendError>;
}
