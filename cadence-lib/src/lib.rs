//! # Cadence Audio Library
//!
//! Pooled sound playback on top of a native playback primitive. The [`engine`] module resolves
//! play requests into pooled instances (pre-warming, reuse, and voice stealing per sound type),
//! and the [`mixer`] module layers a single-track crossfade state machine on top of it.
//!
//! Native playback is reached through the traits in [`backend`]; a rodio implementation ships
//! behind the default `rodio-backend` feature and a headless mock is always available.

pub mod backend;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod host;
pub mod instance;
pub mod mixer;
pub mod registry;

pub use backend::{MockBackend, PlaybackBackend, PlaybackUnit, UnitSignal};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, PlayOptions, Randomize, SoundTypeConfig, StealingStrategy};
pub use engine::{perceptual_factor, Engine, EngineOptions};
pub use error::{BackendError, ConfigError, EngineError};
pub use events::{AudioEvent, AudioEventKind, ListenerToken};
pub use host::{ConsentState, HostSignal};
pub use instance::{InstanceId, PlaybackHandle};
pub use mixer::{MixerOptions, MixerState, SingleTrackMixer, Ticker};
