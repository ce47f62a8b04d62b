//! Single-track crossfading on top of an [`Engine`].
//!
//! The mixer keeps at most one current track and one previous track fading out. Every call to
//! [`SingleTrackMixer::update`] moves the current track's volume multiplier towards 1 and the
//! previous one's towards 0, at a rate of one full swing per transition duration.

mod ticker;

use log::{debug, warn};

use crate::backend::PlaybackBackend;
use crate::clock::{Clock, SystemClock};
use crate::config::{PlayOptions, SoundTypeConfig};
use crate::engine::{Engine, EngineOptions};
use crate::error::EngineError;
use crate::host::HostSignal;
use crate::instance::InstanceId;

pub use ticker::Ticker;

pub const DEFAULT_TRANSITION_DURATION_MS: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixerOptions {
    /// Time for a full fade in or out.
    pub transition_duration_ms: f64,
    /// Options for the engine that serves the track types.
    pub engine: EngineOptions,
}

impl Default for MixerOptions {
    fn default() -> Self {
        Self {
            transition_duration_ms: DEFAULT_TRANSITION_DURATION_MS,
            engine: EngineOptions::default(),
        }
    }
}

impl MixerOptions {
    pub fn with_transition_ms(mut self, ms: f64) -> Self {
        self.transition_duration_ms = ms;
        self
    }

    pub fn with_engine(mut self, engine: EngineOptions) -> Self {
        self.engine = engine;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixerState {
    /// Nothing current and nothing fading.
    Idle,
    Playing,
    /// Terminal.
    Disposed,
}

/// Plays one track at a time and crossfades between them.
pub struct SingleTrackMixer {
    engine: Engine,
    clock: Box<dyn Clock>,
    ticker: Ticker,
    transition_duration_ms: f64,
    current: Option<InstanceId>,
    previous: Option<InstanceId>,
    disposed: bool,
}

impl std::fmt::Debug for SingleTrackMixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleTrackMixer")
            .field("state", &self.state())
            .field("current", &self.current)
            .field("previous", &self.previous)
            .field("ticking", &self.ticker.is_running())
            .field("transition_duration_ms", &self.transition_duration_ms)
            .finish()
    }
}

impl SingleTrackMixer {
    /// Build a mixer over `tracks` ticking on the system clock. Ticking starts immediately.
    ///
    /// # Errors
    /// Propagates engine construction errors.
    pub fn new<B>(
        tracks: impl IntoIterator<Item = SoundTypeConfig>,
        backend: B,
        options: MixerOptions,
    ) -> Result<Self, EngineError>
    where
        B: PlaybackBackend + 'static,
    {
        Self::with_clock(tracks, backend, options, SystemClock::new())
    }

    /// Build a mixer that reads time from `clock`.
    ///
    /// # Errors
    /// Propagates engine construction errors.
    pub fn with_clock<B, C>(
        tracks: impl IntoIterator<Item = SoundTypeConfig>,
        backend: B,
        options: MixerOptions,
        clock: C,
    ) -> Result<Self, EngineError>
    where
        B: PlaybackBackend + 'static,
        C: Clock + 'static,
    {
        let engine = Engine::new(tracks, backend, options.engine)?;
        let mut mixer = Self {
            engine,
            clock: Box::new(clock),
            ticker: Ticker::new(),
            transition_duration_ms: options.transition_duration_ms,
            current: None,
            previous: None,
            disposed: false,
        };
        mixer.start();
        Ok(mixer)
    }

    pub fn state(&self) -> MixerState {
        if self.disposed {
            MixerState::Disposed
        } else if self.current.is_some() || self.previous.is_some() {
            MixerState::Playing
        } else {
            MixerState::Idle
        }
    }

    /// Switch to a track of `type_id`. Playing the current track's type again does nothing.
    ///
    /// # Errors
    /// [`EngineError::UnknownType`] for unregistered ids.
    pub fn play(&mut self, type_id: &str, options: PlayOptions) -> Result<(), EngineError> {
        if self.disposed {
            warn!("play({}) on a disposed mixer", type_id);
            return Ok(());
        }
        if self.current_type() == Some(type_id) {
            return Ok(());
        }
        let fade_in = match self.engine.get_type(type_id) {
            Some(config) => config.fade_in,
            None => return Err(EngineError::UnknownType(type_id.to_string())),
        };

        self.end_current();

        let volume = if fade_in { 0.0 } else { 1.0 };
        let id = self.engine.play(type_id, options.with_volume(volume))?;
        if id.is_some() && id == self.previous {
            self.previous = None;
        }
        self.current = id;
        if self.engine.debug() {
            debug!("mixer track {} -> {:?}", type_id, id);
        }
        Ok(())
    }

    /// End the current track without starting another.
    pub fn play_empty(&mut self) {
        self.end_current();
    }

    /// Advance fades by the time elapsed since the last tick. Does nothing while stopped.
    pub fn update(&mut self) {
        let Some(elapsed) = self.ticker.advance(self.clock.now()) else {
            return;
        };
        let delta = if self.transition_duration_ms > 0.0 {
            (elapsed.as_secs_f64() * 1000.0 / self.transition_duration_ms) as f32
        } else {
            1.0
        };

        if let Some(current) = self.current {
            if let Some((volume, fade_in)) = self.fade_state(current, |config| config.fade_in) {
                if volume < 1.0 {
                    let next = if fade_in { (volume + delta).min(1.0) } else { 1.0 };
                    self.engine.set_volume(current, next);
                }
            }
        }

        if let Some(previous) = self.previous {
            match self.fade_state(previous, |config| config.fade_out) {
                Some((volume, fade_out)) => {
                    let next = if fade_out { (volume - delta).max(0.0) } else { 0.0 };
                    self.engine.set_volume(previous, next);
                    if next <= 0.0 {
                        self.engine.pause(previous);
                        self.previous = None;
                    }
                }
                None => self.previous = None,
            }
        }
    }

    /// Resume ticking. No-op after [`dispose`](Self::dispose).
    pub fn start(&mut self) {
        if self.disposed {
            return;
        }
        self.ticker.start(self.clock.now());
    }

    pub fn stop(&mut self) {
        self.ticker.stop();
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_running()
    }

    /// Stop ticking and dispose the engine. Terminal.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.stop();
        self.engine.dispose();
        self.current = None;
        self.previous = None;
        self.disposed = true;
    }

    pub fn current(&self) -> Option<InstanceId> {
        self.current
    }

    pub fn previous(&self) -> Option<InstanceId> {
        self.previous
    }

    /// Type id of the current track.
    pub fn current_type(&self) -> Option<&str> {
        self.current
            .and_then(|id| self.engine.instance(id))
            .map(|instance| instance.type_id())
    }

    pub fn transition_duration_ms(&self) -> f64 {
        self.transition_duration_ms
    }

    pub fn volume(&self) -> f32 {
        self.engine.volume()
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.engine.set_volume_global(volume);
    }

    pub fn debug(&self) -> bool {
        self.engine.debug()
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.engine.set_debug(debug);
    }

    pub fn handle_host_signal(&mut self, signal: HostSignal) {
        self.engine.handle_host_signal(signal);
    }

    /// Drain native notifications of the track engine.
    pub fn poll(&mut self) {
        self.engine.poll();
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Move a still-playing current track out of the current slot.
    fn end_current(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };
        let Some((playing, fade_out)) = self.engine.instance(current).map(|instance| {
            let fade_out = self
                .engine
                .get_type(instance.type_id())
                .map_or(true, |config| config.fade_out);
            (instance.is_playing(), fade_out)
        }) else {
            return;
        };
        if !playing {
            return;
        }
        if fade_out {
            if let Some(displaced) = self.previous.replace(current) {
                if displaced != current {
                    self.engine.pause(displaced);
                }
            }
        } else {
            self.engine.pause(current);
        }
    }

    /// Volume multiplier of `id` and a fade flag of its type.
    fn fade_state(
        &self,
        id: InstanceId,
        flag: impl Fn(&SoundTypeConfig) -> bool,
    ) -> Option<(f32, bool)> {
        let instance = self.engine.instance(id)?;
        let enabled = self.engine.get_type(instance.type_id()).map_or(true, flag);
        Some((instance.volume_multiplier(), enabled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::clock::ManualClock;
    use crate::config::StealingStrategy;
    use crate::events::AudioEventKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    const EPS: f32 = 1e-4;

    fn track(id: &str) -> SoundTypeConfig {
        SoundTypeConfig::new(id, format!("{}.ogg", id).as_str())
            .with_max_instances(1)
            .with_looping(true)
    }

    fn mixer_with(tracks: Vec<SoundTypeConfig>) -> (SingleTrackMixer, MockBackend, ManualClock) {
        let backend = MockBackend::new();
        let clock = ManualClock::new();
        let options = MixerOptions::default()
            .with_engine(EngineOptions::default().without_consent().with_seed(3));
        let mixer = SingleTrackMixer::with_clock(tracks, backend.clone(), options, clock.clone())
            .expect("mixer");
        (mixer, backend, clock)
    }

    fn multiplier(mixer: &SingleTrackMixer, id: InstanceId) -> f32 {
        mixer
            .engine()
            .instance(id)
            .expect("instance")
            .volume_multiplier()
    }

    fn run_for(mixer: &mut SingleTrackMixer, clock: &ManualClock, total_ms: u64) {
        let mut elapsed = 0;
        while elapsed + 16 <= total_ms {
            clock.advance_ms(16);
            mixer.update();
            elapsed += 16;
        }
    }

    #[test]
    fn starts_idle_and_ticking() {
        let (mixer, _, _) = mixer_with(vec![track("a")]);
        assert_eq!(mixer.state(), MixerState::Idle);
        assert!(mixer.is_running());
    }

    #[test]
    fn replaying_current_type_is_a_no_op() {
        let (mut mixer, _, _) = mixer_with(vec![track("a")]);
        let played = Rc::new(RefCell::new(0));
        let counter = played.clone();
        mixer
            .engine_mut()
            .subscribe_kind(AudioEventKind::Played, move |_| *counter.borrow_mut() += 1);

        mixer.play("a", PlayOptions::default()).expect("play a");
        let first = mixer.current();
        mixer.play("a", PlayOptions::default()).expect("play a again");

        assert_eq!(mixer.current(), first);
        assert_eq!(mixer.previous(), None);
        assert_eq!(*played.borrow(), 1);
        assert_eq!(mixer.state(), MixerState::Playing);
    }

    #[test]
    fn fade_in_reaches_half_after_quarter_second() {
        let (mut mixer, _, clock) = mixer_with(vec![track("bg")]);
        mixer.play("bg", PlayOptions::default()).expect("play bg");
        let id = mixer.current().expect("current");
        assert_eq!(multiplier(&mixer, id), 0.0);

        run_for(&mut mixer, &clock, 250);

        assert!((multiplier(&mixer, id) - 0.5).abs() < 0.05);
    }

    #[test]
    fn crossfade_is_monotonic_and_completes() {
        let (mut mixer, backend, clock) = mixer_with(vec![track("a"), track("b")]);
        mixer.play("a", PlayOptions::default()).expect("play a");
        let a = mixer.current().expect("a");
        run_for(&mut mixer, &clock, 600);
        assert!((multiplier(&mixer, a) - 1.0).abs() < EPS);

        mixer.play("b", PlayOptions::default()).expect("play b");
        let b = mixer.current().expect("b");
        assert_eq!(mixer.previous(), Some(a));

        let mut last_a = multiplier(&mixer, a);
        let mut last_b = multiplier(&mixer, b);
        for _ in 0..40 {
            clock.advance_ms(16);
            mixer.update();
            let now_a = multiplier(&mixer, a);
            let now_b = multiplier(&mixer, b);
            assert!(now_a <= last_a + EPS);
            assert!(now_b >= last_b - EPS);
            last_a = now_a;
            last_b = now_b;
        }

        assert_eq!(last_a, 0.0);
        assert!((last_b - 1.0).abs() < EPS);
        assert_eq!(mixer.previous(), None);
        assert!(backend.unit(0).expect("unit a").paused);
        assert!(!backend.unit(1).expect("unit b").paused);
    }

    #[test]
    fn stop_halts_ticks_until_start() {
        let (mut mixer, _, clock) = mixer_with(vec![track("a")]);
        mixer.play("a", PlayOptions::default()).expect("play a");
        let id = mixer.current().expect("current");

        mixer.stop();
        mixer.stop();
        clock.advance_ms(200);
        mixer.update();
        assert_eq!(multiplier(&mixer, id), 0.0);

        mixer.start();
        mixer.update();
        assert_eq!(multiplier(&mixer, id), 0.0);

        clock.advance_ms(100);
        mixer.update();
        assert!((multiplier(&mixer, id) - 0.2).abs() < EPS);
    }

    #[test]
    fn disabled_fades_snap() {
        let (mut mixer, backend, clock) = mixer_with(vec![
            track("a").with_fades(false, false),
            track("b").with_fades(false, true),
        ]);
        mixer.play("a", PlayOptions::default()).expect("play a");
        let a = mixer.current().expect("a");
        assert_eq!(multiplier(&mixer, a), 1.0);

        mixer.play("b", PlayOptions::default()).expect("play b");
        assert_eq!(mixer.previous(), None);
        assert!(backend.unit(0).expect("unit a").paused);

        let b = mixer.current().expect("b");
        clock.advance_ms(16);
        mixer.update();
        assert_eq!(multiplier(&mixer, b), 1.0);
    }

    #[test]
    fn play_empty_fades_out_current() {
        let (mut mixer, _, clock) = mixer_with(vec![track("a")]);
        mixer.play("a", PlayOptions::default()).expect("play a");
        let a = mixer.current().expect("a");

        mixer.play_empty();
        assert_eq!(mixer.current(), None);
        assert_eq!(mixer.previous(), Some(a));

        run_for(&mut mixer, &clock, 600);
        assert_eq!(mixer.previous(), None);
        assert_eq!(mixer.state(), MixerState::Idle);
    }

    #[test]
    fn reused_instance_is_not_also_previous() {
        let (mut mixer, _, clock) = mixer_with(vec![
            track("a").with_stealing_strategy(StealingStrategy::Oldest),
            track("b"),
        ]);
        mixer.play("a", PlayOptions::default()).expect("play a");
        let a = mixer.current().expect("a");
        run_for(&mut mixer, &clock, 100);

        mixer.play_empty();
        assert_eq!(mixer.previous(), Some(a));
        mixer.play("a", PlayOptions::default()).expect("play a again");

        assert_eq!(mixer.current(), Some(a));
        assert_eq!(mixer.previous(), None);
    }

    #[test]
    fn displaced_previous_is_paused() {
        let (mut mixer, backend, _) = mixer_with(vec![track("a"), track("b"), track("c")]);
        mixer.play("a", PlayOptions::default()).expect("play a");
        let a = mixer.current().expect("a");
        mixer.play("b", PlayOptions::default()).expect("play b");
        let b = mixer.current().expect("b");
        mixer.play("c", PlayOptions::default()).expect("play c");

        assert_eq!(mixer.previous(), Some(b));
        assert_ne!(mixer.previous(), Some(a));
        assert!(backend.unit(0).expect("unit a").paused);
    }

    #[test]
    fn ended_current_is_not_faded() {
        let (mut mixer, backend, _) = mixer_with(vec![
            SoundTypeConfig::new("once", "once.ogg").with_max_instances(1),
            track("b"),
        ]);
        mixer.play("once", PlayOptions::default()).expect("play once");
        backend.finish(0);
        mixer.poll();

        mixer.play("b", PlayOptions::default()).expect("play b");
        assert_eq!(mixer.previous(), None);
    }

    #[test]
    fn unknown_track_is_an_error() {
        let (mut mixer, _, _) = mixer_with(vec![track("a")]);
        mixer.play("a", PlayOptions::default()).expect("play a");
        let a = mixer.current();

        assert!(matches!(
            mixer.play("missing", PlayOptions::default()),
            Err(EngineError::UnknownType(_))
        ));
        assert_eq!(mixer.current(), a);
    }

    #[test]
    fn dispose_is_terminal() {
        let (mut mixer, backend, clock) = mixer_with(vec![track("a")]);
        mixer.play("a", PlayOptions::default()).expect("play a");

        mixer.dispose();
        mixer.dispose();
        mixer.start();
        mixer.play("a", PlayOptions::default()).expect("ignored");
        clock.advance_ms(16);
        mixer.update();

        assert_eq!(mixer.state(), MixerState::Disposed);
        assert!(!mixer.is_running());
        assert_eq!(mixer.current(), None);
        assert_eq!(backend.live_unit_count(), 0);
        assert!(mixer.engine().is_disposed());
    }

    #[test]
    fn volume_passes_through_to_engine() {
        let (mut mixer, _, _) = mixer_with(vec![track("a")]);
        mixer.set_volume(0.4);
        assert!((mixer.volume() - 0.4).abs() < EPS);
        mixer.set_debug(true);
        assert!(mixer.engine().debug());
    }
}
