//! Soundboard state shared by the TUI: one engine for sound effects and a mixer for tracks.

use cadence_lib::clock::{Clock, SystemClock};
use cadence_lib::{
    ConsentState, Engine, EngineConfig, EngineError, EngineOptions, HostSignal, InstanceId,
    MixerOptions, PlayOptions, PlaybackBackend, SingleTrackMixer,
};
use log::{info, warn};

const VOLUME_STEP: f32 = 0.05;

/// Track slot as shown in the status panel.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSlot {
    pub type_id: String,
    pub volume: f32,
    /// Playback position of the driven unit.
    pub position_ms: f64,
}

/// Per-type pool occupancy.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolRow {
    pub type_id: String,
    pub active: usize,
    pub idle: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardStatus {
    pub volume: f32,
    pub consent: ConsentState,
    pub visible: bool,
    pub ticking: bool,
    pub current: Option<TrackSlot>,
    pub previous: Option<TrackSlot>,
    pub pools: Vec<PoolRow>,
}

pub struct Soundboard {
    sounds: Engine,
    mixer: SingleTrackMixer,
    sound_ids: Vec<String>,
    track_ids: Vec<String>,
    next_track: usize,
}

impl Soundboard {
    /// Build both engines from `config` on a shared backend.
    ///
    /// # Errors
    /// Fails if either engine rejects its type list.
    pub fn new<B>(
        config: &EngineConfig,
        backend: B,
        options: EngineOptions,
        transition_duration_ms: f64,
    ) -> Result<Self, EngineError>
    where
        B: PlaybackBackend + Clone + 'static,
    {
        Self::with_clock(
            config,
            backend,
            options,
            transition_duration_ms,
            SystemClock::new(),
        )
    }

    pub fn with_clock<B, C>(
        config: &EngineConfig,
        backend: B,
        options: EngineOptions,
        transition_duration_ms: f64,
        clock: C,
    ) -> Result<Self, EngineError>
    where
        B: PlaybackBackend + Clone + 'static,
        C: Clock + 'static,
    {
        let sounds = Engine::new(config.sounds.clone(), backend.clone(), options)?;
        let mixer = SingleTrackMixer::with_clock(
            config.tracks.clone(),
            backend,
            MixerOptions::default()
                .with_transition_ms(transition_duration_ms)
                .with_engine(options),
            clock,
        )?;
        let sound_ids = sounds.type_ids().map(str::to_string).collect();
        let track_ids = mixer.engine().type_ids().map(str::to_string).collect();
        Ok(Self {
            sounds,
            mixer,
            sound_ids,
            track_ids,
            next_track: 0,
        })
    }

    pub fn sound_ids(&self) -> &[String] {
        &self.sound_ids
    }

    pub fn track_ids(&self) -> &[String] {
        &self.track_ids
    }

    /// Play the sound type bound to slot `index`.
    pub fn trigger(&mut self, index: usize) -> Result<Option<InstanceId>, EngineError> {
        let Some(type_id) = self.sound_ids.get(index) else {
            return Ok(None);
        };
        let played = self.sounds.play(type_id, PlayOptions::default())?;
        match played {
            Some(id) => info!("{} -> {}", type_id, id),
            None => info!("{} is at capacity", type_id),
        }
        Ok(played)
    }

    /// Crossfade to the next track in config order, wrapping around.
    pub fn next_track(&mut self) -> Result<(), EngineError> {
        if self.track_ids.is_empty() {
            warn!("no tracks configured");
            return Ok(());
        }
        let type_id = &self.track_ids[self.next_track % self.track_ids.len()];
        self.next_track = self.next_track.wrapping_add(1);
        self.mixer.play(type_id, PlayOptions::default())?;
        info!("track -> {}", type_id);
        Ok(())
    }

    pub fn play_empty(&mut self) {
        self.mixer.play_empty();
        info!("track -> (none)");
    }

    /// Move the global volume of both engines by `steps` increments.
    pub fn nudge_volume(&mut self, steps: i32) {
        let volume = (self.sounds.volume() + steps as f32 * VOLUME_STEP).clamp(0.0, 1.0);
        self.sounds.set_volume_global(volume);
        self.mixer.set_volume(volume);
    }

    /// Stop or restart the crossfade tick. Returns whether it is running afterwards.
    pub fn toggle_tick(&mut self) -> bool {
        if self.mixer.is_running() {
            self.mixer.stop();
        } else {
            self.mixer.start();
        }
        self.mixer.is_running()
    }

    pub fn host_signal(&mut self, signal: HostSignal) {
        self.sounds.handle_host_signal(signal);
        self.mixer.handle_host_signal(signal);
    }

    /// Per-frame work: drain native notifications and advance fades.
    pub fn frame(&mut self) {
        self.sounds.poll();
        self.mixer.poll();
        self.mixer.update();
    }

    pub fn status(&self) -> BoardStatus {
        let engine = self.mixer.engine();
        let slot = |id: Option<InstanceId>| {
            id.and_then(|id| engine.instance(id)).map(|instance| TrackSlot {
                type_id: instance.type_id().to_string(),
                volume: instance.volume_multiplier(),
                position_ms: instance.current_time_ms().unwrap_or(0.0),
            })
        };
        BoardStatus {
            volume: self.sounds.volume(),
            consent: self.sounds.consent_state(),
            visible: self.sounds.is_visible(),
            ticking: self.mixer.is_running(),
            current: slot(self.mixer.current()),
            previous: slot(self.mixer.previous()),
            pools: self
                .sound_ids
                .iter()
                .map(|type_id| PoolRow {
                    type_id: type_id.clone(),
                    active: self.sounds.active_count(type_id),
                    idle: self.sounds.idle_count(type_id),
                })
                .collect(),
        }
    }

    pub fn dispose(&mut self) {
        self.sounds.dispose();
        self.mixer.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_lib::{ManualClock, MockBackend, SoundTypeConfig, StealingStrategy};

    fn config() -> EngineConfig {
        EngineConfig {
            sounds: vec![SoundTypeConfig::new("blip", "blip.wav")
                .with_max_instances(1)
                .with_stealing_strategy(StealingStrategy::None)],
            tracks: vec![
                SoundTypeConfig::new("calm", "calm.ogg").with_max_instances(1),
                SoundTypeConfig::new("storm", "storm.ogg").with_max_instances(1),
            ],
            ..EngineConfig::default()
        }
    }

    fn board() -> (Soundboard, ManualClock) {
        let (board, clock, _) = board_with_backend();
        (board, clock)
    }

    fn board_with_backend() -> (Soundboard, ManualClock, MockBackend) {
        let clock = ManualClock::new();
        let backend = MockBackend::new();
        let board = Soundboard::with_clock(
            &config(),
            backend.clone(),
            EngineOptions::default().with_seed(5),
            500.0,
            clock.clone(),
        )
        .expect("board");
        (board, clock, backend)
    }

    #[test]
    fn ids_follow_config_order() {
        let (board, _) = board();
        assert_eq!(board.sound_ids(), ["blip".to_string()]);
        assert_eq!(board.track_ids(), ["calm".to_string(), "storm".to_string()]);
    }

    #[test]
    fn track_slot_reports_playback_position() {
        let (mut board, _, backend) = board_with_backend();
        board.next_track().expect("calm");
        assert_eq!(board.status().current.map(|slot| slot.position_ms), Some(0.0));

        // Unit 0 belongs to the sound engine, unit 1 is the calm track.
        backend.report_time(1, 1.5);
        board.frame();
        let slot = board.status().current.expect("current track");
        assert_eq!(slot.type_id, "calm");
        assert!((slot.position_ms - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn triggers_respect_capacity() {
        let (mut board, _) = board();
        assert!(board.trigger(0).expect("trigger").is_some());
        assert!(board.trigger(0).expect("trigger").is_none());
        assert!(board.trigger(8).expect("out of range").is_none());

        let status = board.status();
        assert_eq!(
            status.pools,
            vec![PoolRow {
                type_id: "blip".to_string(),
                active: 1,
                idle: 0,
            }]
        );
    }

    #[test]
    fn tracks_cycle_and_crossfade() {
        let (mut board, clock) = board();
        board.next_track().expect("calm");
        board.next_track().expect("storm");

        let status = board.status();
        assert_eq!(status.current.map(|slot| slot.type_id), Some("storm".to_string()));
        assert_eq!(status.previous.map(|slot| slot.type_id), Some("calm".to_string()));

        for _ in 0..40 {
            clock.advance_ms(16);
            board.frame();
        }
        let status = board.status();
        assert_eq!(status.previous, None);
        assert_eq!(status.current.map(|slot| slot.volume), Some(1.0));

        board.next_track().expect("calm again");
        assert_eq!(
            board.status().current.map(|slot| slot.type_id),
            Some("calm".to_string())
        );
    }

    #[test]
    fn consent_and_visibility_reach_both_engines() {
        let (mut board, _) = board();
        assert_eq!(board.status().consent, ConsentState::Pending);

        board.host_signal(HostSignal::UserInteraction);
        board.host_signal(HostSignal::VisibilityChanged { visible: false });

        let status = board.status();
        assert_eq!(status.consent, ConsentState::Granted);
        assert!(!status.visible);
        assert!(board.mixer.engine().consent_received());
        assert!(!board.mixer.engine().is_visible());
    }

    #[test]
    fn volume_nudges_are_clamped() {
        let (mut board, _) = board();
        board.nudge_volume(-4);
        assert!((board.status().volume - 0.8).abs() < 1e-5);
        board.nudge_volume(100);
        assert_eq!(board.status().volume, 1.0);
        assert_eq!(board.mixer.volume(), 1.0);
    }

    #[test]
    fn toggling_the_tick_freezes_fades() {
        let (mut board, clock) = board();
        board.next_track().expect("calm");
        assert!(!board.toggle_tick());

        clock.advance_ms(200);
        board.frame();
        assert_eq!(board.status().current.map(|slot| slot.volume), Some(0.0));

        assert!(board.toggle_tick());
    }
}
