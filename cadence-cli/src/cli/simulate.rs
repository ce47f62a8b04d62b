//! Headless crossfade simulation on a manual clock.

use cadence_lib::{
    Clock, EngineConfig, EngineError, EngineOptions, ManualClock, MixerOptions, MockBackend,
    PlayOptions, SingleTrackMixer,
};
use clap::ArgMatches;
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotVolume {
    pub track: String,
    pub volume: f32,
}

/// Mixer state after one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub time_ms: u64,
    pub current: Option<SlotVolume>,
    pub previous: Option<SlotVolume>,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    pub track: String,
    pub then: Option<String>,
    pub phase_ms: u64,
    pub tick_ms: u64,
    pub transition_ms: f64,
    pub seed: Option<u64>,
}

/// Play `track`, tick for one phase, then optionally switch to `then` and tick again.
pub fn simulate(config: &EngineConfig, sim: &Simulation) -> Result<Vec<Frame>, EngineError> {
    let clock = ManualClock::new();
    let mut engine = EngineOptions::default()
        .without_consent()
        .with_volume(config.volume);
    if let Some(seed) = sim.seed {
        engine = engine.with_seed(seed);
    }
    let mut mixer = SingleTrackMixer::with_clock(
        config.tracks.clone(),
        MockBackend::new(),
        MixerOptions::default()
            .with_transition_ms(sim.transition_ms)
            .with_engine(engine),
        clock.clone(),
    )?;

    let mut frames = Vec::new();
    mixer.play(&sim.track, PlayOptions::default())?;
    frames.push(frame(&mixer, &clock));
    run_phase(&mut mixer, &clock, sim, &mut frames);

    if let Some(then) = &sim.then {
        mixer.play(then, PlayOptions::default())?;
        frames.push(frame(&mixer, &clock));
        run_phase(&mut mixer, &clock, sim, &mut frames);
    }

    mixer.dispose();
    Ok(frames)
}

fn run_phase(
    mixer: &mut SingleTrackMixer,
    clock: &ManualClock,
    sim: &Simulation,
    frames: &mut Vec<Frame>,
) {
    let tick = sim.tick_ms.max(1);
    let mut elapsed = 0;
    while elapsed < sim.phase_ms {
        let step = tick.min(sim.phase_ms - elapsed);
        clock.advance_ms(step);
        mixer.update();
        elapsed += step;
        frames.push(frame(mixer, clock));
    }
}

fn frame(mixer: &SingleTrackMixer, clock: &ManualClock) -> Frame {
    let slot = |id| {
        mixer.engine().instance(id).map(|instance| SlotVolume {
            track: instance.type_id().to_string(),
            volume: instance.volume_multiplier(),
        })
    };
    Frame {
        time_ms: clock.now().as_millis() as u64,
        current: mixer.current().and_then(slot),
        previous: mixer.previous().and_then(slot),
    }
}

fn slot_text(slot: &Option<SlotVolume>) -> String {
    match slot {
        Some(slot) => format!("{}:{:.3}", slot.track, slot.volume),
        None => "-".to_string(),
    }
}

pub fn frame_line(frame: &Frame) -> String {
    format!(
        "{:>6}ms  current={}  previous={}",
        frame.time_ms,
        slot_text(&frame.current),
        slot_text(&frame.previous)
    )
}

pub fn run_simulate(args: &ArgMatches) -> Result<i32, CliError> {
    let path = args
        .get_one::<String>("CONFIG")
        .map(String::as_str)
        .unwrap_or_default();
    let config = EngineConfig::from_path(path)?;
    let sim = Simulation {
        track: args.get_one::<String>("track").cloned().unwrap_or_default(),
        then: args.get_one::<String>("then").cloned(),
        phase_ms: args.get_one::<u64>("ms").copied().unwrap_or(1000),
        tick_ms: args.get_one::<u64>("tick-ms").copied().unwrap_or(16),
        transition_ms: args
            .get_one::<f64>("transition-ms")
            .copied()
            .unwrap_or(config.transition_duration_ms),
        seed: args.get_one::<u64>("seed").copied(),
    };

    let frames = simulate(&config, &sim)?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&frames)?);
    } else if args.get_flag("quiet") {
        if let Some(last) = frames.last() {
            println!("{}", frame_line(last));
        }
    } else {
        for frame in &frames {
            println!("{}", frame_line(frame));
        }
    }
    Ok(0)
}
