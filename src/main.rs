use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::thread::sleep;
use std::time::{Duration, Instant};

use cadence_lib::backend::RodioBackend;
use cadence_lib::{
    AudioEvent, AudioEventKind, Engine, EngineConfig, EngineOptions, InstanceId, PlayOptions,
};
use clap::Parser;
use log::{error, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine configuration JSON file
    config: String,

    /// Sound type ids to play, in order
    #[arg(required = true)]
    sounds: Vec<String>,

    /// The playback gain (0-100)
    #[arg(short, long, default_value_t = 100.0, value_name = "GAIN")]
    gain: f32,

    /// Delay between starting consecutive sounds
    #[arg(long, default_value_t = 250, value_name = "MS")]
    stagger_ms: u64,

    /// Stop waiting after this many seconds (looping sounds never end)
    #[arg(long, default_value_t = 30.0, value_name = "SECONDS")]
    max_seconds: f64,

    /// Show debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let args = Cli::parse();

    // For any error, return an exit code -1. Otherwise return the exit code provided.
    let code = match run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            eprintln!("error: {}", err);
            -1
        }
    };

    std::process::exit(code)
}

fn format_time(time: f64) -> String {
    // Seconds rounded up
    let seconds = (time / 1000.0).ceil() as u32;
    let minutes = seconds / 60;
    let seconds = seconds % 60;
    let hours = minutes / 60;
    let minutes = minutes % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

fn run(args: &Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let config = EngineConfig::from_path(&args.config)?;
    let options = EngineOptions::default()
        .without_consent()
        .with_volume(args.gain / 100.0)
        .with_debug(args.debug);

    let backend = RodioBackend::open_default()?;
    let mut engine = Engine::new(config.sounds.clone(), backend, options)?;

    let ended = Rc::new(RefCell::new(HashSet::new()));
    let sink = ended.clone();
    engine.subscribe_kind(AudioEventKind::Ended, move |event: &AudioEvent| {
        sink.borrow_mut().insert(event.instance());
    });

    let started = Instant::now();
    let mut playing: Vec<(String, InstanceId)> = Vec::new();
    for (index, type_id) in args.sounds.iter().enumerate() {
        if index > 0 {
            sleep(Duration::from_millis(args.stagger_ms));
        }
        match engine.play(type_id, PlayOptions::default())? {
            Some(id) => {
                println!("{} {} -> {}", format_time(elapsed_ms(started)), type_id, id);
                playing.push((type_id.clone(), id));
            }
            None => warn!("{} is at capacity, skipped", type_id),
        }
    }

    let mut last_report = 0.0;
    while playing.iter().any(|(_, id)| !ended.borrow().contains(id)) {
        engine.poll();
        let now = elapsed_ms(started);
        if now / 1000.0 > args.max_seconds {
            warn!("giving up after {}s", args.max_seconds);
            break;
        }
        if now - last_report >= 1000.0 {
            last_report = now;
            let remaining: Vec<&str> = playing
                .iter()
                .filter(|(_, id)| !ended.borrow().contains(id))
                .map(|(type_id, _)| type_id.as_str())
                .collect();
            println!("{} playing: {}", format_time(now), remaining.join(", "));
        }
        sleep(Duration::from_millis(50));
    }

    engine.dispose();
    Ok(0)
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
